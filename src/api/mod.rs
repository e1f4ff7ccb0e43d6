pub mod callable;
pub mod health;
pub mod inquiries;
pub mod swagger;
pub mod users;

use actix_web::web;

/// Registers the callable functions and the health check.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(callable::json_config())
        .route("/health", web::get().to(health::health_check))
        .route("/sendInqueries", web::post().to(inquiries::send_inquiries))
        .route("/createUserToAuthAndDB", web::post().to(users::create_user))
        .route("/deleteUsersInAuthAndDB", web::post().to(users::delete_users));
}
