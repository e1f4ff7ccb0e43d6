use actix_web::{web, HttpResponse};

use crate::api::callable::{CallableRequest, CallableResponse};
use crate::models::{CreateUserResult, DeleteUsersResult, ImportUserRequest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/createUserToAuthAndDB",
    tag = "Users",
    request_body(content = ImportUserRequest, description = "Imported user wrapped as {\"data\": ...}"),
    responses(
        (status = 200, description = "Provisioning outcome, see statusCode", body = CreateUserResult),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn create_user(
    state: web::Data<AppState>,
    request: web::Json<CallableRequest<ImportUserRequest>>,
) -> HttpResponse {
    log::info!("👤 POST /createUserToAuthAndDB - id: {}", request.data.id);

    let result = state.provisioner.provision(&request.data).await;
    HttpResponse::Ok().json(CallableResponse::new(result))
}

#[utoipa::path(
    post,
    path = "/deleteUsersInAuthAndDB",
    tag = "Users",
    request_body(content = i32, description = "Year wrapped as {\"data\": 2024}"),
    responses(
        (status = 200, description = "Echoes the year once every deletion has finished", body = DeleteUsersResult),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn delete_users(
    state: web::Data<AppState>,
    request: web::Json<CallableRequest<i32>>,
) -> HttpResponse {
    log::info!("🗑️ POST /deleteUsersInAuthAndDB - year: {}", request.data);

    let result = state.cleaner.delete_by_year(request.data).await;
    HttpResponse::Ok().json(CallableResponse::new(result))
}
