mod api;
mod config;
mod database;
mod models;
mod services;
mod state;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::database::{MongoDB, MongoUserStore};
use crate::services::identity_service::FirebaseAuthClient;
use crate::services::mail_service::SmtpMailer;
use crate::state::AppState;
use crate::utils::error::AppError;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    log::info!("🚀 Starting Lab Survey Service...");
    log::info!("📊 Database: {}", redact_uri(&config.database_url));
    log::info!("📧 SMTP relay: {}:{}", config.mail.smtp_host, config.mail.smtp_port);
    log::info!("🔐 Identity project: {}", config.identity.project_id);

    let db = MongoDB::new(&config.database_url).await?;
    log::info!("✅ MongoDB connected successfully");

    let state = AppState::new(
        &config,
        Arc::new(SmtpMailer::new(&config.mail)?),
        Arc::new(FirebaseAuthClient::new(&config.identity)?),
        Arc::new(MongoUserStore::new(&db)),
    )?;
    let state = web::Data::new(state);

    let host = config.server.host.clone();
    let port = config.server.port;
    let allowed_origins = config.server.allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["POST", "GET", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi),
            )
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}

/// Hides the password part of a connection URI before logging it.
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &uri[scheme_end + 3..at];
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}{}:***{}", &uri[..scheme_end + 3], user, &uri[at..])
        }
        _ => uri.to_string(),
    }
}
