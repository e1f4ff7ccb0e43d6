use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Mail account user, also used as the `from` address.
    pub username: String,
    pub password: String,
    pub admin_email: String,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub project_id: String,
    pub credentials_path: Option<String>,
    pub emulator_host: Option<String>,
}

/// Everything the callable handlers need, loaded once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub mail: MailConfig,
    pub identity: IdentityConfig,
    pub encryption_key: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_port("PORT", get("PORT"), 8080)?,
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };

        let mail = MailConfig {
            smtp_host: get("MAIL_SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: parse_port("MAIL_SMTP_PORT", get("MAIL_SMTP_PORT"), 465)?,
            username: required("MAIL_USERNAME")?,
            password: required("MAIL_PASSWORD")?,
            admin_email: required("ADMIN_EMAIL")?,
        };

        let identity = IdentityConfig {
            project_id: required("FIREBASE_PROJECT_ID")?,
            credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS"),
            emulator_host: get("FIREBASE_AUTH_EMULATOR_HOST"),
        };

        if identity.credentials_path.is_none() && identity.emulator_host.is_none() {
            return Err(ConfigError::Missing("GOOGLE_APPLICATION_CREDENTIALS"));
        }

        Ok(Self {
            server,
            database_url: required("DATABASE_URL")?,
            mail,
            identity,
            encryption_key: required("ENCRYPTION_KEY")?,
        })
    }
}

fn parse_port(key: &'static str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
