// ==================== IDENTITY PROVIDER ====================
// Login accounts in Firebase Authentication (Identity Toolkit REST API)

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::IdentityConfig;
use crate::models::{IdentityRecord, NewIdentity};

const IDENTITY_TOOLKIT_HOST: &str = "https://identitytoolkit.googleapis.com";
const OAUTH_SCOPES: &str =
    "https://www.googleapis.com/auth/identitytoolkit https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("There is no user record corresponding to the provided identifier: {0}")]
    NotFound(String),

    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("Identity provider request failed: {0}")]
    Transport(String),

    #[error("Identity provider credentials error: {0}")]
    Credentials(String),
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, IdentityError>;
    async fn create_user(&self, user: &NewIdentity) -> Result<IdentityRecord, IdentityError>;
    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError>;
}

// ==================== WIRE MODELS ====================

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    disabled: bool,
}

impl From<AccountInfo> for IdentityRecord {
    fn from(info: AccountInfo) -> Self {
        IdentityRecord {
            uid: info.local_id,
            email: info.email,
            display_name: info.display_name,
            email_verified: info.email_verified,
            disabled: info.disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
    email_verified: bool,
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ==================== FIREBASE CLIENT ====================

enum Authorization {
    Emulator,
    ServiceAccount(ServiceAccountKey),
}

pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    authorization: Authorization,
    token: Mutex<Option<CachedToken>>,
}

impl FirebaseAuthClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let project = urlencoding::encode(&config.project_id).into_owned();

        let (host, authorization) = match (&config.emulator_host, &config.credentials_path) {
            (Some(emulator), _) => {
                log::info!("🧪 Using Firebase Auth emulator at {}", emulator);
                (
                    format!("http://{}/identitytoolkit.googleapis.com", emulator),
                    Authorization::Emulator,
                )
            }
            (None, Some(path)) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| IdentityError::Credentials(format!("{}: {}", path, e)))?;
                let key: ServiceAccountKey = serde_json::from_str(&raw)
                    .map_err(|e| IdentityError::Credentials(e.to_string()))?;
                (IDENTITY_TOOLKIT_HOST.to_string(), Authorization::ServiceAccount(key))
            }
            (None, None) => {
                return Err(IdentityError::Credentials(
                    "no service account or emulator configured".to_string(),
                ))
            }
        };

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/v1/projects/{}", host, project),
            authorization,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, IdentityError> {
        let key = match &self.authorization {
            Authorization::Emulator => return Ok("owner".to_string()),
            Authorization::ServiceAccount(key) => key,
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.value.clone());
            }
        }

        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: OAUTH_SCOPES,
            aud: &key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| IdentityError::Credentials(e.to_string()))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| IdentityError::Credentials(e.to_string()))?;

        let response = self
            .http
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Credentials(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        log::debug!("🔑 Identity provider access token refreshed");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });

        Ok(token.access_token)
    }

    async fn call<B, R>(&self, path: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let status = response.status();
        let raw = response.text().await.unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &raw))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, IdentityError> {
        let body = serde_json::json!({ "email": [email] });
        let response: LookupResponse = self.call("accounts:lookup", &body).await?;
        Ok(response.users.into_iter().next().map(IdentityRecord::from))
    }

    async fn create_user(&self, user: &NewIdentity) -> Result<IdentityRecord, IdentityError> {
        let body = CreateAccountBody {
            email: &user.email,
            password: &user.password,
            display_name: &user.display_name,
            email_verified: user.email_verified,
            disabled: user.disabled,
        };

        let response: SignUpResponse = self.call("accounts", &body).await?;

        Ok(IdentityRecord {
            uid: response.local_id,
            email: Some(user.email.clone()),
            display_name: Some(user.display_name.clone()),
            email_verified: user.email_verified,
            disabled: user.disabled,
        })
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        let body = serde_json::json!({ "localId": uid });
        let _: serde_json::Value = self
            .call("accounts:delete", &body)
            .await
            .map_err(|e| match e {
                IdentityError::Rejected { code, .. } if code == "USER_NOT_FOUND" => {
                    IdentityError::NotFound(uid.to_string())
                }
                other => other,
            })?;
        Ok(())
    }
}

/// Maps an Identity Toolkit error body to an `IdentityError`.
///
/// The API reports codes like `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn parse_error_body(status: u16, raw: &str) -> IdentityError {
    let message = match serde_json::from_str::<ApiErrorEnvelope>(raw) {
        Ok(envelope) => envelope.error.message,
        Err(_) => return IdentityError::Transport(format!("HTTP {}: {}", status, raw)),
    };

    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim().to_string(), Some(detail.trim().to_string())),
        None => (message.trim().to_string(), None),
    };

    let readable = match code.as_str() {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => {
            "The email address is already in use by another account.".to_string()
        }
        "INVALID_EMAIL" => "The email address is improperly formatted.".to_string(),
        "WEAK_PASSWORD" => detail
            .clone()
            .unwrap_or_else(|| "The password must be a string with at least 6 characters.".to_string()),
        "USER_NOT_FOUND" => {
            "There is no user record corresponding to the provided identifier.".to_string()
        }
        _ => detail.unwrap_or_else(|| code.clone()),
    };

    IdentityError::Rejected {
        code,
        message: readable,
    }
}
