use serde::{Deserialize, Deserializer, Serialize};

/// Row of the imported student list, as sent by the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportUserRequest {
    #[serde(deserialize_with = "deserialize_import_id")]
    pub id: String,
    pub name: String,
    pub rank: i32,
    pub group: String,
    pub email: String,
    pub status: i32,
    pub is_active: bool,
    pub is_point_assigned: bool,
    pub is_graduate: bool,
    pub point: i32,
    pub year: i32,
}

/// Document stored in the "users" collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(deserialize_with = "deserialize_import_id")]
    pub id: String,
    pub name: String,
    pub rank: i32,
    pub group: String,
    pub email: String,
    /// Encrypted with `PasswordCipher`, never the plain password.
    pub password: String,
    pub status: i32,
    pub is_active: bool,
    pub is_point_assigned: bool,
    pub is_graduate: bool,
    pub point: i32,
    pub year: i32,
}

impl UserRecord {
    pub fn from_import(import: &ImportUserRequest, encrypted_password: String) -> Self {
        Self {
            id: import.id.clone(),
            name: import.name.clone(),
            rank: import.rank,
            group: import.group.clone(),
            email: import.email.clone(),
            password: encrypted_password,
            status: import.status,
            is_active: import.is_active,
            is_point_assigned: import.is_point_assigned,
            is_graduate: import.is_graduate,
            point: import.point,
            year: import.year,
        }
    }
}

/// A user record together with the identity uid it is keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(rename = "_id")]
    pub uid: String,
    #[serde(flatten)]
    pub record: UserRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResult {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    pub status_code: u16,
}

impl CreateUserResult {
    pub fn created(import: &ImportUserRequest) -> Self {
        Self {
            email: import.email.clone(),
            name: import.name.clone(),
            message: None,
            status_code: 200,
        }
    }

    pub fn failed(import: &ImportUserRequest, message: String, status_code: u16) -> Self {
        Self {
            email: import.email.clone(),
            name: import.name.clone(),
            message: Some(message),
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteUsersResult {
    pub year: i32,
}

/// Spreadsheet imports send student numbers either as text or as numbers.
fn deserialize_import_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(s) => Ok(s),
        RawId::Number(n) => Ok(n.to_string()),
    }
}
