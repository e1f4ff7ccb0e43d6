use serde::{Deserialize, Serialize};

/// Account held by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub email_verified: bool,
    pub disabled: bool,
}
