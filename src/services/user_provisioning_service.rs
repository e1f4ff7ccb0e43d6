// ==================== USER PROVISIONING ====================
// Creates the login and the "users" document for one imported row

use std::sync::Arc;

use crate::{
    database::UserStore,
    models::{CreateUserResult, ImportUserRequest, NewIdentity, UserRecord},
    services::identity_service::IdentityProvider,
    utils::{
        crypto::{generate_password, PasswordCipher},
        error::AppError,
    },
};

pub struct UserProvisioner {
    identities: Arc<dyn IdentityProvider>,
    store: Arc<dyn UserStore>,
    cipher: PasswordCipher,
}

impl UserProvisioner {
    pub fn new(
        identities: Arc<dyn IdentityProvider>,
        store: Arc<dyn UserStore>,
        cipher: PasswordCipher,
    ) -> Self {
        Self {
            identities,
            store,
            cipher,
        }
    }

    pub async fn provision(&self, import: &ImportUserRequest) -> CreateUserResult {
        log::info!("📝 Provisioning user {} <{}>", import.id, import.email);

        // A failed cleanup must not block provisioning; createUser reports
        // the conflict if an identity is still there.
        if let Err(e) = self.remove_stale_identity(import).await {
            log::error!("❌ Stale identity cleanup failed for {}: {}", import.email, e);
        }

        match self.create_identity_and_record(import).await {
            Ok(uid) => {
                log::info!("✅ User {} provisioned as {}", import.email, uid);
                CreateUserResult::created(import)
            }
            Err(e) => {
                log::warn!("❌ Provisioning failed for {}: {}", import.email, e);
                CreateUserResult::failed(import, e.to_string(), failure_status(&e))
            }
        }
    }

    /// Deletes the identity registered under the import's email when neither
    /// the import id nor that identity's uid has a user record.
    async fn remove_stale_identity(&self, import: &ImportUserRequest) -> Result<(), AppError> {
        if self.store.find_by_import_id(&import.id).await?.is_some() {
            return Ok(());
        }

        let Some(identity) = self.identities.get_user_by_email(&import.email).await? else {
            return Ok(());
        };

        if identity.uid.is_empty() {
            log::warn!("⚠️ Identity for {} has no uid, skipping cleanup", import.email);
            return Ok(());
        }

        if self.store.get(&identity.uid).await?.is_some() {
            log::warn!(
                "⚠️ Identity {} for {} still backs a user record, keeping it",
                identity.uid,
                import.email
            );
            return Ok(());
        }

        log::info!("🧹 Removing stale identity {} for {}", identity.uid, import.email);
        self.identities.delete_user(&identity.uid).await?;

        Ok(())
    }

    async fn create_identity_and_record(&self, import: &ImportUserRequest) -> Result<String, AppError> {
        let password = generate_password();

        let identity = self
            .identities
            .create_user(&NewIdentity {
                email: import.email.clone(),
                password: password.clone(),
                display_name: import.name.clone(),
                email_verified: true,
                disabled: false,
            })
            .await?;

        if let Err(e) = self.persist_record(&identity.uid, import, &password).await {
            // Leave no identity behind without its record
            if let Err(rollback) = self.identities.delete_user(&identity.uid).await {
                log::error!(
                    "❌ Could not remove identity {} after failed save: {}",
                    identity.uid,
                    rollback
                );
            }
            return Err(e);
        }

        Ok(identity.uid)
    }

    async fn persist_record(
        &self,
        uid: &str,
        import: &ImportUserRequest,
        password: &str,
    ) -> Result<(), AppError> {
        let encrypted = self.cipher.encrypt(password)?;
        let record = UserRecord::from_import(import, encrypted);
        self.store.set(uid, &record).await?;
        Ok(())
    }
}

/// Identity provider failures are the caller's problem (400); anything after
/// the identity exists is ours (500).
fn failure_status(err: &AppError) -> u16 {
    match err {
        AppError::Identity(_) => 400,
        _ => 500,
    }
}
