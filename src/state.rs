use std::sync::Arc;

use crate::{
    config::AppConfig,
    database::UserStore,
    services::{
        identity_service::IdentityProvider, inquiry_service::InquiryNotifier, mail_service::Mailer,
        user_cleanup_service::UserCleaner, user_provisioning_service::UserProvisioner,
    },
    utils::{crypto::PasswordCipher, error::AppError},
};

/// Handlers shared by every actix worker.
pub struct AppState {
    pub inquiries: InquiryNotifier,
    pub provisioner: UserProvisioner,
    pub cleaner: UserCleaner,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        mailer: Arc<dyn Mailer>,
        identities: Arc<dyn IdentityProvider>,
        store: Arc<dyn UserStore>,
    ) -> Result<Self, AppError> {
        let cipher = PasswordCipher::from_hex_key(&config.encryption_key)?;

        Ok(Self {
            inquiries: InquiryNotifier::new(
                mailer,
                config.mail.username.clone(),
                config.mail.admin_email.clone(),
            ),
            provisioner: UserProvisioner::new(identities.clone(), store.clone(), cipher),
            cleaner: UserCleaner::new(identities, store),
        })
    }
}
