// ==================== USER CLEANUP ====================
// Removes every user of one year (identity + document)

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::{
    database::UserStore,
    models::{DeleteUsersResult, StoredUser},
    services::identity_service::{IdentityError, IdentityProvider},
    utils::error::AppError,
};

/// Upper bound on users being deleted at the same time.
const MAX_CONCURRENT_DELETES: usize = 8;

pub struct UserCleaner {
    identities: Arc<dyn IdentityProvider>,
    store: Arc<dyn UserStore>,
}

impl UserCleaner {
    pub fn new(identities: Arc<dyn IdentityProvider>, store: Arc<dyn UserStore>) -> Self {
        Self { identities, store }
    }

    /// Deletes every user of `year`. Each user is removed independently and
    /// all removals finish before this returns; failures are only logged.
    pub async fn delete_by_year(&self, year: i32) -> DeleteUsersResult {
        log::info!("🗑️ Deleting users for year {}", year);

        let users = match self.store.find_by_year(year).await {
            Ok(users) => users,
            Err(e) => {
                log::error!("❌ Failed to query users for year {}: {}", year, e);
                return DeleteUsersResult { year };
            }
        };

        let outcomes: Vec<Result<(), AppError>> = stream::iter(users.iter())
            .map(|user| self.delete_user(user))
            .buffer_unordered(MAX_CONCURRENT_DELETES)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        log::info!(
            "🎉 Year {}: {} users deleted, {} failed",
            year,
            outcomes.len() - failed,
            failed
        );

        DeleteUsersResult { year }
    }

    async fn delete_user(&self, user: &StoredUser) -> Result<(), AppError> {
        let result = self.remove_identity_then_record(&user.uid).await;

        if let Err(e) = &result {
            log::error!("❌ Failed to delete user {} ({}): {}", user.uid, user.record.email, e);
        }

        result
    }

    async fn remove_identity_then_record(&self, uid: &str) -> Result<(), AppError> {
        match self.identities.delete_user(uid).await {
            Ok(()) => {}
            Err(IdentityError::NotFound(_)) => {
                log::warn!("⚠️ Identity {} already removed, deleting record only", uid);
            }
            Err(e) => return Err(e.into()),
        }

        self.store.delete(uid).await?;
        Ok(())
    }
}
