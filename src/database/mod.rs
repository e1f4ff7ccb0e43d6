use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection, Database, IndexModel};
use thiserror::Error;

use crate::models::{StoredUser, UserRecord};

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Persistence for user records, keyed by identity uid.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_by_import_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;
    async fn find_by_year(&self, year: i32) -> Result<Vec<StoredUser>, StoreError>;
    /// Creates or replaces the record stored under `uid`.
    async fn set(&self, uid: &str, record: &UserRecord) -> Result<(), StoreError>;
    async fn delete(&self, uid: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, StoreError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(1);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        // Database name comes from the URI path
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| "lab_survey".to_string());

        let client = Client::with_options(client_options)?;

        let db = client.database(&db_name);

        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<mongodb::bson::Document>(USERS_COLLECTION);

        for field in ["id", "year"] {
            let index = IndexModel::builder().keys(doc! { field: 1 }).build();

            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: users({})", field),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// `UserStore` over the MongoDB "users" collection.
#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<StoredUser>,
}

impl MongoUserStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            users: db.collection::<StoredUser>(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, StoreError> {
        let found = self.users.find_one(doc! { "_id": uid }).await?;
        Ok(found.map(|stored| stored.record))
    }

    async fn find_by_import_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.find_one(doc! { "id": id }).await?)
    }

    async fn find_by_year(&self, year: i32) -> Result<Vec<StoredUser>, StoreError> {
        let cursor = self.users.find(doc! { "year": year }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set(&self, uid: &str, record: &UserRecord) -> Result<(), StoreError> {
        let stored = StoredUser {
            uid: uid.to_string(),
            record: record.clone(),
        };

        self.users
            .replace_one(doc! { "_id": uid }, &stored)
            .upsert(true)
            .await?;

        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<(), StoreError> {
        let result = self.users.delete_one(doc! { "_id": uid }).await?;

        if result.deleted_count == 0 {
            log::warn!("⚠️ No user record stored under {}", uid);
        }

        Ok(())
    }
}
