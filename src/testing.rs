//! In-memory collaborators for handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::database::{StoreError, UserStore};
use crate::models::{IdentityRecord, ImportUserRequest, NewIdentity, OutgoingMail, StoredUser, UserRecord};
use crate::services::identity_service::{IdentityError, IdentityProvider};
use crate::services::mail_service::{MailError, Mailer};
use crate::utils::crypto::PasswordCipher;

pub const TEST_KEY: &str = "8f2b1c9d4e7a6b3c5d0e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e";

pub fn test_cipher() -> PasswordCipher {
    PasswordCipher::from_hex_key(TEST_KEY).unwrap()
}

pub fn sample_import(id: &str, email: &str, year: i32) -> ImportUserRequest {
    ImportUserRequest {
        id: id.to_string(),
        name: "同志社 太郎".to_string(),
        rank: 3,
        group: "A".to_string(),
        email: email.to_string(),
        status: 0,
        is_active: true,
        is_point_assigned: false,
        is_graduate: false,
        point: 100,
        year,
    }
}

// ==================== IDENTITY PROVIDER ====================

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<Vec<(IdentityRecord, String)>>,
    deleted: Mutex<Vec<String>>,
    delete_attempts: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    next_uid: AtomicUsize,
    email_lookups: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_creates: AtomicBool,
    create_failure: Mutex<Option<IdentityError>>,
    deletes_in_flight: AtomicUsize,
    max_deletes_in_flight: AtomicUsize,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, uid: &str, email: &str) -> IdentityRecord {
        let record = IdentityRecord {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            display_name: None,
            email_verified: true,
            disabled: false,
        };
        self.seed_record(record.clone());
        record
    }

    pub fn seed_record(&self, record: IdentityRecord) {
        self.accounts.lock().unwrap().push((record, String::new()));
    }

    /// Current accounts with the plain password each was created with.
    pub fn accounts(&self) -> Vec<(IdentityRecord, String)> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }

    /// Highest number of `delete_user` calls that were suspended at once.
    pub fn max_deletes_in_flight(&self) -> usize {
        self.max_deletes_in_flight.load(Ordering::SeqCst)
    }

    pub fn email_lookups(&self) -> usize {
        self.email_lookups.load(Ordering::SeqCst)
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    /// Makes every `create_user` call fail with `err`.
    pub fn fail_creates_with(&self, err: IdentityError) {
        *self.create_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_delete_for(&self, uid: &str) {
        self.failing_deletes.lock().unwrap().insert(uid.to_string());
    }

    fn email_exists() -> IdentityError {
        IdentityError::Rejected {
            code: "EMAIL_EXISTS".to_string(),
            message: "The email address is already in use by another account.".to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, IdentityError> {
        self.email_lookups.fetch_add(1, Ordering::SeqCst);

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(IdentityError::Transport("simulated lookup failure".to_string()));
        }

        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(record, _)| record.email.as_deref() == Some(email))
            .map(|(record, _)| record.clone()))
    }

    async fn create_user(&self, user: &NewIdentity) -> Result<IdentityRecord, IdentityError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Self::email_exists());
        }

        if let Some(err) = self.create_failure.lock().unwrap().as_ref() {
            return Err(clone_identity_error(err));
        }

        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .iter()
            .any(|(record, _)| record.email.as_deref() == Some(user.email.as_str()))
        {
            return Err(Self::email_exists());
        }

        let uid = format!("uid-{}", self.next_uid.fetch_add(1, Ordering::SeqCst) + 1);
        let record = IdentityRecord {
            uid,
            email: Some(user.email.clone()),
            display_name: Some(user.display_name.clone()),
            email_verified: user.email_verified,
            disabled: user.disabled,
        };
        accounts.push((record.clone(), user.password.clone()));

        Ok(record)
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        self.delete_attempts.lock().unwrap().push(uid.to_string());

        let in_flight = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_deletes_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_deletes.lock().unwrap().contains(uid) {
            return Err(IdentityError::Transport("simulated delete failure".to_string()));
        }

        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|(record, _)| record.uid != uid);

        if accounts.len() == before {
            return Err(IdentityError::NotFound(uid.to_string()));
        }

        self.deleted.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

fn clone_identity_error(err: &IdentityError) -> IdentityError {
    match err {
        IdentityError::Rejected { code, message } => IdentityError::Rejected {
            code: code.clone(),
            message: message.clone(),
        },
        IdentityError::NotFound(uid) => IdentityError::NotFound(uid.clone()),
        IdentityError::Transport(msg) => IdentityError::Transport(msg.clone()),
        IdentityError::Credentials(msg) => IdentityError::Credentials(msg.clone()),
    }
}

// ==================== USER STORE ====================

#[derive(Default)]
pub struct InMemoryUserStore {
    records: Mutex<HashMap<String, UserRecord>>,
    deleted: Mutex<Vec<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uid: &str, record: UserRecord) {
        self.records.lock().unwrap().insert(uid.to_string(), record);
    }

    pub fn record(&self, uid: &str) -> Option<UserRecord> {
        self.records.lock().unwrap().get(uid).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check_reads()?;
        Ok(self.record(uid))
    }

    async fn find_by_import_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        self.check_reads()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|(_, record)| record.id == id)
            .map(|(uid, record)| StoredUser {
                uid: uid.clone(),
                record: record.clone(),
            }))
    }

    async fn find_by_year(&self, year: i32) -> Result<Vec<StoredUser>, StoreError> {
        self.check_reads()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, record)| record.year == year)
            .map(|(uid, record)| StoredUser {
                uid: uid.clone(),
                record: record.clone(),
            })
            .collect())
    }

    async fn set(&self, uid: &str, record: &UserRecord) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        self.insert(uid, record.clone());
        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        self.records.lock().unwrap().remove(uid);
        self.deleted.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

// ==================== MAILER ====================

/// Records sent mail; can be told to fail on the n-th send (1-based).
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    attempts: AtomicUsize,
    fail_on: Option<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on: Some(attempt),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_on == Some(attempt) {
            return Err(MailError::Transport("simulated relay failure".to_string()));
        }

        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

// ==================== CONFIG ====================

pub fn test_config() -> crate::config::AppConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("DATABASE_URL", "mongodb://localhost:27017/lab_survey_test".to_string()),
        ("MAIL_USERNAME", "survey@example.com".to_string()),
        ("MAIL_PASSWORD", "app-password".to_string()),
        ("ADMIN_EMAIL", "admin@example.com".to_string()),
        ("ENCRYPTION_KEY", TEST_KEY.to_string()),
        ("FIREBASE_PROJECT_ID", "lab-survey-test".to_string()),
        ("FIREBASE_AUTH_EMULATOR_HOST", "127.0.0.1:9099".to_string()),
    ]);

    crate::config::AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}
