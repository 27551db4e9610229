use crate::error::VaultError;
use crate::record::CredentialRecord;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Persistence interface for credential records
///
/// The vault never touches persistence directly; it drives rotation off
/// whatever this trait returns. `list_active` must return only active
/// records, pre-sorted by selection preference: priority descending, then
/// fewer failures, then more recent success, then newer creation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active credentials for an owner in selection order
    async fn list_active(&self, owner_id: &str) -> Result<Vec<CredentialRecord>>;

    /// Reset fail count and stamp a success on the record
    async fn record_success(&self, id: &str) -> Result<()>;

    /// Increment fail count and stamp the attempt on the record
    async fn record_failure(&self, id: &str) -> Result<()>;

    /// Add a new credential record
    async fn insert(&self, record: CredentialRecord) -> Result<()>;

    /// Remove a credential record
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory credential store
///
/// Backs the vault in tests and in single-process deployments where
/// credentials are seeded from the environment at startup.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of a single record, mainly for assertions in tests
    pub fn get(&self, id: &str) -> Option<CredentialRecord> {
        self.records.read().get(id).cloned()
    }

    /// Number of stored records across all owners
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Sort records by selection preference
pub(crate) fn sort_by_preference(records: &mut [CredentialRecord]) {
    records.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.fail_count.cmp(&b.fail_count))
            .then(b.last_success_at.cmp(&a.last_success_at))
            .then(b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn list_active(&self, owner_id: &str) -> Result<Vec<CredentialRecord>> {
        let records = self.records.read();
        let mut active: Vec<CredentialRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id && r.is_active)
            .cloned()
            .collect();
        sort_by_preference(&mut active);
        Ok(active)
    }

    async fn record_success(&self, id: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| VaultError::UnknownCredential(id.to_string()))?;
        let now = Utc::now();
        record.fail_count = 0;
        record.last_success_at = Some(now);
        record.last_attempt_at = Some(now);
        Ok(())
    }

    async fn record_failure(&self, id: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| VaultError::UnknownCredential(id.to_string()))?;
        record.fail_count += 1;
        record.last_attempt_at = Some(Utc::now());
        Ok(())
    }

    async fn insert(&self, record: CredentialRecord) -> Result<()> {
        if record.id.is_empty() || record.owner_id.is_empty() {
            return Err(VaultError::InvalidRecord(
                "id and owner_id are required".to_string(),
            ));
        }
        if record.api_key.is_empty() {
            return Err(VaultError::InvalidRecord(
                "api_key is required".to_string(),
            ));
        }
        self.records.write().insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| VaultError::UnknownCredential(id.to_string()))
    }
}
