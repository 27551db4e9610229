use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored API credential with rotation metadata
///
/// Records are owned by the credential store and mutated only through
/// explicit success/failure reporting. Inactive records are never selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique id of this credential
    pub id: String,
    /// Owner this credential belongs to
    pub owner_id: String,
    /// API key (or OAuth bearer token for token-authenticated surfaces)
    pub api_key: String,
    /// API secret used for request signing
    pub secret: String,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Higher priority keys are preferred
    #[serde(default)]
    pub priority: i32,
    /// Inactive records are excluded from rotation
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Consecutive failures since the last success
    #[serde(default)]
    pub fail_count: u32,
    /// Last time this credential was used for a network attempt
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Last time a request with this credential succeeded
    #[serde(default)]
    pub last_success_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl CredentialRecord {
    /// Create an active record with default priority
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            api_key: api_key.into(),
            secret: secret.into(),
            label: String::new(),
            priority: 0,
            is_active: true,
            fail_count: 0,
            last_attempt_at: None,
            last_success_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
