use crate::store::CredentialStore;
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Credential material handed out by the vault
#[derive(Debug, Clone)]
pub struct SelectedKey {
    pub key_id: String,
    pub api_key: String,
    pub secret: String,
}

/// Process-local rotation bookkeeping, never persisted
#[derive(Debug, Default)]
struct RotationState {
    last_failed: Option<String>,
    used_in_cycle: HashSet<String>,
}

/// Rotation policy over a credential store
///
/// One vault instance per process, injected by reference into callers.
/// Selection skips the last failed key and everything already used in the
/// current cycle; when the cycle exhausts, the state resets and rotation
/// starts over from the most preferred key. An owner with N active keys
/// therefore sees at most N consecutive skips before every key is retried.
pub struct KeyVault {
    store: Arc<dyn CredentialStore>,
    rotation: Mutex<RotationState>,
}

impl KeyVault {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            rotation: Mutex::new(RotationState::default()),
        }
    }

    /// Select the next usable credential for an owner
    ///
    /// Returns `None` only when the owner has no active credentials at all;
    /// callers must fail the outer request in that case rather than proceed
    /// unauthenticated.
    pub async fn next_key(&self, owner_id: &str) -> Result<Option<SelectedKey>> {
        let actives = self.store.list_active(owner_id).await?;

        if actives.is_empty() {
            warn!("No active credentials for owner {}", owner_id);
            return Ok(None);
        }

        let mut rotation = self.rotation.lock();

        let picked = actives.iter().find(|record| {
            rotation.last_failed.as_deref() != Some(record.id.as_str())
                && !rotation.used_in_cycle.contains(&record.id)
        });

        let selected = match picked {
            Some(record) => record,
            None => {
                // Cycle exhausted: reset and start over from the top of the
                // preference order
                debug!(
                    "Rotation cycle exhausted for owner {} ({} keys), resetting",
                    owner_id,
                    actives.len()
                );
                rotation.used_in_cycle.clear();
                rotation.last_failed = None;
                &actives[0]
            }
        };

        rotation.used_in_cycle.insert(selected.id.clone());

        debug!(
            "Selected credential {} for owner {} ({} used this cycle)",
            selected.id,
            owner_id,
            rotation.used_in_cycle.len()
        );

        Ok(Some(SelectedKey {
            key_id: selected.id.clone(),
            api_key: selected.api_key.clone(),
            secret: selected.secret.clone(),
        }))
    }

    /// Report the outcome of a network attempt made with a credential
    ///
    /// Must be called exactly once per attempt that reached the network.
    /// Success resets the stored fail count and makes the key immediately
    /// eligible again; failure marks it to be skipped on the next selection.
    pub async fn update_key_status(&self, key_id: &str, success: bool) -> Result<()> {
        {
            let mut rotation = self.rotation.lock();
            if success {
                rotation.used_in_cycle.remove(key_id);
                if rotation.last_failed.as_deref() == Some(key_id) {
                    rotation.last_failed = None;
                }
            } else {
                rotation.last_failed = Some(key_id.to_string());
            }
        }

        if success {
            debug!("Credential {} succeeded", key_id);
            self.store.record_success(key_id).await
        } else {
            warn!("Credential {} failed", key_id);
            self.store.record_failure(key_id).await
        }
    }
}
