//! Per-user persistent store: tracked contracts and wallet records.
//!
//! One JSON file keyed by user identifier, written atomically via a temp
//! file. Every read goes to the in-memory state guarded by the caller's
//! mutex; nothing is cached elsewhere.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A contract the user asked the bridge to expose as tools.
/// Unique per `(user, address)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedContract {
    pub name: String,
    pub address: String,
    pub added_at: DateTime<Utc>,
}

/// The user's signing identity. One per user, created lazily on the first
/// `set_wallet` call and never updated for a given address afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: String,
    /// Hex-encoded k256 signing key, generated locally. Never returned to
    /// callers; only the router reads it.
    pub signing_secret: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserProfile {
    #[serde(default)]
    contracts: Vec<TrackedContract>,
    #[serde(default)]
    wallet: Option<WalletRecord>,
}

/// File-backed store for all users of this server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStore {
    users: HashMap<String, UserProfile>,
    storage_path: PathBuf,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileStore {
    pub fn new(storage_path: PathBuf) -> Self {
        if let Some(parent) = storage_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            users: HashMap::new(),
            storage_path,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Load an existing store file, or start a fresh one if none exists.
    pub fn load_or_create(file_path: &Path) -> Result<Self> {
        if file_path.exists() {
            let content = std::fs::read_to_string(file_path)
                .context("Failed to read profile store file")?;
            let store: ProfileStore =
                serde_json::from_str(&content).context("Failed to parse profile store")?;
            Ok(store)
        } else {
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create profile store directory")?;
            }
            let mut store = Self::new(file_path.to_path_buf());
            store.save().context("Failed to save new profile store")?;
            Ok(store)
        }
    }

    /// Ordered list of the user's tracked contracts.
    pub fn tracked_contracts(&self, user_id: &str) -> Vec<TrackedContract> {
        self.users
            .get(user_id)
            .map(|p| p.contracts.clone())
            .unwrap_or_default()
    }

    /// Insert-if-absent on `(user, address)`. Returns false when the
    /// contract was already tracked; the list is left unchanged.
    pub fn add_tracked_contract(
        &mut self,
        user_id: &str,
        name: &str,
        address: &str,
    ) -> Result<bool> {
        let profile = self.users.entry(user_id.to_string()).or_default();
        if profile.contracts.iter().any(|c| c.address == address) {
            return Ok(false);
        }
        profile.contracts.push(TrackedContract {
            name: name.to_string(),
            address: address.to_string(),
            added_at: Utc::now(),
        });
        self.save()?;
        Ok(true)
    }

    /// Remove a tracked contract. Returns false when nothing matched.
    pub fn remove_tracked_contract(&mut self, user_id: &str, address: &str) -> Result<bool> {
        let Some(profile) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        let before = profile.contracts.len();
        profile.contracts.retain(|c| c.address != address);
        if profile.contracts.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Insert-if-absent wallet creation. A fresh signing secret is generated
    /// locally; re-setting a user that already has a record is a no-op and
    /// returns the existing record.
    pub fn set_wallet(&mut self, user_id: &str, address: &str) -> Result<WalletRecord> {
        let profile = self.users.entry(user_id.to_string()).or_default();
        if let Some(existing) = &profile.wallet {
            return Ok(existing.clone());
        }
        let secret = SigningKey::random(&mut OsRng);
        let record = WalletRecord {
            address: address.to_string(),
            signing_secret: hex::encode(secret.to_bytes()),
            created_at: Utc::now(),
        };
        profile.wallet = Some(record.clone());
        self.save()?;
        Ok(record)
    }

    pub fn wallet(&self, user_id: &str) -> Option<WalletRecord> {
        self.users.get(user_id).and_then(|p| p.wallet.clone())
    }

    /// Persist to disk through a temp file so a crash mid-write cannot
    /// corrupt the store.
    pub fn save(&mut self) -> Result<()> {
        self.updated_at = Utc::now();
        let temp_path = self.storage_path.with_extension("tmp");
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize profile store")?;
        std::fs::write(&temp_path, content).context("Failed to write profile store file")?;
        std::fs::rename(&temp_path, &self.storage_path)
            .or_else(|_| {
                std::fs::copy(&temp_path, &self.storage_path)?;
                std::fs::remove_file(&temp_path)?;
                Ok::<(), std::io::Error>(())
            })
            .context("Failed to finalize profile store file")?;
        Ok(())
    }
}

/// Default store location under the platform data directory.
pub fn default_store_path() -> Result<PathBuf> {
    let mut path = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    path.push("ledger-mcp");
    std::fs::create_dir_all(&path).context("Failed to create ledger-mcp directory")?;
    path.push("profiles.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        (dir, store)
    }

    #[test]
    fn add_then_list_returns_single_entry() {
        let (_dir, mut store) = store();
        assert!(store.add_tracked_contract("u1", "Token", "CAAA").unwrap());

        let listed = store.tracked_contracts("u1");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Token");
        assert_eq!(listed[0].address, "CAAA");
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let (_dir, mut store) = store();
        assert!(store.add_tracked_contract("u1", "Token", "CAAA").unwrap());
        assert!(!store.add_tracked_contract("u1", "Token", "CAAA").unwrap());
        assert_eq!(store.tracked_contracts("u1").len(), 1);
    }

    #[test]
    fn contracts_are_scoped_per_user() {
        let (_dir, mut store) = store();
        store.add_tracked_contract("u1", "Token", "CAAA").unwrap();
        store.add_tracked_contract("u2", "Vault", "CBBB").unwrap();

        assert_eq!(store.tracked_contracts("u1").len(), 1);
        assert_eq!(store.tracked_contracts("u2")[0].address, "CBBB");
        assert!(store.tracked_contracts("u3").is_empty());
    }

    #[test]
    fn remove_deletes_only_the_matching_address() {
        let (_dir, mut store) = store();
        store.add_tracked_contract("u1", "Token", "CAAA").unwrap();
        store.add_tracked_contract("u1", "Vault", "CBBB").unwrap();

        assert!(store.remove_tracked_contract("u1", "CAAA").unwrap());
        assert!(!store.remove_tracked_contract("u1", "CAAA").unwrap());
        let left = store.tracked_contracts("u1");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].address, "CBBB");
    }

    #[test]
    fn set_wallet_generates_a_secret_and_is_insert_if_absent() {
        let (_dir, mut store) = store();
        assert!(store.wallet("u1").is_none());

        let first = store.set_wallet("u1", "GUSER").unwrap();
        assert_eq!(first.address, "GUSER");
        assert_eq!(first.signing_secret.len(), 64); // 32 bytes hex

        // Re-setting is a no-op, even with a different address.
        let second = store.set_wallet("u1", "GOTHER").unwrap();
        assert_eq!(second.address, "GUSER");
        assert_eq!(second.signing_secret, first.signing_secret);
    }

    #[test]
    fn store_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let mut store = ProfileStore::load_or_create(&path).unwrap();
        store.add_tracked_contract("u1", "Token", "CAAA").unwrap();
        store.set_wallet("u1", "GUSER").unwrap();

        let reloaded = ProfileStore::load_or_create(&path).unwrap();
        assert_eq!(reloaded.tracked_contracts("u1").len(), 1);
        assert_eq!(reloaded.wallet("u1").unwrap().address, "GUSER");
    }
}
