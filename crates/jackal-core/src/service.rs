use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Receipt returned by the service after provisioning storage for an account.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProvisionReceipt {
    pub jackal_address: String,
    pub tx_hash: String,
}

/// Receipt returned by the service after a save. Quota fields are optional;
/// the service includes them only when accounting is enabled.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SaveReceipt {
    pub key: String,
    pub cid: String,
    #[serde(default)]
    pub bytes_used: Option<u64>,
    #[serde(default)]
    pub quota_bytes: Option<u64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Service-reported storage accounting, surfaced verbatim.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UsageReport {
    pub bytes_used: u64,
    pub quota_bytes: u64,
    pub percent_used: f64,
}

/// Contract for the remote Jackal Memory service. Content is an opaque string:
/// a base64 envelope when encryption is active, raw text otherwise. The client
/// never interprets the content identifier the service returns.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Provision backing storage for a Jackal address.
    async fn provision(&self, jackal_address: &str) -> Result<ProvisionReceipt, MemoryError>;

    /// Store content under a caller-chosen key, overwriting any existing entry.
    async fn save(&self, key: &str, content: &str) -> Result<SaveReceipt, MemoryError>;

    /// Fetch the content stored under a key.
    async fn load(&self, key: &str) -> Result<String, MemoryError>;

    /// Fetch account-level storage accounting.
    async fn usage(&self) -> Result<UsageReport, MemoryError>;
}

/// In-memory service double for deterministic tests. Assigns sequential fake
/// content identifiers and tracks byte usage against a fixed quota.
#[derive(Debug, Clone)]
pub struct InMemoryMemoryService {
    inner: Arc<Mutex<ServiceState>>,
    quota_bytes: u64,
}

#[derive(Debug, Default)]
struct ServiceState {
    records: HashMap<String, String>,
    next_cid: u64,
}

impl InMemoryMemoryService {
    pub fn new() -> Self {
        Self::with_quota(1024 * 1024)
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ServiceState::default())),
            quota_bytes,
        }
    }

    /// Seed a record directly, bypassing the client. Used by tests to model
    /// content stored before encryption existed.
    pub fn seed(&self, key: &str, content: &str) {
        let mut state = self.inner.lock().expect("service state lock");
        state.records.insert(key.to_string(), content.to_string());
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ServiceState>, MemoryError> {
        self.inner
            .lock()
            .map_err(|err| MemoryError::transport(None, format!("lock poisoned: {err}")))
    }

    fn bytes_used(state: &ServiceState) -> u64 {
        state.records.values().map(|c| c.len() as u64).sum()
    }
}

impl Default for InMemoryMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryService for InMemoryMemoryService {
    async fn provision(&self, jackal_address: &str) -> Result<ProvisionReceipt, MemoryError> {
        Ok(ProvisionReceipt {
            jackal_address: jackal_address.to_string(),
            tx_hash: "0xfake".to_string(),
        })
    }

    async fn save(&self, key: &str, content: &str) -> Result<SaveReceipt, MemoryError> {
        let mut state = self.lock()?;
        state.records.insert(key.to_string(), content.to_string());
        state.next_cid += 1;
        let cid = format!("bafy-test-{}", state.next_cid);
        let bytes_used = Self::bytes_used(&state);
        Ok(SaveReceipt {
            key: key.to_string(),
            cid,
            bytes_used: Some(bytes_used),
            quota_bytes: Some(self.quota_bytes),
            warnings: Vec::new(),
        })
    }

    async fn load(&self, key: &str) -> Result<String, MemoryError> {
        let state = self.lock()?;
        state
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| MemoryError::NotFound {
                key: key.to_string(),
            })
    }

    async fn usage(&self) -> Result<UsageReport, MemoryError> {
        let state = self.lock()?;
        let bytes_used = Self::bytes_used(&state);
        Ok(UsageReport {
            bytes_used,
            quota_bytes: self.quota_bytes,
            percent_used: bytes_used as f64 / self.quota_bytes as f64 * 100.0,
        })
    }
}
