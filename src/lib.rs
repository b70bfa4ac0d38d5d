// src/lib.rs

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// Re-export modules
pub mod config;
pub mod ledger;
pub mod mcp;
pub mod store;
pub mod utils;

use ledger::client::LedgerClient;
use mcp::registry::SessionRegistry;
use store::ProfileStore;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Capability provider for the ledger: interface lookup, simulation,
    /// relay submission
    pub ledger: Arc<dyn LedgerClient>,
    /// Per-user store: tracked contracts and wallet records
    pub store: Arc<Mutex<ProfileStore>>,
    /// Per-user tool registries, built at session initialization and
    /// read-only between rebuilds
    pub sessions: Arc<RwLock<HashMap<String, SessionRegistry>>>,
}
