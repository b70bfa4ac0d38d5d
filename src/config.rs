// src/config.rs

use anyhow::{Context, Result};
use secrecy::Secret;
use std::env;

/// Process-wide signing credential used to co-sign deployments. Loaded once
/// at startup from the environment; the secret is never logged.
#[derive(Clone, Debug)]
pub struct DeployerCredential {
    /// The service account address on the ledger.
    pub account: String,
    /// Hex-encoded k256 signing key.
    pub secret: Secret<String>,
}

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // Ledger settings
    /// JSON-RPC endpoint of the ledger node (interface lookup + simulation).
    pub ledger_rpc_url: String,
    /// Relay endpoint that accepts fully authorized transactions.
    pub relay_url: String,

    // Session settings
    /// Stable user identifier supplied by the upstream identity layer.
    /// Used for stdio sessions and as the HTTP fallback when no
    /// `x-user-id` header is present.
    pub default_user_id: String,

    // Signing settings
    /// Co-signer for deployments; its account also attributes read-only
    /// simulations for users without a wallet.
    pub deployer: DeployerCredential,

    // Store settings
    pub store_path: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let ledger_rpc_url =
            env::var("LEDGER_RPC_URL").context("LEDGER_RPC_URL must be set to the ledger JSON-RPC endpoint")?;
        let relay_url =
            env::var("RELAY_URL").context("RELAY_URL must be set to the transaction relay endpoint")?;

        let deployer = DeployerCredential {
            account: env::var("SERVICE_ACCOUNT")
                .context("SERVICE_ACCOUNT must be set to the service signing account address")?,
            secret: Secret::new(
                env::var("DEPLOYER_SECRET")
                    .context("DEPLOYER_SECRET must be set to the hex-encoded service signing key")?,
            ),
        };

        let store_path = env::var("PROFILE_STORE_PATH").ok().or_else(|| {
            dirs::home_dir().map(|mut path| {
                path.push(".ledger-mcp");
                path.push("profiles.json");
                path.to_string_lossy().to_string()
            })
        });

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            ledger_rpc_url,
            relay_url,
            default_user_id: env::var("MCP_USER_ID").unwrap_or_else(|_| "local".to_string()),
            deployer,
            store_path,
        })
    }
}
