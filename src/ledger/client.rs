// src/ledger/client.rs
//
// The ledger capability surface the pipeline consumes: interface lookup,
// simulation, and relay submission. Everything network-bound sits behind
// `LedgerClient` so tests can substitute a scripted implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::ledger::models::{
    BridgeError, Operation, SignedTransaction, SimulationResult, SubmitOutcome,
};

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch the published interface blob for a contract. Fails with
    /// `DescriptorFetch` when the ledger cannot locate the contract's code.
    async fn fetch_contract_interface(&self, contract_id: &str) -> Result<String, BridgeError>;

    /// Run an operation against current ledger state without committing it.
    async fn simulate(&self, operation: &Operation) -> Result<SimulationResult, BridgeError>;

    /// Submit a fully authorized transaction through the relay service.
    /// The relay owns retries; the outcome is propagated verbatim.
    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitOutcome, BridgeError>;
}

/// JSON-RPC implementation speaking to a ledger node, with submissions routed
/// through the configured relay endpoint.
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: Client,
    rpc_url: String,
    relay_url: String,
}

impl HttpLedgerClient {
    pub fn new(rpc_url: &str, relay_url: &str) -> Self {
        Self {
            http: Client::new(),
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            relay_url: relay_url.trim_end_matches('/').to_string(),
        }
    }

    /// One JSON-RPC round trip. Transport failures and RPC-level `error`
    /// members both surface as the string the caller maps into its domain
    /// error.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });
        debug!("ledger rpc call: {}", method);
        let resp = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("rpc transport error: {}", e))?;
        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| format!("rpc returned non-JSON ({}): {}", status, e))?;
        if let Some(err) = payload.get("error") {
            return Err(format!("rpc error: {}", err));
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| "rpc response missing 'result'".to_string())
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn fetch_contract_interface(&self, contract_id: &str) -> Result<String, BridgeError> {
        let result = self
            .rpc_call("getContractInterface", json!({ "contractId": contract_id }))
            .await
            .map_err(|reason| BridgeError::DescriptorFetch {
                contract_id: contract_id.to_string(),
                reason,
            })?;
        result
            .get("interface")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| BridgeError::DescriptorFetch {
                contract_id: contract_id.to_string(),
                reason: "response missing 'interface'".to_string(),
            })
    }

    async fn simulate(&self, operation: &Operation) -> Result<SimulationResult, BridgeError> {
        let result = self
            .rpc_call("simulateOperation", json!({ "operation": operation }))
            .await
            .map_err(|message| BridgeError::Simulation {
                message,
                diagnostic: None,
            })?;
        // A structurally valid response with a contract-side failure carries
        // the ledger diagnostic; surface it rather than a decoded result.
        if let Some(diag) = result.get("error") {
            return Err(BridgeError::Simulation {
                message: diag
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("contract-side failure")
                    .to_string(),
                diagnostic: Some(diag.clone()),
            });
        }
        serde_json::from_value(result).map_err(|e| BridgeError::Simulation {
            message: format!("malformed simulation response: {}", e),
            diagnostic: None,
        })
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmitOutcome, BridgeError> {
        let resp = self
            .http
            .post(&self.relay_url)
            .json(tx)
            .send()
            .await
            .map_err(|e| BridgeError::Submission(format!("relay transport error: {}", e)))?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(BridgeError::Submission(format!(
                "relay error {}: {}",
                status.as_u16(),
                body
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| BridgeError::Submission(format!("malformed relay response: {}", e)))
    }
}
