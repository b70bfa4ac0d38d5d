// src/mcp/registry.rs
//
// The session tool registry: built-in registry/wallet/deploy tools plus the
// per-contract tools synthesized at session initialization. Rebuilt by
// `initialize` and `refresh_tools`; read-only in between.

use serde_json::{json, Value};
use tracing::warn;

use crate::ledger::client::LedgerClient;
use crate::ledger::descriptor::decode_interface;
use crate::ledger::synthesizer::{synthesize_tools, SynthesizedTool};
use crate::store::TrackedContract;

/// Tools synthesized for one user's tracked contracts.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    tools: Vec<SynthesizedTool>,
}

impl SessionRegistry {
    /// Fetch, decode, and synthesize tools for every tracked contract.
    ///
    /// One broken contract never blocks the rest: fetch and decode failures
    /// are logged and that contract is skipped. Id collisions keep the first
    /// tool and log the loser.
    pub async fn build(ledger: &dyn LedgerClient, contracts: &[TrackedContract]) -> Self {
        let mut tools: Vec<SynthesizedTool> = Vec::new();
        for contract in contracts {
            let blob = match ledger.fetch_contract_interface(&contract.address).await {
                Ok(blob) => blob,
                Err(e) => {
                    warn!("skipping contract {}: {}", contract.address, e);
                    continue;
                }
            };
            let descriptor = match decode_interface(&contract.address, &blob) {
                Ok(d) => d,
                Err(e) => {
                    warn!("skipping contract {}: {}", contract.address, e);
                    continue;
                }
            };
            for tool in synthesize_tools(&contract.name, &descriptor) {
                if tools.iter().any(|t| t.id == tool.id) {
                    warn!(
                        "tool id collision: '{}' already registered, dropping {}.{}",
                        tool.id, tool.contract_id, tool.function
                    );
                    continue;
                }
                tools.push(tool);
            }
        }
        Self { tools }
    }

    pub fn find(&self, tool_id: &str) -> Option<&SynthesizedTool> {
        self.tools.iter().find(|t| t.id == tool_id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `tools/list` entries for the synthesized tools.
    pub fn tool_descriptors(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.id,
                    "description": t.description,
                    "inputSchema": t.input_schema()
                })
            })
            .collect()
    }
}

/// `tools/list` entries for the built-in tools, always present regardless of
/// the session's tracked contracts.
pub fn builtin_tool_descriptors() -> Vec<Value> {
    vec![
        json!({
            "name": "add_contract",
            "description": "Track a smart contract; its functions become callable tools after refresh_tools",
            "inputSchema": {
                "type": "object",
                "required": ["name", "address"],
                "properties": {
                    "name": { "type": "string", "description": "Display name used in tool ids" },
                    "address": { "type": "string", "description": "Contract address on the ledger" }
                }
            }
        }),
        json!({
            "name": "remove_contract",
            "description": "Stop tracking a smart contract",
            "inputSchema": {
                "type": "object",
                "required": ["address"],
                "properties": {
                    "address": { "type": "string", "description": "Contract address on the ledger" }
                }
            }
        }),
        json!({
            "name": "list_contracts",
            "description": "List the contracts tracked for this user",
            "inputSchema": { "type": "object", "properties": {} }
        }),
        json!({
            "name": "set_wallet",
            "description": "Create this user's wallet record; a signing key is generated server-side",
            "inputSchema": {
                "type": "object",
                "required": ["address"],
                "properties": {
                    "address": { "type": "string", "description": "Account address on the ledger" }
                }
            }
        }),
        json!({
            "name": "get_wallet",
            "description": "Show the wallet address stored for this user",
            "inputSchema": { "type": "object", "properties": {} }
        }),
        json!({
            "name": "deploy_token",
            "description": "Deploy a token contract; requires a wallet and is co-signed by the service account",
            "inputSchema": {
                "type": "object",
                "required": ["owner", "name", "symbol", "decimals", "initial_supply", "cap"],
                "properties": {
                    "owner": { "type": "string", "description": "Owner account address" },
                    "name": { "type": "string", "description": "Token name" },
                    "symbol": { "type": "string", "description": "Token symbol" },
                    "decimals": { "type": "string", "description": "Decimal places (u32)" },
                    "initial_supply": { "type": "string", "description": "Initial supply (i128)" },
                    "cap": { "type": "string", "description": "Supply cap (i128)" }
                }
            }
        }),
        json!({
            "name": "refresh_tools",
            "description": "Re-synthesize contract tools from the current tracked-contract list",
            "inputSchema": { "type": "object", "properties": {} }
        }),
    ]
}
