// src/ledger/models.rs

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// --- Error taxonomy ---

/// Every failure the invocation pipeline can produce. All variants are
/// recoverable at the invocation level: the worst outcome is one tool call
/// reporting an error envelope, or one contract's tools missing from the
/// session registry.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to fetch interface for contract {contract_id}: {reason}")]
    DescriptorFetch { contract_id: String, reason: String },

    #[error("malformed interface description for contract {contract_id}: {reason}")]
    DescriptorDecode { contract_id: String, reason: String },

    #[error("invalid value for parameter '{name}': {reason}")]
    ParameterValidation { name: String, reason: String },

    #[error("simulation failed: {message}")]
    Simulation {
        message: String,
        /// Ledger-side diagnostic payload, passed through verbatim.
        diagnostic: Option<Value>,
    },

    #[error("no wallet is set for this user; call set_wallet first")]
    NoWallet,

    #[error("submission failed: {0}")]
    Submission(String),
}

impl BridgeError {
    /// Stable machine-readable tag used in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::DescriptorFetch { .. } => "descriptor_fetch",
            BridgeError::DescriptorDecode { .. } => "descriptor_decode",
            BridgeError::ParameterValidation { .. } => "parameter_validation",
            BridgeError::Simulation { .. } => "simulation",
            BridgeError::NoWallet => "no_wallet",
            BridgeError::Submission(_) => "submission",
        }
    }
}

// --- Native value encoding ---

/// The ledger's native argument and result encoding. Only string-typed
/// scalar inputs are accepted from callers; each variant knows how to parse
/// itself from the caller-supplied string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeValue {
    Address(String),
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    /// 128-bit integers ride as decimal strings; JSON numbers cannot hold them.
    U128(String),
    I128(String),
    String(String),
    Symbol(String),
    Bytes(String),
}

impl NativeValue {
    /// Decode a base64-wrapped native value, as returned by simulation.
    pub fn decode_base64(encoded: &str) -> anyhow::Result<NativeValue> {
        let raw = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Plain JSON rendering for the response envelope (untagged).
    pub fn to_display_json(&self) -> Value {
        match self {
            NativeValue::Address(s)
            | NativeValue::String(s)
            | NativeValue::Symbol(s)
            | NativeValue::Bytes(s)
            | NativeValue::U128(s)
            | NativeValue::I128(s) => Value::String(s.clone()),
            NativeValue::Bool(b) => Value::Bool(*b),
            NativeValue::U32(n) => Value::from(*n),
            NativeValue::I32(n) => Value::from(*n),
            NativeValue::U64(n) => Value::from(*n),
            NativeValue::I64(n) => Value::from(*n),
        }
    }
}

// --- Operations ---

/// Initialization arguments for the token deployment flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInit {
    pub owner: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: String,
    pub cap: String,
}

/// An unsigned ledger operation, attributed to its source account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Invoke {
        contract_id: String,
        function: String,
        args: Vec<NativeValue>,
        source: String,
    },
    Deploy {
        deployer: String,
        init: TokenInit,
    },
}

impl Operation {
    pub fn source(&self) -> &str {
        match self {
            Operation::Invoke { source, .. } => source,
            Operation::Deploy { deployer, .. } => deployer,
        }
    }
}

// --- Simulation ---

/// One authorization the ledger requires before the operation may commit.
/// `payload` is the opaque blob the signer must sign, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    pub signer: String,
    pub payload: String,
}

/// Projected outcome of running an operation against current ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Base64-wrapped native return value, absent for void functions.
    #[serde(default)]
    pub result: Option<String>,
    /// Authorization entries that must be attached before submission.
    #[serde(default)]
    pub required_auth: Vec<AuthEntry>,
}

// --- Submission ---

/// A signature over one authorization payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSignature {
    pub signer: String,
    /// Hex-encoded ECDSA signature over the auth payload.
    pub signature: String,
}

/// A fully authorized transaction ready for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub operation: Operation,
    pub signatures: Vec<AuthSignature>,
}

/// The relay's verdict, propagated verbatim. No local retry is performed;
/// submission is at-most-once from this server's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub hash: String,
    pub status: String,
    /// Assigned address when the operation deployed a new contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_value_round_trips_through_base64() {
        let raw = serde_json::to_vec(&NativeValue::U64(42)).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let decoded = NativeValue::decode_base64(&encoded).unwrap();
        assert_eq!(decoded, NativeValue::U64(42));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(NativeValue::decode_base64("not base64!!").is_err());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"{\"nope\":1}");
        assert!(NativeValue::decode_base64(&encoded).is_err());
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(BridgeError::NoWallet.kind(), "no_wallet");
        assert_eq!(
            BridgeError::Submission("relay down".into()).kind(),
            "submission"
        );
    }
}
