// src/ledger/synthesizer.rs
//
// Turns a decoded contract descriptor into the session's callable tools.
// Pure data transformation: nothing here touches the network, and the tool
// set is never mutated after construction.

use serde_json::{json, Value};

use crate::ledger::descriptor::{ContractDescriptor, ParameterDescriptor};
use crate::ledger::models::{BridgeError, NativeValue};

/// Functions whose name carries this marker are synthetic constructor entries
/// and never become tools.
pub const CONSTRUCTOR_MARKER: &str = "__";

const TOOL_ID_MAX_LEN: usize = 64;

/// A registered callable unit bound to one contract function. Created once
/// per session initialization and read-only thereafter.
#[derive(Debug, Clone)]
pub struct SynthesizedTool {
    pub id: String,
    pub description: String,
    pub contract_id: String,
    pub function: String,
    pub parameters: Vec<ParameterDescriptor>,
}

impl SynthesizedTool {
    /// JSON Schema advertised through `tools/list`. Every parameter is
    /// accepted as a string and transformed into the ledger's native
    /// encoding at invocation time.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let desc = if param.doc.is_empty() {
                format!("{} value", param.declared_type)
            } else {
                format!("{} ({})", param.doc, param.declared_type)
            };
            properties.insert(
                param.name.clone(),
                json!({ "type": "string", "description": desc }),
            );
            required.push(Value::String(param.name.clone()));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// Validate and transform caller-supplied string arguments into the
    /// ordered native argument list the transaction layer expects.
    pub fn transform_arguments(&self, args: &Value) -> Result<Vec<NativeValue>, BridgeError> {
        self.parameters
            .iter()
            .map(|param| {
                let raw = args.get(&param.name).and_then(|v| v.as_str()).ok_or_else(|| {
                    BridgeError::ParameterValidation {
                        name: param.name.clone(),
                        reason: "missing or not a string".to_string(),
                    }
                })?;
                transform_argument(&param.name, &param.declared_type, raw)
            })
            .collect()
    }
}

/// Derive the stable tool id for `(contractName, functionName)`.
///
/// The raw form `"<contract>: <function>"` is sanitized to the
/// alphanumeric/underscore/hyphen charset, capped at 64 characters, and runs
/// of double underscores are collapsed. Distinct pairs can collide after
/// truncation; the registry logs and keeps the first.
pub fn derive_tool_id(contract_name: &str, function_name: &str) -> String {
    let raw = format!("{}: {}", contract_name, function_name);
    let mut sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    sanitized.truncate(TOOL_ID_MAX_LEN);
    while sanitized.contains("__") {
        sanitized = sanitized.replace("__", "_");
    }
    sanitized
}

/// Parse one caller-supplied string into the native encoding for
/// `declared_type`. Composite and collection types are not supported; they
/// are rejected here rather than at synthesis time so the advertised tool
/// set stays complete and deterministic.
pub fn transform_argument(
    name: &str,
    declared_type: &str,
    raw: &str,
) -> Result<NativeValue, BridgeError> {
    let invalid = |reason: String| BridgeError::ParameterValidation {
        name: name.to_string(),
        reason,
    };

    match declared_type {
        "address" => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid(format!("'{}' is not a ledger address", raw)));
            }
            Ok(NativeValue::Address(trimmed.to_string()))
        }
        "bool" => match raw.trim() {
            "true" => Ok(NativeValue::Bool(true)),
            "false" => Ok(NativeValue::Bool(false)),
            other => Err(invalid(format!("'{}' is not 'true' or 'false'", other))),
        },
        "u32" => raw
            .trim()
            .parse::<u32>()
            .map(NativeValue::U32)
            .map_err(|e| invalid(format!("'{}' is not a u32: {}", raw, e))),
        "i32" => raw
            .trim()
            .parse::<i32>()
            .map(NativeValue::I32)
            .map_err(|e| invalid(format!("'{}' is not an i32: {}", raw, e))),
        "u64" => raw
            .trim()
            .parse::<u64>()
            .map(NativeValue::U64)
            .map_err(|e| invalid(format!("'{}' is not a u64: {}", raw, e))),
        "i64" => raw
            .trim()
            .parse::<i64>()
            .map(NativeValue::I64)
            .map_err(|e| invalid(format!("'{}' is not an i64: {}", raw, e))),
        "u128" => raw
            .trim()
            .parse::<u128>()
            .map(|v| NativeValue::U128(v.to_string()))
            .map_err(|e| invalid(format!("'{}' is not a u128: {}", raw, e))),
        "i128" => raw
            .trim()
            .parse::<i128>()
            .map(|v| NativeValue::I128(v.to_string()))
            .map_err(|e| invalid(format!("'{}' is not an i128: {}", raw, e))),
        "string" => Ok(NativeValue::String(raw.to_string())),
        "symbol" => {
            let trimmed = raw.trim();
            if trimmed.is_empty()
                || trimmed.len() > 32
                || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(invalid(format!("'{}' is not a valid symbol", raw)));
            }
            Ok(NativeValue::Symbol(trimmed.to_string()))
        }
        "bytes" => {
            let trimmed = raw.trim().trim_start_matches("0x");
            hex::decode(trimmed)
                .map(|_| NativeValue::Bytes(trimmed.to_string()))
                .map_err(|e| invalid(format!("'{}' is not hex: {}", raw, e)))
        }
        other => Err(invalid(format!(
            "parameter type '{}' is not supported; only string-typed scalars can be passed",
            other
        ))),
    }
}

/// Build the tool set for one contract. Constructor-marker functions are
/// excluded; everything else becomes a tool bound to `(contract_id,
/// function)` with the descriptor's doc as its description (empty when the
/// contract published none).
pub fn synthesize_tools(contract_name: &str, descriptor: &ContractDescriptor) -> Vec<SynthesizedTool> {
    descriptor
        .functions
        .iter()
        .filter(|f| !f.name.contains(CONSTRUCTOR_MARKER))
        .map(|f| SynthesizedTool {
            id: derive_tool_id(contract_name, &f.name),
            description: f.doc.clone(),
            contract_id: descriptor.contract_id.clone(),
            function: f.name.clone(),
            parameters: f.parameters.clone(),
        })
        .collect()
}
