// src/ledger/descriptor.rs
//
// Decodes a contract's published interface description into a typed list of
// callable functions. The blob arrives from the ledger as base64-wrapped JSON
// spec entries; anything else is a decode failure for that one contract.

use base64::Engine;
use serde::Deserialize;

use crate::ledger::models::BridgeError;

/// Decoded interface of one on-chain contract. Fetched fresh per session
/// initialization and discarded once tools are built.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub contract_id: String,
    pub functions: Vec<FunctionDescriptor>,
}

/// One callable entry point.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub doc: String,
    pub parameters: Vec<ParameterDescriptor>,
}

#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub doc: String,
    pub declared_type: String,
}

// Wire shape of one spec entry. Non-function entries (types, events) are
// present in the blob and skipped here.
#[derive(Debug, Deserialize)]
struct SpecEntry {
    #[serde(rename = "type")]
    kind: String,
    // Non-function entries may omit the name; they are filtered out anyway.
    #[serde(default)]
    name: String,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    inputs: Vec<SpecInput>,
}

#[derive(Debug, Deserialize)]
struct SpecInput {
    name: String,
    #[serde(default)]
    doc: String,
    #[serde(rename = "type")]
    declared_type: String,
}

/// Decode an interface blob into a `ContractDescriptor`.
///
/// Missing docs default to empty strings; a blob that is not base64, not
/// JSON, or not a spec-entry array fails with `DescriptorDecode` so the
/// caller can skip this contract and keep registering the rest.
pub fn decode_interface(contract_id: &str, blob: &str) -> Result<ContractDescriptor, BridgeError> {
    let decode_err = |reason: String| BridgeError::DescriptorDecode {
        contract_id: contract_id.to_string(),
        reason,
    };

    let raw = base64::engine::general_purpose::STANDARD
        .decode(blob.trim())
        .map_err(|e| decode_err(format!("not base64: {}", e)))?;

    let entries: Vec<SpecEntry> =
        serde_json::from_slice(&raw).map_err(|e| decode_err(format!("not a spec array: {}", e)))?;

    let functions = entries
        .into_iter()
        .filter(|e| e.kind == "function")
        .map(|e| FunctionDescriptor {
            name: e.name,
            doc: e.doc,
            parameters: e
                .inputs
                .into_iter()
                .map(|i| ParameterDescriptor {
                    name: i.name,
                    doc: i.doc,
                    declared_type: i.declared_type,
                })
                .collect(),
        })
        .collect();

    Ok(ContractDescriptor {
        contract_id: contract_id.to_string(),
        functions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn encode(json: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    #[test]
    fn decodes_functions_and_skips_other_entries() {
        let blob = encode(
            r#"[
                {"type":"function","name":"balance","doc":"Query a balance","inputs":[
                    {"name":"account","doc":"Account address","type":"address"}]},
                {"type":"struct","name":"AllowanceKey","inputs":[]},
                {"type":"function","name":"transfer","inputs":[
                    {"name":"from","type":"address"},
                    {"name":"to","type":"address"},
                    {"name":"amount","type":"i128"}]}
            ]"#,
        );

        let desc = decode_interface("CCONTRACT", &blob).unwrap();
        assert_eq!(desc.contract_id, "CCONTRACT");
        assert_eq!(desc.functions.len(), 2);
        assert_eq!(desc.functions[0].name, "balance");
        assert_eq!(desc.functions[0].doc, "Query a balance");
        assert_eq!(desc.functions[1].doc, "");
        assert_eq!(desc.functions[1].parameters.len(), 3);
        assert_eq!(desc.functions[1].parameters[2].declared_type, "i128");
    }

    #[test]
    fn tolerates_nameless_non_function_entries() {
        let blob = encode(
            r#"[
                {"type":"event"},
                {"type":"function","name":"balance","inputs":[]}
            ]"#,
        );
        let desc = decode_interface("C1", &blob).unwrap();
        assert_eq!(desc.functions.len(), 1);
        assert_eq!(desc.functions[0].name, "balance");
    }

    #[test]
    fn rejects_non_base64_blob() {
        let err = decode_interface("C1", "%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, BridgeError::DescriptorDecode { .. }));
    }

    #[test]
    fn rejects_non_spec_json() {
        let err = decode_interface("C1", &encode(r#"{"oops": true}"#)).unwrap_err();
        assert!(matches!(err, BridgeError::DescriptorDecode { .. }));
    }
}
