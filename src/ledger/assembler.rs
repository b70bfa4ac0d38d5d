// src/ledger/assembler.rs
//
// Builds the unsigned operation for a tool invocation, simulates it, and
// decides whether it is a pure read or a state mutation. A read's projected
// return value is already final; only mutations continue to the router.

use crate::ledger::client::LedgerClient;
use crate::ledger::models::{BridgeError, NativeValue, Operation, SimulationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Read,
    Mutation,
}

/// Ephemeral per-invocation state. Not persisted anywhere.
#[derive(Debug, Clone)]
pub struct AssembledCall {
    pub operation: Operation,
    pub simulation: SimulationResult,
    pub classification: Classification,
}

/// Construct the invoke operation, simulate it, and classify the result.
/// Simulation failures carry the ledger's diagnostic payload through
/// `BridgeError::Simulation`.
pub async fn assemble_and_classify(
    ledger: &dyn LedgerClient,
    contract_id: &str,
    function: &str,
    args: Vec<NativeValue>,
    invoking_account: &str,
) -> Result<AssembledCall, BridgeError> {
    let operation = Operation::Invoke {
        contract_id: contract_id.to_string(),
        function: function.to_string(),
        args,
        source: invoking_account.to_string(),
    };
    let simulation = ledger.simulate(&operation).await?;
    let classification = classify(&simulation, invoking_account);
    Ok(AssembledCall {
        operation,
        simulation,
        classification,
    })
}

/// `Read` iff no party other than the invoking account must authorize.
/// Reads never reach the submission path and are always safe to retry.
pub fn classify(simulation: &SimulationResult, invoking_account: &str) -> Classification {
    let needs_external_auth = simulation
        .required_auth
        .iter()
        .any(|entry| entry.signer != invoking_account);
    if needs_external_auth {
        Classification::Mutation
    } else {
        Classification::Read
    }
}

/// Decode the simulation's projected return value, absent for void
/// functions. An undecodable value is a simulation-layer fault.
pub fn decode_result(simulation: &SimulationResult) -> Result<Option<NativeValue>, BridgeError> {
    match &simulation.result {
        None => Ok(None),
        Some(encoded) => NativeValue::decode_base64(encoded)
            .map(Some)
            .map_err(|e| BridgeError::Simulation {
                message: format!("undecodable projected result: {}", e),
                diagnostic: None,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::models::AuthEntry;
    use base64::Engine;

    fn sim(auth_signers: &[&str]) -> SimulationResult {
        SimulationResult {
            result: None,
            required_auth: auth_signers
                .iter()
                .map(|s| AuthEntry {
                    signer: s.to_string(),
                    payload: "cGF5bG9hZA==".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_auth_list_is_a_read() {
        assert_eq!(classify(&sim(&[]), "GUSER"), Classification::Read);
    }

    #[test]
    fn external_signer_means_mutation() {
        assert_eq!(classify(&sim(&["GOTHER"]), "GUSER"), Classification::Mutation);
        assert_eq!(
            classify(&sim(&["GUSER", "GOTHER"]), "GUSER"),
            Classification::Mutation
        );
    }

    #[test]
    fn invoker_only_auth_is_a_read() {
        assert_eq!(classify(&sim(&["GUSER"]), "GUSER"), Classification::Read);
        assert_eq!(
            classify(&sim(&["GUSER", "GUSER"]), "GUSER"),
            Classification::Read
        );
    }

    #[test]
    fn decode_result_handles_absent_and_present_values() {
        assert_eq!(decode_result(&sim(&[])).unwrap(), None);

        let encoded = base64::engine::general_purpose::STANDARD
            .encode(serde_json::to_vec(&NativeValue::I128("100".into())).unwrap());
        let with_result = SimulationResult {
            result: Some(encoded),
            required_auth: vec![],
        };
        assert_eq!(
            decode_result(&with_result).unwrap(),
            Some(NativeValue::I128("100".into()))
        );
    }

    #[test]
    fn decode_result_maps_garbage_to_simulation_error() {
        let broken = SimulationResult {
            result: Some("###".to_string()),
            required_auth: vec![],
        };
        assert!(matches!(
            decode_result(&broken),
            Err(BridgeError::Simulation { .. })
        ));
    }
}
