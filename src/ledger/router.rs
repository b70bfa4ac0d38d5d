// src/ledger/router.rs
//
// Mutation path only: resolve the user's signing credential, sign the
// authorization entries the simulation demanded, and hand the transaction to
// the relay. This is the only module that can change on-ledger state.

use base64::Engine;
use k256::ecdsa::{signature::Signer as _, Signature, SigningKey};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::ledger::assembler::{AssembledCall, Classification};
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{AuthSignature, BridgeError, SignedTransaction, SubmitOutcome};
use crate::store::ProfileStore;

/// Sign one base64 auth payload with a hex-encoded k256 secret.
pub fn sign_auth_payload(secret_hex: &Secret<String>, payload_b64: &str) -> Result<String, BridgeError> {
    let key_bytes = hex::decode(secret_hex.expose_secret())
        .map_err(|e| BridgeError::Submission(format!("corrupt signing secret: {}", e)))?;
    let key = SigningKey::from_slice(&key_bytes)
        .map_err(|e| BridgeError::Submission(format!("corrupt signing secret: {}", e)))?;
    let payload = base64::engine::general_purpose::STANDARD
        .decode(payload_b64)
        .map_err(|e| BridgeError::Submission(format!("malformed auth payload: {}", e)))?;
    debug!(
        "signing auth payload sha256={}",
        hex::encode(Sha256::digest(&payload))
    );
    let signature: Signature = key.sign(&payload);
    Ok(hex::encode(signature.to_bytes()))
}

/// Route a mutation-classified call through signing and relay submission.
///
/// The wallet lookup happens first and `NoWallet` short-circuits before any
/// network call. The relay's verdict is propagated verbatim; no local retry.
pub async fn sign_and_submit(
    ledger: &dyn LedgerClient,
    store: &Mutex<ProfileStore>,
    user_id: &str,
    call: AssembledCall,
) -> Result<SubmitOutcome, BridgeError> {
    debug_assert_eq!(call.classification, Classification::Mutation);

    let wallet = store
        .lock()
        .await
        .wallet(user_id)
        .ok_or(BridgeError::NoWallet)?;
    let secret = Secret::new(wallet.signing_secret);

    let mut signatures = Vec::with_capacity(call.simulation.required_auth.len());
    for entry in &call.simulation.required_auth {
        signatures.push(AuthSignature {
            signer: entry.signer.clone(),
            signature: sign_auth_payload(&secret, &entry.payload)?,
        });
    }

    let tx = SignedTransaction {
        operation: call.operation,
        signatures,
    };
    ledger.submit(&tx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{signature::Verifier, VerifyingKey};
    use rand::rngs::OsRng;

    #[test]
    fn signatures_verify_against_the_public_key() {
        let key = SigningKey::random(&mut OsRng);
        let secret = Secret::new(hex::encode(key.to_bytes()));
        let payload = base64::engine::general_purpose::STANDARD.encode(b"auth-payload");

        let sig_hex = sign_auth_payload(&secret, &payload).unwrap();
        let sig = Signature::from_slice(&hex::decode(sig_hex).unwrap()).unwrap();
        let verifier = VerifyingKey::from(&key);
        assert!(verifier.verify(b"auth-payload", &sig).is_ok());
    }

    #[test]
    fn corrupt_secret_is_a_submission_error() {
        let secret = Secret::new("zz-not-hex".to_string());
        let payload = base64::engine::general_purpose::STANDARD.encode(b"x");
        assert!(matches!(
            sign_auth_payload(&secret, &payload),
            Err(BridgeError::Submission(_))
        ));
    }

    #[test]
    fn malformed_payload_is_a_submission_error() {
        let key = SigningKey::random(&mut OsRng);
        let secret = Secret::new(hex::encode(key.to_bytes()));
        assert!(matches!(
            sign_auth_payload(&secret, "%%%"),
            Err(BridgeError::Submission(_))
        ));
    }
}
