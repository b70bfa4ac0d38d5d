// src/ledger/deploy.rs
//
// Token deployment: a degenerate case of the assemble/route pipeline with no
// pre-existing contract id. Construction always requires the deployer's
// authorization, so this is unconditionally a signing/submission flow,
// co-signed by the configuration-injected service credential.

use secrecy::Secret;
use tokio::sync::Mutex;

use crate::config::DeployerCredential;
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{AuthSignature, BridgeError, Operation, SignedTransaction, SubmitOutcome, TokenInit};
use crate::ledger::router::sign_auth_payload;
use crate::store::ProfileStore;

/// Deploy a token contract on behalf of the session user. Returns the
/// relay's outcome, which carries the newly assigned contract address on
/// success.
pub async fn deploy_token(
    ledger: &dyn LedgerClient,
    store: &Mutex<ProfileStore>,
    service: &DeployerCredential,
    user_id: &str,
    init: TokenInit,
) -> Result<SubmitOutcome, BridgeError> {
    // Wallet resolution first: no network traffic without a signing identity.
    let wallet = store
        .lock()
        .await
        .wallet(user_id)
        .ok_or(BridgeError::NoWallet)?;
    let user_secret = Secret::new(wallet.signing_secret);

    let operation = Operation::Deploy {
        deployer: wallet.address.clone(),
        init,
    };
    let simulation = ledger.simulate(&operation).await?;

    // The user's entries get the user's key; everything else is the service
    // co-signer's responsibility.
    let mut signatures = Vec::with_capacity(simulation.required_auth.len());
    for entry in &simulation.required_auth {
        let secret = if entry.signer == wallet.address {
            &user_secret
        } else {
            &service.secret
        };
        signatures.push(AuthSignature {
            signer: entry.signer.clone(),
            signature: sign_auth_payload(secret, &entry.payload)?,
        });
    }

    let tx = SignedTransaction {
        operation,
        signatures,
    };
    ledger.submit(&tx).await
}
