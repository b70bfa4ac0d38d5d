//! # MCP Handler Module
//!
//! Implements the Model Context Protocol dispatch for the ledger bridge.
//! `initialize` synthesizes one tool per function of every contract the user
//! tracks; `tools/call` routes those invocations through the
//! assemble/classify/sign/submit pipeline.
//!
//! ## Built-in Tools
//!
//! - `add_contract` / `remove_contract` / `list_contracts` - tracked-contract registry
//! - `set_wallet` / `get_wallet` - per-user signing identity
//! - `deploy_token` - deploy a token contract (service co-signed)
//! - `refresh_tools` - re-run tool synthesis for this session
//!
//! Every synthesized-tool invocation terminates in exactly one response
//! envelope; pipeline failures become error envelopes, never JSON-RPC
//! transport errors.

use serde_json::{json, Value};
use tracing::info;

use crate::{
    ledger::{
        assembler::{assemble_and_classify, decode_result, Classification},
        deploy, envelope,
        models::{BridgeError, TokenInit},
        router,
        synthesizer::SynthesizedTool,
    },
    mcp::{
        protocol::{error_codes, Request, Response},
        registry::{builtin_tool_descriptors, SessionRegistry},
    },
    utils, AppState,
};

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState, user_id: &str) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req, &state, user_id).await,
        "tools/list" => handle_tools_list(&req, &state, user_id).await,
        "tools/call" => handle_tool_call(req, state, user_id).await,
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Builds the session tool set and reports server capabilities.
async fn handle_initialize(req: &Request, state: &AppState, user_id: &str) -> Response {
    let count = rebuild_session(state, user_id).await;
    info!("session initialized for {}: {} contract tools", user_id, count);

    Response::success(
        req.id.clone(),
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "ledger-mcp-server",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

/// Re-run tool synthesis for this user and return the number of contract
/// tools now registered. Shared by `initialize` and `refresh_tools`.
async fn rebuild_session(state: &AppState, user_id: &str) -> usize {
    let contracts = state.store.lock().await.tracked_contracts(user_id);
    let registry = SessionRegistry::build(state.ledger.as_ref(), &contracts).await;
    let count = registry.len();
    state
        .sessions
        .write()
        .await
        .insert(user_id.to_string(), registry);
    count
}

async fn handle_tools_list(req: &Request, state: &AppState, user_id: &str) -> Response {
    let mut tools = builtin_tool_descriptors();
    if let Some(registry) = state.sessions.read().await.get(user_id) {
        tools.extend(registry.tool_descriptors());
    }
    Response::success(req.id.clone(), json!({ "tools": tools }))
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState, user_id: &str) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name.to_string(),
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args).clone();
    let req_id = &req.id;

    match tool_name.as_str() {
        "add_contract" => {
            let res: Result<Response, Response> = (async {
                let name = utils::get_required_arg::<String>(&args, "name", req_id)?;
                let address = utils::get_required_arg::<String>(&args, "address", req_id)?;
                let inserted = state
                    .store
                    .lock()
                    .await
                    .add_tracked_contract(user_id, &name, &address)
                    .map_err(|e| {
                        Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, e.to_string())
                    })?;
                let summary = if inserted {
                    format!(
                        "Now tracking '{}' at {}; run refresh_tools to expose its functions",
                        name, address
                    )
                } else {
                    format!("Contract {} was already tracked", address)
                };
                Ok(Response::success(
                    req_id.clone(),
                    json!({
                        "inserted": inserted,
                        "content": [{ "type": "text", "text": summary }]
                    }),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "remove_contract" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(&args, "address", req_id)?;
                let removed = state
                    .store
                    .lock()
                    .await
                    .remove_tracked_contract(user_id, &address)
                    .map_err(|e| {
                        Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, e.to_string())
                    })?;
                let summary = if removed {
                    format!("Stopped tracking {}", address)
                } else {
                    format!("Contract {} was not tracked", address)
                };
                Ok(Response::success(
                    req_id.clone(),
                    json!({
                        "removed": removed,
                        "content": [{ "type": "text", "text": summary }]
                    }),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "list_contracts" => {
            let contracts = state.store.lock().await.tracked_contracts(user_id);
            let entries: Vec<Value> = contracts
                .iter()
                .map(|c| json!({ "name": c.name, "address": c.address }))
                .collect();
            let summary = format!("{} tracked contract(s)", entries.len());
            Response::success(
                req_id.clone(),
                json!({
                    "contracts": entries,
                    "content": [{ "type": "text", "text": summary }]
                }),
            )
        }
        "set_wallet" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(&args, "address", req_id)?;
                let record = state
                    .store
                    .lock()
                    .await
                    .set_wallet(user_id, &address)
                    .map_err(|e| {
                        Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, e.to_string())
                    })?;
                // The signing secret stays server-side; only the address goes back.
                Ok(Response::success(
                    req_id.clone(),
                    json!({
                        "address": record.address,
                        "content": [{
                            "type": "text",
                            "text": format!("Wallet set: {}", record.address)
                        }]
                    }),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_wallet" => {
            let wallet = state.store.lock().await.wallet(user_id);
            match wallet {
                Some(record) => Response::success(
                    req_id.clone(),
                    json!({
                        "address": record.address,
                        "content": [{
                            "type": "text",
                            "text": format!("Wallet address: {}", record.address)
                        }]
                    }),
                ),
                None => Response::success(
                    req_id.clone(),
                    json!({
                        "address": Value::Null,
                        "content": [{
                            "type": "text",
                            "text": "No wallet set; call set_wallet first"
                        }]
                    }),
                ),
            }
        }
        "deploy_token" => {
            let res: Result<Response, Response> = (async {
                let init = TokenInit {
                    owner: utils::get_required_arg::<String>(&args, "owner", req_id)?,
                    name: utils::get_required_arg::<String>(&args, "name", req_id)?,
                    symbol: utils::get_required_arg::<String>(&args, "symbol", req_id)?,
                    decimals: utils::get_required_arg::<String>(&args, "decimals", req_id)?
                        .parse::<u32>()
                        .map_err(|e| {
                            Response::error(
                                req_id.clone(),
                                error_codes::INVALID_PARAMS,
                                format!("'decimals' must be a u32: {}", e),
                            )
                        })?,
                    initial_supply: utils::get_required_arg::<String>(
                        &args,
                        "initial_supply",
                        req_id,
                    )?,
                    cap: utils::get_required_arg::<String>(&args, "cap", req_id)?,
                };

                let envelope = match deploy::deploy_token(
                    state.ledger.as_ref(),
                    &state.store,
                    &state.config.deployer,
                    user_id,
                    init,
                )
                .await
                {
                    Ok(outcome) => envelope::mutation_success(None, &outcome),
                    Err(e) => envelope::failure(&e),
                };
                Ok(Response::success(req_id.clone(), envelope))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "refresh_tools" => {
            let count = rebuild_session(&state, user_id).await;
            Response::success(
                req_id.clone(),
                json!({
                    "tool_count": count,
                    "content": [{
                        "type": "text",
                        "text": format!("{} contract tool(s) registered", count)
                    }]
                }),
            )
        }
        // Everything else is a synthesized contract tool.
        other => {
            let tool = state
                .sessions
                .read()
                .await
                .get(user_id)
                .and_then(|registry| registry.find(other).cloned());
            match tool {
                Some(tool) => {
                    let envelope = invoke_contract_tool(&state, user_id, &tool, &args).await;
                    Response::success(req_id.clone(), envelope)
                }
                None => Response::error(
                    req_id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Unknown tool: {}", other),
                ),
            }
        }
    }
}

/// The tool-handler boundary: every outcome of the pipeline, including every
/// failure, is converted into exactly one response envelope here.
async fn invoke_contract_tool(
    state: &AppState,
    user_id: &str,
    tool: &SynthesizedTool,
    args: &Value,
) -> Value {
    match run_invocation(state, user_id, tool, args).await {
        Ok(envelope) => envelope,
        Err(e) => envelope::failure(&e),
    }
}

/// One invocation, strictly sequential: transform arguments, simulate and
/// classify, then either decode the read result or sign and submit.
async fn run_invocation(
    state: &AppState,
    user_id: &str,
    tool: &SynthesizedTool,
    args: &Value,
) -> Result<Value, BridgeError> {
    let native_args = tool.transform_arguments(args)?;

    // Reads for wallet-less users are attributed to the service account;
    // attribution only affects simulation context, and mutations still fail
    // with NoWallet at the router.
    let invoking_account = state
        .store
        .lock()
        .await
        .wallet(user_id)
        .map(|w| w.address)
        .unwrap_or_else(|| state.config.deployer.account.clone());

    let call = assemble_and_classify(
        state.ledger.as_ref(),
        &tool.contract_id,
        &tool.function,
        native_args,
        &invoking_account,
    )
    .await?;
    let result = decode_result(&call.simulation)?;

    match call.classification {
        Classification::Read => Ok(envelope::read_success(result.as_ref())),
        Classification::Mutation => {
            let outcome =
                router::sign_and_submit(state.ledger.as_ref(), &state.store, user_id, call).await?;
            Ok(envelope::mutation_success(result.as_ref(), &outcome))
        }
    }
}
