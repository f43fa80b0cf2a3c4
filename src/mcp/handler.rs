//! # MCP Handler Module
//!
//! JSON-RPC entry point for agent hosts speaking the Model Context Protocol.
//!
//! ## Methods
//! - `initialize` - server info, capabilities and the agent instructions
//! - `tools/list` - every registered action with its input schema
//! - `tools/call` - runs an action and returns its result envelope
//! - `ping`
//!
//! Action names (`search-prompts`, `search_prompts`, ...) are also accepted
//! as methods and rewritten into `tools/call`.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::mcp::protocol::{error_codes, Request, Response, PROTOCOL_VERSION};
use crate::AppState;

/// Dispatches one request. Notifications get no response.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Ignoring notification {}", req.method);
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req, &state),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&req, &state),
        "tools/call" => handle_tool_call(req, &state).await,
        method if state.session.registry.get(method).is_some() => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": method,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, &state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

fn handle_initialize(req: &Request, state: &AppState) -> Response {
    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": {
                "name": "oneshot_mcp",
                "version": env!("CARGO_PKG_VERSION")
            },
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "instructions": state.session.instructions
        }),
    )
}

fn handle_tools_list(req: &Request, state: &AppState) -> Response {
    Response::success(
        req.id.clone(),
        json!({ "tools": state.session.registry.descriptors() }),
    )
}

async fn handle_tool_call(req: Request, state: &AppState) -> Response {
    let Some(params) = req.params.as_ref() else {
        return Response::error(
            req.id,
            error_codes::INVALID_PARAMS,
            "Missing 'params' object",
        );
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Response::error(
            req.id,
            error_codes::INVALID_PARAMS,
            "Missing 'name' field in params",
        );
    };
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let session = &state.session;
    match session
        .registry
        .invoke(session.context.clone(), name, args)
        .await
    {
        Some(outcome) => Response::tool_result(req.id, &outcome),
        None => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {}", name),
        ),
    }
}
