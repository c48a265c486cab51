use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use crate::tools::Tools;
use crate::transport::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR,
};

const SERVER_NAME: &str = "policy-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    tools: Tools,
    initialized: bool,
}

impl McpServer {
    pub fn new(tools: Tools) -> Self {
        Self {
            tools,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reads one JSON-RPC message per line until EOF, writing a response line
    /// for every message that is not a notification.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(resp) = self.handle_request(&line) {
                writeln!(output, "{}", resp)?;
                output.flush()?;
            }
        }
        Ok(())
    }

    pub fn handle_request(&mut self, input: &str) -> Option<String> {
        let message: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(_) => {
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error").encode());
            }
        };

        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(r) => r,
            Err(e) => {
                let resp =
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e));
                return Some(resp.encode());
            }
        };

        if request.jsonrpc != "2.0" {
            let resp = JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            );
            return Some(resp.encode());
        }

        tracing::debug!(method = %request.method, "received request");

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                return None;
            }
            "tools/list" => self.handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(&request),
            "ping" => JsonRpcResponse::success(request.id.clone(), json!({})),
            _ if request.is_notification() => return None,
            _ => JsonRpcResponse::error(
                request.id.clone(),
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        if request.is_notification() {
            return None;
        }
        Some(response.encode())
    }

    fn handle_initialize(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools = self.tools.list();
        JsonRpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    fn handle_tools_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let params = match &request.params {
            Some(p) => p,
            None => {
                return JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Missing params")
            }
        };

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.tools.call(name, arguments) {
            Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call rejected");
                JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, e.to_string())
            }
        }
    }
}
