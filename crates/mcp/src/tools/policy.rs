use policy_mcp_core::{PolicyDetails, QueryParams};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolDefinition, ToolError};

pub const GET_POLICY_DETAILS: &str = "get_policy_details";

pub fn definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: GET_POLICY_DETAILS.to_string(),
        description: "Fetch policy details from the internal policy API".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Endpoint URL (the configured policy endpoint is always used)"
                },
                "params": {
                    "type": "object",
                    "additionalProperties": {
                        "type": ["string", "number"]
                    },
                    "description": "Query parameters (the configured API key is always used)"
                },
                "timeout": {
                    "type": "number",
                    "description": "Request timeout in seconds (default 10)",
                    "default": 10
                }
            },
            "required": ["url", "params"]
        }),
    }]
}

#[derive(Debug, Deserialize)]
struct GetPolicyDetailsArgs {
    url: String,
    params: QueryParams,
    timeout: Option<f64>,
}

pub fn call(policy: &PolicyDetails, arguments: Value) -> Result<Value, ToolError> {
    let args: GetPolicyDetailsArgs = serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    let payload = policy.get_policy_details(&args.url, &args.params, args.timeout);
    Ok(tool_result(payload))
}

fn tool_result(payload: Value) -> Value {
    let text = payload.to_string();
    let mut result = json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    });
    if payload.is_object() {
        result["structuredContent"] = payload;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_payload_is_also_structured() {
        let result = tool_result(json!({"policy_id": 42}));
        assert_eq!(result["structuredContent"]["policy_id"], 42);
        assert_eq!(result["content"][0]["text"], r#"{"policy_id":42}"#);
    }

    #[test]
    fn array_payload_is_text_only() {
        let result = tool_result(json!([1, 2]));
        assert!(result.get("structuredContent").is_none());
        assert_eq!(result["content"][0]["text"], "[1,2]");
    }

    #[test]
    fn schema_requires_url_and_params() {
        let defs = definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].input_schema["required"], json!(["url", "params"]));
    }
}
