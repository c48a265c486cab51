mod policy;

use policy_mcp_core::PolicyDetails;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use policy::GET_POLICY_DETAILS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub struct Tools {
    policy: PolicyDetails,
}

impl Tools {
    pub fn new(policy: PolicyDetails) -> Self {
        Self { policy }
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        policy::definitions()
    }

    pub fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        match name {
            GET_POLICY_DETAILS => policy::call(&self.policy, arguments),
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
