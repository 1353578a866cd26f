//! Tool dispatch for runs waiting in `requires_action`
//!
//! Handlers are pure: the output depends only on the call's arguments.

mod contact;

pub use contact::ContactInformationTool;

use crate::assistants::{ToolCall, ToolOutput};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A function the remote model may call
pub trait Tool: Send + Sync {
    /// Function name as registered on the assistant
    fn name(&self) -> &str;

    /// Produce the output string for one call
    fn run(&self, arguments: &Value) -> String;
}

/// What to do with a call whose function name has no handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolPolicy {
    /// Fail the whole batch
    #[default]
    Reject,
    /// Leave the call without an output; the remote side decides what happens
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("No tool registered as {0}")]
    UnknownTool(String),
}

/// Static registry of tool handlers
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    unknown_policy: UnknownToolPolicy,
}

impl ToolRegistry {
    pub fn new(unknown_policy: UnknownToolPolicy) -> Self {
        Self {
            tools: HashMap::new(),
            unknown_policy,
        }
    }

    /// Registry with the built-in handlers
    pub fn standard(contact_url: &str, unknown_policy: UnknownToolPolicy) -> Self {
        Self::new(unknown_policy).with_tool(ContactInformationTool::new(contact_url))
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run every call in order, producing outputs in the same order.
    pub fn dispatch(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>, DispatchError> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            if let Some(tool) = self.tools.get(&call.name) {
                tracing::debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
                outputs.push(ToolOutput {
                    tool_call_id: call.id.clone(),
                    output: tool.run(&call.arguments),
                });
                continue;
            }

            match self.unknown_policy {
                UnknownToolPolicy::Reject => {
                    tracing::warn!(tool = %call.name, call_id = %call.id, "Rejecting batch with unknown tool");
                    return Err(DispatchError::UnknownTool(call.name.clone()));
                }
                UnknownToolPolicy::Omit => {
                    tracing::warn!(tool = %call.name, call_id = %call.id, "No handler for tool call, omitting output");
                }
            }
        }
        Ok(outputs)
    }
}
