//! Common types for thread/run interactions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Cancelling,
    RequiresAction,
    Completed,
    Failed,
    Expired,
    Cancelled,
    /// Any status string this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Cancelling => "cancelling",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Still executing on the remote side; re-fetch after a wait.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    /// No further status changes will happen.
    pub fn is_terminal(self) -> bool {
        !self.is_pending() && self != Self::RequiresAction
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asynchronous execution of the assistant against a thread
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    /// Tool calls the model is waiting on (only when `requires_action`)
    pub required_action: Option<Vec<ToolCall>>,
}

impl Run {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, thread_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            status,
            required_action: None,
        }
    }

    #[cfg(test)]
    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.required_action = Some(calls);
        self
    }
}

/// A function call requested by the remote model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Output returned to the remote side for one tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Citation or file reference embedded in message text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Annotation {
    /// Literal span of the message text this annotation covers
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Annotation {
    #[cfg(test)]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
        }
    }
}

/// A message retrieved from a thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub annotations: Vec<Annotation>,
}

impl ThreadMessage {
    #[cfg(test)]
    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            ..Self::assistant(id, text)
        }
    }

    #[cfg(test)]
    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }
}
