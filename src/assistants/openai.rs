//! `OpenAI` Assistants v2 implementation over HTTP

use super::types::{Annotation, MessageRole, Run, RunStatus, ThreadMessage, ToolCall, ToolOutput};
use super::{ApiError, AssistantsApi};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const BETA_HEADER: &str = "assistants=v2";

/// Assistants API client authenticated with a bearer credential
pub struct OpenAIAssistants {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIAssistants {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", BETA_HEADER)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ApiError::network(format!("Connection failed: {e}"))
            } else {
                ApiError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(ApiError::from_status(status.as_u16(), &error_resp.error.message));
            }
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::decode(format!("Failed to parse response: {e} - body: {body}")))
    }
}

#[async_trait]
impl AssistantsApi for OpenAIAssistants {
    async fn create_thread_and_run(&self, assistant_id: &str, text: &str) -> Result<Run, ApiError> {
        let body = CreateThreadAndRun {
            assistant_id,
            thread: NewThread {
                messages: vec![UserMessage::new(text)],
            },
        };
        let run: WireRun = self
            .send(self.client.post(self.url("threads/runs")).json(&body))
            .await?;
        Ok(run.into())
    }

    async fn create_run(
        &self,
        assistant_id: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<Run, ApiError> {
        let body = CreateRun {
            assistant_id,
            additional_messages: vec![UserMessage::new(text)],
        };
        let run: WireRun = self
            .send(
                self.client
                    .post(self.url(&format!("threads/{thread_id}/runs")))
                    .json(&body),
            )
            .await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        let run: WireRun = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{thread_id}/runs/{run_id}"))),
            )
            .await?;
        Ok(run.into())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ApiError> {
        let body = SubmitToolOutputs {
            tool_outputs: outputs,
        };
        let run: WireRun = self
            .send(
                self.client
                    .post(self.url(&format!(
                        "threads/{thread_id}/runs/{run_id}/submit_tool_outputs"
                    )))
                    .json(&body),
            )
            .await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        let list: MessageList = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{thread_id}/messages"))),
            )
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}

// Request bodies

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> UserMessage<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewThread<'a> {
    messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct CreateThreadAndRun<'a> {
    assistant_id: &'a str,
    thread: NewThread<'a>,
}

#[derive(Debug, Serialize)]
struct CreateRun<'a> {
    assistant_id: &'a str,
    additional_messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct SubmitToolOutputs<'a> {
    tool_outputs: &'a [ToolOutput],
}

// Response bodies

#[derive(Debug, Deserialize)]
struct WireRun {
    id: String,
    thread_id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
}

#[derive(Debug, Deserialize)]
struct WireRequiredAction {
    submit_tool_outputs: WireToolCalls,
}

#[derive(Debug, Deserialize)]
struct WireToolCalls {
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<WireRun> for Run {
    fn from(run: WireRun) -> Self {
        let required_action = run.required_action.map(|action| {
            action
                .submit_tool_outputs
                .tool_calls
                .into_iter()
                .map(|tc| {
                    let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                        tracing::warn!(error = %e, arguments = %tc.function.arguments, "Failed to parse tool call arguments");
                        serde_json::Value::Object(serde_json::Map::new())
                    });
                    ToolCall::new(tc.id, tc.function.name, arguments)
                })
                .collect()
        });

        Run {
            id: run.id,
            thread_id: run.thread_id,
            status: run.status,
            required_action,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    role: MessageRole,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text {
        text: WireText,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl From<WireMessage> for ThreadMessage {
    fn from(msg: WireMessage) -> Self {
        // Only the first text part is displayed
        let text = msg.content.into_iter().find_map(|part| match part {
            WireContent::Text { text } => Some(text),
            WireContent::Other => None,
        });
        let (text, annotations) = text.map_or_else(
            || (String::new(), Vec::new()),
            |t| (t.value, t.annotations),
        );

        ThreadMessage {
            id: msg.id,
            role: msg.role,
            text,
            annotations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
