//! Thread/run conversational API abstraction
//!
//! The engine only talks to the remote assistant through `AssistantsApi`,
//! so tests can swap in a scripted implementation.

mod error;
mod openai;
mod types;

pub use error::{ApiError, ApiErrorKind};
pub use openai::{OpenAIAssistants, DEFAULT_API_BASE};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Remote operations the session engine needs
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Create a thread seeded with `text` and start a run on it
    async fn create_thread_and_run(&self, assistant_id: &str, text: &str) -> Result<Run, ApiError>;

    /// Append `text` to an existing thread and start a run
    async fn create_run(
        &self,
        assistant_id: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<Run, ApiError>;

    /// Re-fetch a run's status
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError>;

    /// Hand tool outputs back to a run waiting in `requires_action`
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ApiError>;

    /// List thread messages, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError>;
}

#[async_trait]
impl<T: AssistantsApi + ?Sized> AssistantsApi for Arc<T> {
    async fn create_thread_and_run(&self, assistant_id: &str, text: &str) -> Result<Run, ApiError> {
        (**self).create_thread_and_run(assistant_id, text).await
    }

    async fn create_run(
        &self,
        assistant_id: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<Run, ApiError> {
        (**self).create_run(assistant_id, thread_id, text).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        (**self).retrieve_run(thread_id, run_id).await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ApiError> {
        (**self).submit_tool_outputs(thread_id, run_id, outputs).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        (**self).list_messages(thread_id).await
    }
}

/// Logging wrapper for an Assistants API implementation
pub struct LoggingApi<A> {
    inner: A,
}

impl<A: AssistantsApi> LoggingApi<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    fn record<T>(operation: &str, started: Instant, result: &Result<T, ApiError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::debug!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "Assistants call completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Assistants call failed"
                );
            }
        }
    }
}

#[async_trait]
impl<A: AssistantsApi> AssistantsApi for LoggingApi<A> {
    async fn create_thread_and_run(&self, assistant_id: &str, text: &str) -> Result<Run, ApiError> {
        let started = Instant::now();
        let result = self.inner.create_thread_and_run(assistant_id, text).await;
        Self::record("create_thread_and_run", started, &result);
        result
    }

    async fn create_run(
        &self,
        assistant_id: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<Run, ApiError> {
        let started = Instant::now();
        let result = self.inner.create_run(assistant_id, thread_id, text).await;
        Self::record("create_run", started, &result);
        result
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        let started = Instant::now();
        let result = self.inner.retrieve_run(thread_id, run_id).await;
        Self::record("retrieve_run", started, &result);
        result
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ApiError> {
        let started = Instant::now();
        let result = self.inner.submit_tool_outputs(thread_id, run_id, outputs).await;
        Self::record("submit_tool_outputs", started, &result);
        result
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        let started = Instant::now();
        let result = self.inner.list_messages(thread_id).await;
        Self::record("list_messages", started, &result);
        result
    }
}
