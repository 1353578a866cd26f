//! Mock implementations for testing
//!
//! These mocks enable session and widget tests without real I/O.

use super::WidgetEvent;
use crate::assistants::{ApiError, AssistantsApi, Run, RunStatus, ThreadMessage, ToolOutput};
use crate::render::DisplayContent;
use crate::widget::{PresentationSurface, VisibilityCoordinator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock Assistants API
// ============================================================================

/// A call made against the mock, with the arguments that matter to tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateThreadAndRun { text: String },
    CreateRun { thread_id: String, text: String },
    RetrieveRun { thread_id: String, run_id: String },
    SubmitToolOutputs { run_id: String, outputs: Vec<ToolOutput> },
    ListMessages { thread_id: String },
}

/// Assistants API that replays queued responses in order.
///
/// Run creation, run retrieval, submissions and message listings each have
/// their own queue. An empty queue yields a network error, except for
/// submissions which succeed unless a failure was queued.
#[derive(Default)]
pub struct MockAssistantsApi {
    created: Mutex<VecDeque<Result<Run, ApiError>>>,
    runs: Mutex<VecDeque<Result<Run, ApiError>>>,
    messages: Mutex<VecDeque<Result<Vec<ThreadMessage>, ApiError>>>,
    submission_failures: Mutex<VecDeque<ApiError>>,
    /// Record of all calls made
    pub calls: Mutex<Vec<ApiCall>>,
}

impl MockAssistantsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the run returned by the next create call
    pub fn queue_created(&self, run: Run) {
        self.created.lock().unwrap().push_back(Ok(run));
    }

    pub fn queue_create_error(&self, error: ApiError) {
        self.created.lock().unwrap().push_back(Err(error));
    }

    /// Queue the run returned by the next status fetch
    pub fn queue_run(&self, run: Run) {
        self.runs.lock().unwrap().push_back(Ok(run));
    }

    pub fn queue_run_error(&self, error: ApiError) {
        self.runs.lock().unwrap().push_back(Err(error));
    }

    /// Queue a message listing, newest first
    pub fn queue_messages(&self, messages: Vec<ThreadMessage>) {
        self.messages.lock().unwrap().push_back(Ok(messages));
    }

    /// Make the next tool output submission fail
    pub fn fail_submissions(&self, error: ApiError) {
        self.submission_failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    /// Every submitted output batch, in order
    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                ApiCall::SubmitToolOutputs { outputs, .. } => Some(outputs.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, what: &str) -> Result<T, ApiError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::network(format!("No mock {what} queued"))))
    }
}

#[async_trait]
impl AssistantsApi for MockAssistantsApi {
    async fn create_thread_and_run(&self, _assistant_id: &str, text: &str) -> Result<Run, ApiError> {
        self.record(ApiCall::CreateThreadAndRun {
            text: text.to_string(),
        });
        Self::next(&self.created, "run creation")
    }

    async fn create_run(
        &self,
        _assistant_id: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<Run, ApiError> {
        self.record(ApiCall::CreateRun {
            thread_id: thread_id.to_string(),
            text: text.to_string(),
        });
        Self::next(&self.created, "run creation")
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        self.record(ApiCall::RetrieveRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        });
        Self::next(&self.runs, "run")
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ApiError> {
        self.record(ApiCall::SubmitToolOutputs {
            run_id: run_id.to_string(),
            outputs: outputs.to_vec(),
        });
        match self.submission_failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(Run::new(run_id, thread_id, RunStatus::Queued)),
        }
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        self.record(ApiCall::ListMessages {
            thread_id: thread_id.to_string(),
        });
        Self::next(&self.messages, "message listing")
    }
}

// ============================================================================
// Recording Surface
// ============================================================================

/// Presentation surface that records what it was asked to draw
pub struct RecordingSurface {
    events: Mutex<Vec<WidgetEvent>>,
    visibility: Mutex<VisibilityCoordinator>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        let mut visibility = VisibilityCoordinator::new();
        visibility.initialize();
        Self {
            events: Mutex::new(Vec::new()),
            visibility: Mutex::new(visibility),
        }
    }

    pub fn events(&self) -> Vec<WidgetEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: WidgetEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PresentationSurface for RecordingSurface {
    fn display_user_message(&self, text: &str) {
        self.push(WidgetEvent::UserMessage {
            text: text.to_string(),
        });
    }

    fn display_assistant_message(&self, content: &DisplayContent, loading: bool) {
        self.push(WidgetEvent::AssistantMessage {
            content: content.clone(),
            loading,
        });
    }

    fn is_widget_visible(&self) -> bool {
        self.visibility.lock().unwrap().is_widget_visible()
    }

    fn open_widget(&self) {
        let visibility = self.visibility.lock().unwrap().open_widget();
        self.push(WidgetEvent::Visibility { visibility });
    }

    fn close_widget(&self) {
        let visibility = self.visibility.lock().unwrap().close_widget();
        self.push(WidgetEvent::Visibility { visibility });
    }

    fn show_suggestions(&self, suggestions: &[String]) {
        self.push(WidgetEvent::Suggestions {
            suggestions: suggestions.to_vec(),
        });
    }

    fn clear(&self) {
        self.push(WidgetEvent::Cleared);
    }

    fn notify_error(&self, message: &str) {
        self.push(WidgetEvent::Error {
            message: message.to_string(),
        });
    }
}
