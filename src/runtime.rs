//! Runtime for live widget sessions
//!
//! Owns every visitor's session and fans widget events out to SSE clients.

mod poller;
mod session;

#[cfg(test)]
pub mod testing;

pub use poller::RunPoller;
pub use session::{ConversationSession, ReplyStyle, TurnGuard};

use crate::assistants::AssistantsApi;
use crate::render::{BrandColors, DisplayContent};
use crate::state_machine::PollContext;
use crate::tools::ToolRegistry;
use crate::widget::{
    ChatWidget, Greeting, PresentationSurface, VisibilityCoordinator, VisibilitySnapshot,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};

/// Production widget: any Assistants API behind a broadcasting surface
pub type LiveWidget = ChatWidget<dyn AssistantsApi, BroadcastSurface>;

/// Events sent to SSE clients
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Init {
        session_id: String,
        visibility: VisibilitySnapshot,
        brand: BrandColors,
        /// A reply is being produced
        busy: bool,
        has_thread: bool,
    },
    UserMessage {
        text: String,
    },
    AssistantMessage {
        content: DisplayContent,
        loading: bool,
    },
    Visibility {
        visibility: VisibilitySnapshot,
    },
    Suggestions {
        suggestions: Vec<String>,
    },
    Cleared,
    Error {
        message: String,
    },
}

/// Surface that turns every presentation call into a broadcast event
pub struct BroadcastSurface {
    tx: broadcast::Sender<WidgetEvent>,
    visibility: Mutex<VisibilityCoordinator>,
}

impl BroadcastSurface {
    /// Icon and notice start visible, the widget closed
    pub fn new(tx: broadcast::Sender<WidgetEvent>) -> Self {
        let mut coordinator = VisibilityCoordinator::new();
        coordinator.initialize();
        Self {
            tx,
            visibility: Mutex::new(coordinator),
        }
    }

    pub fn visibility(&self) -> VisibilitySnapshot {
        self.coordinator().snapshot()
    }

    fn coordinator(&self) -> std::sync::MutexGuard<'_, VisibilityCoordinator> {
        self.visibility.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: WidgetEvent) {
        // No subscribers is fine; the page may reconnect later
        let _ = self.tx.send(event);
    }
}

impl PresentationSurface for BroadcastSurface {
    fn display_user_message(&self, text: &str) {
        self.emit(WidgetEvent::UserMessage {
            text: text.to_string(),
        });
    }

    fn display_assistant_message(&self, content: &DisplayContent, loading: bool) {
        self.emit(WidgetEvent::AssistantMessage {
            content: content.clone(),
            loading,
        });
    }

    fn is_widget_visible(&self) -> bool {
        self.coordinator().is_widget_visible()
    }

    fn open_widget(&self) {
        let visibility = self.coordinator().open_widget();
        self.emit(WidgetEvent::Visibility { visibility });
    }

    fn close_widget(&self) {
        let visibility = self.coordinator().close_widget();
        self.emit(WidgetEvent::Visibility { visibility });
    }

    fn show_suggestions(&self, suggestions: &[String]) {
        self.emit(WidgetEvent::Suggestions {
            suggestions: suggestions.to_vec(),
        });
    }

    fn clear(&self) {
        self.emit(WidgetEvent::Cleared);
    }

    fn notify_error(&self, message: &str) {
        self.emit(WidgetEvent::Error {
            message: message.to_string(),
        });
    }
}

/// Everything a new session is built from
#[derive(Clone)]
pub struct SessionSettings {
    pub assistant_id: String,
    pub tools: ToolRegistry,
    pub poll: PollContext,
    pub style: ReplyStyle,
    pub greeting: Greeting,
}

/// Handle to interact with a live session
#[derive(Clone)]
pub struct SessionHandle {
    pub widget: Arc<LiveWidget>,
    pub broadcast_tx: broadcast::Sender<WidgetEvent>,
    last_active: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Nothing happened for `idle_timeout` since the last page disconnected
    /// or the last turn finished. A watched or busy session counts as active.
    fn expired_at(&self, now: Instant, idle_timeout: Duration) -> bool {
        let mut last_active = self.last_active.lock().unwrap_or_else(PoisonError::into_inner);
        if self.broadcast_tx.receiver_count() > 0 || self.widget.session().is_busy() {
            *last_active = now;
            return false;
        }
        now.saturating_duration_since(*last_active) >= idle_timeout
    }

    /// Snapshot sent first to every new subscriber
    pub fn init_event(&self, session_id: &str, brand: &BrandColors) -> WidgetEvent {
        WidgetEvent::Init {
            session_id: session_id.to_string(),
            visibility: self.widget.surface().visibility(),
            brand: brand.clone(),
            busy: self.widget.session().is_busy(),
            has_thread: self.widget.session().thread_id().is_some(),
        }
    }
}

/// Manager for all widget sessions
pub struct SessionManager {
    api: Arc<dyn AssistantsApi>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AssistantsApi>, settings: SessionSettings) -> Self {
        Self {
            api,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session with no thread; returns its id
    pub async fn create(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (broadcast_tx, _) = broadcast::channel(128);

        let session = ConversationSession::new(
            self.settings.assistant_id.clone(),
            Arc::clone(&self.api),
            self.settings.tools.clone(),
            self.settings.poll.clone(),
            self.settings.style.clone(),
        );
        let widget = ChatWidget::new(
            session,
            BroadcastSurface::new(broadcast_tx.clone()),
            self.settings.greeting.clone(),
        );

        self.sessions.write().await.insert(
            session_id.clone(),
            SessionHandle {
                widget: Arc::new(widget),
                broadcast_tx,
                last_active: Arc::new(Mutex::new(Instant::now())),
            },
        );
        tracing::info!(session_id = %session_id, "Session created");
        session_id
    }

    /// Look up a session and mark it active
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        handle.touch();
        Some(handle)
    }

    /// Subscribe to a session's events, starting with an init snapshot
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Option<(WidgetEvent, broadcast::Receiver<WidgetEvent>)> {
        let handle = self.get(session_id).await?;
        let rx = handle.broadcast_tx.subscribe();
        Some((handle.init_event(session_id, &self.settings.style.brand), rx))
    }

    /// Drop a session. A turn still in flight completes against the old handle.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session removed");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every expired session; returns how many were removed
    pub async fn expire_idle(&self, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, handle| {
            let expired = handle.expired_at(now, idle_timeout);
            if expired {
                tracing::info!(session_id = %session_id, "Session expired");
            }
            !expired
        });
        before - sessions.len()
    }

    /// Sweep for expired sessions every `period` until the manager is dropped
    pub fn spawn_expiry(self: &Arc<Self>, idle_timeout: Duration, period: Duration) {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let expired = manager.expire_idle(idle_timeout).await;
                if expired > 0 {
                    let remaining = manager.count().await;
                    tracing::debug!(expired, remaining, "Expiry sweep");
                }
            }
        });
    }
}
