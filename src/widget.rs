//! Chat widget controller
//!
//! Ties a conversation session to whatever is drawing the widget. The
//! drawing side only has to implement `PresentationSurface`.

mod visibility;

pub use visibility::{Visibility, VisibilityCoordinator, VisibilitySnapshot};

use crate::assistants::AssistantsApi;
use crate::error::TurnError;
use crate::render::DisplayContent;
use crate::runtime::{ConversationSession, TurnGuard};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shown in place of a reply when a turn fails
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again in a moment.";

/// Shown when a message arrives while the previous one is still being answered
pub const BUSY_MESSAGE: &str = "Please wait for the current reply before sending another message.";

/// What the widget draws on. Calls are fire-and-forget.
pub trait PresentationSurface: Send + Sync {
    fn display_user_message(&self, text: &str);

    /// `loading` shows a placeholder; the next non-loading assistant message replaces it
    fn display_assistant_message(&self, content: &DisplayContent, loading: bool);

    fn is_widget_visible(&self) -> bool;

    fn open_widget(&self);

    fn close_widget(&self);

    /// Quick-reply buttons; an empty slice hides them
    fn show_suggestions(&self, suggestions: &[String]);

    /// Remove every message bubble
    fn clear(&self);

    fn notify_error(&self, message: &str);
}

/// Greeting shown when the widget opens on an empty conversation
#[derive(Debug, Clone, Default)]
pub struct Greeting {
    pub welcome: String,
    pub suggestions: Vec<String>,
}

/// One visitor's widget: a session plus the surface it draws on
pub struct ChatWidget<A: ?Sized, S> {
    session: ConversationSession<A>,
    surface: S,
    greeting: Greeting,
    greeted: AtomicBool,
    suggestions_shown: AtomicBool,
}

impl<A, S> ChatWidget<A, S>
where
    A: AssistantsApi + ?Sized,
    S: PresentationSurface,
{
    pub fn new(session: ConversationSession<A>, surface: S, greeting: Greeting) -> Self {
        Self {
            session,
            surface,
            greeting,
            greeted: AtomicBool::new(false),
            suggestions_shown: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &ConversationSession<A> {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn open(&self) {
        self.surface.open_widget();
        self.greet();
    }

    pub fn close(&self) {
        self.surface.close_widget();
    }

    pub fn toggle(&self) {
        if self.surface.is_widget_visible() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Start over: new thread, empty transcript, greeting again if open
    pub fn refresh(&self) {
        self.session.reset();
        self.greeted.store(false, Ordering::SeqCst);
        self.suggestions_shown.store(false, Ordering::SeqCst);
        self.surface.clear();
        if self.surface.is_widget_visible() {
            self.greet();
        }
    }

    /// Send a quick-reply suggestion as if typed
    pub async fn choose_suggestion(&self, suggestion: &str) -> Result<(), TurnError> {
        self.send(suggestion).await
    }

    /// Send one visitor message and display the reply (or a failure notice).
    ///
    /// Rejections (`EmptyMessage`, `Busy`) display nothing in the transcript.
    pub async fn send(&self, text: &str) -> Result<(), TurnError> {
        let guard = self.begin_send(text)?;
        self.finish_send(guard, text).await
    }

    /// Claim the turn for `text` without drawing anything.
    ///
    /// A `Busy` claim is reported to the surface as an error notice.
    pub fn begin_send(&self, text: &str) -> Result<TurnGuard, TurnError> {
        if text.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        self.session.try_begin().inspect_err(|e| {
            if matches!(e, TurnError::Busy) {
                self.surface.notify_error(BUSY_MESSAGE);
            }
        })
    }

    /// Draw the visitor's message, run the claimed turn and draw its outcome
    pub async fn finish_send(&self, guard: TurnGuard, text: &str) -> Result<(), TurnError> {
        self.hide_suggestions();
        self.surface.display_user_message(text);
        self.ensure_visible();
        self.surface
            .display_assistant_message(&DisplayContent::text(""), true);

        match self.session.complete_turn(guard, text).await {
            Ok(content) => {
                self.ensure_visible();
                self.surface.display_assistant_message(&content, false);
                Ok(())
            }
            // Transcript was cleared by the reset that made this turn stale
            Err(TurnError::Stale) => Err(TurnError::Stale),
            Err(e) => {
                tracing::warn!(error = %e, "Turn failed");
                self.surface
                    .display_assistant_message(&DisplayContent::text(FAILURE_MESSAGE), false);
                Err(e)
            }
        }
    }

    fn ensure_visible(&self) {
        if !self.surface.is_widget_visible() {
            self.surface.open_widget();
        }
    }

    fn greet(&self) {
        if self.session.thread_id().is_some() || self.greeted.swap(true, Ordering::SeqCst) {
            return;
        }
        if !self.greeting.welcome.is_empty() {
            self.surface
                .display_assistant_message(&DisplayContent::text(self.greeting.welcome.clone()), false);
        }
        if !self.greeting.suggestions.is_empty() {
            self.surface.show_suggestions(&self.greeting.suggestions);
            self.suggestions_shown.store(true, Ordering::SeqCst);
        }
    }

    fn hide_suggestions(&self) {
        if self.suggestions_shown.swap(false, Ordering::SeqCst) {
            self.surface.show_suggestions(&[]);
        }
    }
}
