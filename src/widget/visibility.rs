//! Icon / notice / widget visibility

use serde::Serialize;

/// Visibility of one page surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Visibility of every surface at one moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VisibilitySnapshot {
    pub icon: Visibility,
    pub notice: Visibility,
    pub widget: Visibility,
}

/// Finite-state coordinator for the three surfaces.
///
/// Opening the widget hides the notice, closing it shows the notice again.
/// The icon is shown once at initialization and never touched afterwards.
#[derive(Debug, Clone, Default)]
pub struct VisibilityCoordinator {
    state: VisibilitySnapshot,
}

impl VisibilityCoordinator {
    /// Everything starts hidden until `initialize`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VisibilitySnapshot {
        self.state
    }

    pub fn is_widget_visible(&self) -> bool {
        self.state.widget == Visibility::Visible
    }

    /// Page loaded: show the icon and the notice
    pub fn initialize(&mut self) -> VisibilitySnapshot {
        self.state.icon = Visibility::Visible;
        self.state.notice = Visibility::Visible;
        self.state
    }

    pub fn open_widget(&mut self) -> VisibilitySnapshot {
        self.state.widget = Visibility::Visible;
        self.state.notice = Visibility::Hidden;
        self.state
    }

    pub fn close_widget(&mut self) -> VisibilitySnapshot {
        self.state.widget = Visibility::Hidden;
        self.state.notice = Visibility::Visible;
        self.state
    }

    pub fn toggle_widget(&mut self) -> VisibilitySnapshot {
        if self.is_widget_visible() {
            self.close_widget()
        } else {
            self.open_widget()
        }
    }
}
