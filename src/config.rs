//! Widget configuration, read once from the environment at startup

use crate::render::{BrandColors, CallToAction};
use crate::runtime::{ReplyStyle, SessionSettings};
use crate::state_machine::PollContext;
use crate::tools::{ToolRegistry, UnknownToolPolicy};
use crate::widget::Greeting;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

/// Sessions with no page attached are dropped after this long
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// How often idle sessions are swept
pub const EXPIRY_SWEEP_PERIOD: Duration = Duration::from_secs(60);

pub const DEFAULT_WELCOME: &str = "Hi there! How can I help you today?";

/// Deployment settings for the widget server
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    /// Remote API base URL; the public endpoint when unset
    pub api_base: Option<String>,
    pub port: u16,
    pub session_idle: Duration,
    pub poll: PollContext,
    pub brand: BrandColors,
    pub welcome: String,
    pub suggestions: Vec<String>,
    /// Answer to `get_contact_information`; the tool is not registered without it
    pub contact_url: Option<String>,
    pub calls_to_action: Vec<CallToAction>,
    pub unknown_tools: UnknownToolPolicy,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            api_base: None,
            port: DEFAULT_PORT,
            session_idle: DEFAULT_SESSION_IDLE,
            poll: PollContext::default(),
            brand: BrandColors::default(),
            welcome: DEFAULT_WELCOME.to_string(),
            suggestions: Vec::new(),
            contact_url: None,
            calls_to_action: Vec::new(),
            unknown_tools: UnknownToolPolicy::default(),
        }
    }
}

impl WidgetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let poll = PollContext {
            poll_interval: parse_var(&var, "CONCIERGE_POLL_INTERVAL_MS")
                .map_or(defaults.poll.poll_interval, Duration::from_millis),
            settle_delay: parse_var(&var, "CONCIERGE_SETTLE_DELAY_MS")
                .map_or(defaults.poll.settle_delay, Duration::from_millis),
            max_polls: parse_var(&var, "CONCIERGE_MAX_POLLS").unwrap_or(defaults.poll.max_polls),
        };

        let brand = BrandColors {
            link: var("CONCIERGE_LINK_COLOR").unwrap_or(defaults.brand.link),
            frame: var("CONCIERGE_FRAME_COLOR").unwrap_or(defaults.brand.frame),
        };

        let suggestions = var("CONCIERGE_SUGGESTIONS")
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let calls_to_action = var("CONCIERGE_CTAS")
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(ctas) => Some(ctas),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed CONCIERGE_CTAS");
                    None
                }
            })
            .unwrap_or_default();

        let unknown_tools = var("CONCIERGE_UNKNOWN_TOOLS")
            .and_then(|raw| {
                let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
                match serde_json::from_value(value) {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        tracing::warn!(value = %raw, error = %e, "Unknown CONCIERGE_UNKNOWN_TOOLS, using reject");
                        None
                    }
                }
            })
            .unwrap_or_default();

        Self {
            api_key: var("OPENAI_API_KEY"),
            assistant_id: var("CONCIERGE_ASSISTANT_ID"),
            api_base: var("CONCIERGE_API_BASE"),
            port: parse_var(&var, "CONCIERGE_PORT").unwrap_or(defaults.port),
            session_idle: parse_var(&var, "CONCIERGE_SESSION_IDLE_SECS")
                .map_or(defaults.session_idle, Duration::from_secs),
            poll,
            brand,
            welcome: var("CONCIERGE_WELCOME").unwrap_or(defaults.welcome),
            suggestions,
            contact_url: var("CONCIERGE_CONTACT_URL"),
            calls_to_action,
            unknown_tools,
        }
    }

    /// Log what is missing for replies to work; the server still starts
    pub fn warn_if_incomplete(&self) {
        if self.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; every turn will fail authentication");
        }
        if self.assistant_id.is_none() {
            tracing::warn!("CONCIERGE_ASSISTANT_ID not set; every turn will be rejected");
        }
        if self.contact_url.is_none() {
            tracing::warn!("CONCIERGE_CONTACT_URL not set; get_contact_information is unavailable");
        }
    }

    pub fn tools(&self) -> ToolRegistry {
        match &self.contact_url {
            Some(url) => ToolRegistry::standard(url, self.unknown_tools),
            None => ToolRegistry::new(self.unknown_tools),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            assistant_id: self.assistant_id.clone().unwrap_or_default(),
            tools: self.tools(),
            poll: self.poll.clone(),
            style: ReplyStyle {
                brand: self.brand.clone(),
                calls_to_action: self.calls_to_action.clone(),
            },
            greeting: Greeting {
                welcome: self.welcome.clone(),
                suggestions: self.suggestions.clone(),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}
