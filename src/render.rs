//! Assistant reply rendering
//!
//! Turns raw assistant text into the markup the widget displays. Every
//! function here is pure: same text, annotations and brand in, same bytes out.

mod markdown;

#[cfg(test)]
mod proptests;

use crate::assistants::{Annotation, ThreadMessage};
use serde::{Deserialize, Serialize};

pub use markdown::collect_media;

/// Brand colors used by generated inline styles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    /// Link text color
    pub link: String,
    /// Image frame background and horizontal rule color
    pub frame: String,
}

impl Default for BrandColors {
    fn default() -> Self {
        Self {
            link: "#6fa8dc".to_string(),
            frame: "#fff".to_string(),
        }
    }
}

/// Image referenced by an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub alt: String,
}

/// Button shown under an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub text: String,
    pub url: String,
}

/// Display-ready assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayContent {
    pub html: String,
    pub media: Vec<MediaRef>,
    pub calls_to_action: Vec<CallToAction>,
}

impl DisplayContent {
    /// Content made of markup only, no media or buttons
    pub fn text(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            media: Vec::new(),
            calls_to_action: Vec::new(),
        }
    }
}

const BOLD_SPAN_OPEN: &str = r#"<span style="font-weight: 600;">"#;

/// Render a retrieved message into display content.
pub fn display_content(
    message: &ThreadMessage,
    brand: &BrandColors,
    calls_to_action: &[CallToAction],
) -> DisplayContent {
    DisplayContent {
        html: transform(&message.text, &message.annotations, brand),
        media: collect_media(&strip_annotations(&message.text, &message.annotations)),
        calls_to_action: calls_to_action.to_vec(),
    }
}

/// Convert raw assistant text to markup.
pub fn transform(raw: &str, annotations: &[Annotation], brand: &BrandColors) -> String {
    transform_stripped(&strip_annotations(raw, annotations), brand)
}

fn transform_stripped(text: &str, brand: &BrandColors) -> String {
    let escaped = escape_html(text);

    let joined: String = escaped
        .split('\n')
        .map(|line| line_block(line, brand))
        .collect();

    let bolded = markdown::BOLD.replace_all(&joined, format!("{BOLD_SPAN_OPEN}${{1}}</span>"));
    let bolded =
        markdown::LEGACY_BOLD.replace_all(&bolded, format!("{BOLD_SPAN_OPEN}${{1}}</span>"));

    bolded.replace(" - ", " ")
}

fn line_block(line: &str, brand: &BrandColors) -> String {
    let line = markdown::convert_images(line, brand);
    let line = markdown::convert_links(&line, brand);

    if line.trim().is_empty() {
        return format!(
            r#"<div style="display: block; padding-top: 5px; padding-bottom: 15px;"><div style="background-color: {}; height: 1px;"></div></div>"#,
            brand.frame
        );
    }

    match line.trim_start().strip_prefix("###") {
        Some(heading) => format!(
            r#"<span style="display: block; margin-bottom: 10px; font-weight: 600;">{}</span>"#,
            heading.trim_start()
        ),
        None => format!(r#"<span style="display: block; margin-bottom: 10px;">{line}</span>"#),
    }
}

/// Remove every occurrence of each annotation's text.
fn strip_annotations(raw: &str, annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .filter(|a| !a.text.is_empty())
        .fold(raw.to_string(), |text, annotation| {
            tracing::debug!(annotation = %annotation.text, kind = ?annotation.kind, "Stripping annotation");
            text.replace(&annotation.text, "")
        })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
