//! Server-Sent Events support

use crate::runtime::WidgetEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: WidgetEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<WidgetEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(widget_event_to_axum(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(widget_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn widget_event_to_axum(event: WidgetEvent) -> Event {
    let (event_type, data) = event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn event_payload(event: WidgetEvent) -> (&'static str, serde_json::Value) {
    match event {
        WidgetEvent::Init {
            session_id,
            visibility,
            brand,
            busy,
            has_thread,
        } => (
            "init",
            json!({
                "type": "init",
                "session_id": session_id,
                "visibility": visibility,
                "brand": brand,
                "busy": busy,
                "has_thread": has_thread
            }),
        ),
        WidgetEvent::UserMessage { text } => (
            "user_message",
            json!({
                "type": "user_message",
                "text": text
            }),
        ),
        WidgetEvent::AssistantMessage { content, loading } => (
            "assistant_message",
            json!({
                "type": "assistant_message",
                "content": content,
                "loading": loading
            }),
        ),
        WidgetEvent::Visibility { visibility } => (
            "visibility",
            json!({
                "type": "visibility",
                "visibility": visibility
            }),
        ),
        WidgetEvent::Suggestions { suggestions } => (
            "suggestions",
            json!({
                "type": "suggestions",
                "suggestions": suggestions
            }),
        ),
        WidgetEvent::Cleared => (
            "cleared",
            json!({
                "type": "cleared"
            }),
        ),
        WidgetEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
