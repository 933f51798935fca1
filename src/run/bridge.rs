//! JSON-lines bridge between the browser extension and the engine.
//!
//! Each input line is either an interception event (tagged by `event`) or a
//! [`Message`] (tagged by `action`). Replies to messages are written as one
//! JSON line each.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::resources::Services;
use crate::app::Message;
use crate::capture::{BeforeRequestEvent, SendHeadersEvent};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CaptureEvent {
    BeforeRequest(BeforeRequestEvent),
    BeforeSendHeaders(SendHeadersEvent),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Capture(CaptureEvent),
    Message(Message),
}

/// Handles lines from `input` until it ends.
pub async fn serve_lines<R, W>(services: &Services, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read bridge input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let inbound: Inbound = match serde_json::from_str(line) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!("Ignoring undecodable bridge line: {e}");
                continue;
            }
        };
        match inbound {
            Inbound::Capture(CaptureEvent::BeforeRequest(event)) => {
                services.capture.on_before_request(event).await
            }
            Inbound::Capture(CaptureEvent::BeforeSendHeaders(event)) => {
                services.capture.on_before_send_headers(event).await
            }
            Inbound::Message(message) => {
                let reply = match services.dispatcher.dispatch(message).await {
                    Ok(reply) => serde_json::to_value(reply)?,
                    Err(e) => serde_json::json!({ "type": "error", "data": e.to_string() }),
                };
                debug!("Reply: {reply}");
                output.write_all(format!("{reply}\n").as_bytes()).await?;
                output.flush().await?;
            }
        }
    }
    Ok(())
}
