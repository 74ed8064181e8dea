//! Console gate for local operation.
//!
//! Reads one reply per stdin line and prints everything the core sends.
//! A line starting with `file:` is delivered as an attachment reference
//! instead of text, which is enough to walk the CV step by hand.

use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::error::GateError;
use crate::gateway::{
    AttachmentRef, IncomingMessage, MessageGate, MessageStream, PromptOptions, UserId,
};

/// Gate that bridges stdin/stdout to the dispatcher.
pub struct ConsoleGate {
    identity: UserId,
    handle: Option<String>,
    started: Mutex<bool>,
}

impl ConsoleGate {
    /// Create a console gate impersonating the given identity.
    pub fn new(identity: UserId, handle: Option<String>) -> Self {
        Self {
            identity,
            handle,
            started: Mutex::new(false),
        }
    }

    fn render_options(options: &PromptOptions) -> String {
        if !options.buttons.is_empty() {
            let rows: Vec<&str> = options.buttons.iter().map(String::as_str).collect();
            format!("  [{}]", rows.join("] ["))
        } else if options.remove_keyboard {
            "  (keyboard removed)".to_string()
        } else {
            String::new()
        }
    }
}

#[async_trait]
impl MessageGate for ConsoleGate {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(&self) -> Result<MessageStream, GateError> {
        {
            let mut started = self.started.lock().await;
            if *started {
                return Err(GateError::StartupFailed {
                    name: "console".to_string(),
                    reason: "console gate already started".to_string(),
                });
            }
            *started = true;
        }

        let (tx, rx) = mpsc::channel(32);
        let identity = self.identity;
        let handle = self.handle.clone();

        tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("console input closed: {}", e);
                        break;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let msg = match trimmed.strip_prefix("file:") {
                    Some(rest) => IncomingMessage {
                        identity,
                        text: None,
                        attachment: Some(AttachmentRef(rest.trim().to_string())),
                        handle: handle.clone(),
                    },
                    None => IncomingMessage {
                        identity,
                        text: Some(trimmed.to_string()),
                        attachment: None,
                        handle: handle.clone(),
                    },
                };
                if tx.blocking_send(msg).is_err() {
                    break;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn send_prompt(
        &self,
        to: UserId,
        text: &str,
        options: PromptOptions,
    ) -> Result<(), GateError> {
        println!("[{}] {}{}", to, text, Self::render_options(&options));
        Ok(())
    }

    async fn send_file(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        println!("[{}] <file {}> {}", to, attachment, caption.unwrap_or(""));
        Ok(())
    }

    async fn send_photo(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        println!("[{}] <photo {}> {}", to, attachment, caption.unwrap_or(""));
        Ok(())
    }

    async fn send_video(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        println!("[{}] <video {}> {}", to, attachment, caption.unwrap_or(""));
        Ok(())
    }
}
