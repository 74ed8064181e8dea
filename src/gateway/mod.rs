//! Message delivery collaborator.
//!
//! The gateway is the boundary to the messaging transport. The core only
//! needs to push prompts, summaries, and files to an identity and to pull
//! a stream of inbound replies; everything transport-specific (delivery
//! primitives, keyboards, file hosting) lives behind [`MessageGate`].

mod console;

use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::error::GateError;

pub use console::ConsoleGate;

/// Opaque user identity, unique per conversation partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an uploaded file, resolved by the transport.
///
/// The core never inspects file contents, only presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef(pub String);

impl std::fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound reply from a user.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub identity: UserId,
    /// Free-text body, absent when the reply is only an attachment.
    pub text: Option<String>,
    /// Attachment carried by the reply, if any.
    pub attachment: Option<AttachmentRef>,
    /// Public username of the sender, as reported by the transport.
    pub handle: Option<String>,
}

impl IncomingMessage {
    pub fn text(identity: UserId, text: impl Into<String>) -> Self {
        Self {
            identity,
            text: Some(text.into()),
            attachment: None,
            handle: None,
        }
    }

    pub fn attachment(identity: UserId, attachment: AttachmentRef) -> Self {
        Self {
            identity,
            text: None,
            attachment: Some(attachment),
            handle: None,
        }
    }
}

/// Presentation options attached to an outbound prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    /// Reply-keyboard button labels, one row per entry.
    pub buttons: Vec<String>,
    /// Remove any reply keyboard currently shown to the user.
    pub remove_keyboard: bool,
}

impl PromptOptions {
    /// Plain message, no keyboard change.
    pub fn none() -> Self {
        Self::default()
    }

    /// Show a reply keyboard with the given button labels.
    pub fn buttons<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buttons: labels.into_iter().map(Into::into).collect(),
            remove_keyboard: false,
        }
    }

    /// Remove the current reply keyboard.
    pub fn remove_keyboard() -> Self {
        Self {
            buttons: Vec::new(),
            remove_keyboard: true,
        }
    }
}

/// Stream of inbound messages produced by a gate.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// Delivery primitives the core calls to render every prompt and summary.
///
/// Implementations must be cheap to call concurrently; failures are
/// reported, logged by the caller, and never retried.
#[async_trait]
pub trait MessageGate: Send + Sync {
    /// Short gate name for logs and error messages.
    fn name(&self) -> &str;

    /// Start the inbound side and return its message stream.
    ///
    /// May only be called once per gate.
    async fn start(&self) -> Result<MessageStream, GateError>;

    /// Send a text prompt with optional keyboard changes.
    async fn send_prompt(
        &self,
        to: UserId,
        text: &str,
        options: PromptOptions,
    ) -> Result<(), GateError>;

    /// Send a document by reference.
    async fn send_file(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        options: PromptOptions,
    ) -> Result<(), GateError>;

    /// Send a photo by reference.
    async fn send_photo(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        options: PromptOptions,
    ) -> Result<(), GateError>;

    /// Send a video by reference.
    async fn send_video(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        options: PromptOptions,
    ) -> Result<(), GateError>;
}
