//! Shared test doubles: a recording message gate and a stub exporter.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use intake_bot::error::{ExportError, GateError};
use intake_bot::gateway::{
    AttachmentRef, MessageGate, MessageStream, PromptOptions, UserId,
};
use intake_bot::ledger::RegistrationRecord;
use intake_bot::report::ReportExporter;

/// One delivery captured by the recording gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Prompt {
        to: UserId,
        text: String,
        options: PromptOptions,
    },
    File {
        to: UserId,
        attachment: AttachmentRef,
        caption: Option<String>,
    },
    Photo {
        to: UserId,
        attachment: AttachmentRef,
        caption: Option<String>,
    },
    Video {
        to: UserId,
        attachment: AttachmentRef,
        caption: Option<String>,
    },
}

/// Gate that records every send and can simulate delivery failures.
pub struct RecordingGate {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<UserId>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every send to `identity` fail from now on.
    pub fn fail_sends_to(&self, identity: UserId) {
        self.failing.lock().unwrap().insert(identity);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// All prompt texts delivered to `identity`, in order.
    pub fn prompts_to(&self, identity: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Prompt { to, text, .. } if *to == identity => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_prompt_to(&self, identity: UserId) -> Option<String> {
        self.prompts_to(identity).pop()
    }

    pub fn last_options_to(&self, identity: UserId) -> Option<PromptOptions> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Prompt { to, options, .. } if *to == identity => Some(options.clone()),
                _ => None,
            })
            .last()
    }

    pub fn files_to(&self, identity: UserId) -> Vec<AttachmentRef> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::File { to, attachment, .. } if *to == identity => Some(attachment.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn check(&self, to: UserId) -> Result<(), GateError> {
        if self.failing.lock().unwrap().contains(&to) {
            return Err(GateError::SendFailed {
                name: "recording".to_string(),
                reason: format!("delivery to {} disabled by test", to),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessageGate for RecordingGate {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<MessageStream, GateError> {
        Ok(Box::pin(tokio_stream::empty()))
    }

    async fn send_prompt(
        &self,
        to: UserId,
        text: &str,
        options: PromptOptions,
    ) -> Result<(), GateError> {
        self.check(to)?;
        self.sent.lock().unwrap().push(Sent::Prompt {
            to,
            text: text.to_string(),
            options,
        });
        Ok(())
    }

    async fn send_file(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        self.check(to)?;
        self.sent.lock().unwrap().push(Sent::File {
            to,
            attachment: attachment.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        self.check(to)?;
        self.sent.lock().unwrap().push(Sent::Photo {
            to,
            attachment: attachment.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn send_video(
        &self,
        to: UserId,
        attachment: &AttachmentRef,
        caption: Option<&str>,
        _options: PromptOptions,
    ) -> Result<(), GateError> {
        self.check(to)?;
        self.sent.lock().unwrap().push(Sent::Video {
            to,
            attachment: attachment.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }
}

/// Exporter that hands back a fixed attachment reference.
pub struct StubExporter;

#[async_trait]
impl ReportExporter for StubExporter {
    async fn export_registrations(
        &self,
        _records: &[RegistrationRecord],
    ) -> Result<AttachmentRef, ExportError> {
        Ok(AttachmentRef("report-1".to_string()))
    }
}
