//! Conversational form-filling engine.
//!
//! Three cooperating pieces share the [`Flow`] struct:
//! - `collect` drives the ordered per-variant prompt sequence,
//! - `review` runs the summary/edit cycle once all fields are in,
//! - `finalize` commits the submission and notifies administrators.
//!
//! Each inbound reply advances exactly one step; the session's cursor
//! decides which piece interprets it.

mod collect;
mod finalize;
pub mod prompts;
mod review;

use std::sync::Arc;

use crate::directory::AdminDirectory;
use crate::error::GateError;
use crate::gateway::{IncomingMessage, MessageGate, PromptOptions, UserId};
use crate::ledger::Ledger;
use crate::session::{FormVariant, SessionStore, Step};

/// Form state machine plus review/edit controller plus finalizer.
pub struct Flow {
    store: Arc<SessionStore>,
    gate: Arc<dyn MessageGate>,
    directory: Arc<AdminDirectory>,
    ledger: Arc<Ledger>,
}

impl Flow {
    pub fn new(
        store: Arc<SessionStore>,
        gate: Arc<dyn MessageGate>,
        directory: Arc<AdminDirectory>,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            store,
            gate,
            directory,
            ledger,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Open a fresh session and issue the first prompt.
    ///
    /// Any prior incomplete session for the identity is overwritten.
    pub async fn start_form(
        &self,
        identity: UserId,
        variant: FormVariant,
        handle: Option<String>,
    ) -> Result<(), GateError> {
        self.store.open(identity, variant, handle).await;
        tracing::info!(user = %identity, variant = %variant, "form started");
        self.gate
            .send_prompt(identity, prompts::PROMPT_NAME, PromptOptions::remove_keyboard())
            .await
    }

    /// Advance the session for the sender of `msg` by one step.
    ///
    /// A reply for an identity with no open session gets the
    /// session-expired notice and changes nothing.
    pub async fn advance(&self, msg: &IncomingMessage) -> Result<(), GateError> {
        let Some(session) = self.store.get(msg.identity).await else {
            return self
                .gate
                .send_prompt(msg.identity, prompts::STALE_SESSION, PromptOptions::none())
                .await;
        };

        match session.step {
            Step::Name | Step::Phone | Step::Target | Step::Pass | Step::About | Step::Cv => {
                self.collect_step(&session, msg).await
            }
            Step::Review => self.handle_review_reply(&session, msg).await,
            Step::EditMenu => self.handle_edit_choice(&session, msg).await,
            Step::Edit(target) => self.apply_edit(&session, target, msg).await,
        }
    }

    /// Transition from collecting to reviewing: render and send the
    /// summary with the submit/edit keyboard.
    ///
    /// Always re-reads the session so the summary reflects the latest
    /// field values, including a just-applied edit.
    pub(crate) async fn enter_review(&self, identity: UserId) -> Result<(), GateError> {
        self.store
            .update(identity, |s| {
                debug_assert!(s.ready_for_review());
                s.step = Step::Review;
            })
            .await;

        let Some(session) = self.store.get(identity).await else {
            return Ok(());
        };
        self.gate
            .send_prompt(
                identity,
                &prompts::render_summary(&session),
                prompts::review_options(),
            )
            .await
    }
}
