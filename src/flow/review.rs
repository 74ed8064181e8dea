//! Review/edit controller.
//!
//! Entered only after all required fields are collected. From the
//! summary the user either submits or branches into the edit menu; one
//! edit reply updates exactly one field and unconditionally returns to
//! the freshly rendered summary.

use super::prompts;
use super::Flow;
use crate::error::GateError;
use crate::gateway::{IncomingMessage, PromptOptions};
use crate::session::{EditTarget, SessionRecord, Step};

impl Flow {
    /// Reply while the summary is on screen: submit, edit, or re-render.
    pub(crate) async fn handle_review_reply(
        &self,
        session: &SessionRecord,
        msg: &IncomingMessage,
    ) -> Result<(), GateError> {
        let identity = session.identity;
        match msg.text.as_deref() {
            Some(prompts::BTN_SUBMIT) => self.finalize(session).await,
            Some(prompts::BTN_EDIT) => {
                self.store
                    .update(identity, |s| {
                        s.reviewing = true;
                        s.step = Step::EditMenu;
                    })
                    .await;
                self.gate
                    .send_prompt(
                        identity,
                        prompts::EDIT_MENU_TITLE,
                        prompts::edit_menu_options(session.variant),
                    )
                    .await
            }
            // Anything else re-renders the same summary with the same
            // options; a no-op, not an error.
            _ => {
                self.gate
                    .send_prompt(
                        identity,
                        &prompts::render_summary(session),
                        prompts::review_options(),
                    )
                    .await
            }
        }
    }

    /// Reply while the edit menu is on screen.
    pub(crate) async fn handle_edit_choice(
        &self,
        session: &SessionRecord,
        msg: &IncomingMessage,
    ) -> Result<(), GateError> {
        let identity = session.identity;
        let text = msg.text.as_deref().unwrap_or("");

        if text == prompts::BTN_BACK_TO_REVIEW {
            self.store
                .update(identity, |s| s.reviewing = false)
                .await;
            return self.enter_review(identity).await;
        }

        match prompts::match_edit_choice(session.variant, text) {
            Some(target) => {
                self.store
                    .update(identity, |s| s.step = Step::Edit(target))
                    .await;
                let (prompt, options) = prompts::edit_prompt(session.variant, target);
                self.gate.send_prompt(identity, prompt, options).await
            }
            None => {
                self.gate
                    .send_prompt(identity, prompts::INVALID_CHOICE, PromptOptions::none())
                    .await?;
                self.gate
                    .send_prompt(
                        identity,
                        prompts::EDIT_MENU_TITLE,
                        prompts::edit_menu_options(session.variant),
                    )
                    .await
            }
        }
    }

    /// Replacement value for the field being edited.
    ///
    /// Uses the same per-field validation as initial collection; on a
    /// validation failure the edit prompt is re-issued in place.
    pub(crate) async fn apply_edit(
        &self,
        session: &SessionRecord,
        target: EditTarget,
        msg: &IncomingMessage,
    ) -> Result<(), GateError> {
        let identity = session.identity;

        match target {
            EditTarget::Name => {
                let Some(text) = msg.text.clone() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                self.store
                    .update(identity, |s| s.display_name = Some(text))
                    .await;
            }
            EditTarget::Phone => {
                let Some(text) = msg.text.clone() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                self.store
                    .update(identity, |s| s.contact_phone = Some(text))
                    .await;
            }
            EditTarget::Target => {
                let Some(text) = msg.text.clone() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                self.store
                    .update(identity, |s| s.target_name = Some(text))
                    .await;
            }
            EditTarget::Pass => {
                let needs_pass = msg.text.as_deref().map(prompts::parse_yes).unwrap_or(false);
                self.store
                    .update(identity, |s| s.needs_access_pass = Some(needs_pass))
                    .await;
            }
            EditTarget::About => {
                let Some(text) = msg.text.clone() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                self.store
                    .update(identity, |s| s.about_text = Some(text))
                    .await;
            }
            EditTarget::Cv => {
                let Some(attachment) = msg.attachment.clone() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                self.store
                    .update(identity, |s| s.attachment = Some(attachment))
                    .await;
            }
            EditTarget::Handle => {
                let Some(text) = msg.text.as_deref() else {
                    return self.reissue_edit_prompt(session, target).await;
                };
                let handle = prompts::normalize_handle(text);
                self.store.update(identity, |s| s.handle = handle).await;
            }
        }

        self.store
            .update(identity, |s| s.reviewing = false)
            .await;
        self.enter_review(identity).await
    }

    async fn reissue_edit_prompt(
        &self,
        session: &SessionRecord,
        target: EditTarget,
    ) -> Result<(), GateError> {
        tracing::debug!(user = %session.identity, step = %session.step, "edit validation failed, re-issuing prompt");
        let (prompt, options) = prompts::edit_prompt(session.variant, target);
        self.gate.send_prompt(session.identity, prompt, options).await
    }
}
