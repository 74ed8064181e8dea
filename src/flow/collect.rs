//! Per-step answer collection.
//!
//! Each step validates the reply, writes it into the session, and
//! computes the next cursor from the fixed per-variant ordering:
//! Event `name, phone, event, pass` then review; Vacancy `name, phone,
//! vacancy, about, cv` then review. Validation failures re-issue the
//! same prompt without advancing; retries are unbounded.

use super::prompts;
use super::Flow;
use crate::error::GateError;
use crate::gateway::{IncomingMessage, PromptOptions};
use crate::session::{FormVariant, SessionRecord, Step};

impl Flow {
    pub(crate) async fn collect_step(
        &self,
        session: &SessionRecord,
        msg: &IncomingMessage,
    ) -> Result<(), GateError> {
        let identity = session.identity;

        match session.step {
            Step::Name => {
                let Some(text) = msg.text.clone() else {
                    return self.reprompt(identity, prompts::PROMPT_NAME).await;
                };
                self.store
                    .update(identity, |s| {
                        s.display_name = Some(text);
                        s.step = Step::Phone;
                    })
                    .await;
                self.gate
                    .send_prompt(identity, prompts::PROMPT_PHONE, PromptOptions::none())
                    .await
            }
            Step::Phone => {
                let Some(text) = msg.text.clone() else {
                    return self.reprompt(identity, prompts::PROMPT_PHONE).await;
                };
                self.store
                    .update(identity, |s| {
                        s.contact_phone = Some(text);
                        s.step = Step::Target;
                    })
                    .await;
                let prompt = match session.variant {
                    FormVariant::Event => prompts::PROMPT_EVENT,
                    FormVariant::Vacancy => prompts::PROMPT_VACANCY,
                };
                self.gate
                    .send_prompt(identity, prompt, PromptOptions::none())
                    .await
            }
            Step::Target => {
                let Some(text) = msg.text.clone() else {
                    let prompt = match session.variant {
                        FormVariant::Event => prompts::PROMPT_EVENT,
                        FormVariant::Vacancy => prompts::PROMPT_VACANCY,
                    };
                    return self.reprompt(identity, prompt).await;
                };
                match session.variant {
                    FormVariant::Event => {
                        self.store
                            .update(identity, |s| {
                                s.target_name = Some(text);
                                s.step = Step::Pass;
                            })
                            .await;
                        self.gate
                            .send_prompt(
                                identity,
                                prompts::PROMPT_PASS,
                                PromptOptions::buttons([prompts::BTN_YES, prompts::BTN_NO]),
                            )
                            .await
                    }
                    FormVariant::Vacancy => {
                        self.store
                            .update(identity, |s| {
                                s.target_name = Some(text);
                                s.step = Step::About;
                            })
                            .await;
                        self.gate
                            .send_prompt(identity, prompts::PROMPT_ABOUT, PromptOptions::none())
                            .await
                    }
                }
            }
            Step::Pass => {
                // Permissive coercion: anything but an affirmative token
                // is "no", including a text-less reply.
                let needs_pass = msg.text.as_deref().map(prompts::parse_yes).unwrap_or(false);
                self.store
                    .update(identity, |s| s.needs_access_pass = Some(needs_pass))
                    .await;
                self.enter_review(identity).await
            }
            Step::About => {
                let Some(text) = msg.text.clone() else {
                    return self.reprompt(identity, prompts::PROMPT_ABOUT).await;
                };
                self.store
                    .update(identity, |s| {
                        s.about_text = Some(text);
                        s.step = Step::Cv;
                    })
                    .await;
                self.gate
                    .send_prompt(identity, prompts::PROMPT_CV, PromptOptions::none())
                    .await
            }
            Step::Cv => {
                let Some(attachment) = msg.attachment.clone() else {
                    // Missing attachment: same prompt, cursor unchanged.
                    return self.reprompt(identity, prompts::PROMPT_CV).await;
                };
                self.store
                    .update(identity, |s| s.attachment = Some(attachment))
                    .await;
                self.enter_review(identity).await
            }
            Step::Review | Step::EditMenu | Step::Edit(_) => unreachable!("routed by advance"),
        }
    }

    async fn reprompt(
        &self,
        identity: crate::gateway::UserId,
        prompt: &str,
    ) -> Result<(), GateError> {
        tracing::debug!(user = %identity, "validation failed, re-issuing prompt");
        self.gate
            .send_prompt(identity, prompt, PromptOptions::none())
            .await
    }
}
