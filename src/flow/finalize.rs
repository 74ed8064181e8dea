//! Submission finalizer.
//!
//! Converts the in-progress session into a permanent record, appends it
//! to the matching log, and removes the session unconditionally, even
//! if downstream notifications fail. Submission success is the append,
//! not delivery.

use chrono::Utc;

use super::prompts;
use super::Flow;
use crate::error::GateError;
use crate::gateway::PromptOptions;
use crate::ledger::{ApplicationRecord, RegistrationRecord};
use crate::session::{FormVariant, SessionRecord};

impl Flow {
    /// Commit the reviewed session as a permanent record.
    ///
    /// Delivery failures (confirmation, admin notifications) are logged
    /// and swallowed; they never roll back the append.
    pub(crate) async fn finalize(&self, session: &SessionRecord) -> Result<(), GateError> {
        let identity = session.identity;
        let submitted_at = Utc::now();

        match session.variant {
            FormVariant::Event => {
                self.ledger
                    .append_registration(RegistrationRecord {
                        identity,
                        display_name: session.display_name.clone().unwrap_or_default(),
                        handle: session.handle.clone(),
                        contact_phone: session.contact_phone.clone().unwrap_or_default(),
                        event: session.target_name.clone().unwrap_or_default(),
                        needs_access_pass: session.needs_access_pass.unwrap_or(false),
                        submitted_at,
                    })
                    .await;
            }
            FormVariant::Vacancy => {
                self.ledger
                    .append_application(ApplicationRecord {
                        identity,
                        display_name: session.display_name.clone().unwrap_or_default(),
                        handle: session.handle.clone(),
                        contact_phone: session.contact_phone.clone().unwrap_or_default(),
                        vacancy: session.target_name.clone().unwrap_or_default(),
                        about: session.about_text.clone().unwrap_or_default(),
                        attachment: session
                            .attachment
                            .clone()
                            .unwrap_or_else(|| crate::gateway::AttachmentRef(String::new())),
                        submitted_at,
                    })
                    .await;
            }
        }

        self.store.close(identity).await;
        tracing::info!(user = %identity, variant = %session.variant, "submission committed");

        let thanks = match session.variant {
            FormVariant::Event => prompts::THANKS_EVENT,
            FormVariant::Vacancy => prompts::THANKS_VACANCY,
        };
        let confirmation = format!("{}\n\n{}", thanks, prompts::render_summary(session));
        if let Err(e) = self
            .gate
            .send_prompt(identity, &confirmation, PromptOptions::remove_keyboard())
            .await
        {
            tracing::warn!(user = %identity, "failed to send confirmation: {}", e);
        }

        self.notify_admins(session).await;

        if let Err(e) = self
            .gate
            .send_prompt(identity, prompts::USER_MENU, prompts::user_menu_options())
            .await
        {
            tracing::warn!(user = %identity, "failed to re-show menu: {}", e);
        }

        Ok(())
    }

    async fn notify_admins(&self, session: &SessionRecord) {
        let handle = session
            .handle
            .as_deref()
            .unwrap_or("не указан");
        let notification = match session.variant {
            FormVariant::Event => format!(
                "📝 Новая регистрация на мероприятие:\n\
                 👤 ФИО: {}\n\
                 👤 Username: @{}\n\
                 📱 Телефон: {}\n\
                 🎯 Мероприятие: {}\n\
                 🪪 Пропуск: {}",
                session.display_name.as_deref().unwrap_or_default(),
                handle,
                session.contact_phone.as_deref().unwrap_or_default(),
                session.target_name.as_deref().unwrap_or_default(),
                if session.needs_access_pass.unwrap_or(false) {
                    "Да"
                } else {
                    "Нет"
                },
            ),
            FormVariant::Vacancy => format!(
                "📄 Новая заявка на вакансию:\n\
                 👤 ФИО: {}\n\
                 📱 Телефон: {}\n\
                 👤 Username: @{}\n\
                 💼 Вакансия: {}\n\
                 📝 О себе: {}",
                session.display_name.as_deref().unwrap_or_default(),
                session.contact_phone.as_deref().unwrap_or_default(),
                handle,
                session.target_name.as_deref().unwrap_or_default(),
                session.about_text.as_deref().unwrap_or_default(),
            ),
        };

        for admin in self.directory.admin_ids().await {
            if let Err(e) = self
                .gate
                .send_prompt(admin, &notification, PromptOptions::none())
                .await
            {
                tracing::warn!(admin = %admin, "failed to notify admin: {}", e);
                continue;
            }
            if session.variant == FormVariant::Vacancy {
                if let Some(cv) = &session.attachment {
                    if let Err(e) = self
                        .gate
                        .send_file(admin, cv, None, PromptOptions::none())
                        .await
                    {
                        tracing::warn!(admin = %admin, "failed to forward CV: {}", e);
                    }
                }
            }
        }
    }
}
