//! Outer dispatch point.
//!
//! Every inbound reply passes through [`Dispatcher::handle`] exactly
//! once: commands first, then form-start buttons, then the open session
//! (whose cursor interprets the reply), then the fallback responder.
//! Delivery errors are logged here and never crash the loop.

use std::sync::Arc;

use chrono::NaiveTime;

use crate::directory::{AdminDirectory, SubscriberList};
use crate::error::GateError;
use crate::flow::{prompts, Flow};
use crate::gateway::{IncomingMessage, MessageGate, PromptOptions, UserId};
use crate::ledger::Ledger;
use crate::relay::Relay;
use crate::report::ReportExporter;
use crate::sched::{parse_weekday, Scheduler};
use crate::session::{FormVariant, SessionStore};

const MAIN_ADMIN_ONLY: &str = "❌ Эта команда доступна только главному администратору";
const ADMIN_HINT: &str = "🛠 Панель администратора. Команды:\n\
    /report — выгрузка регистраций\n\
    /status — состояние бота\n\
    /admins, /add_admin <id>, /remove_admin <id>\n\
    /add_channel <id>, /remove_channel <id>\n\
    /mailing on|off, /mailing_day <день>, /mailing_time <ЧЧ:ММ>\n\
    /reminder_text <текст>, /reminder_freq <1|2|3>";

/// Routes every inbound message to the right handler.
pub struct Dispatcher {
    gate: Arc<dyn MessageGate>,
    store: Arc<SessionStore>,
    flow: Flow,
    directory: Arc<AdminDirectory>,
    subscribers: Arc<SubscriberList>,
    relay: Arc<Relay>,
    scheduler: Arc<Scheduler>,
    ledger: Arc<Ledger>,
    exporter: Arc<dyn ReportExporter>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gate: Arc<dyn MessageGate>,
        store: Arc<SessionStore>,
        flow: Flow,
        directory: Arc<AdminDirectory>,
        subscribers: Arc<SubscriberList>,
        relay: Arc<Relay>,
        scheduler: Arc<Scheduler>,
        ledger: Arc<Ledger>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            gate,
            store,
            flow,
            directory,
            subscribers,
            relay,
            scheduler,
            ledger,
            exporter,
        }
    }

    /// Process one inbound reply to completion.
    ///
    /// The never-crash boundary: any error surfacing here is logged and
    /// the loop continues.
    pub async fn handle(&self, msg: IncomingMessage) {
        if let Err(e) = self.route(&msg).await {
            tracing::error!(user = %msg.identity, "dispatch failed: {}", e);
        }
    }

    async fn route(&self, msg: &IncomingMessage) -> Result<(), GateError> {
        let identity = msg.identity;
        let text = msg.text.as_deref().map(str::trim).unwrap_or("");

        if text.starts_with('/') {
            return self.handle_command(identity, text).await;
        }

        // Form-start buttons win over an open session: starting a new
        // form overwrites any prior incomplete one.
        if !self.directory.is_admin(identity).await {
            if text == prompts::BTN_START_EVENT || text == prompts::BTN_REGISTER_FROM_POST {
                return self
                    .flow
                    .start_form(identity, FormVariant::Event, msg.handle.clone())
                    .await;
            }
            if text == prompts::BTN_START_VACANCY {
                return self
                    .flow
                    .start_form(identity, FormVariant::Vacancy, msg.handle.clone())
                    .await;
            }
        }

        if self.store.contains(identity).await {
            return self.flow.advance(msg).await;
        }

        self.fallback(identity).await
    }

    /// Generic responder for input outside any active step.
    async fn fallback(&self, identity: UserId) -> Result<(), GateError> {
        if self.directory.is_admin(identity).await {
            self.gate
                .send_prompt(identity, ADMIN_HINT, PromptOptions::none())
                .await
        } else {
            self.gate
                .send_prompt(identity, prompts::STALE_SESSION, PromptOptions::none())
                .await
        }
    }

    async fn handle_command(&self, identity: UserId, text: &str) -> Result<(), GateError> {
        let mut parts = text.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).unwrap_or("");

        match command {
            "/start" => self.cmd_start(identity).await,
            "/unsubscribe" => self.cmd_unsubscribe(identity).await,
            "/report" => {
                if !self.directory.is_admin(identity).await {
                    return self.fallback(identity).await;
                }
                self.cmd_report(identity).await
            }
            "/status" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_status(identity).await
            }
            "/admins" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_list_admins(identity).await
            }
            "/add_admin" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_add_admin(identity, arg).await
            }
            "/remove_admin" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_remove_admin(identity, arg).await
            }
            "/add_channel" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_add_channel(identity, arg).await
            }
            "/remove_channel" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_remove_channel(identity, arg).await
            }
            "/mailing" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_mailing(identity, arg).await
            }
            "/mailing_day" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_mailing_day(identity, arg).await
            }
            "/mailing_time" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_mailing_time(identity, arg).await
            }
            "/reminder_text" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_reminder_text(identity, arg).await
            }
            "/reminder_freq" => {
                if !self.directory.is_main_admin(identity).await {
                    return self.reply(identity, MAIN_ADMIN_ONLY).await;
                }
                self.cmd_reminder_freq(identity, arg).await
            }
            _ => self.fallback(identity).await,
        }
    }

    async fn reply(&self, identity: UserId, text: &str) -> Result<(), GateError> {
        self.gate
            .send_prompt(identity, text, PromptOptions::none())
            .await
    }

    async fn cmd_start(&self, identity: UserId) -> Result<(), GateError> {
        if self.directory.is_admin(identity).await {
            return self.reply(identity, ADMIN_HINT).await;
        }
        self.subscribers.subscribe(identity).await;
        self.gate
            .send_prompt(identity, prompts::USER_MENU, prompts::user_menu_options())
            .await?;
        self.reply(identity, prompts::SUBSCRIBED_NOTE).await
    }

    async fn cmd_unsubscribe(&self, identity: UserId) -> Result<(), GateError> {
        if self.subscribers.unsubscribe(identity).await {
            self.reply(identity, prompts::UNSUBSCRIBED).await
        } else {
            self.reply(identity, prompts::NOT_SUBSCRIBED).await
        }
    }

    async fn cmd_report(&self, identity: UserId) -> Result<(), GateError> {
        let records = self.ledger.registrations().await;
        if records.is_empty() {
            return self.reply(identity, "ℹ️ Нет данных о регистрациях").await;
        }
        match self.exporter.export_registrations(&records).await {
            Ok(attachment) => {
                self.gate
                    .send_file(
                        identity,
                        &attachment,
                        Some("📊 Список регистраций"),
                        PromptOptions::none(),
                    )
                    .await
            }
            Err(e) => {
                tracing::error!("registration export failed: {}", e);
                self.reply(identity, "⚠️ Не удалось сформировать отчёт").await
            }
        }
    }

    async fn cmd_status(&self, identity: UserId) -> Result<(), GateError> {
        let mailing = self.scheduler.mailing_settings().await;
        let reminder = self.scheduler.reminder_settings().await;
        let channels = self.relay.monitored_channels().await;

        let mut text = format!(
            "📢 Статус:\n\n\
             Подписчиков на рассылку: {}\n\
             Отслеживаемых каналов: {}\n\
             Регистраций: {}\n\
             Заявок на вакансии: {}\n\n\
             📧 Рассылка: {} ({:?} в {})\n\
             ⏰ Напоминание: {} (раз в {} нед., последняя отправка: {})",
            self.subscribers.len().await,
            channels.len(),
            self.ledger.registrations().await.len(),
            self.ledger.applications().await.len(),
            if mailing.enabled {
                "включена"
            } else {
                "выключена"
            },
            mailing.day,
            mailing.time.format("%H:%M"),
            reminder.text.as_deref().unwrap_or("не установлено"),
            reminder.frequency_weeks,
            reminder
                .last_sent
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "ещё не отправлялось".to_string()),
        );
        if !channels.is_empty() {
            text.push_str("\n\nКаналы:\n");
            for id in channels {
                text.push_str(&format!("- {}\n", id));
            }
        }
        self.reply(identity, &text).await
    }

    async fn cmd_list_admins(&self, identity: UserId) -> Result<(), GateError> {
        let mut text = "👥 Список администраторов:\n\n".to_string();
        for (id, role) in self.directory.roster().await {
            text.push_str(&format!("{} ({})\n", id, role.as_str()));
        }
        self.reply(identity, &text).await
    }

    async fn cmd_add_admin(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Ok(id) = arg.parse::<i64>() else {
            return self.reply(identity, "❌ ID должен состоять только из цифр").await;
        };
        if self.directory.add(UserId(id)).await {
            self.reply(
                identity,
                &format!("✅ Пользователь {} добавлен как администратор", id),
            )
            .await
        } else {
            self.reply(identity, "⚠️ Этот пользователь уже администратор")
                .await
        }
    }

    async fn cmd_remove_admin(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Ok(id) = arg.parse::<i64>() else {
            return self.reply(identity, "❌ ID должен состоять только из цифр").await;
        };
        match self.directory.remove(UserId(id)).await {
            Ok(()) => {
                self.reply(identity, &format!("✅ Администратор {} удалён", id))
                    .await
            }
            Err(e) => {
                self.reply(identity, &format!("❌ Нельзя удалить: {}", e))
                    .await
            }
        }
    }

    async fn cmd_add_channel(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Ok(id) = arg.parse::<i64>() else {
            return self.reply(identity, "❌ ID канала должен быть числом").await;
        };
        if self.relay.add_channel(id).await {
            self.reply(
                identity,
                &format!("✅ Канал {} добавлен для мониторинга", id),
            )
            .await
        } else {
            self.reply(identity, "ℹ️ Канал уже отслеживается").await
        }
    }

    async fn cmd_remove_channel(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Ok(id) = arg.parse::<i64>() else {
            return self.reply(identity, "❌ ID канала должен быть числом").await;
        };
        if self.relay.remove_channel(id).await {
            self.reply(identity, "✅ Канал удалён из мониторинга").await
        } else {
            self.reply(identity, "❌ Канал не отслеживается").await
        }
    }

    async fn cmd_mailing(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let enabled = match arg {
            "on" => true,
            "off" => false,
            _ => {
                return self
                    .reply(identity, "❌ Используйте /mailing on или /mailing off")
                    .await
            }
        };
        self.scheduler.set_mailing_enabled(enabled).await;
        self.reply(
            identity,
            if enabled {
                "✅ Рассылка теперь включена"
            } else {
                "✅ Рассылка теперь выключена"
            },
        )
        .await
    }

    async fn cmd_mailing_day(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Some(day) = parse_weekday(arg) else {
            return self.reply(identity, "❌ Неверный день").await;
        };
        self.scheduler.set_mailing_day(day).await;
        self.reply(identity, &format!("✅ День рассылки изменён на {}", arg))
            .await
    }

    async fn cmd_mailing_time(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        let Ok(time) = NaiveTime::parse_from_str(arg, "%H:%M") else {
            return self
                .reply(identity, "❌ Неверный формат времени. Используйте ЧЧ:ММ")
                .await;
        };
        self.scheduler.set_mailing_time(time).await;
        self.reply(identity, &format!("✅ Время рассылки изменено на {}", arg))
            .await
    }

    async fn cmd_reminder_text(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        if arg.is_empty() {
            return self
                .reply(identity, "❌ Укажите текст: /reminder_text <текст>")
                .await;
        }
        self.scheduler.set_reminder_text(arg.to_string()).await;
        self.reply(identity, "✅ Текст напоминания сохранен").await
    }

    async fn cmd_reminder_freq(&self, identity: UserId, arg: &str) -> Result<(), GateError> {
        match arg.parse::<u32>() {
            Ok(weeks) if (1..=3).contains(&weeks) => {
                self.scheduler.set_reminder_frequency(weeks).await;
                self.reply(
                    identity,
                    &format!("✅ Частота напоминаний установлена: {} нед.", weeks),
                )
                .await
            }
            _ => self.reply(identity, "❌ Неверный выбор").await,
        }
    }
}
