//! Background scheduler: weekly digest and periodic reminders.
//!
//! Runs on a fixed one-second tick in its own task. It only reads the
//! permanent logs, the directories, and its own settings; it never
//! touches session records.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc, Weekday};
use tokio::sync::{Mutex, RwLock};

use crate::config::{MailingConfig, ReminderConfig};
use crate::directory::{AdminDirectory, SubscriberList};
use crate::gateway::{MessageGate, PromptOptions};
use crate::ledger::Ledger;
use crate::report::ReportExporter;

/// When and whether the weekly digest goes out.
#[derive(Debug, Clone)]
pub struct MailingSettings {
    pub enabled: bool,
    pub day: Weekday,
    pub time: NaiveTime,
}

/// What and how often subscribers are reminded.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub text: Option<String>,
    /// Weeks between reminders (1, 2, or 3).
    pub frequency_weeks: u32,
    pub last_sent: Option<DateTime<Utc>>,
}

/// Parse a weekday from its English or Russian name.
pub fn parse_weekday(text: &str) -> Option<Weekday> {
    let lowered = text.trim().to_lowercase();
    match lowered.as_str() {
        "понедельник" => Some(Weekday::Mon),
        "вторник" => Some(Weekday::Tue),
        "среда" => Some(Weekday::Wed),
        "четверг" => Some(Weekday::Thu),
        "пятница" => Some(Weekday::Fri),
        "суббота" => Some(Weekday::Sat),
        "воскресенье" => Some(Weekday::Sun),
        other => other.parse().ok(),
    }
}

/// Tick-driven digest and reminder sender.
pub struct Scheduler {
    mailing: RwLock<MailingSettings>,
    reminder: RwLock<ReminderSettings>,
    /// Day the digest last went out; at most one digest per day.
    last_digest: Mutex<Option<NaiveDate>>,
    ledger: Arc<Ledger>,
    directory: Arc<AdminDirectory>,
    subscribers: Arc<SubscriberList>,
    gate: Arc<dyn MessageGate>,
    exporter: Arc<dyn ReportExporter>,
}

impl Scheduler {
    pub fn new(
        mailing: &MailingConfig,
        reminder: &ReminderConfig,
        ledger: Arc<Ledger>,
        directory: Arc<AdminDirectory>,
        subscribers: Arc<SubscriberList>,
        gate: Arc<dyn MessageGate>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            mailing: RwLock::new(MailingSettings {
                enabled: mailing.enabled,
                day: mailing.day,
                time: mailing.time,
            }),
            reminder: RwLock::new(ReminderSettings {
                text: reminder.text.clone(),
                frequency_weeks: reminder.frequency_weeks,
                last_sent: None,
            }),
            last_digest: Mutex::new(None),
            ledger,
            directory,
            subscribers,
            gate,
            exporter,
        }
    }

    /// Run the tick loop until the process exits.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            interval.tick().await;
            self.tick(Local::now().naive_local().date(), Local::now().time(), Utc::now())
                .await;
        }
    }

    /// One scheduler pass; separated from the loop for tests.
    pub async fn tick(&self, today: NaiveDate, time_of_day: NaiveTime, now: DateTime<Utc>) {
        if self.digest_due(today, time_of_day).await {
            self.send_weekly_digest(now).await;
        }
        self.maybe_send_reminders(now).await;
    }

    async fn digest_due(&self, today: NaiveDate, time_of_day: NaiveTime) -> bool {
        use chrono::Datelike;

        let mailing = self.mailing.read().await;
        if !mailing.enabled || today.weekday() != mailing.day || time_of_day < mailing.time {
            return false;
        }
        drop(mailing);

        let mut last = self.last_digest.lock().await;
        if *last == Some(today) {
            return false;
        }
        *last = Some(today);
        true
    }

    async fn send_weekly_digest(&self, now: DateTime<Utc>) {
        let recent = self
            .ledger
            .registrations_since(now - Duration::days(7))
            .await;
        if recent.is_empty() {
            tracing::debug!("no registrations this week, digest skipped");
            return;
        }

        let attachment = match self.exporter.export_registrations(&recent).await {
            Ok(attachment) => attachment,
            Err(e) => {
                tracing::error!("weekly digest export failed: {}", e);
                return;
            }
        };

        for admin in self.directory.admin_ids().await {
            if let Err(e) = self
                .gate
                .send_file(
                    admin,
                    &attachment,
                    Some("📊 Еженедельный отчёт по регистрациям"),
                    PromptOptions::none(),
                )
                .await
            {
                tracing::warn!(admin = %admin, "failed to deliver digest: {}", e);
            }
        }
        tracing::info!(records = recent.len(), "weekly digest sent");
    }

    async fn maybe_send_reminders(&self, now: DateTime<Utc>) {
        let (text, due) = {
            let reminder = self.reminder.read().await;
            let Some(text) = reminder.text.clone() else {
                return;
            };
            let due = match reminder.last_sent {
                None => true,
                Some(last) => now - last >= Duration::weeks(reminder.frequency_weeks as i64),
            };
            (text, due)
        };
        if !due {
            return;
        }

        let subscribers = self.subscribers.snapshot().await;
        if subscribers.is_empty() {
            return;
        }

        let body = format!("⏰ Напоминание:\n\n{}", text);
        for user in subscribers {
            if let Err(e) = self
                .gate
                .send_prompt(user, &body, PromptOptions::none())
                .await
            {
                tracing::warn!(user = %user, "reminder delivery failed, dropping subscriber: {}", e);
                self.subscribers.discard(user).await;
            }
        }

        self.reminder.write().await.last_sent = Some(now);
        tracing::info!("reminders sent");
    }

    // Settings accessors used by the admin command surface.

    pub async fn mailing_settings(&self) -> MailingSettings {
        self.mailing.read().await.clone()
    }

    pub async fn reminder_settings(&self) -> ReminderSettings {
        self.reminder.read().await.clone()
    }

    pub async fn set_mailing_enabled(&self, enabled: bool) {
        self.mailing.write().await.enabled = enabled;
    }

    pub async fn set_mailing_day(&self, day: Weekday) {
        self.mailing.write().await.day = day;
    }

    pub async fn set_mailing_time(&self, time: NaiveTime) {
        self.mailing.write().await.time = time;
    }

    pub async fn set_reminder_text(&self, text: String) {
        self.reminder.write().await.text = Some(text);
    }

    pub async fn set_reminder_frequency(&self, weeks: u32) {
        self.reminder.write().await.frequency_weeks = weeks;
    }
}
