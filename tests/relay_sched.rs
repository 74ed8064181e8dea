//! Tests for the post relay and the background scheduler.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use common::{RecordingGate, Sent, StubExporter};
use intake_bot::config::{MailingConfig, ReminderConfig};
use intake_bot::directory::{AdminDirectory, SubscriberList};
use intake_bot::flow::prompts;
use intake_bot::gateway::{AttachmentRef, MessageGate, PromptOptions, UserId};
use intake_bot::ledger::{Ledger, RegistrationRecord};
use intake_bot::relay::{Post, PostBody, Relay};
use intake_bot::report::ReportExporter;
use intake_bot::sched::Scheduler;

fn text_post(chat_id: i64, message_id: i64, text: &str) -> Post {
    Post {
        chat_id,
        chat_title: "Новости клуба".to_string(),
        message_id,
        body: PostBody::Text(text.to_string()),
    }
}

async fn relay_with_subscribers(ids: &[i64]) -> (Arc<RecordingGate>, Arc<SubscriberList>, Relay) {
    let gate = Arc::new(RecordingGate::new());
    let subscribers = Arc::new(SubscriberList::new());
    for id in ids {
        subscribers.subscribe(UserId(*id)).await;
    }
    let relay = Relay::new(gate.clone(), subscribers.clone());
    (gate, subscribers, relay)
}

#[tokio::test]
async fn channel_post_fans_out_with_register_button() {
    let (gate, _, relay) = relay_with_subscribers(&[1, 2]).await;
    relay.add_channel(-100).await;

    relay
        .relay_channel_post(&text_post(-100, 10, "Открыта запись на хакатон"))
        .await;

    for id in [1_i64, 2] {
        let text = gate.last_prompt_to(UserId(id)).unwrap();
        assert!(text.contains("Открыта запись на хакатон"));
        assert!(text.contains("Новости клуба"));
        assert_eq!(
            gate.last_options_to(UserId(id)).unwrap(),
            PromptOptions::buttons([prompts::BTN_REGISTER_FROM_POST])
        );
    }
}

#[tokio::test]
async fn unmonitored_channel_is_ignored() {
    let (gate, _, relay) = relay_with_subscribers(&[1]).await;

    relay
        .relay_channel_post(&text_post(-200, 10, "мимо"))
        .await;

    assert_eq!(gate.total_sent(), 0);
}

#[tokio::test]
async fn duplicate_message_ids_are_delivered_once() {
    let (gate, _, relay) = relay_with_subscribers(&[1]).await;
    relay.add_channel(-100).await;

    relay.relay_channel_post(&text_post(-100, 10, "раз")).await;
    relay.relay_channel_post(&text_post(-100, 10, "раз")).await;

    assert_eq!(gate.total_sent(), 1);
}

#[tokio::test]
async fn group_post_has_no_register_button() {
    let (gate, _, relay) = relay_with_subscribers(&[1]).await;

    relay.relay_group_post(&text_post(-300, 11, "обсуждаем")).await;

    assert_eq!(
        gate.last_options_to(UserId(1)).unwrap(),
        PromptOptions::none()
    );
}

#[tokio::test]
async fn unreachable_subscriber_is_dropped() {
    let (gate, subscribers, relay) = relay_with_subscribers(&[1, 2]).await;
    relay.add_channel(-100).await;
    gate.fail_sends_to(UserId(2));

    relay.relay_channel_post(&text_post(-100, 10, "пост")).await;

    assert_eq!(subscribers.snapshot().await, vec![UserId(1)]);
    assert!(gate.last_prompt_to(UserId(1)).is_some());
}

#[tokio::test]
async fn document_post_is_forwarded_with_caption() {
    let (gate, _, relay) = relay_with_subscribers(&[1]).await;
    relay.add_channel(-100).await;

    relay
        .relay_channel_post(&Post {
            chat_id: -100,
            chat_title: "Новости клуба".to_string(),
            message_id: 12,
            body: PostBody::Document {
                attachment: AttachmentRef("doc-7".to_string()),
                caption: Some("Программа мероприятия".to_string()),
            },
        })
        .await;

    let sent = gate.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Sent::File {
            to,
            attachment,
            caption,
        } => {
            assert_eq!(*to, UserId(1));
            assert_eq!(*attachment, AttachmentRef("doc-7".to_string()));
            let caption = caption.as_deref().unwrap();
            assert!(caption.contains("Программа мероприятия"));
            assert!(caption.contains("Новости клуба"));
        }
        other => panic!("expected a file delivery, got {:?}", other),
    }
}

#[tokio::test]
async fn seen_set_stays_bounded() {
    let (_, _, relay) = relay_with_subscribers(&[]).await;
    relay.add_channel(-100).await;

    for id in 0..1001_i64 {
        relay.relay_channel_post(&text_post(-100, id, "пост")).await;
    }

    assert_eq!(relay.seen_count().await, 901);
}

struct SchedHarness {
    gate: Arc<RecordingGate>,
    subscribers: Arc<SubscriberList>,
    ledger: Arc<Ledger>,
    scheduler: Scheduler,
}

fn sched_harness(mailing: MailingConfig, reminder: ReminderConfig, admins: &[i64]) -> SchedHarness {
    let gate = Arc::new(RecordingGate::new());
    let gate_dyn: Arc<dyn MessageGate> = gate.clone();
    let ledger = Arc::new(Ledger::new());
    let admin_ids: Vec<UserId> = admins.iter().map(|id| UserId(*id)).collect();
    let directory = Arc::new(AdminDirectory::new(&admin_ids));
    let subscribers = Arc::new(SubscriberList::new());
    let exporter: Arc<dyn ReportExporter> = Arc::new(StubExporter);
    let scheduler = Scheduler::new(
        &mailing,
        &reminder,
        ledger.clone(),
        directory,
        subscribers.clone(),
        gate_dyn,
        exporter,
    );
    SchedHarness {
        gate,
        subscribers,
        ledger,
        scheduler,
    }
}

fn sunday_noon() -> MailingConfig {
    MailingConfig {
        enabled: true,
        day: Weekday::Sun,
        time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    }
}

fn no_reminder() -> ReminderConfig {
    ReminderConfig {
        text: None,
        frequency_weeks: 1,
    }
}

fn registration(at: DateTime<Utc>) -> RegistrationRecord {
    RegistrationRecord {
        identity: UserId(5),
        display_name: "Иванов Иван".to_string(),
        handle: None,
        contact_phone: "+70000000000".to_string(),
        event: "Хакатон".to_string(),
        needs_access_pass: false,
        submitted_at: at,
    }
}

// 2026-08-30 is a Sunday.
fn a_sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
}

#[tokio::test]
async fn digest_goes_to_admins_once_per_day() {
    let h = sched_harness(sunday_noon(), no_reminder(), &[99]);
    let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
    h.ledger
        .append_registration(registration(now - Duration::days(1)))
        .await;

    // Before the configured time nothing happens.
    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(11, 59, 0).unwrap(), now)
        .await;
    assert_eq!(h.gate.total_sent(), 0);

    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(12, 0, 5).unwrap(), now)
        .await;
    assert_eq!(
        h.gate.files_to(UserId(99)),
        vec![AttachmentRef("report-1".to_string())]
    );

    // Later ticks on the same day do not resend.
    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(15, 0, 0).unwrap(), now)
        .await;
    assert_eq!(h.gate.files_to(UserId(99)).len(), 1);
}

#[tokio::test]
async fn digest_skipped_when_disabled_or_empty() {
    let mut mailing = sunday_noon();
    mailing.enabled = false;
    let h = sched_harness(mailing, no_reminder(), &[99]);
    let now = Utc.with_ymd_and_hms(2026, 8, 30, 13, 0, 0).unwrap();
    h.ledger
        .append_registration(registration(now - Duration::days(1)))
        .await;

    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(13, 0, 0).unwrap(), now)
        .await;
    assert_eq!(h.gate.total_sent(), 0);

    // Enabled but nothing registered this week: still nothing.
    let h = sched_harness(sunday_noon(), no_reminder(), &[99]);
    h.ledger
        .append_registration(registration(now - Duration::days(30)))
        .await;
    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(13, 0, 0).unwrap(), now)
        .await;
    assert_eq!(h.gate.total_sent(), 0);
}

#[tokio::test]
async fn reminder_respects_frequency() {
    let reminder = ReminderConfig {
        text: Some("Не забудьте про встречу".to_string()),
        frequency_weeks: 2,
    };
    let mut mailing = sunday_noon();
    mailing.enabled = false;
    let h = sched_harness(mailing, reminder, &[]);
    h.subscribers.subscribe(UserId(7)).await;

    let start = Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap();
    let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

    // First pass sends immediately.
    h.scheduler.tick(monday, ten, start).await;
    let sent = h.gate.prompts_to(UserId(7));
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Напоминание"));
    assert!(sent[0].contains("Не забудьте про встречу"));

    // One week later: not yet due at two-week frequency.
    h.scheduler.tick(monday, ten, start + Duration::weeks(1)).await;
    assert_eq!(h.gate.prompts_to(UserId(7)).len(), 1);

    // Two weeks later: due again.
    h.scheduler.tick(monday, ten, start + Duration::weeks(2)).await;
    assert_eq!(h.gate.prompts_to(UserId(7)).len(), 2);
}

#[tokio::test]
async fn reminder_without_text_never_fires() {
    let mut mailing = sunday_noon();
    mailing.enabled = false;
    let h = sched_harness(mailing, no_reminder(), &[]);
    h.subscribers.subscribe(UserId(7)).await;

    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(10, 0, 0).unwrap(), Utc::now())
        .await;
    assert_eq!(h.gate.total_sent(), 0);
}

#[tokio::test]
async fn unreachable_subscriber_dropped_from_reminders() {
    let reminder = ReminderConfig {
        text: Some("Встреча в пятницу".to_string()),
        frequency_weeks: 1,
    };
    let mut mailing = sunday_noon();
    mailing.enabled = false;
    let h = sched_harness(mailing, reminder, &[]);
    h.subscribers.subscribe(UserId(1)).await;
    h.subscribers.subscribe(UserId(2)).await;
    h.gate.fail_sends_to(UserId(2));

    h.scheduler
        .tick(a_sunday(), NaiveTime::from_hms_opt(10, 0, 0).unwrap(), Utc::now())
        .await;

    assert_eq!(h.subscribers.snapshot().await, vec![UserId(1)]);
    assert_eq!(h.gate.prompts_to(UserId(1)).len(), 1);
}
