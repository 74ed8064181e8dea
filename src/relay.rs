//! Channel and group post relay.
//!
//! Posts from monitored channels fan out to every subscriber with a
//! register button; group posts fan out without it. Message ids are
//! deduplicated in a bounded set, and subscribers that cannot be
//! reached are dropped from the list.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::directory::SubscriberList;
use crate::flow::prompts;
use crate::gateway::{AttachmentRef, MessageGate, PromptOptions, UserId};

/// Dedup set trims down to this many ids once the cap is exceeded.
const SEEN_CAP: usize = 1000;
const SEEN_TRIM: usize = 100;

/// One post picked up from a monitored channel or group.
#[derive(Debug, Clone)]
pub struct Post {
    pub chat_id: i64,
    pub chat_title: String,
    pub message_id: i64,
    pub body: PostBody,
}

/// Content of a relayed post.
#[derive(Debug, Clone)]
pub enum PostBody {
    Text(String),
    Photo {
        attachment: AttachmentRef,
        caption: Option<String>,
    },
    Document {
        attachment: AttachmentRef,
        caption: Option<String>,
    },
    Video {
        attachment: AttachmentRef,
        caption: Option<String>,
    },
}

impl PostBody {
    fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Photo { caption, .. }
            | Self::Document { caption, .. }
            | Self::Video { caption, .. } => {
                caption.as_deref().unwrap_or("📢 Новое сообщение из канала")
            }
        }
    }
}

/// Fan-out relay from monitored sources to subscribers.
pub struct Relay {
    gate: Arc<dyn MessageGate>,
    subscribers: Arc<SubscriberList>,
    monitored: RwLock<HashSet<i64>>,
    seen: Mutex<BTreeSet<i64>>,
}

impl Relay {
    pub fn new(gate: Arc<dyn MessageGate>, subscribers: Arc<SubscriberList>) -> Self {
        Self {
            gate,
            subscribers,
            monitored: RwLock::new(HashSet::new()),
            seen: Mutex::new(BTreeSet::new()),
        }
    }

    /// Returns false when the channel was already monitored.
    pub async fn add_channel(&self, channel_id: i64) -> bool {
        self.monitored.write().await.insert(channel_id)
    }

    /// Returns false when the channel was not monitored.
    pub async fn remove_channel(&self, channel_id: i64) -> bool {
        self.monitored.write().await.remove(&channel_id)
    }

    pub async fn monitored_channels(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.monitored.read().await.iter().copied().collect();
        ids.sort();
        ids
    }

    /// Relay a channel post to all subscribers, with a register button.
    ///
    /// Ignored when the channel is not monitored or the message id has
    /// been seen before.
    pub async fn relay_channel_post(&self, post: &Post) {
        if !self.monitored.read().await.contains(&post.chat_id) {
            tracing::debug!(channel = post.chat_id, "channel not monitored, post ignored");
            return;
        }
        if !self.mark_seen(post.message_id).await {
            tracing::debug!(message = post.message_id, "duplicate post ignored");
            return;
        }
        let caption_suffix = format!("📍 Канал: {}", post.chat_title);
        let options = PromptOptions::buttons([prompts::BTN_REGISTER_FROM_POST]);
        self.fan_out(post, &caption_suffix, options).await;
    }

    /// Relay a group post to all subscribers, without the button.
    pub async fn relay_group_post(&self, post: &Post) {
        if !self.mark_seen(post.message_id).await {
            tracing::debug!(message = post.message_id, "duplicate post ignored");
            return;
        }
        let caption_suffix = format!("📍 Чат: {}", post.chat_title);
        self.fan_out(post, &caption_suffix, PromptOptions::none()).await;
    }

    /// Record a message id; false when already present. Keeps the set
    /// bounded by discarding the oldest ids past the cap.
    async fn mark_seen(&self, message_id: i64) -> bool {
        let mut seen = self.seen.lock().await;
        if !seen.insert(message_id) {
            return false;
        }
        if seen.len() > SEEN_CAP {
            let cut: Vec<i64> = seen.iter().take(SEEN_TRIM).copied().collect();
            for id in cut {
                seen.remove(&id);
            }
        }
        true
    }

    async fn fan_out(&self, post: &Post, suffix: &str, options: PromptOptions) {
        for user in self.subscribers.snapshot().await {
            let result = match &post.body {
                PostBody::Text(text) => {
                    let body = format!(
                        "📢 Сообщение из канала '{}':\n\n{}",
                        post.chat_title, text
                    );
                    self.gate.send_prompt(user, &body, options.clone()).await
                }
                PostBody::Photo { attachment, .. } => {
                    let caption = format!("{}\n\n{}", post.body.text(), suffix);
                    self.gate
                        .send_photo(user, attachment, Some(&caption), options.clone())
                        .await
                }
                PostBody::Document { attachment, .. } => {
                    let caption = format!("{}\n\n{}", post.body.text(), suffix);
                    self.gate
                        .send_file(user, attachment, Some(&caption), options.clone())
                        .await
                }
                PostBody::Video { attachment, .. } => {
                    let caption = format!("{}\n\n{}", post.body.text(), suffix);
                    self.gate
                        .send_video(user, attachment, Some(&caption), options.clone())
                        .await
                }
            };
            if let Err(e) = result {
                tracing::warn!(user = %user, "relay delivery failed, dropping subscriber: {}", e);
                self.subscribers.discard(user).await;
            }
        }
    }

    /// Number of remembered message ids, for the status report.
    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }
}
