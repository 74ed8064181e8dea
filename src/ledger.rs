//! Permanent registration and application logs.
//!
//! Two unbounded in-memory ordered logs, one per form variant. Records
//! are immutable once appended; insertion order is submission order.
//! The conversational path appends, everything else only reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::gateway::{AttachmentRef, UserId};

/// Submitted event registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub identity: UserId,
    pub display_name: String,
    pub handle: Option<String>,
    pub contact_phone: String,
    pub event: String,
    pub needs_access_pass: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Submitted vacancy application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub identity: UserId,
    pub display_name: String,
    pub handle: Option<String>,
    pub contact_phone: String,
    pub vacancy: String,
    pub about: String,
    pub attachment: AttachmentRef,
    pub submitted_at: DateTime<Utc>,
}

/// Append-only store for both permanent logs.
pub struct Ledger {
    registrations: Mutex<Vec<RegistrationRecord>>,
    applications: Mutex<Vec<ApplicationRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Vec::new()),
            applications: Mutex::new(Vec::new()),
        }
    }

    pub async fn append_registration(&self, record: RegistrationRecord) {
        self.registrations.lock().await.push(record);
    }

    pub async fn append_application(&self, record: ApplicationRecord) {
        self.applications.lock().await.push(record);
    }

    /// Snapshot of the registration log in submission order.
    pub async fn registrations(&self) -> Vec<RegistrationRecord> {
        self.registrations.lock().await.clone()
    }

    /// Snapshot of the application log in submission order.
    pub async fn applications(&self) -> Vec<ApplicationRecord> {
        self.applications.lock().await.clone()
    }

    /// Registrations submitted at or after `cutoff`, for digest reports.
    pub async fn registrations_since(&self, cutoff: DateTime<Utc>) -> Vec<RegistrationRecord> {
        self.registrations
            .lock()
            .await
            .iter()
            .filter(|r| r.submitted_at >= cutoff)
            .cloned()
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
