//! Session store: one mutable conversation record per active user.
//!
//! A session is created when a form starts, mutated as the form state
//! machine advances, and removed exactly once by the submission
//! finalizer. Abandoned sessions simply stay in the store until the
//! process restarts; there is no timeout and no persistence.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::gateway::{AttachmentRef, UserId};

/// Which field set and prompt sequence a session follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVariant {
    Event,
    Vacancy,
}

impl FormVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Vacancy => "vacancy",
        }
    }
}

impl std::fmt::Display for FormVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field a running edit sub-dialog is targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Name,
    Phone,
    /// The event name or vacancy name, depending on the variant.
    Target,
    Pass,
    About,
    Cv,
    Handle,
}

/// State-machine cursor: names the next expected input.
///
/// The source program encoded `Review` and `EditMenu` as registered
/// continuations; here they are explicit so the cursor alone decides
/// how the next reply is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Name,
    Phone,
    /// Event name or vacancy name, depending on the variant.
    Target,
    Pass,
    About,
    Cv,
    /// Waiting for submit/edit at the rendered summary.
    Review,
    /// Waiting for a field choice in the edit menu.
    EditMenu,
    /// Waiting for the replacement value of one field.
    Edit(EditTarget),
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Target => "target",
            Self::Pass => "pass",
            Self::About => "about",
            Self::Cv => "cv",
            Self::Review => "review",
            Self::EditMenu => "edit_menu",
            Self::Edit(EditTarget::Name) => "edit_name",
            Self::Edit(EditTarget::Phone) => "edit_phone",
            Self::Edit(EditTarget::Target) => "edit_target",
            Self::Edit(EditTarget::Pass) => "edit_pass",
            Self::Edit(EditTarget::About) => "edit_about",
            Self::Edit(EditTarget::Cv) => "edit_cv",
            Self::Edit(EditTarget::Handle) => "edit_handle",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user in-progress form state.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub identity: UserId,
    pub variant: FormVariant,
    pub display_name: Option<String>,
    pub contact_phone: Option<String>,
    /// Event name or vacancy name, depending on the variant.
    pub target_name: Option<String>,
    /// Event-only.
    pub needs_access_pass: Option<bool>,
    /// Vacancy-only.
    pub about_text: Option<String>,
    /// Vacancy-only, required before review.
    pub attachment: Option<AttachmentRef>,
    /// Optional public username, captured at session start, editable.
    pub handle: Option<String>,
    pub step: Step,
    /// True while the user is inside the edit sub-dialog; suppresses the
    /// generic fallback responder.
    pub reviewing: bool,
}

impl SessionRecord {
    pub fn new(identity: UserId, variant: FormVariant, handle: Option<String>) -> Self {
        Self {
            identity,
            variant,
            display_name: None,
            contact_phone: None,
            target_name: None,
            needs_access_pass: None,
            about_text: None,
            attachment: None,
            handle,
            step: Step::Name,
            reviewing: false,
        }
    }

    /// All required fields for the active variant are collected.
    pub fn ready_for_review(&self) -> bool {
        let common = self.display_name.is_some()
            && self.contact_phone.is_some()
            && self.target_name.is_some();
        match self.variant {
            FormVariant::Event => common && self.needs_access_pass.is_some(),
            FormVariant::Vacancy => {
                common && self.about_text.is_some() && self.attachment.is_some()
            }
        }
    }
}

/// Synchronized per-identity session map.
///
/// The conversational path is the only writer; the background scheduler
/// never touches sessions. The mutex serializes per-identity access if
/// the dispatcher is ever driven concurrently.
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, SessionRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for `identity`, overwriting any prior incomplete
    /// one. No field carries over.
    pub async fn open(&self, identity: UserId, variant: FormVariant, handle: Option<String>) {
        let mut map = self.inner.lock().await;
        map.insert(identity, SessionRecord::new(identity, variant, handle));
    }

    /// Snapshot of the session for `identity`, if one is open.
    pub async fn get(&self, identity: UserId) -> Option<SessionRecord> {
        self.inner.lock().await.get(&identity).cloned()
    }

    /// Whether `identity` currently has an open session.
    pub async fn contains(&self, identity: UserId) -> bool {
        self.inner.lock().await.contains_key(&identity)
    }

    /// Apply `f` to the open session for `identity`.
    ///
    /// Returns false when no session is open (stale reference).
    pub async fn update<F>(&self, identity: UserId, f: F) -> bool
    where
        F: FnOnce(&mut SessionRecord),
    {
        let mut map = self.inner.lock().await;
        match map.get_mut(&identity) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Remove and return the session for `identity`.
    pub async fn close(&self, identity: UserId) -> Option<SessionRecord> {
        self.inner.lock().await.remove(&identity)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
