//! Administrator directory and subscriber list.
//!
//! Two-tier admin model: main administrators are fixed at startup and
//! can manage the directory; regular administrators only receive
//! notifications and reports. Subscribers receive relayed posts and
//! reminders and can be dropped when delivery to them fails.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::error::DirectoryError;
use crate::gateway::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRole {
    Main,
    Regular,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "главный",
            Self::Regular => "обычный",
        }
    }
}

/// Read-mostly registry of administrator identities.
pub struct AdminDirectory {
    admins: RwLock<HashMap<UserId, AdminRole>>,
}

impl AdminDirectory {
    pub fn new(main_admins: &[UserId]) -> Self {
        let admins = main_admins
            .iter()
            .map(|id| (*id, AdminRole::Main))
            .collect();
        Self {
            admins: RwLock::new(admins),
        }
    }

    pub async fn is_admin(&self, identity: UserId) -> bool {
        self.admins.read().await.contains_key(&identity)
    }

    pub async fn is_main_admin(&self, identity: UserId) -> bool {
        matches!(
            self.admins.read().await.get(&identity),
            Some(AdminRole::Main)
        )
    }

    /// All current administrator identities, in stable order.
    pub async fn admin_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.admins.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All administrators with their roles, in stable order.
    pub async fn roster(&self) -> Vec<(UserId, AdminRole)> {
        let mut entries: Vec<(UserId, AdminRole)> = self
            .admins
            .read()
            .await
            .iter()
            .map(|(id, role)| (*id, *role))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Add a regular administrator. Returns false when already present.
    pub async fn add(&self, identity: UserId) -> bool {
        let mut admins = self.admins.write().await;
        if admins.contains_key(&identity) {
            return false;
        }
        admins.insert(identity, AdminRole::Regular);
        true
    }

    /// Remove a regular administrator.
    ///
    /// Main administrators and the last remaining administrator cannot
    /// be removed.
    pub async fn remove(&self, identity: UserId) -> Result<(), DirectoryError> {
        let mut admins = self.admins.write().await;
        match admins.get(&identity) {
            None => Err(DirectoryError::Unknown(identity)),
            Some(AdminRole::Main) => Err(DirectoryError::MainAdmin),
            Some(AdminRole::Regular) => {
                if admins.len() <= 1 {
                    return Err(DirectoryError::LastAdmin);
                }
                admins.remove(&identity);
                Ok(())
            }
        }
    }
}

/// Set of users subscribed to relayed posts and reminders.
pub struct SubscriberList {
    inner: RwLock<HashSet<UserId>>,
}

impl SubscriberList {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashSet::new()),
        }
    }

    /// Returns false when the user was already subscribed.
    pub async fn subscribe(&self, identity: UserId) -> bool {
        self.inner.write().await.insert(identity)
    }

    /// Returns false when the user was not subscribed.
    pub async fn unsubscribe(&self, identity: UserId) -> bool {
        self.inner.write().await.remove(&identity)
    }

    pub async fn contains(&self, identity: UserId) -> bool {
        self.inner.read().await.contains(&identity)
    }

    /// Drop a subscriber that can no longer be reached.
    pub async fn discard(&self, identity: UserId) {
        self.inner.write().await.remove(&identity);
    }

    pub async fn snapshot(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.inner.read().await.iter().copied().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

impl Default for SubscriberList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn main_admins_seeded_with_role() {
        let dir = AdminDirectory::new(&[UserId(1), UserId(2)]);
        assert!(dir.is_admin(UserId(1)).await);
        assert!(dir.is_main_admin(UserId(2)).await);
        assert!(!dir.is_admin(UserId(3)).await);
    }

    #[tokio::test]
    async fn added_admins_are_regular() {
        let dir = AdminDirectory::new(&[UserId(1)]);
        assert!(dir.add(UserId(5)).await);
        assert!(!dir.add(UserId(5)).await);
        assert!(dir.is_admin(UserId(5)).await);
        assert!(!dir.is_main_admin(UserId(5)).await);
    }

    #[tokio::test]
    async fn remove_guards_main_and_last_admin() {
        let dir = AdminDirectory::new(&[UserId(1)]);
        assert_eq!(
            dir.remove(UserId(1)).await,
            Err(DirectoryError::MainAdmin)
        );
        assert_eq!(
            dir.remove(UserId(9)).await,
            Err(DirectoryError::Unknown(UserId(9)))
        );

        dir.add(UserId(5)).await;
        assert_eq!(dir.remove(UserId(5)).await, Ok(()));
        assert!(!dir.is_admin(UserId(5)).await);
    }

    #[tokio::test]
    async fn last_regular_admin_cannot_be_removed() {
        let dir = AdminDirectory::new(&[]);
        dir.add(UserId(5)).await;
        assert_eq!(
            dir.remove(UserId(5)).await,
            Err(DirectoryError::LastAdmin)
        );
    }

    #[tokio::test]
    async fn subscriber_roundtrip() {
        let list = SubscriberList::new();
        assert!(list.subscribe(UserId(1)).await);
        assert!(!list.subscribe(UserId(1)).await);
        assert!(list.contains(UserId(1)).await);
        assert!(list.unsubscribe(UserId(1)).await);
        assert!(!list.unsubscribe(UserId(1)).await);
    }
}
