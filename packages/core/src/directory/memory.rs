// In-memory directory для тестов и локальной разработки
// Повторяет коллекции `users` и `groups` удалённой базы

use crate::crypto::jwk::ExportedKey;
use crate::directory::{
    DirectoryEvent, GroupId, GroupMembership, GroupMembershipSource, Identity, RecipientDirectory,
    UserId,
};
use crate::error::{CryptoError, Result};
use crate::utils::validation::{validate_email, validate_id};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Ёмкость канала событий; медленный подписчик получит `Lagged`
const EVENT_BUFFER: usize = 64;

/// Пользователь в directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: UserId,
    pub email: String,
    pub public_key: ExportedKey,
}

impl DirectoryUser {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Группа в directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub participants: BTreeSet<UserId>,
    pub created_by: UserId,
}

impl Group {
    pub fn membership(&self) -> GroupMembership {
        GroupMembership {
            group_id: self.id.clone(),
            participant_ids: self.participants.clone(),
        }
    }
}

/// In-memory directory
pub struct InMemoryDirectory {
    users: RwLock<HashMap<UserId, DirectoryUser>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            users: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Разослать событие. Вызывается под write guard изменённой коллекции,
    /// чтобы порядок событий совпадал с порядком изменений.
    fn notify(&self, event: DirectoryEvent) {
        // Ошибка означает только отсутствие подписчиков
        let _ = self.events.send(event);
    }

    // === Пользователи ===

    /// Опубликовать (или обновить) пользователя и его публичный ключ
    pub async fn publish_user(&self, user: DirectoryUser) -> Result<()> {
        validate_id("user", user.id.as_str())?;
        validate_email(&user.email)?;

        let identity = user.identity();
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user);
        debug!(user_id = %identity.id, "Identity published");
        self.notify(DirectoryEvent::IdentityPublished(identity));
        Ok(())
    }

    pub async fn load_user(&self, user_id: &UserId) -> Option<DirectoryUser> {
        self.users.read().await.get(user_id).cloned()
    }

    pub async fn remove_user(&self, user_id: &UserId) -> Option<DirectoryUser> {
        let mut users = self.users.write().await;
        let removed = users.remove(user_id);
        if removed.is_some() {
            self.notify(DirectoryEvent::IdentityRemoved(user_id.clone()));
        }
        removed
    }

    /// Все пользователи, кроме `self_id`, отсортированные по id
    pub async fn other_users(&self, self_id: &UserId) -> Vec<DirectoryUser> {
        let mut users: Vec<DirectoryUser> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| &u.id != self_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    // === Группы ===

    /// Создать группу; создатель всегда становится участником
    pub async fn create_group<I>(&self, name: &str, created_by: UserId, participants: I) -> Result<Group>
    where
        I: IntoIterator<Item = UserId>,
    {
        validate_id("user", created_by.as_str())?;
        let mut participants: BTreeSet<UserId> = participants.into_iter().collect();
        for participant in &participants {
            validate_id("user", participant.as_str())?;
        }
        participants.insert(created_by.clone());

        let group = Group {
            id: GroupId::generate(),
            name: name.to_string(),
            participants,
            created_by,
        };
        self.save_group(group.clone()).await?;
        Ok(group)
    }

    pub async fn save_group(&self, group: Group) -> Result<()> {
        validate_id("group", group.id.as_str())?;
        let membership = group.membership();
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        self.notify(DirectoryEvent::MembershipChanged(membership));
        Ok(())
    }

    pub async fn load_group(&self, group_id: &GroupId) -> Option<Group> {
        self.groups.read().await.get(group_id).cloned()
    }

    pub async fn add_participant(&self, group_id: &GroupId, user_id: UserId) -> Result<()> {
        validate_id("user", user_id.as_str())?;
        self.update_group(group_id, |group| {
            group.participants.insert(user_id);
        })
        .await
    }

    pub async fn remove_participant(&self, group_id: &GroupId, user_id: &UserId) -> Result<()> {
        self.update_group(group_id, |group| {
            group.participants.remove(user_id);
        })
        .await
    }

    async fn update_group<F>(&self, group_id: &GroupId, update: F) -> Result<()>
    where
        F: FnOnce(&mut Group),
    {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| CryptoError::GroupNotFoundError(group_id.clone()))?;
        update(group);
        self.notify(DirectoryEvent::MembershipChanged(group.membership()));
        Ok(())
    }

    /// Группы, в которых участвует `user_id`, отсортированные по имени
    pub async fn groups_for(&self, user_id: &UserId) -> Vec<Group> {
        let mut groups: Vec<Group> = self
            .groups
            .read()
            .await
            .values()
            .filter(|g| g.participants.contains(user_id))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        groups
    }

    pub async fn delete_group(&self, group_id: &GroupId) -> Option<Group> {
        let mut groups = self.groups.write().await;
        let removed = groups.remove(group_id);
        if removed.is_some() {
            self.notify(DirectoryEvent::GroupDeleted(group_id.clone()));
        }
        removed
    }

    // === Утилиты ===

    pub async fn clear_all(&self) {
        let mut users = self.users.write().await;
        let mut groups = self.groups.write().await;
        users.clear();
        groups.clear();
        self.notify(DirectoryEvent::Cleared);
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn resolve_public_keys(
        &self,
        ids: &BTreeSet<UserId>,
    ) -> Result<HashMap<UserId, ExportedKey>> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (id.clone(), u.public_key.clone())))
            .collect())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<DirectoryEvent>> {
        Some(self.events.subscribe())
    }
}

#[async_trait]
impl GroupMembershipSource for InMemoryDirectory {
    async fn membership(&self, group_id: &GroupId) -> Result<GroupMembership> {
        self.groups
            .read()
            .await
            .get(group_id)
            .map(Group::membership)
            .ok_or_else(|| CryptoError::GroupNotFoundError(group_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> DirectoryUser {
        DirectoryUser {
            id: UserId::from(id),
            email: format!("{}@example.com", id),
            public_key: ExportedKey::from(format!(r#"{{"kty":"RSA","n":"{}"}}"#, id)),
        }
    }

    #[tokio::test]
    async fn test_resolve_skips_unpublished_users() {
        let directory = InMemoryDirectory::new();
        directory.publish_user(user("alice")).await.unwrap();
        directory.publish_user(user("carol")).await.unwrap();

        let ids: BTreeSet<UserId> = ["alice", "bob", "carol"].into_iter().map(UserId::from).collect();
        let keys = directory.resolve_public_keys(&ids).await.unwrap();

        assert_eq!(keys.len(), 2);
        assert!(keys.contains_key(&UserId::from("alice")));
        assert!(!keys.contains_key(&UserId::from("bob")));
    }

    #[tokio::test]
    async fn test_other_users_excludes_self() {
        let directory = InMemoryDirectory::new();
        for id in ["carol", "alice", "bob"] {
            directory.publish_user(user(id)).await.unwrap();
        }

        let others = directory.other_users(&UserId::from("bob")).await;
        let ids: Vec<&str> = others.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "carol"]);
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_user() {
        let directory = InMemoryDirectory::new();
        let mut invalid = user("dave");
        invalid.email = "not-an-email".to_string();

        assert!(matches!(
            directory.publish_user(invalid).await,
            Err(CryptoError::DirectoryError(_))
        ));
        assert!(directory.load_user(&UserId::from("dave")).await.is_none());
    }

    #[tokio::test]
    async fn test_groups_for_participant() {
        let directory = InMemoryDirectory::new();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        let team = directory
            .create_group("team", alice.clone(), vec![bob.clone()])
            .await
            .unwrap();
        directory
            .create_group("solo", alice.clone(), Vec::new())
            .await
            .unwrap();

        assert!(team.participants.contains(&alice), "creator must be a participant");
        assert_eq!(directory.groups_for(&alice).await.len(), 2);

        let bob_groups = directory.groups_for(&bob).await;
        assert_eq!(bob_groups.len(), 1);
        assert_eq!(bob_groups[0].name, "team");
    }

    #[tokio::test]
    async fn test_membership_updates() {
        let directory = InMemoryDirectory::new();
        let group = directory
            .create_group("team", UserId::from("alice"), Vec::new())
            .await
            .unwrap();

        directory.add_participant(&group.id, UserId::from("bob")).await.unwrap();
        let membership = directory.membership(&group.id).await.unwrap();
        assert_eq!(membership.participant_ids.len(), 2);

        directory
            .remove_participant(&group.id, &UserId::from("alice"))
            .await
            .unwrap();
        let membership = directory.membership(&group.id).await.unwrap();
        assert_eq!(
            membership.participant_ids.into_iter().collect::<Vec<_>>(),
            vec![UserId::from("bob")]
        );
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let directory = InMemoryDirectory::new();
        let missing = GroupId::from("nope");

        assert!(matches!(
            directory.membership(&missing).await,
            Err(CryptoError::GroupNotFoundError(_))
        ));
        assert!(matches!(
            directory.add_participant(&missing, UserId::from("bob")).await,
            Err(CryptoError::GroupNotFoundError(_))
        ));
    }

    #[tokio::test]
    async fn test_subscription_receives_events() {
        let directory = InMemoryDirectory::new();
        let mut events = directory.subscribe().unwrap();

        directory.publish_user(user("alice")).await.unwrap();
        directory.remove_user(&UserId::from("alice")).await;

        match events.recv().await.unwrap() {
            DirectoryEvent::IdentityPublished(identity) => assert_eq!(identity.id.as_str(), "alice"),
            other => panic!("unexpected event: {:?}", other),
        }
        match events.recv().await.unwrap() {
            DirectoryEvent::IdentityRemoved(id) => assert_eq!(id.as_str(), "alice"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_group_deletion_and_clear_are_broadcast() {
        let directory = InMemoryDirectory::new();
        directory.publish_user(user("alice")).await.unwrap();
        let group = directory
            .create_group("team", UserId::from("alice"), Vec::new())
            .await
            .unwrap();

        let mut events = directory.subscribe().unwrap();

        assert!(directory.delete_group(&group.id).await.is_some());
        match events.try_recv().unwrap() {
            DirectoryEvent::GroupDeleted(id) => assert_eq!(id, group.id),
            other => panic!("unexpected event: {:?}", other),
        }

        // Повторное удаление ничего не меняет и ничего не рассылает
        assert!(directory.delete_group(&group.id).await.is_none());
        assert!(events.try_recv().is_err());

        directory.clear_all().await;
        assert!(matches!(events.try_recv().unwrap(), DirectoryEvent::Cleared));
        assert!(directory.load_user(&UserId::from("alice")).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_event_matches_state_under_concurrent_updates() {
        let directory = std::sync::Arc::new(InMemoryDirectory::new());
        let group = directory
            .create_group("team", UserId::from("alice"), Vec::new())
            .await
            .unwrap();
        let mut events = directory.subscribe().unwrap();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let directory = directory.clone();
                let group_id = group.id.clone();
                tokio::spawn(async move {
                    directory
                        .add_participant(&group_id, UserId::new(format!("member-{:02}", i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            if let DirectoryEvent::MembershipChanged(membership) = event {
                last = Some(membership);
            }
        }

        let current = directory.membership(&group.id).await.unwrap();
        assert_eq!(current.participant_ids.len(), 33);
        assert_eq!(last, Some(current), "last event must reflect the final state");
    }
}
