//! Внешние источники: опубликованные ключи пользователей и состав групп
//!
//! Ядро не хранит и не синхронизирует записи `users` / `groups`; оно только
//! потребляет их через эти интерфейсы. Каждый провайдер поддерживает
//! pull (`resolve_public_keys`, `membership`) и, опционально, push
//! (`subscribe`) для live-обновлений.

pub mod memory;

use crate::crypto::jwk::ExportedKey;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tokio::sync::broadcast;

/// Непрозрачный идентификатор пользователя
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Непрозрачный идентификатор группы
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Новый случайный id (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Опубликованный публичный ключ участника
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub public_key: ExportedKey,
}

/// Состав группы (только чтение для ядра)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub participant_ids: BTreeSet<UserId>,
}

/// Push-обновления directory
#[derive(Debug, Clone)]
pub enum DirectoryEvent {
    IdentityPublished(Identity),
    IdentityRemoved(UserId),
    MembershipChanged(GroupMembership),
    GroupDeleted(GroupId),
    /// Все записи удалены; подписчик должен сбросить своё зеркало
    Cleared,
}

/// Источник опубликованных публичных ключей
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Вернуть опубликованные ключи для `ids`.
    ///
    /// Пользователи без опубликованного ключа просто отсутствуют в результате;
    /// `Err` означает сбой самого источника.
    async fn resolve_public_keys(
        &self,
        ids: &BTreeSet<UserId>,
    ) -> Result<HashMap<UserId, ExportedKey>>;

    /// Подписка на изменения. `None`, если источник поддерживает только pull.
    fn subscribe(&self) -> Option<broadcast::Receiver<DirectoryEvent>> {
        None
    }
}

/// Источник состава групп
#[async_trait]
pub trait GroupMembershipSource: Send + Sync {
    /// # Errors
    ///
    /// `GroupNotFoundError`, если группа неизвестна.
    async fn membership(&self, group_id: &GroupId) -> Result<GroupMembership>;
}
