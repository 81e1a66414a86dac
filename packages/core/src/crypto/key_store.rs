// Хранилище приватного ключа сессии
//
// Жизненный цикл: создаётся при login, заполняется после генерации или
// восстановления identity, очищается при logout.

use crate::crypto::provider::KeyPairProvider;
use crate::error::{CryptoError, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Слот для одного приватного ключа локальной identity.
///
/// Один писатель / много читателей: шифрование и расшифровка только читают,
/// запись происходит при установке ключа, ротации и logout.
/// Передаётся явно (обычно через `Arc`), глобального состояния нет.
pub struct KeyStore<P: KeyPairProvider> {
    slot: RwLock<Option<P::PrivateKey>>,
}

impl<P: KeyPairProvider> KeyStore<P> {
    /// Пустое хранилище
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Сохранить приватный ключ.
    ///
    /// Возвращает предыдущий ключ, если он был: для вызывающего кода это
    /// ротация identity.
    pub async fn set_private_key(&self, key: P::PrivateKey) -> Option<P::PrivateKey> {
        let mut slot = self.slot.write().await;
        let previous = slot.replace(key);
        if previous.is_some() {
            warn!("Identity key replaced, treat as key rotation");
        } else {
            info!("Identity key loaded");
        }
        previous
    }

    /// Получить приватный ключ
    pub async fn get_private_key(&self) -> Result<P::PrivateKey> {
        self.slot
            .read()
            .await
            .clone()
            .ok_or(CryptoError::NoIdentityError)
    }

    pub async fn has_identity(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Очистить при logout. Возвращает `true`, если ключ был.
    pub async fn clear(&self) -> bool {
        let removed = self.slot.write().await.take().is_some();
        if removed {
            info!("Identity key cleared");
        }
        removed
    }
}

impl<P: KeyPairProvider> Default for KeyStore<P> {
    fn default() -> Self {
        Self::new()
    }
}
