// Identity текущего пользователя
// Генерация / восстановление ключей, публикация публичной половины,
// расшифровка входящих сообщений и logout

use crate::config::Config;
use crate::crypto::cipher::{Ciphertext, MessageCipher};
use crate::crypto::jwk::ExportedKey;
use crate::crypto::key_store::KeyStore;
use crate::crypto::provider::KeyPairProvider;
use crate::crypto::run_blocking;
use crate::directory::{Identity, UserId};
use crate::error::{CryptoError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Менеджер identity для одной сессии
///
/// Создаётся при login, `logout()` очищает приватный ключ.
pub struct IdentityManager<P: KeyPairProvider> {
    user_id: UserId,
    key_store: Arc<KeyStore<P>>,
}

impl<P: KeyPairProvider> IdentityManager<P> {
    pub fn new(user_id: UserId, key_store: Arc<KeyStore<P>>) -> Self {
        Self { user_id, key_store }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn key_store(&self) -> &Arc<KeyStore<P>> {
        &self.key_store
    }

    /// Сгенерировать новую пару ключей и загрузить приватную половину.
    ///
    /// Возвращает Identity для публикации в directory. Если ключ уже был
    /// загружен, это ротация (см. `KeyStore::set_private_key`).
    pub async fn create_identity(&self) -> Result<Identity> {
        let extractable = Config::global().default_extractable;
        let pair = run_blocking(move || P::generate(extractable)).await?;
        let public_key = P::export_public_key(&pair.public_key)?;

        self.key_store.set_private_key(pair.private_key).await;
        info!(
            user_id = %self.user_id,
            fingerprint = %P::fingerprint(&pair.public_key),
            "Identity created"
        );

        Ok(Identity {
            id: self.user_id.clone(),
            public_key,
        })
    }

    /// Восстановить identity из ранее экспортированного приватного ключа
    pub async fn restore_identity(&self, exported_private: &ExportedKey) -> Result<Identity> {
        let exported = exported_private.clone();
        let private_key = run_blocking(move || P::import_private_key(&exported)).await?;
        let public_key = P::public_key_from_private(&private_key);
        let exported_public = P::export_public_key(&public_key)?;

        self.key_store.set_private_key(private_key).await;
        info!(user_id = %self.user_id, "Identity restored");

        Ok(Identity {
            id: self.user_id.clone(),
            public_key: exported_public,
        })
    }

    /// Текущая публичная identity
    pub async fn current_identity(&self) -> Result<Identity> {
        let private_key = self.key_store.get_private_key().await?;
        let public_key = P::public_key_from_private(&private_key);
        Ok(Identity {
            id: self.user_id.clone(),
            public_key: P::export_public_key(&public_key)?,
        })
    }

    /// Fingerprint публичного ключа для сверки вне канала
    pub async fn fingerprint(&self) -> Result<String> {
        let private_key = self.key_store.get_private_key().await?;
        Ok(P::fingerprint(&P::public_key_from_private(&private_key)))
    }

    /// Экспорт приватного ключа для внешнего защищённого хранилища
    pub async fn export_private_key(&self) -> Result<ExportedKey> {
        let private_key = self.key_store.get_private_key().await?;
        P::export_private_key(&private_key)
    }

    /// Расшифровать ciphertext, адресованный этому пользователю
    pub async fn open(&self, ciphertext: &Ciphertext) -> Result<String> {
        let private_key = self.key_store.get_private_key().await?;
        if ciphertext.recipient_id != self.user_id {
            debug!("Ciphertext is addressed to another recipient");
            return Err(CryptoError::DecryptionError);
        }
        MessageCipher::<P>::decrypt(&private_key, &ciphertext.bytes).await
    }

    /// Найти свой ciphertext в наборе группового сообщения и расшифровать
    pub async fn open_group_message(&self, ciphertexts: &[Ciphertext]) -> Result<String> {
        let own = ciphertexts
            .iter()
            .find(|c| c.recipient_id == self.user_id)
            .ok_or(CryptoError::DecryptionError)?;
        self.open(own).await
    }

    /// Logout: удалить приватный ключ из памяти
    pub async fn logout(&self) {
        self.key_store.clear().await;
        info!(user_id = %self.user_id, "Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::suites::rsa_oaep::RsaOaepProvider;

    fn manager(id: &str) -> IdentityManager<RsaOaepProvider> {
        IdentityManager::new(UserId::from(id), Arc::new(KeyStore::new()))
    }

    #[tokio::test]
    async fn test_operations_require_identity() {
        let alice = manager("alice");
        assert!(matches!(
            alice.current_identity().await,
            Err(CryptoError::NoIdentityError)
        ));
        assert!(matches!(
            alice.export_private_key().await,
            Err(CryptoError::NoIdentityError)
        ));
    }

    #[tokio::test]
    async fn test_create_restore_and_logout() {
        let alice = manager("alice");
        let published = alice.create_identity().await.unwrap();
        assert_eq!(published.id, UserId::from("alice"));
        assert_eq!(alice.current_identity().await.unwrap(), published);

        let backup = alice.export_private_key().await.unwrap();
        let fingerprint = alice.fingerprint().await.unwrap();

        alice.logout().await;
        assert!(!alice.key_store().has_identity().await);

        let restored = alice.restore_identity(&backup).await.unwrap();
        assert_eq!(restored, published);
        assert_eq!(alice.fingerprint().await.unwrap(), fingerprint);
    }

    #[tokio::test]
    async fn test_open_rejects_foreign_recipient_tag() {
        let alice = manager("alice");
        let identity = alice.create_identity().await.unwrap();
        let public_key = RsaOaepProvider::import_public_key(&identity.public_key).unwrap();

        let bytes = MessageCipher::<RsaOaepProvider>::encrypt(&public_key, "hi").await.unwrap();
        let own = Ciphertext {
            recipient_id: UserId::from("alice"),
            bytes: bytes.clone(),
        };
        let mislabeled = Ciphertext {
            recipient_id: UserId::from("bob"),
            bytes,
        };

        assert_eq!(alice.open(&own).await.unwrap(), "hi");
        assert!(matches!(
            alice.open(&mislabeled).await,
            Err(CryptoError::DecryptionError)
        ));
        assert!(matches!(
            alice.open_group_message(&[mislabeled]).await,
            Err(CryptoError::DecryptionError)
        ));
    }
}
