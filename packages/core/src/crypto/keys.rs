// Хэндлы ключей
// Непрозрачные обёртки над RSA ключами с флагом extractable

use crate::crypto::provider::KeyPairProvider;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::sync::Arc;

/// Пара ключей identity
///
/// Половины математически связаны: то, что зашифровано `public_key`,
/// расшифровывается только `private_key`.
pub struct KeyPair<P: KeyPairProvider> {
    pub public_key: P::PublicKey,
    pub private_key: P::PrivateKey,
}

impl<P: KeyPairProvider> fmt::Debug for KeyPair<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .finish()
    }
}

/// Публичный ключ, пригодный только для шифрования.
///
/// Клонирование дешёвое: ключ разделяется через `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyHandle {
    key: Arc<RsaPublicKey>,
}

impl PublicKeyHandle {
    pub(crate) fn new(key: RsaPublicKey) -> Self {
        Self { key: Arc::new(key) }
    }

    pub(crate) fn rsa(&self) -> &RsaPublicKey {
        &self.key
    }

    /// Размер модуля в байтах
    pub fn modulus_len(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.key.size()
    }
}

impl fmt::Debug for PublicKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyHandle")
            .field("modulus_bits", &(self.modulus_len() * 8))
            .finish()
    }
}

/// Приватный ключ, пригодный только для расшифровки.
///
/// `extractable = false` запрещает экспорт ключевого материала.
#[derive(Clone)]
pub struct PrivateKeyHandle {
    key: Arc<RsaPrivateKey>,
    extractable: bool,
}

impl PrivateKeyHandle {
    pub(crate) fn new(key: RsaPrivateKey, extractable: bool) -> Self {
        Self {
            key: Arc::new(key),
            extractable,
        }
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.key
    }

    pub fn is_extractable(&self) -> bool {
        self.extractable
    }
}

impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("extractable", &self.extractable)
            .finish_non_exhaustive()
    }
}
