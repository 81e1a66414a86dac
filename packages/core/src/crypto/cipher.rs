//! MessageCipher - шифрование коротких текстовых сообщений
//!
//! Plaintext кодируется в UTF-8 и шифруется напрямую RSA-OAEP, поэтому
//! размер ограничен модулем ключа (190 байт для RSA-2048 / SHA-256).
//! Примитив предназначен для коротких payload (например, симметричного
//! ключа сообщения), а не для тел длинных сообщений.
//!
//! Все операции выполняются на blocking pool: вызывающий код только `.await`.

use crate::crypto::provider::KeyPairProvider;
use crate::crypto::run_blocking;
use crate::directory::UserId;
use crate::error::{CryptoError, Result};
use crate::utils::b64;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::trace;
use zeroize::Zeroizing;

/// Зашифрованное сообщение для одного получателя
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub recipient_id: UserId,
    #[serde(with = "b64::serde_standard")]
    pub bytes: Vec<u8>,
}

/// Шифрование/расшифровка под конкретный KeyPairProvider
pub struct MessageCipher<P: KeyPairProvider> {
    _phantom: PhantomData<P>,
}

impl<P: KeyPairProvider> MessageCipher<P> {
    /// Зашифровать `plaintext` публичным ключом получателя.
    ///
    /// # Errors
    ///
    /// `PlaintextTooLargeError`, если UTF-8 представление длиннее лимита ключа.
    /// Проверка выполняется до любой криптографической операции.
    pub async fn encrypt(public_key: &P::PublicKey, plaintext: &str) -> Result<Vec<u8>> {
        let max = P::max_plaintext_len(public_key);
        if plaintext.len() > max {
            return Err(CryptoError::PlaintextTooLargeError {
                len: plaintext.len(),
                max,
            });
        }

        let key = public_key.clone();
        let bytes = Zeroizing::new(plaintext.as_bytes().to_vec());
        let ciphertext = run_blocking(move || P::encrypt(&key, &bytes)).await?;
        trace!(len = ciphertext.len(), "Message encrypted");
        Ok(ciphertext)
    }

    /// Расшифровать `ciphertext` приватным ключом.
    ///
    /// Любой сбой (чужой ключ, повреждение, padding, невалидный UTF-8)
    /// возвращается как `DecryptionError` без деталей.
    pub async fn decrypt(private_key: &P::PrivateKey, ciphertext: &[u8]) -> Result<String> {
        let key = private_key.clone();
        let bytes = ciphertext.to_vec();
        let plaintext = run_blocking(move || P::decrypt(&key, &bytes))
            .await
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::DecryptionError)?;

        std::str::from_utf8(&plaintext)
            .map(str::to_owned)
            .map_err(|_| CryptoError::DecryptionError)
    }
}
