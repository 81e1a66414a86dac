use crate::directory::{GroupId, UserId};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Failed to generate keys: {0}")]
    KeyGenerationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Malformed key: {0}")]
    KeyFormatError(String),
    #[error("Key algorithm mismatch: expected {expected}, found {found}")]
    KeyAlgorithmMismatchError { expected: String, found: String },
    #[error("No local identity key is loaded")]
    NoIdentityError,
    #[error("Plaintext too large: {len} bytes, limit is {max} bytes")]
    PlaintextTooLargeError { len: usize, max: usize },
    /// Намеренно без подробностей: любой сбой расшифровки выглядит одинаково
    #[error("Decryption failed")]
    DecryptionError,
    #[error("No published key for {} recipient(s): {}", .missing.len(), join_ids(.missing))]
    IncompleteRecipientSetError { missing: Vec<UserId> },
    #[error("Recipient directory error: {0}")]
    DirectoryError(String),
    #[error("Group not found: {0}")]
    GroupNotFoundError(GroupId),
    #[error("Other crypto error: {0}")]
    Other(String),
}

impl CryptoError {
    /// Ошибка связана с получателями группы (нет опубликованного ключа или
    /// опубликованный ключ непригоден), а не с локальной расшифровкой.
    pub fn is_recipient_problem(&self) -> bool {
        matches!(
            self,
            CryptoError::IncompleteRecipientSetError { .. }
                | CryptoError::KeyFormatError(_)
                | CryptoError::KeyAlgorithmMismatchError { .. }
        )
    }
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(UserId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<tokio::task::JoinError> for CryptoError {
    fn from(err: tokio::task::JoinError) -> Self {
        CryptoError::Other(format!("Crypto worker task failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
