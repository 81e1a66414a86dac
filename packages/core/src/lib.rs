// Construct Messenger group crypto core
// RSA-OAEP identity keys and per-recipient group message encryption

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod utils;

// Re-exports для удобства
pub use api::{GroupEncryptionOrchestrator, IdentityManager};
pub use crypto::suites::rsa_oaep::RsaOaepProvider;
pub use crypto::{Ciphertext, ExportedKey, KeyPair, KeyPairProvider, KeyStore, MessageCipher};
pub use directory::{
    GroupId, GroupMembership, GroupMembershipSource, Identity, RecipientDirectory, UserId,
};
pub use error::{CryptoError, Result};
