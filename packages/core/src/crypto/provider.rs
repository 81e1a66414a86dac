//! Defines the KeyPairProvider trait for crypto-agility.

use crate::crypto::jwk::ExportedKey;
use crate::crypto::keys::KeyPair;
use crate::error::Result;
use core::fmt::Debug;

/// Trait that formalizes the asymmetric operations of a specific cipher suite.
/// This enables crypto-agility by allowing different implementations
/// (RSA-OAEP today, a hybrid KEM suite later).
///
/// All functions are synchronous and may be CPU-heavy; async callers go
/// through the blocking pool (see `MessageCipher`).
pub trait KeyPairProvider: Send + Sync + 'static {
    /// Encrypt-only public key handle.
    type PublicKey: Debug + Clone + Send + Sync + 'static;
    /// Decrypt-only private key handle.
    type PrivateKey: Debug + Clone + Send + Sync + 'static;

    /// Generates a new key pair.
    /// `extractable` controls whether the private half may be exported later.
    fn generate(extractable: bool) -> Result<KeyPair<Self>>
    where
        Self: Sized;

    /// Derives the public half from a private key.
    fn public_key_from_private(private_key: &Self::PrivateKey) -> Self::PublicKey;

    /// Serializes a public key. Never includes private material.
    fn export_public_key(public_key: &Self::PublicKey) -> Result<ExportedKey>;

    /// Serializes a private key. Fails for non-extractable keys.
    fn export_private_key(private_key: &Self::PrivateKey) -> Result<ExportedKey>;

    /// Parses an exported public key into an encrypt-only handle.
    fn import_public_key(exported: &ExportedKey) -> Result<Self::PublicKey>;

    /// Parses an exported private key into a decrypt-only handle.
    fn import_private_key(exported: &ExportedKey) -> Result<Self::PrivateKey>;

    /// Largest plaintext (in bytes) that `encrypt` accepts for this key.
    fn max_plaintext_len(public_key: &Self::PublicKey) -> usize;

    /// Encrypts `plaintext` under `public_key` with randomized padding.
    fn encrypt(public_key: &Self::PublicKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts `ciphertext`. Every failure is reported as the same error.
    fn decrypt(private_key: &Self::PrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Stable fingerprint of a public key for out-of-band comparison.
    fn fingerprint(public_key: &Self::PublicKey) -> String;

    /// Returns the SuiteID associated with this provider.
    fn suite_id() -> u16;
}
