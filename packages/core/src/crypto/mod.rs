//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                ┌─────────────┴─────────────┐
//!                ▼                           ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │   IdentityManager         │  │  GroupEncryptionOrchestrator │
//! │  - генерация identity     │  │  - fan-out по получателям    │
//! │  - restore / logout       │  │  - RecipientDirectory        │
//! │  - расшифровка входящих   │  │  - all-or-nothing            │
//! └───────────────────────────┘  └──────────────────────────────┘
//!                │                           │
//!                ▼                           ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │   KeyStore                │  │  MessageCipher               │
//! │  - один приватный ключ    │  │  - RSA-OAEP encrypt/decrypt  │
//! │  - single writer          │  │  - лимит размера plaintext   │
//! └───────────────────────────┘  └──────────────────────────────┘
//!                │                           │
//!                └─────────────┬─────────────┘
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              KeyPairProvider (Crypto-Agility)               │
//! │  - RSA-OAEP-2048 / SHA-256                                  │
//! │  - JWK export / import                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Модули
//!
//! - [`provider`]: KeyPairProvider trait для crypto-agility
//! - [`suites`]: Реализации KeyPairProvider (RSA-OAEP)
//! - [`keys`]: Хэндлы публичных/приватных ключей
//! - [`jwk`]: Текстовое представление ключей (JWK)
//! - [`key_store`]: Приватный ключ текущей сессии
//! - [`cipher`]: Шифрование коротких сообщений

// ============================================================================
// Core Traits
// ============================================================================

/// KeyPairProvider trait для crypto-agility
pub mod provider;

// ============================================================================
// Implementations
// ============================================================================

/// Криптографические наборы (RSA-OAEP)
pub mod suites;

// ============================================================================
// Utilities
// ============================================================================

pub mod cipher;
pub mod jwk;
pub mod key_store;
pub mod keys;

mod worker;

pub(crate) use worker::run_blocking;

// ============================================================================
// Re-exports для удобства
// ============================================================================

pub use cipher::{Ciphertext, MessageCipher};
pub use jwk::ExportedKey;
pub use key_store::KeyStore;
pub use keys::{KeyPair, PrivateKeyHandle, PublicKeyHandle};
pub use provider::KeyPairProvider;

pub type SuiteID = u16;

/// Suite ID for RSA-OAEP-2048 with SHA-256
pub const RSA_OAEP_SUITE_ID: SuiteID = 1;
