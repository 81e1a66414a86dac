//! Криптографические наборы (Crypto Suites)
//!
//! Этот модуль содержит реализации KeyPairProvider trait.
//!
//! ## Доступные наборы
//!
//! ### RSA-OAEP Suite (текущий)
//! - **Алгоритм**: RSA-OAEP, модуль 2048 бит, e = 65537
//! - **Хэш в OAEP**: SHA-256 (MGF1-SHA-256, пустой label)
//! - **Формат ключей**: JWK, `alg = "RSA-OAEP-256"`
//! - **Лимит plaintext**: 190 байт
//! - **Suite ID**: 1
//!
//! ## Выбор suite
//!
//! ```rust,ignore
//! use group_crypto_core::crypto::suites::rsa_oaep::RsaOaepProvider;
//! use group_crypto_core::crypto::provider::KeyPairProvider;
//!
//! type MySuite = RsaOaepProvider;
//!
//! // Генерация ключей
//! let pair = MySuite::generate(true)?;
//! let published = MySuite::export_public_key(&pair.public_key)?;
//! ```

pub mod rsa_oaep;

// Будущее: pub mod hybrid;
