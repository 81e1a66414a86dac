use crate::config::{Config, MAX_MODULUS_BITS, MIN_MODULUS_BITS};
use crate::crypto::jwk::{self, ExportedKey, Jwk, KEY_OP_DECRYPT, KEY_OP_ENCRYPT};
use crate::crypto::keys::{KeyPair, PrivateKeyHandle, PublicKeyHandle};
use crate::crypto::provider::KeyPairProvider;
use crate::error::{CryptoError, Result};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, RsaPrivateKey};
use sha2::Sha256;
use tracing::{debug, trace};

/// Длина выхода SHA-256 (hLen в RFC 8017)
const HASH_LEN: usize = 32;

/// Concrete implementation of `KeyPairProvider` for RSA-OAEP with SHA-256.
pub struct RsaOaepProvider;

impl RsaOaepProvider {
    fn padding() -> Oaep {
        Oaep::new::<Sha256>()
    }

    /// Размер модуля должен быть таким, чтобы другие участники смогли
    /// импортировать опубликованный ключ.
    fn check_modulus_bits(bits: usize) -> Result<()> {
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
            return Err(CryptoError::KeyGenerationError(format!(
                "Modulus of {} bits is outside the {}..={} range",
                bits, MIN_MODULUS_BITS, MAX_MODULUS_BITS
            )));
        }
        Ok(())
    }
}

impl KeyPairProvider for RsaOaepProvider {
    type PublicKey = PublicKeyHandle;
    type PrivateKey = PrivateKeyHandle;

    fn generate(extractable: bool) -> Result<KeyPair<Self>> {
        let config = Config::global();
        Self::check_modulus_bits(config.modulus_bits)?;

        debug!(bits = config.modulus_bits, extractable, "Generating RSA-OAEP key pair");
        let exponent = BigUint::from(config.public_exponent);
        let private_key = RsaPrivateKey::new_with_exp(&mut OsRng, config.modulus_bits, &exponent)
            .map_err(|e| CryptoError::KeyGenerationError(e.to_string()))?;
        let public_key = private_key.to_public_key();

        Ok(KeyPair {
            public_key: PublicKeyHandle::new(public_key),
            private_key: PrivateKeyHandle::new(private_key, extractable),
        })
    }

    fn public_key_from_private(private_key: &Self::PrivateKey) -> Self::PublicKey {
        PublicKeyHandle::new(private_key.rsa().to_public_key())
    }

    fn export_public_key(public_key: &Self::PublicKey) -> Result<ExportedKey> {
        Jwk::from_public(public_key.rsa(), Config::global().jwk_algorithm).to_exported()
    }

    fn export_private_key(private_key: &Self::PrivateKey) -> Result<ExportedKey> {
        if !private_key.is_extractable() {
            return Err(CryptoError::SerializationError(
                "Key is not extractable".to_string(),
            ));
        }
        Jwk::from_private(private_key.rsa(), Config::global().jwk_algorithm)?.to_exported()
    }

    fn import_public_key(exported: &ExportedKey) -> Result<Self::PublicKey> {
        let jwk = Jwk::parse(exported)?;
        jwk.check_algorithm(Config::global().jwk_algorithm)?;
        if jwk.has_private_members() {
            return Err(CryptoError::KeyFormatError(
                "Expected a public key, JWK contains private members".to_string(),
            ));
        }
        jwk.check_usage(KEY_OP_ENCRYPT)?;

        let key = jwk.to_public_key()?;
        if key.size() * 8 < MIN_MODULUS_BITS {
            return Err(CryptoError::KeyFormatError(format!(
                "Modulus of {} bits is below the {}-bit minimum",
                key.size() * 8,
                MIN_MODULUS_BITS
            )));
        }
        trace!(bits = key.size() * 8, "Imported public key");
        Ok(PublicKeyHandle::new(key))
    }

    fn import_private_key(exported: &ExportedKey) -> Result<Self::PrivateKey> {
        let jwk = Jwk::parse(exported)?;
        jwk.check_algorithm(Config::global().jwk_algorithm)?;
        jwk.check_usage(KEY_OP_DECRYPT)?;

        let key = jwk.to_private_key()?;
        if key.size() * 8 < MIN_MODULUS_BITS {
            return Err(CryptoError::KeyFormatError(format!(
                "Modulus of {} bits is below the {}-bit minimum",
                key.size() * 8,
                MIN_MODULUS_BITS
            )));
        }
        // Восстановленный identity ключ остаётся экспортируемым (для backup)
        Ok(PrivateKeyHandle::new(key, true))
    }

    fn max_plaintext_len(public_key: &Self::PublicKey) -> usize {
        // RFC 8017, 7.1.1: mLen <= k - 2hLen - 2
        public_key.modulus_len().saturating_sub(2 * HASH_LEN + 2)
    }

    fn encrypt(public_key: &Self::PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let max = Self::max_plaintext_len(public_key);
        if plaintext.len() > max {
            return Err(CryptoError::PlaintextTooLargeError {
                len: plaintext.len(),
                max,
            });
        }

        public_key
            .rsa()
            .encrypt(&mut OsRng, Self::padding(), plaintext)
            .map_err(|e| CryptoError::Other(format!("RSA-OAEP encryption failed: {}", e)))
    }

    fn decrypt(private_key: &Self::PrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        // Blinding против timing атак; причина сбоя не раскрывается
        private_key
            .rsa()
            .decrypt_blinded(&mut OsRng, Self::padding(), ciphertext)
            .map_err(|_| CryptoError::DecryptionError)
    }

    fn fingerprint(public_key: &Self::PublicKey) -> String {
        jwk::thumbprint(public_key.rsa())
    }

    fn suite_id() -> u16 {
        Config::global().rsa_oaep_suite_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static ALICE: Lazy<KeyPair<RsaOaepProvider>> =
        Lazy::new(|| RsaOaepProvider::generate(true).unwrap());
    static BOB: Lazy<KeyPair<RsaOaepProvider>> =
        Lazy::new(|| RsaOaepProvider::generate(false).unwrap());

    #[test]
    fn test_generated_key_strength() {
        assert_eq!(ALICE.public_key.modulus_len(), 256);
        assert_eq!(RsaOaepProvider::max_plaintext_len(&ALICE.public_key), 190);
        assert_eq!(RsaOaepProvider::suite_id(), crate::crypto::RSA_OAEP_SUITE_ID);
    }

    #[test]
    fn test_generation_rejects_unimportable_modulus() {
        assert!(RsaOaepProvider::check_modulus_bits(2048).is_ok());
        assert!(RsaOaepProvider::check_modulus_bits(4096).is_ok());
        assert!(matches!(
            RsaOaepProvider::check_modulus_bits(1024),
            Err(CryptoError::KeyGenerationError(_))
        ));
        assert!(matches!(
            RsaOaepProvider::check_modulus_bits(8192),
            Err(CryptoError::KeyGenerationError(_))
        ));
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let ciphertext = RsaOaepProvider::encrypt(&ALICE.public_key, b"hello group").unwrap();
        assert_eq!(ciphertext.len(), 256);

        let plaintext = RsaOaepProvider::decrypt(&ALICE.private_key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello group");
    }

    #[test]
    fn test_limit_boundary() {
        let at_limit = vec![b'x'; 190];
        let ciphertext = RsaOaepProvider::encrypt(&ALICE.public_key, &at_limit).unwrap();
        assert_eq!(
            RsaOaepProvider::decrypt(&ALICE.private_key, &ciphertext).unwrap(),
            at_limit
        );

        let over_limit = vec![b'x'; 191];
        assert!(matches!(
            RsaOaepProvider::encrypt(&ALICE.public_key, &over_limit),
            Err(CryptoError::PlaintextTooLargeError { len: 191, max: 190 })
        ));
    }

    #[test]
    fn test_decrypt_failures_are_uniform() {
        let ciphertext = RsaOaepProvider::encrypt(&ALICE.public_key, b"secret").unwrap();

        // Чужой ключ
        assert!(matches!(
            RsaOaepProvider::decrypt(&BOB.private_key, &ciphertext),
            Err(CryptoError::DecryptionError)
        ));

        // Повреждённый ciphertext
        let mut corrupted = ciphertext.clone();
        corrupted[10] ^= 0x01;
        assert!(matches!(
            RsaOaepProvider::decrypt(&ALICE.private_key, &corrupted),
            Err(CryptoError::DecryptionError)
        ));

        // Неверная длина
        assert!(matches!(
            RsaOaepProvider::decrypt(&ALICE.private_key, &ciphertext[..100]),
            Err(CryptoError::DecryptionError)
        ));
    }

    #[test]
    fn test_public_export_has_no_private_members() {
        let exported = RsaOaepProvider::export_public_key(&ALICE.public_key).unwrap();
        let value: serde_json::Value = serde_json::from_str(exported.as_str()).unwrap();

        assert_eq!(value["kty"], "RSA");
        assert_eq!(value["alg"], "RSA-OAEP-256");
        assert_eq!(value["e"], "AQAB");
        assert_eq!(value["key_ops"], serde_json::json!(["encrypt"]));
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(value.get(member).is_none(), "public JWK leaks {}", member);
        }
    }

    #[test]
    fn test_public_import_round_trip() {
        let exported = RsaOaepProvider::export_public_key(&ALICE.public_key).unwrap();
        let imported = RsaOaepProvider::import_public_key(&exported).unwrap();
        assert_eq!(imported, ALICE.public_key);
    }

    #[test]
    fn test_private_export_round_trip() {
        let exported = RsaOaepProvider::export_private_key(&ALICE.private_key).unwrap();
        let restored = RsaOaepProvider::import_private_key(&exported).unwrap();

        let ciphertext = RsaOaepProvider::encrypt(&ALICE.public_key, b"restore me").unwrap();
        assert_eq!(
            RsaOaepProvider::decrypt(&restored, &ciphertext).unwrap(),
            b"restore me"
        );
        assert_eq!(
            RsaOaepProvider::public_key_from_private(&restored),
            ALICE.public_key
        );
    }

    #[test]
    fn test_private_jwk_rejected_as_public_key() {
        let exported = RsaOaepProvider::export_private_key(&ALICE.private_key).unwrap();
        assert!(matches!(
            RsaOaepProvider::import_public_key(&exported),
            Err(CryptoError::KeyFormatError(_))
        ));
    }

    #[test]
    fn test_public_jwk_rejected_as_private_key() {
        let exported = RsaOaepProvider::export_public_key(&ALICE.public_key).unwrap();
        assert!(matches!(
            RsaOaepProvider::import_private_key(&exported),
            Err(CryptoError::KeyFormatError(_))
        ));
    }

    #[test]
    fn test_non_extractable_private_key_not_exported() {
        assert!(!BOB.private_key.is_extractable());
        assert!(matches!(
            RsaOaepProvider::export_private_key(&BOB.private_key),
            Err(CryptoError::SerializationError(_))
        ));
        // Публичная половина всегда экспортируема
        assert!(RsaOaepProvider::export_public_key(&BOB.public_key).is_ok());
    }

    #[test]
    fn test_import_rejects_sha1_oaep() {
        let exported = RsaOaepProvider::export_public_key(&ALICE.public_key).unwrap();
        let tampered = exported.as_str().replace("RSA-OAEP-256", "RSA-OAEP");
        assert!(matches!(
            RsaOaepProvider::import_public_key(&ExportedKey::from(tampered)),
            Err(CryptoError::KeyAlgorithmMismatchError { .. })
        ));
    }

    #[test]
    fn test_import_rejects_weak_modulus() {
        // 1024-битный модуль
        let weak = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let exported = Jwk::from_public(&weak.to_public_key(), "RSA-OAEP-256")
            .to_exported()
            .unwrap();
        assert!(matches!(
            RsaOaepProvider::import_public_key(&exported),
            Err(CryptoError::KeyFormatError(_))
        ));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let exported = RsaOaepProvider::export_public_key(&ALICE.public_key).unwrap();
        let imported = RsaOaepProvider::import_public_key(&exported).unwrap();

        let fingerprint = RsaOaepProvider::fingerprint(&ALICE.public_key);
        assert_eq!(fingerprint, RsaOaepProvider::fingerprint(&imported));
        assert_ne!(fingerprint, RsaOaepProvider::fingerprint(&BOB.public_key));
        // SHA-256 в base64url без padding
        assert_eq!(fingerprint.len(), 43);
    }
}
