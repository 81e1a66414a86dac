//! JSON Web Key representation of RSA-OAEP keys.
//!
//! Keys leave the process as JWK JSON text ([`ExportedKey`]). The format
//! follows RFC 7517/7518: `kty = "RSA"`, `alg = "RSA-OAEP-256"` (OAEP with
//! SHA-256), big-endian unsigned integers encoded as unpadded base64url.
//! Public exports carry only `n` and `e`; private exports add `d`, `p`, `q`,
//! `dp`, `dq` and `qi`.

use crate::error::{CryptoError, Result};
use crate::utils::b64;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Expected `kty` member for every key handled by this crate.
pub const RSA_KEY_TYPE: &str = "RSA";

pub const KEY_OP_ENCRYPT: &str = "encrypt";
pub const KEY_OP_DECRYPT: &str = "decrypt";

/// Textual (JWK JSON) serialization of a key.
///
/// The text is wiped from memory on drop since private exports carry key
/// material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ExportedKey(String);

impl ExportedKey {
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExportedKey {
    fn from(json: String) -> Self {
        Self(json)
    }
}

impl From<&str> for ExportedKey {
    fn from(json: &str) -> Self {
        Self(json.to_string())
    }
}

impl fmt::Debug for ExportedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExportedKey({} bytes)", self.0.len())
    }
}

/// Parsed JWK. Every member is optional at the serde level so that the
/// algorithm checks run before structural ones.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    e: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_ops: Option<Vec<String>>,
}

impl Jwk {
    pub(crate) fn from_public(key: &RsaPublicKey, alg: &str) -> Self {
        Self {
            kty: Some(RSA_KEY_TYPE.to_string()),
            alg: Some(alg.to_string()),
            n: Some(encode_uint(key.n())),
            e: Some(encode_uint(key.e())),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            ext: Some(true),
            key_ops: Some(vec![KEY_OP_ENCRYPT.to_string()]),
        }
    }

    pub(crate) fn from_private(key: &RsaPrivateKey, alg: &str) -> Result<Self> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(CryptoError::SerializationError(format!(
                "JWK export supports two-prime keys only, key has {} primes",
                primes.len()
            )));
        }
        let (dp, dq, qi) = match (key.dp(), key.dq(), key.crt_coefficient()) {
            (Some(dp), Some(dq), Some(qi)) => (dp, dq, qi),
            _ => {
                return Err(CryptoError::SerializationError(
                    "Private key has no CRT parameters".to_string(),
                ))
            }
        };

        Ok(Self {
            kty: Some(RSA_KEY_TYPE.to_string()),
            alg: Some(alg.to_string()),
            n: Some(encode_uint(key.n())),
            e: Some(encode_uint(key.e())),
            d: Some(encode_uint(key.d())),
            p: Some(encode_uint(&primes[0])),
            q: Some(encode_uint(&primes[1])),
            dp: Some(encode_uint(dp)),
            dq: Some(encode_uint(dq)),
            qi: Some(encode_uint(&qi)),
            ext: Some(true),
            key_ops: Some(vec![KEY_OP_DECRYPT.to_string()]),
        })
    }

    /// Parse JWK text. Only structural JSON errors are reported here.
    pub(crate) fn parse(exported: &ExportedKey) -> Result<Self> {
        serde_json::from_str(exported.as_str())
            .map_err(|e| CryptoError::KeyFormatError(format!("Invalid JWK JSON: {}", e)))
    }

    pub(crate) fn to_exported(&self) -> Result<ExportedKey> {
        serde_json::to_string(self)
            .map(ExportedKey)
            .map_err(|e| CryptoError::SerializationError(e.to_string()))
    }

    /// `kty` and `alg` must name RSA-OAEP with the configured hash.
    pub(crate) fn check_algorithm(&self, expected_alg: &str) -> Result<()> {
        match self.kty.as_deref() {
            Some(RSA_KEY_TYPE) => {}
            Some(other) => {
                return Err(CryptoError::KeyAlgorithmMismatchError {
                    expected: RSA_KEY_TYPE.to_string(),
                    found: other.to_string(),
                })
            }
            None => return Err(CryptoError::KeyFormatError("JWK has no \"kty\" member".to_string())),
        }

        match self.alg.as_deref() {
            Some(alg) if alg == expected_alg => Ok(()),
            found => Err(CryptoError::KeyAlgorithmMismatchError {
                expected: expected_alg.to_string(),
                found: found.unwrap_or("<none>").to_string(),
            }),
        }
    }

    /// `key_ops`, when present, must allow `op`; `ext: false` cannot be
    /// imported as an extractable key.
    pub(crate) fn check_usage(&self, op: &str) -> Result<()> {
        if let Some(ops) = &self.key_ops {
            if !ops.iter().any(|o| o == op) {
                return Err(CryptoError::KeyFormatError(format!(
                    "JWK key_ops does not allow \"{}\"",
                    op
                )));
            }
        }
        if self.ext == Some(false) {
            return Err(CryptoError::KeyFormatError(
                "JWK is marked non-extractable".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn has_private_members(&self) -> bool {
        self.d.is_some()
            || self.p.is_some()
            || self.q.is_some()
            || self.dp.is_some()
            || self.dq.is_some()
            || self.qi.is_some()
    }

    pub(crate) fn to_public_key(&self) -> Result<RsaPublicKey> {
        let n = required_uint(&self.n, "n")?;
        let e = required_uint(&self.e, "e")?;
        RsaPublicKey::new(n, e)
            .map_err(|e| CryptoError::KeyFormatError(format!("Invalid RSA public key: {}", e)))
    }

    pub(crate) fn to_private_key(&self) -> Result<RsaPrivateKey> {
        let n = required_uint(&self.n, "n")?;
        let e = required_uint(&self.e, "e")?;
        let d = required_uint(&self.d, "d")?;
        let p = required_uint(&self.p, "p")?;
        let q = required_uint(&self.q, "q")?;

        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CryptoError::KeyFormatError(format!("Invalid RSA private key: {}", e)))?;
        key.validate()
            .map_err(|e| CryptoError::KeyFormatError(format!("Invalid RSA private key: {}", e)))?;

        // CRT параметры необязательны, но если есть - должны совпадать
        check_optional(&self.dp, "dp", key.dp())?;
        check_optional(&self.dq, "dq", key.dq())?;
        check_optional(&self.qi, "qi", key.crt_coefficient().as_ref())?;

        Ok(key)
    }
}

/// RFC 7638 thumbprint: SHA-256 over the canonical `{"e","kty","n"}` object.
pub fn thumbprint(key: &RsaPublicKey) -> String {
    let canonical = format!(
        r#"{{"e":"{}","kty":"{}","n":"{}"}}"#,
        encode_uint(key.e()),
        RSA_KEY_TYPE,
        encode_uint(key.n())
    );
    b64::encode_url(&Sha256::digest(canonical.as_bytes()))
}

fn encode_uint(value: &BigUint) -> String {
    b64::encode_url(&value.to_bytes_be())
}

fn decode_uint(encoded: &str, member: &str) -> Result<BigUint> {
    let bytes = b64::decode_url(encoded)
        .map_err(|e| CryptoError::KeyFormatError(format!("JWK member \"{}\": {}", member, e)))?;
    if bytes.is_empty() {
        return Err(CryptoError::KeyFormatError(format!(
            "JWK member \"{}\" is empty",
            member
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn required_uint(value: &Option<String>, member: &str) -> Result<BigUint> {
    let encoded = value.as_deref().ok_or_else(|| {
        CryptoError::KeyFormatError(format!("JWK has no \"{}\" member", member))
    })?;
    decode_uint(encoded, member)
}

fn check_optional(value: &Option<String>, member: &str, expected: Option<&BigUint>) -> Result<()> {
    if let (Some(encoded), Some(expected)) = (value.as_deref(), expected) {
        if decode_uint(encoded, member)? != *expected {
            return Err(CryptoError::KeyFormatError(format!(
                "JWK member \"{}\" does not match the key",
                member
            )));
        }
    }
    Ok(())
}
