use crate::error::{CryptoError, Result};

/// Максимальная длина идентификатора пользователя или группы
pub const MAX_ID_LENGTH: usize = 128;

pub fn validate_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(CryptoError::DirectoryError(format!("{} id must not be empty", kind)));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(CryptoError::DirectoryError(format!(
            "{} id must be at most {} bytes",
            kind, MAX_ID_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CryptoError::DirectoryError(format!("Invalid email: {}", email))),
    }
}
