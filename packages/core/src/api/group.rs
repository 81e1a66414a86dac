//! GroupEncryptionOrchestrator - fan-out шифрование для группы
//!
//! ## Процесс
//!
//! ```text
//! encrypt_for_group(plaintext, {A, B, C})
//!   1. Разбить получателей на batch по directory_batch_size
//!   2. resolve_public_keys для каждого batch (не более max_concurrent_batches одновременно)
//!   3. Есть неразрешённые id → IncompleteRecipientSetError (ничего не шифруется)
//!   4. Импорт всех ключей + проверка лимита размера для каждого
//!   5. Шифрование под каждый ключ (не более max_concurrent_encryptions одновременно)
//!   6. Вернуть все Ciphertext или ошибку - частичного результата нет
//! ```
//!
//! ## Гарантии
//!
//! - Каждый получатель из входного множества ровно один раз в результате
//! - Каждый Ciphertext зашифрован только ключом своего получателя,
//!   общего симметричного секрета нет
//! - Отмена (drop future) отбрасывает уже готовые ciphertext
//! - Повторов нет: retry - решение вызывающего кода

use crate::config::Config;
use crate::crypto::cipher::{Ciphertext, MessageCipher};
use crate::crypto::jwk::ExportedKey;
use crate::crypto::provider::KeyPairProvider;
use crate::directory::{GroupId, GroupMembershipSource, RecipientDirectory, UserId};
use crate::error::{CryptoError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fan-out шифрование одного сообщения для множества получателей
pub struct GroupEncryptionOrchestrator<P: KeyPairProvider, D: RecipientDirectory + ?Sized> {
    directory: Arc<D>,
    batch_size: usize,
    max_concurrent_batches: usize,
    max_concurrent_encryptions: usize,
    _phantom: PhantomData<P>,
}

impl<P: KeyPairProvider, D: RecipientDirectory + ?Sized> GroupEncryptionOrchestrator<P, D> {
    /// Создать с глобальной конфигурацией
    pub fn new(directory: Arc<D>) -> Self {
        Self::with_config(directory, Config::global())
    }

    pub fn with_config(directory: Arc<D>, config: &Config) -> Self {
        Self {
            directory,
            batch_size: config.directory_batch_size.max(1),
            max_concurrent_batches: config.max_concurrent_batches.max(1),
            max_concurrent_encryptions: config.max_concurrent_encryptions.max(1),
            _phantom: PhantomData,
        }
    }

    /// Зашифровать `plaintext` отдельно для каждого получателя.
    ///
    /// Дубликаты в `recipient_ids` схлопываются. Порядок результата не определён.
    ///
    /// # Errors
    ///
    /// - `IncompleteRecipientSetError` - у части получателей нет опубликованного ключа
    /// - `KeyFormatError` / `KeyAlgorithmMismatchError` - опубликованный ключ непригоден
    /// - `PlaintextTooLargeError` - сообщение не помещается в ключ получателя
    /// - `DirectoryError` - сбой источника ключей
    pub async fn encrypt_for_group<I>(&self, plaintext: &str, recipient_ids: I) -> Result<Vec<Ciphertext>>
    where
        I: IntoIterator<Item = UserId>,
    {
        let recipients: BTreeSet<UserId> = recipient_ids.into_iter().collect();
        if recipients.is_empty() {
            debug!("Empty recipient set, nothing to encrypt");
            return Ok(Vec::new());
        }

        let resolved = self.resolve_all(&recipients).await?;
        let keys = Self::prepare_keys(plaintext, resolved)?;

        let ciphertexts: Vec<Ciphertext> = stream::iter(keys)
            .map(|(recipient_id, public_key)| async move {
                let bytes = MessageCipher::<P>::encrypt(&public_key, plaintext).await?;
                Ok::<_, CryptoError>(Ciphertext {
                    recipient_id,
                    bytes,
                })
            })
            .buffer_unordered(self.max_concurrent_encryptions)
            .try_collect()
            .await?;

        info!(recipients = ciphertexts.len(), "Group message encrypted");
        Ok(ciphertexts)
    }

    /// Зашифровать для всех текущих участников группы
    pub async fn encrypt_for_group_id<M>(
        &self,
        membership_source: &M,
        group_id: &GroupId,
        plaintext: &str,
    ) -> Result<Vec<Ciphertext>>
    where
        M: GroupMembershipSource + ?Sized,
    {
        let membership = membership_source.membership(group_id).await?;
        debug!(
            group_id = %group_id,
            participants = membership.participant_ids.len(),
            "Resolved group membership"
        );
        self.encrypt_for_group(plaintext, membership.participant_ids).await
    }

    /// Разрешить ключи всех получателей или вернуть полный список отсутствующих
    async fn resolve_all(&self, recipients: &BTreeSet<UserId>) -> Result<HashMap<UserId, ExportedKey>> {
        let ordered: Vec<UserId> = recipients.iter().cloned().collect();
        let batches: Vec<BTreeSet<UserId>> = ordered
            .chunks(self.batch_size)
            .map(|chunk| chunk.iter().cloned().collect())
            .collect();
        debug!(
            recipients = recipients.len(),
            batches = batches.len(),
            "Resolving recipient keys"
        );

        let directory = &self.directory;
        let found: Vec<HashMap<UserId, ExportedKey>> = stream::iter(batches)
            .map(|batch| async move {
                let mut keys = directory.resolve_public_keys(&batch).await?;
                // Directory может вернуть лишнее - берём только запрошенное
                keys.retain(|id, _| batch.contains(id));
                Ok::<_, CryptoError>(keys)
            })
            .buffer_unordered(self.max_concurrent_batches)
            .try_collect()
            .await?;

        let resolved: HashMap<UserId, ExportedKey> = found.into_iter().flatten().collect();

        let missing: Vec<UserId> = recipients
            .iter()
            .filter(|id| !resolved.contains_key(*id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(missing = missing.len(), "Recipients without a published key");
            return Err(CryptoError::IncompleteRecipientSetError { missing });
        }

        Ok(resolved)
    }

    /// Импортировать все ключи и проверить лимит до начала шифрования
    fn prepare_keys(
        plaintext: &str,
        resolved: HashMap<UserId, ExportedKey>,
    ) -> Result<Vec<(UserId, P::PublicKey)>> {
        let mut keys = Vec::with_capacity(resolved.len());
        for (recipient_id, exported) in resolved {
            let public_key = P::import_public_key(&exported).map_err(|e| {
                warn!(recipient = %recipient_id, "Published key rejected: {}", e);
                e
            })?;

            let max = P::max_plaintext_len(&public_key);
            if plaintext.len() > max {
                return Err(CryptoError::PlaintextTooLargeError {
                    len: plaintext.len(),
                    max,
                });
            }
            keys.push((recipient_id, public_key));
        }
        Ok(keys)
    }
}
