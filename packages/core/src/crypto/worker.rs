// Вынос тяжёлых RSA операций из async контекста

use crate::error::Result;

/// Выполнить синхронную криптографическую операцию на blocking pool tokio.
///
/// Генерация RSA ключей и приватные операции занимают миллисекунды и дольше,
/// поэтому они не должны выполняться на worker-потоках runtime.
pub(crate) async fn run_blocking<F, T>(operation: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation).await?
}
