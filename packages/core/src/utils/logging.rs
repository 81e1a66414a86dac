// Логирование

use tracing_subscriber::EnvFilter;

/// Уровень по умолчанию, если `RUST_LOG` не задан
const DEFAULT_FILTER: &str = "group_crypto_core=info";

/// Установить fmt subscriber с фильтром из `RUST_LOG`.
///
/// Повторный вызов (или уже установленный subscriber приложения) не ошибка.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
