//! Централизованная конфигурация для group-crypto-core
//!
//! Все константы и настройки должны быть определены здесь,
//! чтобы избежать хардкода по всему проекту.

use std::sync::OnceLock;

/// Глобальная конфигурация (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Минимально допустимый размер модуля RSA (в битах)
pub const MIN_MODULUS_BITS: usize = 2048;

/// Максимальный размер модуля, который `rsa` принимает при импорте публичного ключа
pub const MAX_MODULUS_BITS: usize = 4096;

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // КРИПТОГРАФИЧЕСКИЕ ПАРАМЕТРЫ
    // ============================================

    /// Размер модуля RSA (в битах)
    pub modulus_bits: usize,

    /// Публичная экспонента RSA
    pub public_exponent: u64,

    /// Значение `alg` в JWK: RSA-OAEP с SHA-256
    pub jwk_algorithm: &'static str,

    /// Можно ли экспортировать сгенерированные ключи
    pub default_extractable: bool,

    /// ID набора RSA-OAEP
    pub rsa_oaep_suite_id: u16,

    // ============================================
    // FAN-OUT ПАРАМЕТРЫ
    // ============================================

    /// Сколько получателей запрашивать у directory за один вызов
    pub directory_batch_size: usize,

    /// Максимальное количество одновременных запросов к directory
    pub max_concurrent_batches: usize,

    /// Максимальное количество одновременных шифрований при fan-out
    pub max_concurrent_encryptions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Криптография
            modulus_bits: MIN_MODULUS_BITS,
            public_exponent: 65_537,
            jwk_algorithm: "RSA-OAEP-256",
            default_extractable: true,
            rsa_oaep_suite_id: crate::crypto::RSA_OAEP_SUITE_ID,

            // Fan-out
            directory_batch_size: 50,
            max_concurrent_batches: 4,
            max_concurrent_encryptions: 8,
        }
    }
}

impl Config {
    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Переопределить значения по умолчанию через произвольный источник
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(parsed) = lookup("RSA_MODULUS_BITS").and_then(|v| v.parse::<usize>().ok()) {
            config.modulus_bits = parsed.clamp(MIN_MODULUS_BITS, MAX_MODULUS_BITS);
        }

        if let Some(parsed) = lookup("DIRECTORY_BATCH_SIZE").and_then(|v| v.parse::<usize>().ok()) {
            // Пустой batch не имеет смысла
            config.directory_batch_size = parsed.max(1);
        }

        if let Some(parsed) = lookup("MAX_CONCURRENT_BATCHES").and_then(|v| v.parse::<usize>().ok()) {
            config.max_concurrent_batches = parsed.max(1);
        }

        if let Some(parsed) = lookup("MAX_CONCURRENT_ENCRYPTIONS").and_then(|v| v.parse::<usize>().ok()) {
            config.max_concurrent_encryptions = parsed.max(1);
        }

        if let Some(parsed) = lookup("KEYS_EXTRACTABLE").and_then(|v| v.parse().ok()) {
            config.default_extractable = parsed;
        }

        config
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<(), &'static str> {
        Self::init_with(Self::default())
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        Self::init_with(Self::from_env())
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| "Config already initialized")
    }

    /// Проверить, инициализирована ли глобальная конфигурация
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }
}
