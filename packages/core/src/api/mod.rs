// Публичный API
// Высокоуровневые операции: identity текущего пользователя и групповое шифрование

pub mod group;
pub mod identity;

pub use group::GroupEncryptionOrchestrator;
pub use identity::IdentityManager;
