pub use super::users::Entity as Users;
pub use super::vault_access_logs::Entity as VaultAccessLogs;
pub use super::vault_entries::Entity as VaultEntries;
pub use super::vault_sessions::Entity as VaultSessions;
