pub mod prelude;

pub mod users;
pub mod vault_access_logs;
pub mod vault_entries;
pub mod vault_sessions;
