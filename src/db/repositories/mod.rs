pub mod access_log;
pub mod session;
pub mod user;
pub mod vault_entry;
