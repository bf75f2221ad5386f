pub mod audit;
pub use audit::{AuditRecorder, VaultAction};

pub mod session;
pub use session::SessionManager;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod vault_service;
pub use vault_service::{
    CredentialRequest, IssuedCredential, RevealedCredential, VaultError, VaultService, VaultStatus,
};

pub mod vault_service_impl;
pub use vault_service_impl::SeaOrmVaultService;
