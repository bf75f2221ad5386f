//! Domain service for the credential vault.
//!
//! Issues, resets, and reveals agent credentials behind an unlock gate,
//! with a synchronous audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::crypto::CodecError;
use crate::db::VaultSession;

/// Errors specific to vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Vault is locked")]
    VaultLocked,

    #[error("User not found")]
    UserNotFound,

    #[error("Vault entry not found")]
    EntryNotFound,

    #[error("User already has a vault credential")]
    CredentialExists,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// The Database and Internal payloads stay opaque on purpose: the full error
// goes to the server log, and callers (and their audit rows) only ever see
// the kind plus a fixed message.
impl From<sea_orm::DbErr> for VaultError {
    fn from(err: sea_orm::DbErr) -> Self {
        error!(error = %err, "Vault storage operation failed");
        Self::Database("storage operation failed".to_string())
    }
}

impl From<anyhow::Error> for VaultError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            error!(error = ?err, "Vault storage operation failed");
            Self::Database("storage operation failed".to_string())
        } else {
            error!(error = ?err, "Vault operation failed");
            Self::Internal("unexpected failure".to_string())
        }
    }
}

impl From<CodecError> for VaultError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedRecord => Self::Validation(err.to_string()),
            CodecError::InvalidKey | CodecError::Encrypt | CodecError::Decrypt => {
                error!(error = %err, "Vault crypto operation failed");
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Inputs for issuing or resetting a credential.
#[derive(Clone)]
pub struct CredentialRequest {
    pub user_id: i32,
    /// Plaintext chosen by the caller; None asks the vault to generate one.
    pub password: Option<String>,
    /// Admin performing the operation.
    pub issued_by: i32,
    /// Origin address recorded in the audit trail.
    pub origin: String,
}

impl std::fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("issued_by", &self.issued_by)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Plaintext credential handed back exactly once from create/reset.
#[derive(Clone, Serialize)]
pub struct IssuedCredential {
    pub user_id: i32,
    pub password: String,
}

impl std::fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Plaintext revealed from the vault during a live unlock session.
#[derive(Clone, Serialize)]
pub struct RevealedCredential {
    pub user_id: i32,
    pub password: String,
}

impl std::fmt::Debug for RevealedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealedCredential")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Lock state reported for an admin.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VaultStatus {
    Locked,
    Unlocked { expires_at: DateTime<Utc> },
}

/// Domain service trait for the credential vault.
#[async_trait::async_trait]
pub trait VaultService: Send + Sync {
    /// Issues a credential for a user that has none yet. Generates a password
    /// when the request does not supply one. The plaintext is returned here
    /// and nowhere else.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UserNotFound`] for an unknown user and
    /// [`VaultError::CredentialExists`] when the user already has an entry.
    async fn create_credential(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, VaultError>;

    /// Replaces a user's credential, creating the vault entry when absent.
    async fn reset_credential(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, VaultError>;

    /// Reveals a user's stored password to an admin holding a live unlock
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::VaultLocked`] when no live session exists; the
    /// refused attempt writes no audit row.
    async fn view_credential(
        &self,
        admin_id: i32,
        user_id: i32,
        origin: &str,
    ) -> Result<RevealedCredential, VaultError>;

    /// Verifies the admin's password and opens a fresh unlock window,
    /// deactivating any session that was active before.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidCredentials`] when verification fails.
    async fn unlock(&self, admin_id: i32, password: &str) -> Result<VaultSession, VaultError>;

    /// Closes the admin's unlock window. Locking an already locked vault is
    /// a no-op.
    async fn lock(&self, admin_id: i32) -> Result<(), VaultError>;

    /// Current lock state for the admin.
    async fn status(&self, admin_id: i32) -> Result<VaultStatus, VaultError>;
}
