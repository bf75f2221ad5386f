//! Vault session lifecycle: unlock, lock, status, and expiry sweeps.
//!
//! Unlock state lives in the sessions table, not in process memory, so any
//! number of workers see the same lock state and a restart loses nothing.

use chrono::{Duration, Utc};
use tokio::task;
use tracing::info;

use crate::config::{MAX_SESSION_TIMEOUT_SECONDS, VaultConfig};
use crate::crypto::CredentialHasher;
use crate::db::{Store, VaultSession};
use crate::services::vault_service::{VaultError, VaultStatus};

#[derive(Clone)]
pub struct SessionManager {
    store: Store,
    hasher: CredentialHasher,
    timeout: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Store, hasher: CredentialHasher, config: &VaultConfig) -> Self {
        // Capped so expiry arithmetic stays inside chrono's range even when a
        // host skips Config::validate().
        let secs = i64::try_from(config.session_timeout_seconds.min(MAX_SESSION_TIMEOUT_SECONDS))
            .unwrap_or(300);
        Self {
            store,
            hasher,
            timeout: Duration::seconds(secs),
        }
    }

    /// Verify the admin's password and open a fresh unlock window. Whatever
    /// session was active before is deactivated in the same transaction, so
    /// the admin never holds two live sessions.
    pub async fn unlock(&self, admin_id: i32, password: &str) -> Result<VaultSession, VaultError> {
        let user = self
            .store
            .get_user(admin_id)
            .await?
            .ok_or(VaultError::InvalidCredentials)?;

        let Some(digest) = user.password_hash else {
            return Err(VaultError::InvalidCredentials);
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let verified = task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| {
                VaultError::Internal(format!("Password verification task panicked: {e}"))
            })?;

        if !verified {
            return Err(VaultError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = self
            .store
            .open_exclusive_session(admin_id, now, now + self.timeout)
            .await?;

        info!(
            event = "vault_unlocked",
            admin_id,
            expires_at = %session.expires_at,
            "Vault unlocked"
        );

        Ok(session)
    }

    /// True when the admin holds a session that is active and not yet expired.
    pub async fn has_active_session(&self, admin_id: i32) -> Result<bool, VaultError> {
        let session = self.store.active_session_for(admin_id, Utc::now()).await?;
        Ok(session.is_some())
    }

    /// Close the admin's unlock window. A second lock finds nothing active
    /// and succeeds without touching any row.
    pub async fn lock(&self, admin_id: i32) -> Result<(), VaultError> {
        let closed = self.store.close_sessions_for(admin_id, Utc::now()).await?;

        if closed > 0 {
            info!(event = "vault_locked", admin_id, "Vault locked");
        }

        Ok(())
    }

    /// Current lock state for the admin.
    pub async fn status(&self, admin_id: i32) -> Result<VaultStatus, VaultError> {
        let session = self.store.active_session_for(admin_id, Utc::now()).await?;

        Ok(session.map_or(VaultStatus::Locked, |s| VaultStatus::Unlocked {
            expires_at: s.expires_at,
        }))
    }

    /// Deactivate every session past its expiry, in one batch. Returns the
    /// number of sessions swept.
    pub async fn expire_sweep(&self) -> Result<u64, VaultError> {
        let swept = self.store.close_expired_sessions(Utc::now()).await?;

        if swept > 0 {
            info!(
                event = "vault_sessions_swept",
                count = swept,
                "Expired vault sessions deactivated"
            );
        }

        Ok(swept)
    }
}
