//! `SeaORM` implementation of the `VaultService` trait.
//!
//! Every operation runs compute first, persists second, audits third, and
//! only then returns, so a row in the audit trail always describes a change
//! that really happened.

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::config::VaultConfig;
use crate::crypto::{CredentialHasher, SecretCodec, generator};
use crate::db::{Store, VaultSession};
use crate::services::audit::{AuditRecorder, VaultAction};
use crate::services::session::SessionManager;
use crate::services::vault_service::{
    CredentialRequest, IssuedCredential, RevealedCredential, VaultError, VaultService, VaultStatus,
};

pub struct SeaOrmVaultService {
    store: Store,
    codec: SecretCodec,
    hasher: CredentialHasher,
    sessions: SessionManager,
    audit: AuditRecorder,
    password_length: usize,
}

impl SeaOrmVaultService {
    #[must_use]
    pub fn new(
        store: Store,
        codec: SecretCodec,
        hasher: CredentialHasher,
        sessions: SessionManager,
        audit: AuditRecorder,
        config: &VaultConfig,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
            sessions,
            audit,
            password_length: config.generated_password_length,
        }
    }

    /// Use the supplied plaintext or generate one when the request has none.
    fn resolve_plaintext(&self, supplied: Option<String>) -> Result<String, VaultError> {
        match supplied {
            Some(password) if password.is_empty() => Err(VaultError::Validation(
                "Password must not be empty".to_string(),
            )),
            Some(password) => Ok(password),
            None => Ok(generator::generate(self.password_length)),
        }
    }

    /// Hash on a blocking thread; Argon2 is CPU-heavy.
    async fn hash_blocking(&self, plaintext: &str) -> Result<String, VaultError> {
        let hasher = self.hasher.clone();
        let password = plaintext.to_string();

        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| VaultError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(VaultError::from)
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sea_orm::DbErr>()
        .and_then(sea_orm::DbErr::sql_err)
        .is_some_and(|sql_err| matches!(sql_err, sea_orm::SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl VaultService for SeaOrmVaultService {
    async fn create_credential(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, VaultError> {
        let user = self
            .store
            .get_user(request.user_id)
            .await?
            .ok_or(VaultError::UserNotFound)?;

        if self.store.get_vault_entry(user.id).await?.is_some() {
            return Err(VaultError::CredentialExists);
        }

        let plaintext = self.resolve_plaintext(request.password)?;
        let digest = self.hash_blocking(&plaintext).await?;
        let record = self.codec.encrypt(&plaintext)?;

        self.store.set_user_password_hash(user.id, &digest).await?;
        let entry = match self
            .store
            .insert_vault_entry(user.id, &record, request.issued_by)
            .await
        {
            Ok(entry) => entry,
            // A concurrent create can slip past the entry check; the unique
            // index on user_id reports it as a conflict, not a storage fault.
            Err(err) if is_unique_violation(&err) => return Err(VaultError::CredentialExists),
            Err(err) => return Err(err.into()),
        };

        self.audit
            .record(entry.id, request.issued_by, VaultAction::Create, &request.origin)
            .await?;

        info!(
            event = "credential_created",
            user_id = user.id,
            issued_by = request.issued_by,
            "Vault credential created"
        );

        Ok(IssuedCredential {
            user_id: user.id,
            password: plaintext,
        })
    }

    async fn reset_credential(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, VaultError> {
        let user = self
            .store
            .get_user(request.user_id)
            .await?
            .ok_or(VaultError::UserNotFound)?;

        let plaintext = self.resolve_plaintext(request.password)?;
        let digest = self.hash_blocking(&plaintext).await?;
        let record = self.codec.encrypt(&plaintext)?;

        self.store.set_user_password_hash(user.id, &digest).await?;
        let entry = self
            .store
            .upsert_vault_entry(user.id, &record, request.issued_by)
            .await?;

        self.audit
            .record(entry.id, request.issued_by, VaultAction::Reset, &request.origin)
            .await?;

        info!(
            event = "credential_reset",
            user_id = user.id,
            issued_by = request.issued_by,
            "Vault credential reset"
        );

        Ok(IssuedCredential {
            user_id: user.id,
            password: plaintext,
        })
    }

    async fn view_credential(
        &self,
        admin_id: i32,
        user_id: i32,
        origin: &str,
    ) -> Result<RevealedCredential, VaultError> {
        if !self.sessions.has_active_session(admin_id).await? {
            return Err(VaultError::VaultLocked);
        }

        let entry = self
            .store
            .get_vault_entry(user_id)
            .await?
            .ok_or(VaultError::EntryNotFound)?;

        let plaintext = self.codec.decrypt(&entry.encrypted_password)?;

        self.audit
            .record(entry.id, admin_id, VaultAction::View, origin)
            .await?;

        info!(
            event = "credential_viewed",
            user_id,
            admin_id,
            "Vault credential revealed"
        );

        Ok(RevealedCredential {
            user_id,
            password: plaintext,
        })
    }

    async fn unlock(&self, admin_id: i32, password: &str) -> Result<VaultSession, VaultError> {
        self.sessions.unlock(admin_id, password).await
    }

    async fn lock(&self, admin_id: i32) -> Result<(), VaultError> {
        self.sessions.lock(admin_id).await
    }

    async fn status(&self, admin_id: i32) -> Result<VaultStatus, VaultError> {
        self.sessions.status(admin_id).await
    }
}
