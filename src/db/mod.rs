use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use crate::entities::users::Model as User;
pub use crate::entities::vault_access_logs::Model as VaultAccessLog;
pub use crate::entities::vault_entries::Model as VaultEntry;
pub use crate::entities::vault_sessions::Model as VaultSession;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn vault_entry_repo(&self) -> repositories::vault_entry::VaultEntryRepository {
        repositories::vault_entry::VaultEntryRepository::new(self.conn.clone())
    }

    fn access_log_repo(&self) -> repositories::access_log::AccessLogRepository {
        repositories::access_log::AccessLogRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, company_id: i32, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(company_id, email).await
    }

    pub async fn create_user(&self, company_id: i32, email: &str) -> Result<User> {
        self.user_repo().create(company_id, email).await
    }

    pub async fn set_user_password_hash(&self, id: i32, digest: &str) -> Result<()> {
        self.user_repo().set_password_hash(id, digest).await
    }

    // ========== Vault Entry Repository Methods ==========

    pub async fn get_vault_entry(&self, user_id: i32) -> Result<Option<VaultEntry>> {
        self.vault_entry_repo().get_for_user(user_id).await
    }

    pub async fn insert_vault_entry(
        &self,
        user_id: i32,
        encrypted_password: &str,
        created_by: i32,
    ) -> Result<VaultEntry> {
        self.vault_entry_repo()
            .insert(user_id, encrypted_password, created_by)
            .await
    }

    pub async fn upsert_vault_entry(
        &self,
        user_id: i32,
        encrypted_password: &str,
        created_by: i32,
    ) -> Result<VaultEntry> {
        self.vault_entry_repo()
            .upsert(user_id, encrypted_password, created_by)
            .await
    }

    // ========== Access Log Repository Methods ==========

    pub async fn record_vault_access(
        &self,
        vault_entry_id: i32,
        accessed_by: i32,
        action: &str,
        origin: &str,
    ) -> Result<()> {
        self.access_log_repo()
            .record(vault_entry_id, accessed_by, action, origin)
            .await
    }

    pub async fn vault_access_history(&self, vault_entry_id: i32) -> Result<Vec<VaultAccessLog>> {
        self.access_log_repo().for_entry(vault_entry_id).await
    }

    pub async fn recent_vault_access(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<VaultAccessLog>, u64)> {
        self.access_log_repo().recent(page, page_size).await
    }

    // ========== Session Repository Methods ==========

    pub async fn active_session_for(
        &self,
        admin_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<VaultSession>> {
        self.session_repo().active_for_admin(admin_id, now).await
    }

    pub async fn open_exclusive_session(
        &self,
        admin_id: i32,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<VaultSession> {
        self.session_repo()
            .unlock_exclusive(admin_id, now, expires_at)
            .await
    }

    pub async fn close_sessions_for(&self, admin_id: i32, now: DateTime<Utc>) -> Result<u64> {
        self.session_repo().deactivate_for_admin(admin_id, now).await
    }

    pub async fn close_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.session_repo().deactivate_expired(now).await
    }
}
