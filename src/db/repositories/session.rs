use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::vault_sessions;

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The admin's live session: active flag set and expiry still ahead.
    pub async fn active_for_admin(
        &self,
        admin_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<vault_sessions::Model>> {
        vault_sessions::Entity::find()
            .filter(vault_sessions::Column::AdminId.eq(admin_id))
            .filter(vault_sessions::Column::IsActive.eq(true))
            .filter(vault_sessions::Column::ExpiresAt.gt(now))
            .order_by_desc(vault_sessions::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query active vault session")
    }

    /// Deactivate whatever is active for the admin and open a fresh session.
    /// Runs in one transaction so concurrent unlocks cannot leave two active
    /// rows behind.
    pub async fn unlock_exclusive(
        &self,
        admin_id: i32,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<vault_sessions::Model> {
        let txn = self.conn.begin().await?;

        vault_sessions::Entity::update_many()
            .col_expr(vault_sessions::Column::IsActive, Expr::value(false))
            .col_expr(vault_sessions::Column::LockedAt, Expr::value(Some(now)))
            .filter(vault_sessions::Column::AdminId.eq(admin_id))
            .filter(vault_sessions::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let session = vault_sessions::ActiveModel {
            admin_id: Set(admin_id),
            expires_at: Set(expires_at),
            is_active: Set(true),
            locked_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit()
            .await
            .context("Failed to commit vault unlock transaction")?;

        Ok(session)
    }

    /// Mark the admin's active sessions locked. Returns rows touched, which
    /// is 0 when the vault was already locked.
    pub async fn deactivate_for_admin(&self, admin_id: i32, now: DateTime<Utc>) -> Result<u64> {
        let result = vault_sessions::Entity::update_many()
            .col_expr(vault_sessions::Column::IsActive, Expr::value(false))
            .col_expr(vault_sessions::Column::LockedAt, Expr::value(Some(now)))
            .filter(vault_sessions::Column::AdminId.eq(admin_id))
            .filter(vault_sessions::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to lock vault sessions")?;

        Ok(result.rows_affected)
    }

    /// Deactivate every session whose expiry has passed, in one batch.
    pub async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = vault_sessions::Entity::update_many()
            .col_expr(vault_sessions::Column::IsActive, Expr::value(false))
            .col_expr(vault_sessions::Column::LockedAt, Expr::value(Some(now)))
            .filter(vault_sessions::Column::IsActive.eq(true))
            .filter(vault_sessions::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to sweep expired vault sessions")?;

        Ok(result.rows_affected)
    }
}
