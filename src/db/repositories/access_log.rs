use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::vault_access_logs;

pub struct AccessLogRepository {
    conn: DatabaseConnection,
}

impl AccessLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append one audit row. Callers treat failure as fatal for the
    /// surrounding vault operation.
    pub async fn record(
        &self,
        vault_entry_id: i32,
        accessed_by: i32,
        action: &str,
        origin: &str,
    ) -> Result<()> {
        let active = vault_access_logs::ActiveModel {
            vault_entry_id: Set(vault_entry_id),
            accessed_by: Set(accessed_by),
            action: Set(action.to_string()),
            origin: Set(origin.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        vault_access_logs::Entity::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert vault access log")?;

        Ok(())
    }

    /// All audit rows for one vault entry, newest first.
    pub async fn for_entry(&self, vault_entry_id: i32) -> Result<Vec<vault_access_logs::Model>> {
        vault_access_logs::Entity::find()
            .filter(vault_access_logs::Column::VaultEntryId.eq(vault_entry_id))
            .order_by_desc(vault_access_logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query vault access logs")
    }

    /// Recent audit rows across all entries, paginated (1-based page).
    pub async fn recent(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<vault_access_logs::Model>, u64)> {
        let paginator = vault_access_logs::Entity::find()
            .order_by_desc(vault_access_logs::Column::Id)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }
}
