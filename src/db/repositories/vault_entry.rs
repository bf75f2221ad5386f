use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::vault_entries;

pub struct VaultEntryRepository {
    conn: DatabaseConnection,
}

impl VaultEntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the vault entry for a user, if a credential has been issued.
    pub async fn get_for_user(&self, user_id: i32) -> Result<Option<vault_entries::Model>> {
        vault_entries::Entity::find()
            .filter(vault_entries::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query vault entry")
    }

    /// Insert a new entry; the unique index on `user_id` rejects duplicates.
    pub async fn insert(
        &self,
        user_id: i32,
        encrypted_password: &str,
        created_by: i32,
    ) -> Result<vault_entries::Model> {
        let now = Utc::now();

        let active = vault_entries::ActiveModel {
            user_id: Set(user_id),
            encrypted_password: Set(encrypted_password.to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert vault entry")
    }

    /// Replace the stored record for a user, creating the entry when absent.
    pub async fn upsert(
        &self,
        user_id: i32,
        encrypted_password: &str,
        created_by: i32,
    ) -> Result<vault_entries::Model> {
        let Some(entry) = self.get_for_user(user_id).await? else {
            return self.insert(user_id, encrypted_password, created_by).await;
        };

        let mut active: vault_entries::ActiveModel = entry.into();
        active.encrypted_password = Set(encrypted_password.to_string());
        active.created_by = Set(created_by);
        active.updated_at = Set(Utc::now());

        active
            .update(&self.conn)
            .await
            .context("Failed to update vault entry")
    }
}
