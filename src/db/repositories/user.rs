use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    /// Get user by company-scoped email
    pub async fn get_by_email(&self, company_id: i32, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    /// Create an active user record with no login credential yet.
    pub async fn create(&self, company_id: i32, email: &str) -> Result<users::Model> {
        let now = Utc::now();

        let active = users::ActiveModel {
            company_id: Set(company_id),
            email: Set(email.to_string()),
            password_hash: Set(None),
            status: Set("active".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")
    }

    /// Store a freshly computed Argon2id digest as the user's login password.
    pub async fn set_password_hash(&self, id: i32, digest: &str) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(digest.to_string()));
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }
}
