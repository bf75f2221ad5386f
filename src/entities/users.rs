use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_id: i32,

    /// Unique per company (enforced by an index in the initial migration).
    pub email: String,

    /// Argon2id digest of the login password; None until a credential is issued.
    pub password_hash: Option<String>,

    pub status: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::vault_entries::Entity")]
    VaultEntries,
}

impl Related<super::vault_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
