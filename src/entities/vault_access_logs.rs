use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "vault_access_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub vault_entry_id: i32,

    /// Admin who performed the action.
    pub accessed_by: i32,

    /// One of `create`, `reset`, `view`.
    pub action: String,

    /// Caller-supplied origin address.
    pub origin: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vault_entries::Entity",
        from = "Column::VaultEntryId",
        to = "super::vault_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    VaultEntries,
}

impl Related<super::vault_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
