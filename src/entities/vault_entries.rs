use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vault_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One vault entry per user.
    #[sea_orm(unique)]
    pub user_id: i32,

    /// `ivHex:cipherHex` record produced by the secret codec.
    pub encrypted_password: String,

    /// Admin who issued or last reset the credential.
    pub created_by: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::vault_access_logs::Entity")]
    VaultAccessLogs,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::vault_access_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VaultAccessLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
