use super::{like, user};
use sea_orm::entity::prelude::*;

/// Maximum number of characters a post may hold.
pub const MAX_CONTENT_CHARS: usize = 280;

/// A short text update owned by exactly one user.
/// Rows are removed together with their author (`ON DELETE CASCADE`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The author of the post.
    pub user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Creation time, assigned by the server and never changed by edits.
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
