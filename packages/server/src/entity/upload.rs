use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Display name, user-provided or allocator-assigned. Not unique.
    pub name: String,

    pub image_url: String,
    /// Bucket-relative image path. Immutable once set.
    pub image_path: String,

    pub model_url: String,
    /// Bucket-relative model path. Immutable once set.
    pub model_path: String,

    /// Opaque generator metadata; the shape is not contractually fixed.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta: Option<Json>,

    /// URL-safe random token granting unauthenticated read access.
    #[sea_orm(unique)]
    pub share_id: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
