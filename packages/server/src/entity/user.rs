use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Assigned at signup, or carried over from the external identity
    /// provider when the account arrives through OAuth.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// None until an OAuth identity has picked a username. Set once,
    /// never changed afterwards.
    #[sea_orm(unique)]
    pub username: Option<String>,

    pub email: Option<String>,

    /// None for OAuth identities.
    pub password_hash: Option<String>,

    #[sea_orm(has_many)]
    pub uploads: HasMany<super::upload::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
