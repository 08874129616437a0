use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, FromQueryResult, QueryFilter,
    QuerySelect,
};
use tracing::warn;
use uuid::Uuid;

use crate::entity::upload;

/// Prefix for allocator-assigned display names.
pub const AUTO_NAME_PREFIX: &str = "newXray";

#[derive(FromQueryResult)]
struct NameRow {
    name: String,
}

/// Allocate the next default display name for a user.
///
/// Scans the user's existing names for `newXray<counter>` (case-insensitive)
/// and returns `newXray{max+1}`. Auto-naming is best-effort: a failed scan
/// falls back to `newXray1` instead of failing the caller.
pub async fn auto_name(db: &DatabaseConnection, user_id: Uuid) -> String {
    match max_counter(db, user_id).await {
        Ok(max) => format!("{AUTO_NAME_PREFIX}{}", max + 1),
        Err(e) => {
            warn!(error = %e, %user_id, "Auto-name scan failed, falling back");
            format!("{AUTO_NAME_PREFIX}1")
        }
    }
}

async fn max_counter(db: &DatabaseConnection, user_id: Uuid) -> Result<u32, DbErr> {
    let rows = upload::Entity::find()
        .filter(upload::Column::UserId.eq(user_id))
        .filter(
            Expr::expr(Func::lower(Expr::col(upload::Column::Name))).like(LikeExpr::new(format!(
                "{}%",
                AUTO_NAME_PREFIX.to_lowercase()
            ))),
        )
        .select_only()
        .column(upload::Column::Name)
        .into_model::<NameRow>()
        .all(db)
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| counter_suffix(&row.name))
        .max()
        .unwrap_or(0))
}

/// Extract the counter from an allocator-style name, case-insensitively.
/// `newXray12` -> `Some(12)`; anything else -> `None`.
fn counter_suffix(name: &str) -> Option<u32> {
    if !name.is_char_boundary(AUTO_NAME_PREFIX.len()) {
        return None;
    }
    let (head, rest) = name.split_at(AUTO_NAME_PREFIX.len());
    if !head.eq_ignore_ascii_case(AUTO_NAME_PREFIX) {
        return None;
    }
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
