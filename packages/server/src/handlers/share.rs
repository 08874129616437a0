use axum::Json;
use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{upload, user};
use crate::error::{AppError, ErrorBody};
use crate::models::upload::{GalleryResponse, ShareResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/share/{share_id}",
    tag = "Public",
    operation_id = "getShare",
    summary = "Resolve a public share token",
    description = "Unauthenticated read of the public projection of one upload: name, model \
        URL, metadata, and creation time. Never exposes the owner or storage paths.",
    params(("share_id" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Shared upload", body = ShareResponse),
        (status = 404, description = "Unknown token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_share(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let record = upload::Entity::find()
        .filter(upload::Column::ShareId.eq(&share_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".into()))?;

    Ok(Json(ShareResponse {
        ok: true,
        item: record.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/gallery/{username}",
    tag = "Public",
    operation_id = "getGallery",
    summary = "List a user's uploads publicly",
    description = "Unauthenticated listing of a user's uploads, newest first, projected to \
        name, model URL, and image URL. Consumed by external viewer clients.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Gallery items", body = GalleryResponse),
        (status = 404, description = "Unknown user (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn gallery(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<GalleryResponse>, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let records = upload::Entity::find()
        .filter(upload::Column::UserId.eq(user.id))
        .order_by_desc(upload::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(GalleryResponse {
        ok: true,
        items: records.into_iter().map(Into::into).collect(),
    }))
}
