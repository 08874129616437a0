use std::path::Path as FsPath;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entity::upload;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{escape_like, validate_display_name};
use crate::models::upload::{
    HistoryQuery, HistoryResponse, ItemResponse, OkResponse, RenameRequest, UploadCreatedResponse,
};
use crate::pipeline::{self, TempFile, UploadJob};
use crate::state::AppState;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(50 * 1024 * 1024) // 50 MB
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Uploads",
    operation_id = "uploadImage",
    summary = "Upload an image and generate a 3D model",
    description = "Uploads an image (multipart field `file`, required) and runs the full \
        generation pipeline: image to storage, external generator, model to storage, record \
        insert. The optional `name` field sets the display name; otherwise one is allocated.",
    request_body(content_type = "multipart/form-data", description = "Image upload with optional name"),
    responses(
        (status = 201, description = "Upload complete", body = UploadCreatedResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Pipeline failure (STORAGE_ERROR, GENERATOR_ERROR, DATABASE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut image: Option<TempFile> = None;
    let mut original_filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut provided_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                original_filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                image = Some(spool_field(field, &state.config.server.temp_dir).await?);
            }
            Some("name") => {
                provided_name = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read name: {e}"))
                })?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let image = image.ok_or_else(|| AppError::Validation("Image file is required".into()))?;
    let original_filename = original_filename
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

    let record = pipeline::run_pipeline(
        &state,
        UploadJob {
            user_id: auth_user.user_id,
            image,
            original_filename,
            content_type,
            provided_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadCreatedResponse {
            ok: true,
            upload: record.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "Uploads",
    operation_id = "listHistory",
    summary = "List the caller's uploads",
    description = "Returns the caller's uploads, newest first, optionally filtered by a \
        case-insensitive substring match on the display name.",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Upload list", body = HistoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let mut select =
        upload::Entity::find().filter(upload::Column::UserId.eq(auth_user.user_id));

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(upload::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let records = select
        .order_by_desc(upload::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(HistoryResponse {
        ok: true,
        items: records.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/uploads/{id}",
    tag = "Uploads",
    operation_id = "renameUpload",
    summary = "Rename an upload",
    params(("id" = String, Path, description = "Upload ID (UUID)")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Upload renamed", body = ItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, upload_id = %id))]
pub async fn rename_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RenameRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    validate_display_name(&payload.name)?;
    let new_name = payload.name.trim().to_string();

    let record = find_owned(&state.db, &auth_user, &id).await?;

    let mut active: upload::ActiveModel = record.into();
    active.name = Set(new_name);
    let updated = active.update(&state.db).await?;

    Ok(Json(ItemResponse {
        ok: true,
        item: updated.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/uploads/{id}",
    tag = "Uploads",
    operation_id = "deleteUpload",
    summary = "Delete an upload and its blobs",
    description = "Removes both backing blobs (best-effort) and deletes the record. A failed \
        blob removal is logged and the record is deleted anyway.",
    params(("id" = String, Path, description = "Upload ID (UUID)")),
    responses(
        (status = 200, description = "Upload deleted", body = OkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, upload_id = %id))]
pub async fn delete_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    let record = find_owned(&state.db, &auth_user, &id).await?;

    let paths = [record.image_path.clone(), record.model_path.clone()];
    if let Err(e) = state.blob_store.remove(&paths).await {
        warn!(error = %e, upload_id = %record.id, "Blob removal failed, deleting record anyway");
    }

    upload::Entity::delete_by_id(record.id)
        .exec(&state.db)
        .await?;

    Ok(Json(OkResponse { ok: true }))
}

/// Fetch an upload and enforce ownership: 404 when absent, 403 when owned
/// by someone else.
async fn find_owned(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    id: &str,
) -> Result<upload::Model, AppError> {
    let uuid =
        Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid upload ID".into()))?;

    let record = upload::Entity::find_by_id(uuid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".into()))?;

    if record.user_id != auth_user.user_id {
        return Err(AppError::Forbidden);
    }

    Ok(record)
}

/// Spool a multipart field to a temp file under `temp_root`.
///
/// The returned guard removes the file when dropped, so a failure anywhere
/// downstream still cleans up.
async fn spool_field(
    mut field: axum::extract::multipart::Field<'_>,
    temp_root: &FsPath,
) -> Result<TempFile, AppError> {
    tokio::fs::create_dir_all(temp_root)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp directory: {e}")))?;

    let temp = TempFile::new(temp_root.join(format!("upload-{}", Uuid::new_v4())));

    let mut file = tokio::fs::File::create(temp.path())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(temp)
}
