use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::upload;

/// Owner-facing view of an upload record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadItem {
    /// Upload ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Display name, user-provided or auto-generated.
    #[schema(example = "newXray3")]
    pub name: String,
    pub image_url: String,
    pub image_path: String,
    pub model_url: String,
    pub model_path: String,
    /// Opaque generator metadata.
    #[schema(value_type = Option<Object>)]
    pub meta: Option<serde_json::Value>,
    /// Public share token.
    #[schema(example = "V1StGXR8_Z")]
    pub share_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<upload::Model> for UploadItem {
    fn from(model: upload::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            image_url: model.image_url,
            image_path: model.image_path,
            model_url: model.model_url,
            model_path: model.model_path,
            meta: model.meta,
            share_id: model.share_id,
            created_at: model.created_at,
        }
    }
}

/// Response for a completed upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadCreatedResponse {
    pub ok: bool,
    pub upload: UploadItem,
}

/// Query parameters for the history listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// Case-insensitive substring filter on the display name.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryResponse {
    pub ok: bool,
    pub items: Vec<UploadItem>,
}

/// Request body for renaming an upload.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenameRequest {
    #[schema(example = "left wrist, lateral")]
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemResponse {
    pub ok: bool,
    pub item: UploadItem,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

/// Public projection served for a share token.
///
/// Deliberately excludes the owner and the storage paths.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SharedUpload {
    pub name: String,
    pub model_url: String,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<upload::Model> for SharedUpload {
    fn from(model: upload::Model) -> Self {
        Self {
            name: model.name,
            model_url: model.model_url,
            meta: model.meta,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareResponse {
    pub ok: bool,
    pub item: SharedUpload,
}

/// Public projection for a user's gallery.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryItem {
    pub name: String,
    pub model_url: String,
    pub image_url: String,
}

impl From<upload::Model> for GalleryItem {
    fn from(model: upload::Model) -> Self {
        Self {
            name: model.name,
            model_url: model.model_url,
            image_url: model.image_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryResponse {
    pub ok: bool,
    pub items: Vec<GalleryItem>,
}
