use std::path::{Path, PathBuf};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entity::{upload, user};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{filename, naming, token};

/// Storage namespace for uploaded source images.
pub const IMAGE_KIND: &str = "images";
/// Storage namespace for published models.
pub const MODEL_KIND: &str = "models";

const MODEL_CONTENT_TYPE: &str = "model/gltf-binary";
const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// A spooled local file removed on drop, success or failure.
///
/// Removal is best-effort; a failure leaks one temp file and is left to
/// external temp housekeeping.
pub struct TempFile(PathBuf);

impl TempFile {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.0.display(), error = %e, "Failed to remove temp file");
        }
    }
}

/// Per-request generator work directory, removed recursively on drop.
struct WorkDir(PathBuf);

impl WorkDir {
    async fn create(root: &Path, user_id: Uuid) -> std::io::Result<Self> {
        let dir = root.join(format!("{user_id}_{}", Utc::now().timestamp_millis()));
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self(dir))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.0.display(), error = %e, "Failed to remove work directory");
        }
    }
}

/// One upload request, ready for the pipeline.
pub struct UploadJob {
    pub user_id: Uuid,
    /// Spooled copy of the uploaded image.
    pub image: TempFile,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub provided_name: Option<String>,
}

/// Resolve a user's display username, used to namespace storage paths.
pub async fn resolve_username(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<String, AppError> {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    user.username
        .ok_or_else(|| AppError::NotFound("User has no username".into()))
}

fn storage_path(kind: &str, username: &str, file_name: &str) -> String {
    format!(
        "{kind}/{username}/{}_{file_name}",
        Utc::now().timestamp_millis()
    )
}

/// Run the full upload pipeline for one request.
///
/// Image upload, generation, model upload, naming, and the record insert
/// happen in order, each a hard dependency on the previous step. Local temp
/// state is cleaned up on every exit path; remote blobs written before a
/// later failure are left behind deliberately (attributable and harmless,
/// no compensating transaction).
#[instrument(skip(state, job), fields(user_id = %job.user_id))]
pub async fn run_pipeline(
    state: &AppState,
    job: UploadJob,
) -> Result<upload::Model, AppError> {
    let username = resolve_username(&state.db, job.user_id).await?;

    let image_name = filename::sanitize(&job.original_filename);
    let image_content_type = job
        .content_type
        .clone()
        .or_else(|| {
            mime_guess::from_path(&image_name)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());

    let image = state
        .blob_store
        .put_file(
            job.image.path(),
            &storage_path(IMAGE_KIND, &username, &image_name),
            &image_content_type,
        )
        .await?;

    let work_dir = WorkDir::create(&state.config.server.temp_dir, job.user_id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create work directory: {e}")))?;

    let generated = state.generator.run(job.image.path(), work_dir.path()).await?;

    // The pipeline never fails for lack of geometry: publish the bundled
    // fallback asset when the generator produced no model.
    let model_local = match &generated.model_path {
        Some(path) => path.clone(),
        None => {
            info!("Generator produced no model, publishing fallback asset");
            state.config.assets.fallback_model.clone()
        }
    };
    let model_name = model_local
        .file_name()
        .and_then(|n| n.to_str())
        .map(filename::sanitize)
        .unwrap_or_else(|| "model.glb".to_string());

    let model = state
        .blob_store
        .put_file(
            &model_local,
            &storage_path(MODEL_KIND, &username, &model_name),
            MODEL_CONTENT_TYPE,
        )
        .await?;

    let name = match job.provided_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => naming::auto_name(&state.db, job.user_id).await,
    };

    let record = upload::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(job.user_id),
        name: Set(name),
        image_url: Set(image.public_url),
        image_path: Set(image.path),
        model_url: Set(model.public_url),
        model_path: Set(model.path),
        meta: Set(generated.meta),
        share_id: Set(token::share_token()),
        created_at: Set(Utc::now()),
    };

    // A failed insert here leaves the image and model blobs orphaned; that
    // inconsistency is accepted rather than reconciled.
    let record = record.insert(&state.db).await?;

    info!(upload_id = %record.id, share_id = %record.share_id, "Upload pipeline complete");
    Ok(record)
}
