pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsConfig, StorageBackend};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Relief API",
        version = "1.0.0",
        description = "Image-to-3D upload service: upload an image, run the external \
            generator, store the results, and share them."
    ),
    tags(
        (name = "Auth", description = "Signup, login, and OAuth username completion"),
        (name = "Uploads", description = "Upload pipeline and record management"),
        (name = "Public", description = "Unauthenticated share and gallery reads"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

async fn health() -> &'static str {
    "OK"
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(cfg.max_age));

    if cfg.allow_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cfg
            .allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let frontend_dir = state.config.assets.frontend_dir.clone();
    let assets_dir = state.config.assets.assets_dir.clone();
    let local_storage_root = match state.config.storage.backend {
        StorageBackend::Local => Some(state.config.storage.local_root.clone()),
        StorageBackend::S3 => None,
    };
    let cors = cors_layer(&state.config.server.cors);

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    let mut router = router
        .route("/health", get(health))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .nest_service("/assets", ServeDir::new(&assets_dir));

    // With the local backend, blobs are public through the server itself.
    if let Some(root) = local_storage_root {
        router = router.nest_service("/storage", ServeDir::new(&root));
    }

    let index = frontend_dir.join("index.html");
    router
        .fallback_service(ServeDir::new(&frontend_dir).fallback(ServeFile::new(index)))
        .layer(cors)
}
