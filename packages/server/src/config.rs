use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Spool directory for uploaded files and generator work dirs.
    pub temp_dir: PathBuf,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Shared bucket holding both image and model blobs.
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Base of public blob URLs. Defaults per backend: `{endpoint}/{bucket}`
    /// for S3, `/storage` for local.
    pub public_base_url: Option<String>,
    /// Blob root for the local backend, served at `/storage`.
    pub local_root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    /// Executable to invoke.
    pub program: String,
    /// Arguments placed before the generation flags (e.g. a script path
    /// when `program` is an interpreter).
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Static frontend served at `/`.
    pub frontend_dir: PathBuf,
    /// Bundled assets served at `/assets`.
    pub assets_dir: PathBuf,
    /// Model published when the generator produces no geometry.
    pub fallback_model: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub assets: AssetsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5500)?
            .set_default("server.temp_dir", "tmp")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.backend", "local")?
            .set_default("storage.bucket", "models")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.endpoint", "http://127.0.0.1:9000")?
            .set_default("storage.local_root", "storage")?
            .set_default("generator.program", "python")?
            .set_default("generator.args", vec!["./generator.py"])?
            .set_default("generator.timeout_secs", 300)?
            .set_default("assets.frontend_dir", "frontend")?
            .set_default("assets.assets_dir", "assets")?
            .set_default("assets.fallback_model", "assets/fallback.glb")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., RELIEF__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("RELIEF").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
