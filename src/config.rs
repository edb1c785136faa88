use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scratch: ScratchConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the media routes, e.g. `/api/upload`.
    pub base_path: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScratchConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Cloudinary,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub cloudinary: Option<CloudinaryConfig>,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Overrides `https://api.cloudinary.com/v1_1`.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_url: String,
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("MEDIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<Builder, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.base_path", "/api/upload")?
            .set_default("server.max_upload_bytes", 100 * 1024 * 1024)?
            .set_default("database.max_connections", 5)?
            .set_default("scratch.dir", "uploads")?
            .set_default("storage.provider", "cloudinary")
    }
}
