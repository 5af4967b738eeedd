use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::uploader::FailurePolicy;

/// Default maximum size of a single uploaded file (50MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Identity provider (jwt, appwrite, memory)
    #[arg(long, env = "IDENTITY_PROVIDER")]
    pub identity_provider: Option<String>,

    /// Storage backend provider (appwrite, memory)
    #[arg(long, env = "BACKEND_PROVIDER")]
    pub backend_provider: Option<String>,

    /// What to do with a file whose upload failed (retain, remove)
    #[arg(long, env = "UPLOAD_FAILURE_POLICY")]
    pub on_failure: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
    pub identity: IdentityConfig,
    pub backend: BackendConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
    pub max_request_bytes: usize,
    /// Upper bound on simultaneous uploads per batch, 0 means unbounded.
    pub max_concurrent: usize,
    /// Per-file upload timeout, 0 means none.
    pub timeout_secs: u64,
    pub on_failure: FailurePolicy,
    pub idle_timeout_secs: u64,
    pub toast_capacity: usize,
}

impl UploadConfig {
    pub fn max_concurrent(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub provider: String,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub sign_in_path: String,
    /// Session token accepted by the in-memory provider for the development user.
    pub dev_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub provider: String,
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub users_collection_id: String,
    pub files_collection_id: String,
    pub bucket_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub timeout_disabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
    pub request_timeout_secs: u64,
}

impl ResilienceConfig {
    /// Per-request deadline, `None` when timeouts are disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (!self.timeout_disabled && self.request_timeout_secs > 0)
            .then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "assets")?
            .set_default("uploads.max_file_size_bytes", DEFAULT_MAX_FILE_SIZE)?
            .set_default("uploads.max_request_bytes", 512 * 1024 * 1024)?
            .set_default("uploads.max_concurrent", 0)?
            .set_default("uploads.timeout_secs", 0)?
            .set_default("uploads.on_failure", "retain")?
            .set_default("uploads.idle_timeout_secs", 30 * 60)?
            .set_default("uploads.toast_capacity", 32)?
            .set_default("identity.provider", "memory")?
            .set_default("identity.jwt_secret", "")?
            .set_default("identity.cookie_name", "storeit-session")?
            .set_default("identity.sign_in_path", "/sign-in")?
            .set_default("backend.provider", "memory")?
            .set_default("backend.endpoint", "https://cloud.appwrite.io/v1")?
            .set_default("backend.project_id", "")?
            .set_default("backend.api_key", "")?
            .set_default("backend.database_id", "")?
            .set_default("backend.users_collection_id", "")?
            .set_default("backend.files_collection_id", "")?
            .set_default("backend.bucket_id", "")?
            .set_default("resilience.rate_limit_enabled", false)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.requests_per_second", 20.0)?
            .set_default("resilience.burst_size", 40.0)?
            .set_default("resilience.request_timeout_secs", 120)?;

        // Explicit file first, then ./config.yaml when present.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml));
        } else if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::new("config.yaml", FileFormat::Yaml));
        }

        // E.g. STOREIT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("STOREIT")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > CLI env var > STOREIT_ env > config file > defaults.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(provider) = cli.identity_provider {
            builder = builder.set_override("identity.provider", provider)?;
        }
        if let Some(provider) = cli.backend_provider {
            builder = builder.set_override("backend.provider", provider)?;
        }
        if let Some(policy) = cli.on_failure {
            builder = builder.set_override("uploads.on_failure", policy)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
