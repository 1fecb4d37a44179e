use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use lexstack_ai::PredictorConfig;
use serde::{Deserialize, Serialize};

/// Service configuration.
///
/// Read from an optional `lexstack.toml` in the working directory (or an
/// explicit file), then overridden by `LEXSTACK__*` environment variables,
/// e.g. `LEXSTACK__BIND=127.0.0.1:9000` or
/// `LEXSTACK__CORS_ORIGINS=http://localhost:8080,http://127.0.0.1:8080`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory holding the classifier artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Encoder directory; `<models_dir>/encoder` when unset
    #[serde(default)]
    pub encoder_dir: Option<PathBuf>,

    /// Tokens per encoder window
    #[serde(default = "default_chunk_window")]
    pub chunk_window: usize,

    /// Extracted text shorter than this (after trimming) is rejected
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    /// Length of the text preview echoed back to the caller
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Maximum upload size in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Load the models at startup instead of on the first prediction
    #[serde(default)]
    pub preload_models: bool,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            models_dir: default_models_dir(),
            encoder_dir: None,
            chunk_window: default_chunk_window(),
            min_text_chars: default_min_text_chars(),
            preview_chars: default_preview_chars(),
            max_upload_mb: default_max_upload_mb(),
            timeout_secs: default_timeout_secs(),
            cors_origins: Vec::new(),
            preload_models: false,
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a file (or `lexstack.toml` if present) and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("lexstack").required(false),
        };
        let builder = config::Config::builder().add_source(file).add_source(
            Environment::with_prefix("LEXSTACK")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors_origins")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        anyhow::ensure!(config.chunk_window > 0, "chunk_window must be positive");
        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.bind.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            models_dir: self.models_dir.clone(),
            encoder_dir: self.encoder_dir.clone(),
            chunk_window: self.chunk_window,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_chunk_window() -> usize {
    lexstack_ai::embedder::DEFAULT_WINDOW
}

fn default_min_text_chars() -> usize {
    lexstack_core::text::MIN_TEXT_CHARS
}

fn default_preview_chars() -> usize {
    lexstack_core::text::PREVIEW_CHARS
}

fn default_max_upload_mb() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    120
}
