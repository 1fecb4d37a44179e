mod display;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexstack_ai::{Predictor, PredictorConfig};
use lexstack_client::ClassifyClient;
use lexstack_core::{ClassifyResponse, Document, has_enough_text, preview};
use lexstack_server::ServiceConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexstack", version, about = "Legal document outcome classifier")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP prediction server
    Serve {
        /// Configuration file (default: ./lexstack.toml if present)
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Listen address, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<String>,
        /// Model artifact directory
        #[arg(long, env = "LEXSTACK_MODELS")]
        models: Option<PathBuf>,
        /// Load the models before accepting requests
        #[arg(long)]
        preload: bool,
    },
    /// Classify a local document without a server
    Predict {
        /// PDF, DOCX or plain-text file
        file: PathBuf,
        /// Model artifact directory
        #[arg(long, env = "LEXSTACK_MODELS", default_value = "models")]
        models: PathBuf,
        /// Encoder directory (default: <models>/encoder)
        #[arg(long)]
        encoder: Option<PathBuf>,
        /// Tokens per encoder window
        #[arg(long, default_value_t = lexstack_ai::embedder::DEFAULT_WINDOW)]
        window: usize,
        /// Print the JSON response instead of a card
        #[arg(long)]
        json: bool,
    },
    /// Print the text extracted from a document
    Extract {
        file: PathBuf,
        /// Print the cleaned text fed to the encoder
        #[arg(long)]
        clean: bool,
    },
    /// Upload a document to a running server
    Remote {
        file: PathBuf,
        /// Server base URL
        #[arg(long, env = "LEXSTACK_URL", default_value = "http://localhost:8000")]
        url: String,
        /// Print the JSON response instead of a card
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            bind,
            models,
            preload,
        } => {
            let mut config = ServiceConfig::load(config.as_deref())?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(models) = models {
                config.models_dir = models;
            }
            config.preload_models |= preload;
            init_tracing(cli.log_json || config.log_json);
            tracing::info!("lexstack v{}", env!("CARGO_PKG_VERSION"));
            lexstack_server::start_server(config).await
        }
        Command::Predict {
            file,
            models,
            encoder,
            window,
            json,
        } => {
            init_tracing(cli.log_json);
            let config = PredictorConfig {
                models_dir: models,
                encoder_dir: encoder,
                chunk_window: window,
            };
            let resp = tokio::task::spawn_blocking(move || predict_local(&file, &config)).await??;
            print_response(&resp, json)
        }
        Command::Extract { file, clean } => {
            init_tracing(cli.log_json);
            let (_, text) = read_document(&file)?;
            if clean {
                println!("{}", lexstack_core::clean_text(&text));
            } else {
                println!("{text}");
            }
            Ok(())
        }
        Command::Remote { file, url, json } => {
            init_tracing(cli.log_json);
            let bytes =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let client = ClassifyClient::new(&url);
            let resp = client.classify(&file_name(&file), bytes).await?;
            print_response(&resp, json)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        fmt.json().init();
    } else {
        fmt.compact().init();
    }
}

/// Read and extract a local document; the kind comes from its extension.
fn read_document(path: &Path) -> anyhow::Result<(Document, String)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let doc = Document::new(&file_name(path), bytes);
    anyhow::ensure!(!doc.is_empty(), "{} is empty", path.display());
    let kind = doc.kind()?;
    let text = lexstack_extract::try_extract(&doc.bytes, kind)
        .with_context(|| format!("extracting text from {}", path.display()))?;
    Ok((doc, text))
}

fn predict_local(path: &Path, config: &PredictorConfig) -> anyhow::Result<ClassifyResponse> {
    let (doc, text) = read_document(path)?;
    anyhow::ensure!(
        has_enough_text(&text, lexstack_core::text::MIN_TEXT_CHARS),
        "{} contains too little readable text",
        path.display()
    );

    let mut predictor = Predictor::load(config)?;
    let result = predictor.predict_text(&text)?;
    Ok(ClassifyResponse {
        filename: doc.filename,
        text_preview: preview(&text, lexstack_core::text::PREVIEW_CHARS),
        result,
    })
}

fn print_response(resp: &ClassifyResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resp)?);
    } else {
        display::print_prediction_card(resp);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
