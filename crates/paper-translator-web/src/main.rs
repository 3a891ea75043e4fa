//! Paper Translator Web - HTTP service translating uploaded PDF papers.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use paper_translator_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "paper-translator-web")]
#[command(author, version, about = "Paper Translator Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Layout segmentation endpoint
    #[arg(long, env = "PAPER_LAYOUT_URL")]
    layout_url: Option<String>,

    /// OCR endpoint
    #[arg(long, env = "PAPER_OCR_URL")]
    ocr_url: Option<String>,

    /// Font file for the translated text (must cover Japanese)
    #[arg(long, env = "PAPER_FONT")]
    font: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = if let Some(config_path) = &self.config {
            AppConfig::from_file(config_path).context("Failed to load config file")?
        } else {
            AppConfig::load()
        };

        if let Some(ref api_base) = self.api_base {
            config.translator.api_base.clone_from(api_base);
        }
        if self.api_key.is_some() {
            config.translator.api_key.clone_from(&self.api_key);
        }
        if let Some(ref model) = self.model {
            config.translator.model.clone_from(model);
        }
        if let Some(ref url) = self.layout_url {
            config.models.layout_url.clone_from(url);
        }
        if let Some(ref url) = self.ocr_url {
            config.models.ocr_url.clone_from(url);
        }
        if let Some(ref font) = self.font {
            config.render.font_path.clone_from(font);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = args.load_config()?;
    info!(
        "Models: layout {}, OCR {}, translator {} at {}",
        config.models.layout_url,
        config.models.ocr_url,
        config.translator.model,
        config.translator.api_base
    );

    // Loads the font up front so a bad path fails at startup
    let state = Arc::new(
        AppState::new(config).context("Failed to initialize application state")?,
    );

    let app = Router::new()
        .route("/translate_pdf/", post(routes::translate_pdf))
        .route("/clear_temp_dir/", get(routes::clear_temp_dir))
        .layer(DefaultBodyLimit::max(300 * 1024 * 1024)) // 300MB limit for uploads
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
