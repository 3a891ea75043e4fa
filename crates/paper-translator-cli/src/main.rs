//! Paper Translator CLI - Command line tool for translating PDF papers into Japanese.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use paper_translator_core::{AppConfig, DocumentTranslator, PassThroughStart, PdfDocument};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, ValueEnum)]
enum PassThroughOption {
    /// The page with the references title is still translated
    Next,
    /// The page with the references title is kept as is
    Current,
}

impl From<PassThroughOption> for PassThroughStart {
    fn from(opt: PassThroughOption) -> Self {
        match opt {
            PassThroughOption::Next => Self::NextPage,
            PassThroughOption::Current => Self::CurrentPage,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "paper-translate")]
#[command(author, version, about = "Translate English PDF papers into Japanese", long_about = None)]
struct Args {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output PDF file (default: input-ja.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

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

    /// Where pass-through starts once a references title is found
    #[arg(long, value_enum)]
    pass_through_from: Option<PassThroughOption>,

    /// Keep the per-page PDFs in this directory instead of a temporary one
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Command line values win over the config file.
    fn apply(&self, config: &mut AppConfig) {
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
        if let Some(ref start) = self.pass_through_from {
            config.pass_through_start = start.clone().into();
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            self.input.with_file_name(format!("{stem}-ja.pdf"))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    args.apply(&mut config);

    // Load input PDF
    info!("Loading PDF: {}", args.input.display());
    let doc = PdfDocument::from_file(&args.input)
        .with_context(|| format!("Failed to load PDF: {}", args.input.display()))?;

    let total_pages = doc.page_count();
    info!("Document has {} pages", total_pages);

    let translator =
        DocumentTranslator::from_config(config).context("Failed to initialize translator")?;

    // Per-page files go to a scratch directory unless asked to keep them
    let scratch = tempfile::tempdir().context("Failed to create temporary directory")?;
    let work_dir = args.work_dir.clone().unwrap_or_else(|| scratch.path().to_path_buf());

    // Setup progress bar
    let pb = ProgressBar::new(total_pages as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let progress = pb.clone();
    let merged = translator
        .translate_document(
            &doc,
            &work_dir,
            Some(Box::new(move |done, _total| {
                progress.set_position(done as u64);
            })),
        )
        .await
        .context("Failed to translate document")?;

    pb.finish_with_message("Translation complete");

    let output_path = args.output_path();
    std::fs::copy(&merged, &output_path)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Translated PDF saved to: {}", output_path.display());
    }

    Ok(())
}
