use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;

/// Language codes following ISO 639-1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "ja";

/// Translator backend configuration for OpenAI-compatible APIs.
///
/// Supports llama.cpp, Ollama, vLLM, OpenAI, and any other OpenAI-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Total attempts per chunk. 1 means no retry.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Generation cap per chunk
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout; `None` waits for the model indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TranslatorConfig {
    /// Create a new translator config
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            ..Self::default()
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "default_model".to_string()
}

const fn default_retry_count() -> u32 {
    1
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_max_tokens() -> u32 {
    512
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_tokens: default_max_tokens(),
            timeout_secs: None,
        }
    }
}

/// Endpoints of the layout and OCR model server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoints {
    #[serde(default = "default_layout_url")]
    pub layout_url: String,
    #[serde(default = "default_ocr_url")]
    pub ocr_url: String,
}

fn default_layout_url() -> String {
    "http://localhost:8866/layout".to_string()
}

fn default_ocr_url() -> String {
    "http://localhost:8866/ocr".to_string()
}

impl Default for ModelEndpoints {
    fn default() -> Self {
        Self {
            layout_url: default_layout_url(),
            ocr_url: default_ocr_url(),
        }
    }
}

/// Rasterization, typesetting and page composition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rasterization resolution
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Font used for translated text (must cover Japanese)
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,

    /// Font size in pixels at rasterization resolution
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Height every output panel is scaled to
    #[serde(default = "default_page_height_px")]
    pub page_height_px: u32,

    /// White gap between original and translated panels
    #[serde(default = "default_panel_gap_px")]
    pub panel_gap_px: u32,

    /// Resolution used to size the output PDF pages
    #[serde(default = "default_output_dpi")]
    pub output_dpi: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

const fn default_dpi() -> u32 {
    300
}

fn default_font_path() -> PathBuf {
    PathBuf::from("fonts/SourceHanSerif-Light.otf")
}

const fn default_font_size() -> f32 {
    36.0
}

const fn default_page_height_px() -> u32 {
    1400
}

const fn default_panel_gap_px() -> u32 {
    40
}

const fn default_output_dpi() -> u32 {
    150
}

const fn default_jpeg_quality() -> u8 {
    90
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            font_path: default_font_path(),
            font_size: default_font_size(),
            page_height_px: default_page_height_px(),
            panel_gap_px: default_panel_gap_px(),
            output_dpi: default_output_dpi(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Heuristics deciding which blocks get translated and which outputs are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Blocks with fewer OCR lines are left untouched
    #[serde(default = "default_min_ocr_lines")]
    pub min_ocr_lines: usize,

    /// Maximum chunk length in characters sent to the translator
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Chunk translations starting with any of these are dropped
    #[serde(default = "default_rejected_prefixes")]
    pub rejected_prefixes: Vec<String>,

    /// Translations with a larger share of non-Japanese characters are rejected
    #[serde(default = "default_max_foreign_ratio")]
    pub max_foreign_ratio: f64,
}

const fn default_min_ocr_lines() -> usize {
    2
}

const fn default_max_chunk_chars() -> usize {
    512
}

fn default_rejected_prefixes() -> Vec<String> {
    vec!["「この版".to_string()]
}

const fn default_max_foreign_ratio() -> f64 {
    0.8
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_ocr_lines: default_min_ocr_lines(),
            max_chunk_chars: default_max_chunk_chars(),
            rejected_prefixes: default_rejected_prefixes(),
            max_foreign_ratio: default_max_foreign_ratio(),
        }
    }
}

/// Where pass-through rendering begins once a references title is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassThroughStart {
    /// The page holding the title is still translated
    #[default]
    NextPage,
    /// The page holding the title is already passed through
    CurrentPage,
}

impl std::str::FromStr for PassThroughStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "next" | "next-page" | "next_page" => Ok(Self::NextPage),
            "current" | "current-page" | "current_page" => Ok(Self::CurrentPage),
            other => Err(Error::ConfigInvalid {
                field: "pass_through_start".to_string(),
                reason: format!("unknown policy '{other}'"),
            }),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Translator backend configuration
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Layout and OCR model server
    #[serde(default)]
    pub models: ModelEndpoints,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub pass_through_start: PassThroughStart,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            translator: TranslatorConfig::default(),
            models: ModelEndpoints::default(),
            render: RenderConfig::default(),
            filters: FilterConfig::default(),
            pass_through_start: PassThroughStart::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/paper-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("paper-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, reason: &str| {
            Err(Error::ConfigInvalid {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.render.dpi == 0 {
            return invalid("render.dpi", "must be positive");
        }
        if self.render.output_dpi == 0 {
            return invalid("render.output_dpi", "must be positive");
        }
        if self.render.font_size <= 0.0 {
            return invalid("render.font_size", "must be positive");
        }
        if self.render.page_height_px == 0 {
            return invalid("render.page_height_px", "must be positive");
        }
        if self.filters.max_chunk_chars == 0 {
            return invalid("filters.max_chunk_chars", "must be positive");
        }
        if !(0.0..=1.0).contains(&self.filters.max_foreign_ratio) {
            return invalid("filters.max_foreign_ratio", "must be within 0.0..=1.0");
        }
        if self.translator.retry_count == 0 {
            return invalid("translator.retry_count", "at least one attempt is required");
        }
        Ok(())
    }
}
