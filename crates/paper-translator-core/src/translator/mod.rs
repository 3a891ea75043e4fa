mod traits;
mod openai;
mod block;
pub mod filter;

pub use traits::{Translator, TranslatorInfo};
pub use openai::OpenAiTranslator;
pub use block::{BlockOutcome, BlockTranslator};
pub use filter::TranslationFilter;

use crate::config::TranslatorConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    Ok(Arc::new(OpenAiTranslator::from_config(config)?))
}
