use async_trait::async_trait;
use crate::config::Lang;
use crate::error::Result;

/// Information about a translator backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Whether this translator requires an API key
    pub requires_api_key: bool,
}

/// Text-to-text translation primitive.
///
/// One call translates one chunk; chunking and output filtering happen in
/// [`super::BlockTranslator`].
#[async_trait]
pub trait Translator: Send + Sync {
    fn info(&self) -> TranslatorInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    async fn translate(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
    ) -> Result<String>;
}
