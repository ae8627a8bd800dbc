use async_trait::async_trait;
use common::types::Language;

use crate::errors::ServiceError;

pub mod chat_completion;

pub use chat_completion::ChatCompletionTranslator;

/// Trait abstraction over the text-generation backend.
/// The job only needs one string in, one string out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &Language) -> Result<String, ServiceError>;
}
