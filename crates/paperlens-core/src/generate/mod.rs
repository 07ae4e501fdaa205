//! Text-generation collaborator trait and implementations.

pub mod mock;
pub mod openai;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use openai::OpenAiGenerator;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Other(String),
}

/// A single generation request: the fully built prompt plus an optional
/// sampling temperature. Callers that omit the temperature get the
/// service default.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A text-generation service that turns a prompt into a response string.
///
/// The analysis pipeline builds prompts and interprets responses; an
/// implementor only has to deliver the exchange. Implementations must be
/// shareable across concurrent callers.
pub trait TextGenerator: Send + Sync {
    /// The canonical name of this generator (e.g., "openai"), for logging.
    fn name(&self) -> &str;

    /// Generate a completion for the given request.
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>>;
}
