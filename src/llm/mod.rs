// Language model module
// Completion service abstraction and the Ollama implementation

pub mod ollama;

pub use ollama::{ModelInfo, OllamaClient};

/// A service that turns a free-text prompt into a free-text completion.
///
/// Responses are untrusted text: callers parse them defensively.
pub trait CompletionService {
    /// Send a single prompt and return the raw completion text
    fn complete(&self, prompt: &str) -> crate::Result<String>;
}

impl<T: CompletionService + ?Sized> CompletionService for &T {
    #[inline]
    fn complete(&self, prompt: &str) -> crate::Result<String> {
        (**self).complete(prompt)
    }
}
