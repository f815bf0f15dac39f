//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks the chat completions protocol:
//! OpenAI itself, Ollama in compatibility mode, vLLM, LocalAI or LM Studio.
//!
//! ```rust,no_run
//! use diary_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! let backend = OpenAIBackend::new(OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     gen_model: "llama3".to_string(),
//!     json_mode: true,
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_diary_error, OpenAIErrorCode};
pub use types::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIError,
    OpenAIErrorResponse, ResponseFormat,
};
