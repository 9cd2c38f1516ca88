//! Provider strategies
//!
//! A closed set of tagged strategies behind the `ProviderAdapter` contract.
//! The factory in [`crate::registry`] maps a model's `apiFormat` to one of
//! these; OpenAI-compatible is the default.

pub mod doubao;
pub mod gemini;
pub mod openai;

pub use doubao::DoubaoAdapter;
pub use gemini::GeminiAdapter;
pub use openai::{OpenAiAdapter, REFERENCE_FALLBACK_NOTE};
