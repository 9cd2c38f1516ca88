//! canvasgen
//!
//! A unified multi-provider image and text generation adapter layer. One
//! caller-facing contract hides which vendor, wire format, or transport
//! encoding (JSON, multipart, inline base64) a given provider/model
//! combination requires:
//!
//! - **OpenAI-compatible**: `/images/generations` plus a multipart
//!   `/images/edits` path with a silent fallback chain for reference images
//! - **Gemini-compatible**: `:generateContent` with multimodal inline parts
//! - **Doubao-compatible**: flat JSON with `image_url`
//!
//! Text tokens arrive through a cancellable streaming decoder over the
//! OpenAI-compatible chat wire format.
//!
//! ```rust,ignore
//! use canvasgen::{create_adapter, GenerationParams, ProviderConfig};
//!
//! let adapter = create_adapter(&config, "dall-e-3")?;
//! let images = adapter
//!     .generate_image(GenerationParams::new("dall-e-3", "a red fox"))
//!     .await?;
//! ```
#![deny(unsafe_code)]

pub mod error;
pub mod presets;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod traits;
pub mod transport;
pub mod types;
pub mod utils;

pub use error::GenError;
pub use presets::preset_providers;
pub use registry::create_adapter;
pub use streaming::{
    chat_completion, collect_text, stream_chat_completions, CancelHandle, ChatMessage,
    ChatRequest, ChatStream, ChatStreamHandle, MessageRole, SseChunkDecoder,
};
pub use traits::{ImageGenerationCapability, ProviderAdapter, TextGenerationCapability};
pub use transport::HttpTransport;
pub use types::{
    ApiFormat, GeneratedImage, GenerationParams, ModelConfig, ModelType, ProviderConfig,
    ReferenceImage,
};
