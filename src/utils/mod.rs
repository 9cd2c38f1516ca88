//! Shared utilities

pub mod mime;

pub use mime::{
    extension_for_mime, guess_mime_from_bytes, guess_mime_from_path_or_url, parse_data_url,
};
