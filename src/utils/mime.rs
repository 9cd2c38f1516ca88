//! MIME handling for reference images
//!
//! Reference images arrive either as `data:<mime>;base64,` URLs or as plain
//! URLs. These helpers extract the MIME type and payload from a data URL,
//! sniff MIME from raw bytes (via the `infer` crate), map extensions, and
//! pick a filename extension for synthesized multipart parts.

/// Parse a data URL into `(mime_type, base64_payload)`.
///
/// Returns `None` when the string has no comma separator (i.e. is not a
/// data URL); callers then treat the whole string as a bare base64 payload.
pub fn parse_data_url(data_url: &str) -> Option<(String, String)> {
    if !data_url.starts_with("data:") {
        return None;
    }
    let comma_pos = data_url.find(',')?;
    let header = &data_url[5..comma_pos];
    let data = &data_url[comma_pos + 1..];

    let mime_type = match header.find(';') {
        Some(semicolon_pos) => header[..semicolon_pos].to_string(),
        None => header.to_string(),
    };

    Some((mime_type, data.to_string()))
}

/// Guess MIME by inspecting bytes (magic numbers).
pub fn guess_mime_from_bytes(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| k.mime_type().to_string())
}

/// Guess MIME by file path or URL (extension-based), image types only.
pub fn guess_mime_from_path_or_url(path_or_url: &str) -> Option<String> {
    let extension = path_or_url
        .rsplit('.')
        .next()?
        .split('?') // handle query parameters in URLs
        .next()?
        .to_lowercase();

    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    };

    Some(mime.to_string())
}

/// Filename extension for a MIME type, for synthesized multipart filenames.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "png",
    }
}
