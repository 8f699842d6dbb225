//! Turns the `image_data` string sent by a client into raw image bytes

use crate::error::ServiceError;
use base64::{engine::general_purpose, Engine as _};

/// Append `=` until the length is a multiple of 4. Some canvas encoders drop
/// the trailing padding, which the strict decoder would otherwise reject.
pub fn fix_padding(encoded: &str) -> String {
    let mut padded = encoded.to_string();
    let rem = padded.len() % 4;
    if rem != 0 {
        padded.push_str(&"=".repeat(4 - rem));
    }
    padded
}

/// Decode a `data:<mediatype>;base64,<payload>` string. Everything up to the
/// first comma is discarded.
pub fn decode_data_url(raw: &str) -> Result<Vec<u8>, ServiceError> {
    let (_, encoded) = raw.split_once(',').ok_or_else(|| {
        ServiceError::MalformedPayload("expected a data URL with a ',' before the payload".into())
    })?;

    let bytes = general_purpose::STANDARD.decode(fix_padding(encoded))?;
    Ok(bytes)
}
