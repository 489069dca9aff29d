use base64::{engine::general_purpose, Engine as _};
use encoding_rs::{Encoding, GB18030, GBK, WINDOWS_1252};

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Encodes raw bytes to Base64 format.
pub fn base64_encode_bytes(input: &[u8]) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Decodes a Base64 string into raw bytes.
///
/// Returns `None` if the input is not valid Base64.
pub fn base64_decode(input: &str) -> Option<Vec<u8>> {
    general_purpose::STANDARD.decode(input).ok()
}

/// Decodes Base64 in either the standard or URL-safe alphabet, with or
/// without padding. Link userinfo sections show up in all four variants.
pub fn base64_decode_any(input: &str) -> Option<Vec<u8>> {
    let normalized = input.replace('-', "+").replace('_', "/");
    general_purpose::STANDARD_NO_PAD
        .decode(normalized.trim_end_matches('='))
        .ok()
}

/// Checks whether a body is plausibly one opaque Base64 blob: whitespace
/// stripped, length a multiple of 4, and decodes cleanly.
pub fn is_base64_content(content: &str) -> bool {
    let compact = strip_whitespace(content);
    if compact.is_empty() || compact.len() % 4 != 0 {
        return false;
    }
    general_purpose::STANDARD.decode(compact.as_bytes()).is_ok()
}

/// Strips all whitespace; subscription bodies often wrap Base64 across lines.
pub fn strip_whitespace(content: &str) -> String {
    content.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decodes raw bytes to text through the tolerant codepage chain:
/// UTF-8, ISO-8859-1, windows-1252, GBK, GB18030, then lossy UTF-8.
/// The first decoder that accepts the bytes wins. Order matters: which
/// codepage wins determines the display names seen downstream.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    // ISO-8859-1 maps every byte to U+00xx, so it accepts any input; the
    // entries behind it are kept because the chain order is contractual.
    if let Some(s) = decode_latin1(bytes) {
        return s;
    }
    for enc in [WINDOWS_1252, GBK, GB18030] {
        if let Some(s) = decode_strict(enc, bytes) {
            return s;
        }
    }
    String::from_utf8_lossy(bytes).to_string()
}

/// Decodes a Base64 payload to text via [`decode_text`]. A payload that is
/// not Base64 at all is returned unchanged, matching the tolerant behavior
/// subscription sources rely on.
pub fn decode_base64_text(input: &str) -> String {
    match base64_decode(&strip_whitespace(input)) {
        Some(bytes) => decode_text(&bytes),
        None => input.to_string(),
    }
}

fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| b as char).collect())
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}
