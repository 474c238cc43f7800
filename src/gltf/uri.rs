//! `data:` URIs and relative resource paths.

use crate::error::{LoadError, Result};

/// A decoded `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decodes `data:[<mime>][;base64],<payload>`.
///
/// Only base64 payloads are accepted; glTF never embeds percent-encoded
/// binary.
pub fn parse_data_uri(uri: &str) -> Result<DataUri> {
    let fail = |reason: &str| LoadError::fetch(truncate(uri), reason);

    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| fail("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| fail("data URI has no payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| fail("data URI is not base64 encoded"))?;

    let data = base64_decode(payload).ok_or_else(|| fail("invalid base64 payload"))?;
    Ok(DataUri {
        mime_type: (!mime.is_empty()).then(|| mime.to_string()),
        data,
    })
}

/// Resolves `relative` against the directory part of `document`.
///
/// Absolute URIs (with a scheme or leading `/`) are returned unchanged.
pub fn resolve_relative(document: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.contains("://") {
        return relative.to_string();
    }
    match document.rfind('/') {
        Some(slash) => format!("{}{}", &document[..=slash], relative),
        None => relative.to_string(),
    }
}

/// Standard-alphabet base64 with optional padding; whitespace is skipped.
pub fn base64_decode(input: &str) -> Option<Vec<u8>> {
    fn sextet(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'Z' => Some(c - b'A'),
            b'a'..=b'z' => Some(c - b'a' + 26),
            b'0'..=b'9' => Some(c - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let input: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let body = match input.iter().position(|&b| b == b'=') {
        Some(pad) if input[pad..].iter().all(|&b| b == b'=') && input.len() - pad <= 2 => {
            &input[..pad]
        }
        Some(_) => return None,
        None => &input[..],
    };
    if body.len() % 4 == 1 {
        return None;
    }

    let mut out = Vec::with_capacity(body.len() * 3 / 4);
    for chunk in body.chunks(4) {
        let mut acc = 0u32;
        for &c in chunk {
            acc = (acc << 6) | u32::from(sextet(c)?);
        }
        acc <<= 6 * (4 - chunk.len()) as u32;
        let bytes = acc.to_be_bytes();
        out.extend_from_slice(&bytes[1..chunk.len()]);
    }
    Some(out)
}

/// Keeps error messages short when a data URI is megabytes long.
fn truncate(uri: &str) -> String {
    const MAX: usize = 48;
    match uri.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &uri[..cut]),
        None => uri.to_string(),
    }
}
