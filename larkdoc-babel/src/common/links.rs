//! Link targets: Markdown-safe URL encoding, internal document/media URIs and
//! image source classification.
//!
//! Internal URIs use the configured scheme:
//!
//! ```text
//! <scheme>://doc/<token>     document reference (mention without an explicit url)
//! <scheme>://media/<token>   an uploaded image
//! <scheme>://<kind>/<token>  typed placeholders for embedded objects (sheet, board, ...)
//! ```

use crate::blocks::ImageSource;
use std::borrow::Cow;
use url::Url;

/// Prepare a URL for use as a Markdown link target.
///
/// The URL is percent-decoded first, then only `(` and `)` are re-escaped:
/// unescaped parentheses collide with the link-target delimiters, everything
/// else reads better decoded. Undecodable input is used as-is.
pub fn encode_link_url(url: &str) -> String {
    let decoded = urlencoding::decode(url).unwrap_or(Cow::Borrowed(url));
    let mut out = String::with_capacity(decoded.len());
    for ch in decoded.chars() {
        match ch {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            _ => out.push(ch),
        }
    }
    out
}

/// `<scheme>://<kind>/<token>`
pub fn internal_uri(scheme: &str, kind: &str, token: &str) -> String {
    format!("{scheme}://{kind}/{token}")
}

/// Document-reference URI for a mention that carries no explicit url.
pub fn doc_reference_uri(scheme: &str, token: &str) -> String {
    internal_uri(scheme, "doc", token)
}

/// Token of a `<scheme>://<kind>/<token>` URI, if `url` is one.
pub fn parse_internal_uri<'u>(url: &'u str, scheme: &str, kind: &str) -> Option<&'u str> {
    let rest = url.strip_prefix(scheme)?.strip_prefix("://")?;
    let token = rest.strip_prefix(kind)?.strip_prefix('/')?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Sort an image URL into one of the three supported source classes.
pub fn classify_image_source(src: &str, scheme: &str) -> ImageSource {
    if let Some(token) = parse_internal_uri(src, scheme, "media") {
        return ImageSource::Media(token.to_string());
    }
    match Url::parse(src) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => ImageSource::Remote(src.to_string()),
        _ => ImageSource::Local(src.to_string()),
    }
}
