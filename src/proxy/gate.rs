//! Content-type gate for primary responses.

use reqwest::header::{HeaderMap, CONTENT_TYPE};

/// Whether a primary response may be streamed as an image.
///
/// Passes any `Content-Type` containing `image`, compared ASCII
/// case-insensitively. A missing or non-text header fails the gate.
pub fn is_image(headers: &HeaderMap) -> bool {
    content_type(headers)
        .map(|ct| ct.to_ascii_lowercase().contains("image"))
        .unwrap_or(false)
}

/// The response Content-Type as text, if present and printable.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn with_type(ct: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        headers
    }

    #[test]
    fn image_types_pass() {
        assert!(is_image(&with_type("image/jpeg")));
        assert!(is_image(&with_type("image/svg+xml; charset=utf-8")));
        assert!(is_image(&with_type("Image/PNG")));
    }

    #[test]
    fn other_types_fail() {
        assert!(!is_image(&with_type("text/html")));
        assert!(!is_image(&with_type("application/octet-stream")));
        assert!(!is_image(&HeaderMap::new()));
    }
}
