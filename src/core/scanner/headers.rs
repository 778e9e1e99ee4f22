// src/core/scanner/headers.rs

use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, SERVER};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::core::models::{BodyMeta, CapturedHeaders, SecurityHeader};

/// Placeholder stored when a header is present but not valid UTF-8.
pub const INVALID_UTF8: &str = "[Invalid UTF-8]";

/// Reads a single header, tolerating non-UTF-8 values.
///
/// # Returns
/// `Some(value)` when the header is present (the placeholder if its bytes are not
/// valid UTF-8), `None` otherwise.
fn read_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s.to_string()),
        Err(_) => {
            warn!(header_name = name, "Header found but contained invalid UTF-8.");
            Some(INVALID_UTF8.to_string())
        }
    }
}

/// Captures the enumerated security headers plus `Server` and `X-Powered-By`
/// from the final response. Header names match case-insensitively.
pub fn extract_headers(headers: &HeaderMap) -> CapturedHeaders {
    let security = SecurityHeader::iter()
        .filter_map(|header| read_header(headers, header.wire_name()).map(|v| (header, v)))
        .collect();
    let captured = CapturedHeaders {
        security,
        server: read_header(headers, SERVER.as_str()),
        powered_by: read_header(headers, "x-powered-by"),
    };
    debug!(
        security_headers = captured.security.len(),
        server = captured.server.as_deref().unwrap_or("-"),
        "Captured response headers."
    );
    captured
}

/// Body metadata from `Content-Type` and `Content-Length`; the body itself is never read.
pub fn extract_body_meta(headers: &HeaderMap) -> BodyMeta {
    BodyMeta {
        content_type: read_header(headers, CONTENT_TYPE.as_str()),
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_extract_security_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Strict-Transport-Security", HeaderValue::from_static("max-age=31536000"));
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        headers.insert("Server", HeaderValue::from_static("nginx/1.25"));
        headers.insert("X-Powered-By", HeaderValue::from_static("PHP/8.2"));
        headers.insert("X-Unrelated", HeaderValue::from_static("1"));

        let captured = extract_headers(&headers);
        assert_eq!(captured.security.len(), 2);
        assert_eq!(
            captured.security.get(&SecurityHeader::StrictTransportSecurity).map(String::as_str),
            Some("max-age=31536000")
        );
        assert!(captured.has(SecurityHeader::XFrameOptions));
        assert!(!captured.has(SecurityHeader::ContentSecurityPolicy));
        assert_eq!(captured.server.as_deref(), Some("nginx/1.25"));
        assert_eq!(captured.powered_by.as_deref(), Some("PHP/8.2"));
    }

    #[test]
    fn test_invalid_utf8_header_is_kept_as_placeholder() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-security-policy",
            HeaderValue::from_bytes(b"default-src \xff").unwrap(),
        );
        let captured = extract_headers(&headers);
        assert_eq!(
            captured.security.get(&SecurityHeader::ContentSecurityPolicy).map(String::as_str),
            Some(INVALID_UTF8)
        );
    }

    #[test]
    fn test_body_meta_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1256"));
        let meta = extract_body_meta(&headers);
        assert_eq!(meta.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(meta.content_length, Some(1256));

        assert_eq!(extract_body_meta(&HeaderMap::new()), BodyMeta::default());
    }
}
