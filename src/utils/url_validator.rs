//! Target URL validation.
//!
//! Target URLs are stored verbatim; validation only decides whether a string
//! may be stored at all.

use url::Url;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL is required")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS URLs can be shortened")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is a well-formed absolute `http`/`https` URL.
///
/// Returns the parsed [`Url`]. The caller keeps the original string; the parsed
/// form is only used where an ASCII-serialized URL is required (the `Location`
/// header).
///
/// # Errors
///
/// See [`UrlValidationError`].
pub fn validate_target_url(input: &str) -> Result<Url, UrlValidationError> {
    if input.trim().is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_https() {
        let url = validate_target_url("https://example.com/a").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_accepts_http_with_port_query_and_fragment() {
        assert!(validate_target_url("http://localhost:8080/path?q=1#top").is_ok());
    }

    #[test]
    fn test_accepts_ip_address() {
        assert!(validate_target_url("http://192.168.1.1/admin").is_ok());
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(matches!(
            validate_target_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert!(matches!(
            validate_target_url("example.com/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_target_url(""), Err(UrlValidationError::Empty));
        assert_eq!(validate_target_url("   "), Err(UrlValidationError::Empty));
    }

    #[test]
    fn test_rejects_javascript_protocol() {
        assert_eq!(
            validate_target_url("javascript:alert(1)"),
            Err(UrlValidationError::UnsupportedProtocol)
        );
    }

    #[test]
    fn test_rejects_file_and_ftp() {
        assert_eq!(
            validate_target_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedProtocol)
        );
        assert_eq!(
            validate_target_url("ftp://files.example.com"),
            Err(UrlValidationError::UnsupportedProtocol)
        );
    }

    #[test]
    fn test_unicode_host_serializes_to_ascii() {
        let url = validate_target_url("https://münchen.de/straße").unwrap();
        assert!(url.as_str().is_ascii());
    }
}
