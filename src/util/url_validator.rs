use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the backend base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// Query strings and fragments cannot be combined with templated paths.
    #[error("Base URL must not carry a query or fragment")]
    QueryOrFragment,
}

/// Validates and normalizes the account backend base URL.
///
/// Unlike feed URLs, localhost is allowed: the development backend listens on
/// `http://localhost:4000` by default. Trailing slashes are removed so request
/// paths can be appended with a single `/`.
///
/// # Examples
///
/// ```
/// use pulse_account::util::validate_base_url;
///
/// assert_eq!(validate_base_url("http://localhost:4000/").unwrap(), "http://localhost:4000");
/// assert_eq!(
///     validate_base_url("https://api.example.com/pulse//").unwrap(),
///     "https://api.example.com/pulse"
/// );
/// assert!(validate_base_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<String, UrlValidationError> {
    let trimmed = url_str.trim();
    let url = Url::parse(trimmed)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::QueryOrFragment);
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_allowed() {
        assert_eq!(
            validate_base_url("http://localhost:4000").unwrap(),
            "http://localhost:4000"
        );
        assert_eq!(
            validate_base_url("http://127.0.0.1:8080/").unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        assert_eq!(
            validate_base_url("https://api.example.com/v1///").unwrap(),
            "https://api.example.com/v1"
        );
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_base_url("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_base_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_unparsable_rejected() {
        assert!(matches!(
            validate_base_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_query_rejected() {
        assert!(matches!(
            validate_base_url("https://example.com/?token=1"),
            Err(UrlValidationError::QueryOrFragment)
        ));
        assert!(matches!(
            validate_base_url("https://example.com/#top"),
            Err(UrlValidationError::QueryOrFragment)
        ));
    }
}
