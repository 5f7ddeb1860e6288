use crate::types::HttpRequest;

/// Transport-level failures.
///
/// A transport rejects its promise with one of these. `NoExpectation` and
/// `Mismatch` come only from [`StubTransport`](crate::StubTransport).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("No expectation configured for {request}")]
    NoExpectation { request: Box<HttpRequest> },

    #[error("Request mismatch: expected {expected}, got {actual}")]
    Mismatch {
        expected: Box<HttpRequest>,
        actual: Box<HttpRequest>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn mismatch_display_names_both_requests() {
        let expected = HttpRequest::get(Url::parse("https://example.com/a").unwrap());
        let actual = HttpRequest::get(Url::parse("https://example.com/b").unwrap());
        let error = Error::Mismatch {
            expected: Box::new(expected),
            actual: Box::new(actual),
        };
        assert_eq!(
            error.to_string(),
            "Request mismatch: expected GET https://example.com/a, got GET https://example.com/b"
        );
    }

    #[test]
    fn url_parse_converts() {
        let error: Error = Url::parse("not a url").unwrap_err().into();
        assert!(matches!(error, Error::UrlParse(_)));
    }
}
