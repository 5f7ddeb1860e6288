/// Errors raised by the request layer.
///
/// Network operations reject their promise with one of these (or with a
/// [`seeclickfix_http::Error`] passed through from the transport).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {code}")]
    Status { code: u16 },

    #[error("location produced no query arguments")]
    LocationWithoutQueryArguments,

    #[error("invalid {name}: {value}")]
    InvalidCoordinate { name: &'static str, value: f64 },

    #[error("cannot convert {value:?} to an integer")]
    StrintegerConversion { value: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("transport error: {0}")]
    Transport(#[from] seeclickfix_http::Error),
}

/// Result type alias for request-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
