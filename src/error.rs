use rust_decimal::Decimal;
use std::fmt;

/// Result type for polymarket-sdk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for polymarket-sdk
#[derive(Debug)]
pub enum Error {
    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Invalid configuration
    Config(String),

    /// Authentication level too low for the requested operation
    AuthRequired(String),

    /// Signing operation failed
    Signing(String),

    /// Invalid parameter
    InvalidParameter(String),

    /// API error response
    Api { status: u16, message: String },

    /// Decimal conversion error
    Decimal(rust_decimal::Error),

    /// Invalid order configuration
    InvalidOrder(String),

    /// Missing required field
    MissingField(String),

    /// Tick size with no entry in the rounding table
    UnsupportedTickSize(Decimal),

    /// The order book cannot fill the requested amount
    NoMatch,

    /// JSON-RPC node returned an error or malformed data
    Rpc(String),

    /// Relay rejected or could not build a meta-transaction
    Relay(String),

    /// Waiting for a result exceeded the configured budget
    Timeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::AuthRequired(msg) => write!(f, "Authentication required: {}", msg),
            Error::Signing(msg) => write!(f, "Signing error: {}", msg),
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            Error::Decimal(e) => write!(f, "Decimal error: {}", e),
            Error::InvalidOrder(msg) => write!(f, "Invalid order: {}", msg),
            Error::MissingField(field) => write!(f, "Missing required field: {}", field),
            Error::UnsupportedTickSize(tick) => write!(f, "Unsupported tick size: {}", tick),
            Error::NoMatch => write!(f, "No match: insufficient order book liquidity"),
            Error::Rpc(msg) => write!(f, "RPC error: {}", msg),
            Error::Relay(msg) => write!(f, "Relay error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Decimal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Decimal(err)
    }
}

impl From<alloy_signer::Error> for Error {
    fn from(err: alloy_signer::Error) -> Self {
        Error::Signing(err.to_string())
    }
}

impl From<alloy_sol_types::Error> for Error {
    fn from(err: alloy_sol_types::Error) -> Self {
        Error::Rpc(format!("ABI decoding failed: {}", err))
    }
}

impl From<alloy_transport::TransportError> for Error {
    fn from(err: alloy_transport::TransportError) -> Self {
        Error::Rpc(err.to_string())
    }
}
