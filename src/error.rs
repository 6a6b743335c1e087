use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("unsupported data return type '{0}'")]
    UnsupportedReturnType(String),

    #[error("{0}")]
    MalformedJson(String),

    #[error("Trying to write more data than the buffer capacity")]
    BufferOverflow,

    /// An error reported by the engine through a `Status` frame.
    #[error("{message}")]
    Engine {
        http_code: u16,
        message: String,
        err_line_no: u32,
        err_file_name: String,
    },

    #[error("engine is not available: {0}")]
    EngineUnavailable(String),

    #[error("bad config: {0}")]
    BadConfig(String),
}

impl Error {
    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::UnsupportedReturnType(_) | Error::MalformedJson(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::BufferOverflow | Error::BadConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Engine { http_code, .. } => {
                StatusCode::from_u16(*http_code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The message placed in the `{"error": ...}` response body.
    ///
    /// Engine-side errors with status >= 500 carry the native file and line
    /// so cluster-side failures can be traced from the client.
    pub fn public_message(&self) -> String {
        match self {
            Error::Engine {
                http_code,
                message,
                err_line_no,
                err_file_name,
            } if *http_code >= 500 && !err_file_name.is_empty() => {
                format!("{message} File: {err_file_name}, Line: {err_line_no}")
            }
            other => other.to_string(),
        }
    }

    /// An engine-internal failure detected on the gateway side of the FFI
    /// boundary, e.g. a response payload that is not valid UTF-8.
    pub fn engine_internal(message: impl Into<String>) -> Self {
        Error::Engine {
            http_code: 500,
            message: message.into(),
            err_line_no: 0,
            err_file_name: String::new(),
        }
    }
}
