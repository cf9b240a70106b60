use std::error;
use std::fmt;

/// Convenient result type for live-sync operations using [`SyncError`] as the error type.
///
/// This type alias reduces boilerplate when working with fallible live-sync
/// operations. Most functions in this crate return this type.
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for live-sync operations.
///
/// [`SyncError`] couples a coarse [`ErrorKind`] classification with a static
/// description and optional dynamic detail. The kind drives recovery
/// decisions (reconnect, re-authenticate, surface to the operator) while the
/// description and detail carry the human-readable context.
#[derive(Debug, Clone)]
pub struct SyncError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
///
/// Users should not interact with this type directly but use [`SyncError`] methods instead.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Specific categories of errors that can occur during live-sync operations.
///
/// Error kinds are organized by functional area and failure mode so callers
/// can pick a recovery strategy without string-matching messages.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Transport errors
    ConnectionFailed,
    StreamClosed,

    // Request errors
    RequestFailed,
    ResponseInvalid,

    // Security & authentication errors
    AuthenticationError,
    PermissionDenied,

    // Data errors
    SerializationError,
    DeserializationError,
    ValidationError,

    // Durable storage errors
    StorageIoError,

    // Configuration & state errors
    ConfigError,
    InvalidState,

    // IO errors
    IoError,

    // Unknown / uncategorized
    Unknown,
}

impl SyncError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &SyncError) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
        }
    }
}

impl error::Error for SyncError {}

/// Creates a [`SyncError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SyncError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates a [`SyncError`] from an error kind, static description, and dynamic detail.
impl From<(ErrorKind, &'static str, String)> for SyncError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

// Common standard library error conversions

/// Converts [`std::io::Error`] to [`SyncError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`SyncError`] with appropriate error kind.
///
/// Maps to [`ErrorKind::DeserializationError`] for parse failures and
/// [`ErrorKind::IoError`] for I/O failures based on error classification.
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> SyncError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`reqwest::Error`] to [`SyncError`] with appropriate error kind.
///
/// Connection and timeout failures map to [`ErrorKind::ConnectionFailed`],
/// body decode failures to [`ErrorKind::ResponseInvalid`], everything else
/// to [`ErrorKind::RequestFailed`].
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> SyncError {
        let (kind, description) = if err.is_connect() || err.is_timeout() {
            (ErrorKind::ConnectionFailed, "HTTP connection failed")
        } else if err.is_decode() {
            (ErrorKind::ResponseInvalid, "HTTP response decoding failed")
        } else {
            (ErrorKind::RequestFailed, "HTTP request failed")
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts WebSocket errors to [`SyncError`] with appropriate error kind.
///
/// Closed connections map to [`ErrorKind::StreamClosed`], everything else to
/// [`ErrorKind::ConnectionFailed`] since all remaining failures require a
/// reconnect to recover.
impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> SyncError {
        use tokio_tungstenite::tungstenite::Error;

        let (kind, description) = match &err {
            Error::ConnectionClosed | Error::AlreadyClosed => {
                (ErrorKind::StreamClosed, "WebSocket connection closed")
            }
            _ => (ErrorKind::ConnectionFailed, "WebSocket connection failed"),
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`url::ParseError`] to [`SyncError`] with [`ErrorKind::ConfigError`].
impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::ConfigError,
                "URL parsing failed",
                err.to_string(),
            ),
        }
    }
}
