//! Error type for the messaging and media operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::{ErrorKind, HttpError, TransportError};

/// Failure of a [`WhatsAppClient`](super::WhatsAppClient) operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An argument was rejected before any network call.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Offending argument
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The API answered 2xx with a body of the wrong shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Reading or writing a local file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the transport taxonomy bucket, if the error has one.
    ///
    /// Local validation failures map to [`ErrorKind::Validation`].
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation { .. } => Some(ErrorKind::Validation),
            Self::Transport(e) => Some(e.kind()),
            Self::UnexpectedResponse(_) => Some(ErrorKind::Parse),
            Self::Http(_) | Self::Io { .. } => None,
        }
    }
}
