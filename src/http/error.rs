//! Error types for catalog API operations.
//!
//! This module defines [`CatalogError`], which encompasses every way a call
//! against the catalog API can fail, and [`FailureKind`], the coarse
//! classification callers branch on before touching any payload.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::encoder::EncodeError;

/// Coarse classification of a [`CatalogError`].
///
/// A call either succeeds with decoded JSON or fails with exactly one of
/// these kinds. There is no partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received, even after the retry.
    Transport,
    /// A response arrived with a status outside 200/201/202/204.
    HttpError,
    /// A success status arrived but the body was not valid JSON.
    DecodeError,
    /// The request could not be assembled, so nothing was sent.
    Request,
}

/// Errors that can occur while talking to the catalog API.
///
/// # Error Categories
///
/// - **Network errors**: [`Transport`](CatalogError::Transport)
/// - **Server errors**: [`Http`](CatalogError::Http)
/// - **Response errors**: [`Decode`](CatalogError::Decode)
/// - **Client errors**: [`Attachment`](CatalogError::Attachment),
///   [`AttachmentsNotSupported`](CatalogError::AttachmentsNotSupported),
///   [`MainImageNotAttached`](CatalogError::MainImageNotAttached),
///   [`InvalidRequest`](CatalogError::InvalidRequest), [`Url`](CatalogError::Url), [`Encode`](CatalogError::Encode),
///   [`MethodNotAllowed`](CatalogError::MethodNotAllowed),
///   [`Header`](CatalogError::Header), [`Client`](CatalogError::Client)
///
/// # Example
///
/// ```rust,no_run
/// use catalog_client::http::{CatalogError, FailureKind};
///
/// fn handle_error(err: CatalogError) {
///     match err.kind() {
///         FailureKind::HttpError => eprintln!("server said no: {err}"),
///         FailureKind::Transport => eprintln!("network trouble: {err}"),
///         _ => eprintln!("other error: {err}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No response was received after all attempts.
    ///
    /// Connection refused, DNS failure, TLS failure and the per-attempt
    /// timeout all end up here. `message` is the error of the last attempt.
    #[error("Request failed after {attempts} attempt(s): {message}")]
    Transport {
        /// How many attempts were made before giving up.
        attempts: u32,
        /// Error text of the final attempt.
        message: String,
    },

    /// The server answered with a status that is not treated as success.
    ///
    /// `body` holds the decoded error payload when the server sent JSON,
    /// otherwise the raw text wrapped in a JSON string.
    #[error("Server error {status}: {body}")]
    Http {
        /// The HTTP status code returned by the server.
        status: u16,
        /// Decoded error payload, or the raw body as a JSON string.
        body: Value,
    },

    /// A success status arrived with a body that is not JSON.
    #[error("Invalid JSON in response with status {status}: {raw}")]
    Decode {
        /// The HTTP status code returned by the server.
        status: u16,
        /// The body exactly as received.
        raw: String,
    },

    /// An attachment could not be read from disk.
    #[error("Could not read attachment {}: {source}", .path.display())]
    Attachment {
        /// Path of the unreadable file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Attachments were given for a method that cannot carry them.
    #[error("{method} requests cannot carry attachments ({count} given)")]
    AttachmentsNotSupported {
        /// Requested method.
        method: String,
        /// Number of attachments passed.
        count: usize,
    },

    /// The chosen main image is not one of the uploaded images.
    #[error("Main image {} is not among the attached images", .path.display())]
    MainImageNotAttached {
        /// Path given as the main image.
        path: PathBuf,
    },

    /// The transport refused to build the request. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse or construct a URL.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// The object could not be flattened into request fields.
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// The resource does not accept the requested method.
    #[error("Method {method} is not allowed on /{resource}")]
    MethodNotAllowed {
        /// Requested method.
        method: String,
        /// Resource path.
        resource: &'static str,
    },

    /// A header value (usually a caller-supplied content type) is not valid.
    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl CatalogError {
    /// Classifies the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogError::Transport { .. } => FailureKind::Transport,
            CatalogError::Http { .. } => FailureKind::HttpError,
            CatalogError::Decode { .. } => FailureKind::DecodeError,
            CatalogError::Attachment { .. }
            | CatalogError::AttachmentsNotSupported { .. }
            | CatalogError::MainImageNotAttached { .. }
            | CatalogError::InvalidRequest(_)
            | CatalogError::Url(_)
            | CatalogError::Encode(_)
            | CatalogError::MethodNotAllowed { .. }
            | CatalogError::Header(_)
            | CatalogError::Client(_) => FailureKind::Request,
        }
    }

    /// The HTTP status attached to the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Http { status, .. } | CatalogError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}
