//! HTTP layer for the object catalog REST API.
//!
//! This module turns an encoded request into a call against the catalog API
//! and the response back into JSON. It handles method-specific encoding,
//! Basic authentication, one retry on transport failure, and the mapping of
//! HTTP statuses onto results.
//!
//! # Architecture
//!
//! - [`RequestExecutor`] - Builds the wire request for a method, retries, maps statuses
//! - [`Transport`] - Sends one wire request; [`ReqwestTransport`] is the real one
//! - [`CatalogError`] / [`FailureKind`] - What went wrong, and which kind of wrong
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_client::http::{ApiMethod, RequestExecutor};
//! use url::Url;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let executor = RequestExecutor::new("my-api-token")?;
//! let url = Url::parse("https://api.factopedia.org/objects/5")?;
//!
//! let object = executor
//!     .execute(&url, ApiMethod::Get, "expand=parents", &[], None)
//!     .await?;
//! println!("{}", object["name"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every call returns `Result<serde_json::Value, CatalogError>`. Callers
//! branch on [`CatalogError::kind`]:
//!
//! - `Transport` - no response, even after the retry
//! - `HttpError` - a status other than 200/201/202/204, never retried
//! - `DecodeError` - success status with a body that is not JSON
//! - `Request` - the request could not be built, nothing was sent

mod error;
mod executor;
mod transport;
mod types;
mod utils;

pub use error::{CatalogError, FailureKind};
pub use executor::{DEFAULT_CONTENT_TYPE, RequestExecutor, RetryPolicy};
pub use transport::{DEFAULT_TIMEOUT_SECS, ReqwestTransport, Transport, TransportError};
pub use types::{
    ATTACHMENT_MIME, ApiMethod, FilePart, MULTIPART_FORM_DATA, SUCCESS_STATUSES, WireBody, WireRequest, WireResponse,
};
pub use utils::{parse_fields, url_decode};
