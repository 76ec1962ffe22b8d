use std::time::Duration;

use log::trace;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use super::types::{WireBody, WireRequest, WireResponse};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Why a request produced no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing usable came back (refused, timed out, reset). Worth retrying.
    #[error("{0}")]
    Unreachable(String),
    /// The request could not be built; sending it again cannot help.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Unreachable(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's top-level message hides the cause (refused, timed out, ...)
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        if err.is_builder() {
            TransportError::InvalidRequest(message)
        } else {
            TransportError::Unreachable(message)
        }
    }
}

/// Delivers one [`WireRequest`] and hands back whatever the server answered.
///
/// Any received response is `Ok`, whatever its status. `Err` means nothing
/// usable came back; only [`TransportError::Unreachable`] may be retried.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client with a fixed per-attempt timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn build(&self, request: &WireRequest) -> Result<reqwest::RequestBuilder, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(username) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(""));
        }

        let builder = match &request.body {
            WireBody::Empty => builder,
            WireBody::Form(fields) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields)
                    .finish();
                builder.body(encoded)
            },
            WireBody::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for file in files {
                    let part = Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(file.mime)?;
                    form = form.part(file.field.clone(), part);
                }
                builder.multipart(form)
            },
            WireBody::Raw(body) => builder.body(body.clone()),
        };

        Ok(builder)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let builder = self
            .build(request)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!(status = status, bytes = body.len(); "Response received");
        Ok(WireResponse { status, body })
    }
}
