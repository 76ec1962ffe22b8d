//! Request execution: encoding per method, one retry, status mapping.
//!
//! [`RequestExecutor::execute`] is the single path every catalog call goes
//! through. It turns an encoded body into the wire shape the API expects for
//! the given method, sends it through a [`Transport`], retries once on
//! transport failure, and maps the response onto `Ok(json)` or a
//! [`CatalogError`].
//!
//! # Method dispatch
//!
//! - `GET` appends the body to the URL as the query string and sends nothing.
//! - `POST`/`PATCH` decode the body into form fields. Attachments (or an
//!   explicit `multipart/form-data` content type) switch to multipart.
//! - `PUT` sends the whole body url-decoded as a raw string with an explicit
//!   `Content-Length`. The API's PUT handler expects exactly that shape, so
//!   it is not a form or multipart request, and attachments are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use super::error::CatalogError;
use super::transport::{DEFAULT_TIMEOUT_SECS, ReqwestTransport, Transport, TransportError};
use super::types::{
    ATTACHMENT_MIME, ApiMethod, FilePart, MULTIPART_FORM_DATA, SUCCESS_STATUSES, WireBody, WireRequest,
    WireResponse,
};
use super::utils::{parse_fields, url_decode};
use crate::log::mask_secret;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Retry schedule for transport-level failures.
///
/// HTTP error statuses are never retried; only "no response at all" is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(2),
        }
    }
}

/// Sends catalog requests on behalf of one access token.
///
/// The token is only read, so a shared `&RequestExecutor` is all concurrent
/// callers need.
pub struct RequestExecutor<T = ReqwestTransport> {
    transport: T,
    token: String,
    default_content_type: String,
    retry: RetryPolicy,
}

impl RequestExecutor<ReqwestTransport> {
    /// Creates an executor over a `reqwest` transport with a 30 second
    /// per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Client`] if the HTTP client cannot be built
    /// (e.g. TLS backend initialization failure).
    pub fn new(token: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_timeout(token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(token: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Ok(Self::with_transport(transport, token))
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn with_transport(transport: T, token: impl Into<String>) -> Self {
        Self {
            transport,
            token: token.into(),
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the Content-Type used when the caller passes no override.
    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes one API call.
    ///
    /// # Arguments
    ///
    /// * `url` - Target resource URL
    /// * `method` - HTTP method, see the module docs for how each is encoded
    /// * `encoded_body` - `key=value` pairs joined by `&` (a `\n&` join works too)
    /// * `files` - Images to attach; file `i` goes out as `Objects[imageFiles][i]`
    ///   named `i.jpg` with type `image/jpg`
    /// * `content_type` - Overrides the default `application/json` Content-Type
    ///
    /// # Returns
    ///
    /// The decoded JSON body for statuses 200, 201, 202 and 204. An empty
    /// success body decodes to `null`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Transport`] when both attempts got no response
    /// - [`CatalogError::Http`] for any other status, never retried
    /// - [`CatalogError::Decode`] when a success body is not JSON
    /// - request-kind errors when an attachment cannot be read, attachments
    ///   are given for `PUT`, a header is invalid, or the transport cannot
    ///   build the request; none of these are retried
    pub async fn execute(
        &self,
        url: &Url,
        method: ApiMethod,
        encoded_body: &str,
        files: &[PathBuf],
        content_type: Option<&str>,
    ) -> Result<Value, CatalogError> {
        let request = self
            .build_request(url, method, encoded_body, files, content_type)
            .await?;

        debug!(
            method:% = request.method,
            url:% = request.url,
            user:% = mask_secret(&self.token);
            "Sending catalog request"
        );

        let response = self.send_with_retry(&request).await?;
        map_response(response)
    }

    async fn build_request(
        &self,
        url: &Url,
        method: ApiMethod,
        encoded_body: &str,
        files: &[PathBuf],
        content_type: Option<&str>,
    ) -> Result<WireRequest, CatalogError> {
        let content_type = content_type.unwrap_or(&self.default_content_type);
        let mut headers = HeaderMap::new();
        let mut url = url.clone();

        let body = match method {
            ApiMethod::Get => {
                if !encoded_body.is_empty() {
                    url.set_query(Some(encoded_body));
                }
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
                WireBody::Empty
            },
            ApiMethod::Post | ApiMethod::Patch => {
                let fields = parse_fields(encoded_body);
                if !files.is_empty() || is_multipart(content_type) {
                    // reqwest sets the multipart Content-Type with its boundary
                    WireBody::Multipart {
                        fields,
                        files: load_attachments(files).await?,
                    }
                } else {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
                    WireBody::Form(fields)
                }
            },
            ApiMethod::Put => {
                if !files.is_empty() {
                    return Err(CatalogError::AttachmentsNotSupported {
                        method: method.to_string(),
                        count: files.len(),
                    });
                }
                let body = url_decode(encoded_body);
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
                headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
                WireBody::Raw(body)
            },
        };

        Ok(WireRequest {
            method,
            url,
            headers,
            basic_auth: Some(self.token.clone()),
            body,
        })
    }

    async fn send_with_retry(&self, request: &WireRequest) -> Result<WireResponse, CatalogError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.send(request).await {
                Ok(response) => return Ok(response),
                Err(TransportError::InvalidRequest(message)) => {
                    return Err(CatalogError::InvalidRequest(message));
                },
                Err(e) if attempt < max_attempts => {
                    warn!(
                        url:% = request.url,
                        attempt = attempt,
                        error:% = e;
                        "No response from catalog API, retrying in {:?}", self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    return Err(CatalogError::Transport {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                },
            }
        }
    }
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with(MULTIPART_FORM_DATA)
}

async fn load_attachments(files: &[PathBuf]) -> Result<Vec<FilePart>, CatalogError> {
    let mut parts = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        parts.push(FilePart {
            field: format!("Objects[imageFiles][{index}]"),
            file_name: format!("{index}.jpg"),
            mime: ATTACHMENT_MIME,
            bytes: read_attachment(path).await?,
        });
    }
    Ok(parts)
}

async fn read_attachment(path: &Path) -> Result<Vec<u8>, CatalogError> {
    tokio::fs::read(path).await.map_err(|source| CatalogError::Attachment {
        path: path.to_path_buf(),
        source,
    })
}

fn map_response(response: WireResponse) -> Result<Value, CatalogError> {
    let WireResponse { status, body } = response;

    if SUCCESS_STATUSES.contains(&status) {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) => Err(CatalogError::Decode { status, raw: body }),
        };
    }

    debug!(status = status; "Catalog API returned an error status");
    let body = match serde_json::from_str::<Value>(&body) {
        Ok(value) => value,
        Err(_) => Value::String(body),
    };
    Err(CatalogError::Http { status, body })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::Mutex;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::http::FailureKind;

    /// Replays canned outcomes in order and records every request it sees.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<WireResponse, TransportError>>>,
        seen: Mutex<Vec<WireRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<WireResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last(&self) -> WireRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unreachable("script exhausted".into())))
        }
    }

    fn ok(status: u16, body: &str) -> Result<WireResponse, TransportError> {
        Ok(WireResponse {
            status,
            body: body.to_string(),
        })
    }

    fn refused() -> Result<WireResponse, TransportError> {
        Err(TransportError::Unreachable("connection refused".into()))
    }

    fn executor(outcomes: Vec<Result<WireResponse, TransportError>>) -> RequestExecutor<ScriptedTransport> {
        RequestExecutor::with_transport(ScriptedTransport::new(outcomes), "secret-token")
    }

    fn objects_url() -> Url {
        Url::parse("https://api.example.org/objects").unwrap()
    }

    #[tokio::test]
    async fn test_get_appends_query_and_sends_no_body() {
        let exec = executor(vec![ok(200, r#"{"items":[]}"#)]);

        let value = exec
            .execute(&objects_url(), ApiMethod::Get, "a=1&b=2", &[], None)
            .await
            .unwrap();

        assert_eq!(value, json!({"items": []}));
        let sent = exec.transport().last();
        assert_eq!(sent.url.as_str(), "https://api.example.org/objects?a=1&b=2");
        assert_eq!(sent.body, WireBody::Empty);
        assert_eq!(sent.basic_auth.as_deref(), Some("secret-token"));
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_get_with_empty_body_has_no_query() {
        let exec = executor(vec![ok(200, "{}")]);
        exec.execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap();
        assert_eq!(exec.transport().last().url.query(), None);
    }

    #[tokio::test]
    async fn test_post_decodes_fields_into_form() {
        let exec = executor(vec![ok(201, r#"{"id":"12"}"#)]);

        exec.execute(
            &objects_url(),
            ApiMethod::Post,
            "name=Fido+%26+co\n&parents%5B0%5D%5BObjects%5D%5Bid%5D=7",
            &[],
            None,
        )
        .await
        .unwrap();

        let sent = exec.transport().last();
        assert_eq!(
            sent.body,
            WireBody::Form(vec![
                ("name".to_string(), "Fido & co".to_string()),
                ("parents[0][Objects][id]".to_string(), "7".to_string()),
            ])
        );
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_post_with_files_goes_multipart() {
        let mut image = NamedTempFile::new().unwrap();
        image.write_all(b"png bytes, labelled jpg anyway").unwrap();

        let exec = executor(vec![ok(201, "{}")]);
        exec.execute(
            &objects_url(),
            ApiMethod::Post,
            "name=Fido",
            &[image.path().to_path_buf(), image.path().to_path_buf()],
            None,
        )
        .await
        .unwrap();

        let sent = exec.transport().last();
        assert!(sent.headers.get(CONTENT_TYPE).is_none());
        match sent.body {
            WireBody::Multipart { fields, files } => {
                assert_eq!(fields, vec![("name".to_string(), "Fido".to_string())]);
                assert_eq!(files.len(), 2);
                assert_eq!(files[1].field, "Objects[imageFiles][1]");
                assert_eq!(files[1].file_name, "1.jpg");
                assert_eq!(files[1].mime, "image/jpg");
                assert_eq!(files[0].bytes, b"png bytes, labelled jpg anyway");
            },
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multipart_override_without_files() {
        let exec = executor(vec![ok(200, "{}")]);
        exec.execute(
            &objects_url(),
            ApiMethod::Post,
            "name=Fido",
            &[],
            Some("multipart/form-data"),
        )
        .await
        .unwrap();

        assert!(matches!(exec.transport().last().body, WireBody::Multipart { .. }));
    }

    #[tokio::test]
    async fn test_put_sends_urldecoded_raw_body_with_length() {
        let exec = executor(vec![ok(200, "{}")]);
        let encoded = "name=Fido+the+dog\n&parents%5B0%5D%5BObjects%5D%5Bid%5D=7";

        exec.execute(&objects_url(), ApiMethod::Put, encoded, &[], None)
            .await
            .unwrap();

        let sent = exec.transport().last();
        let expected = "name=Fido the dog\n&parents[0][Objects][id]=7";
        assert_eq!(sent.method, ApiMethod::Put);
        assert_eq!(sent.body, WireBody::Raw(expected.to_string()));
        assert_eq!(
            sent.headers.get(CONTENT_LENGTH).unwrap(),
            expected.len().to_string().as_str()
        );
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_put_with_attachments_is_rejected_before_sending() {
        let mut image = NamedTempFile::new().unwrap();
        image.write_all(b"jpeg").unwrap();

        let exec = executor(vec![ok(200, "{}")]);
        let err = exec
            .execute(
                &objects_url(),
                ApiMethod::Put,
                "name=x",
                &[image.path().to_path_buf()],
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Request);
        assert!(matches!(
            err,
            CatalogError::AttachmentsNotSupported { count: 1, .. }
        ));
        assert_eq!(exec.transport().attempts(), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_retried() {
        let exec = executor(vec![
            Err(TransportError::InvalidRequest("bad mime".into())),
            ok(200, "{}"),
        ]);

        let err = exec
            .execute(&objects_url(), ApiMethod::Post, "name=x", &[], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Request);
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
        assert_eq!(exec.transport().attempts(), 1);
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_before_sending() {
        let exec = executor(vec![ok(200, "{}")]);
        let err = exec
            .execute(
                &objects_url(),
                ApiMethod::Post,
                "name=Fido",
                &[PathBuf::from("/definitely/not/here.jpg")],
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Request);
        assert!(matches!(err, CatalogError::Attachment { .. }));
        assert_eq!(exec.transport().attempts(), 0);
    }

    #[tokio::test]
    async fn test_http_error_carries_decoded_body_and_is_not_retried() {
        let exec = executor(vec![ok(404, r#"{"message":"Object not found"}"#), ok(200, "{}")]);

        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::HttpError);
        match err {
            CatalogError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, json!({"message": "Object not found"}));
            },
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(exec.transport().attempts(), 1);
    }

    #[tokio::test]
    async fn test_http_error_with_raw_body() {
        let exec = executor(vec![ok(502, "<html>Bad Gateway</html>")]);
        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();

        match err {
            CatalogError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, json!("<html>Bad Gateway</html>"));
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_statuses() {
        for status in [200, 201, 202] {
            let exec = executor(vec![ok(status, r#"{"ok":true}"#)]);
            let value = exec
                .execute(&objects_url(), ApiMethod::Get, "", &[], None)
                .await
                .unwrap();
            assert_eq!(value, json!({"ok": true}));
        }

        let exec = executor(vec![ok(204, "")]);
        let value = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);

        let exec = executor(vec![ok(203, "{}")]);
        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(203));
    }

    #[tokio::test]
    async fn test_invalid_json_on_success_is_decode_error() {
        let exec = executor(vec![ok(200, "not json")]);
        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::DecodeError);
        match err {
            CatalogError::Decode { status, raw } => {
                assert_eq!(status, 200);
                assert_eq!(raw, "not json");
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_retries_once_after_delay() {
        let exec = executor(vec![refused(), ok(200, r#"{"id":1}"#)]);
        let start = tokio::time::Instant::now();

        let value = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap();

        assert_eq!(value, json!({"id": 1}));
        assert_eq!(exec.transport().attempts(), 2);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transport_failures_give_up() {
        let exec = executor(vec![refused(), refused(), ok(200, "{}")]);

        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(exec.transport().attempts(), 2);
        match err {
            CatalogError::Transport { attempts, message } => {
                assert_eq!(attempts, 2);
                assert_eq!(message, "connection refused");
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_policy_of_one_attempt() {
        let exec = executor(vec![refused(), ok(200, "{}")]).with_retry_policy(RetryPolicy {
            max_attempts: 1,
            delay: Duration::from_secs(2),
        });

        let err = exec
            .execute(&objects_url(), ApiMethod::Get, "", &[], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(exec.transport().attempts(), 1);
    }
}
