//! The single configured HTTP client every API module goes through
//!
//! Outgoing requests get the persisted bearer token. Responses are checked at
//! two levels: the HTTP status, then the envelope's application `code`. Either
//! kind of 401 tears the session down once per session epoch.

mod unauthorized;

pub use unauthorized::*;

use bytes::Bytes;
use log::{debug, error, warn};
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{Body, Fetch, ResponseKind};
use crate::persist::{clear_session, SessionStorage, TOKEN_KEY};
use crate::types::{Envelope, SUCCESS_CODE, UNAUTHORIZED_CODE};

/// A file returned by an export endpoint
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

struct Inner {
    client: Client,
    options: ClientOptions,
    storage: Arc<dyn SessionStorage>,
    unauthorized: Arc<dyn UnauthorizedHandler>,
    gate: SessionGate,
}

/// Shared handle to the configured client; clones are cheap
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.options.base_url)
            .field("epoch", &self.inner.gate.current())
            .finish()
    }
}

impl HttpClient {
    /// Create a new client
    pub fn new(
        options: ClientOptions,
        storage: Arc<dyn SessionStorage>,
        unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self> {
        let options = options.validated()?;
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                options,
                storage,
                unauthorized,
                gate: SessionGate::default(),
            }),
        })
    }

    /// Options the client was built with
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Storage holding the persisted session
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.inner.storage
    }

    /// Current session epoch; it advances on every login and every teardown
    pub fn session_epoch(&self) -> u64 {
        self.inner.gate.current()
    }

    /// Start a new session epoch so that 401s from requests sent before it are ignored
    pub fn begin_session(&self) -> u64 {
        self.inner.gate.advance()
    }

    /// Execute a request and validate its envelope
    pub async fn send<T: DeserializeOwned>(&self, fetch: Fetch) -> Result<Envelope<T>> {
        if fetch.response == ResponseKind::Binary {
            return Err(Error::invalid_input(format!(
                "{} is a download; use HttpClient::download",
                fetch.path
            )));
        }

        let (response, epoch) = self.dispatch(&fetch).await?;
        if !response.status().is_success() {
            return Err(self.status_error(response, epoch).await);
        }

        let bytes = response.bytes().await?;
        let raw: Envelope<Value> = serde_json::from_slice(&bytes)?;

        if raw.code != SUCCESS_CODE {
            let message = raw.message_text().map(str::to_string);
            let msg = raw.msg.clone();
            error!(
                "API error on {} {}: code {} ({})",
                fetch.method,
                fetch.path,
                raw.code,
                message.as_deref().unwrap_or("Error")
            );
            if raw.code == UNAUTHORIZED_CODE {
                self.end_session(epoch, message.as_deref()).await;
                return Err(Error::Unauthorized { message, msg });
            }
            return Err(Error::Api {
                code: raw.code,
                message,
                msg,
            });
        }

        let data = match raw.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };

        Ok(Envelope {
            success: raw.success,
            code: raw.code,
            message: raw.message,
            msg: raw.msg,
            data,
        })
    }

    /// Execute a request whose body is a file; no envelope validation
    pub async fn download(&self, fetch: Fetch) -> Result<Download> {
        let fetch = fetch.binary();
        let (response, epoch) = self.dispatch(&fetch).await?;
        if !response.status().is_success() {
            return Err(self.status_error(response, epoch).await);
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);
        let bytes = response.bytes().await?;

        debug!("Downloaded {} bytes from {}", bytes.len(), fetch.path);
        Ok(Download {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn dispatch(&self, fetch: &Fetch) -> Result<(Response, u64)> {
        let mut url = Url::parse(&self.inner.options.endpoint(&fetch.path))?;
        if !fetch.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &fetch.query {
                pairs.append_pair(key, value);
            }
        }

        let mut req = self
            .inner
            .client
            .request(fetch.method.clone(), url)
            .header("X-Client-Info", &self.inner.options.client_info);

        if let Some(token) = self.inner.storage.get(TOKEN_KEY) {
            req = req.bearer_auth(token);
        }

        req = match &fetch.body {
            Some(Body::Json(value)) => req.json(value),
            Some(Body::Multipart(parts)) => {
                let mut form = Form::new();
                for part in parts {
                    let mut file = Part::bytes(part.bytes.clone()).file_name(part.file_name.clone());
                    if let Some(content_type) = &part.content_type {
                        file = file.mime_str(content_type)?;
                    }
                    form = form.part(part.field.clone(), file);
                }
                req.multipart(form)
            }
            None => req,
        };

        let epoch = self.inner.gate.current();
        debug!("{} {} (epoch {})", fetch.method, fetch.path, epoch);

        match req.send().await {
            Ok(response) => Ok((response, epoch)),
            Err(e) => {
                error!("Request error on {} {}: {}", fetch.method, fetch.path, e);
                Err(Error::Http(e))
            }
        }
    }

    async fn status_error(&self, response: Response, epoch: u64) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let (message, msg) = extract_messages(&body);
        let message = message.or_else(|| msg.clone());
        let shown = message.as_deref().unwrap_or("");

        match status {
            400 => error!("Bad request: {}", shown),
            401 => warn!("Unauthorized: {}", shown),
            403 => error!("Access denied: {}", shown),
            404 => error!("Resource not found: {}", shown),
            500 => error!("Server error: {}", shown),
            _ => error!("Request failed with status {}: {}", status, shown),
        }

        if status == 401 {
            self.end_session(epoch, message.as_deref()).await;
            return Error::Unauthorized { message, msg };
        }
        Error::Status {
            status,
            message,
            msg,
        }
    }

    /// Clear the persisted session and hand over to the unauthorized strategy,
    /// at most once per epoch.
    async fn end_session(&self, epoch: u64, message: Option<&str>) {
        let _flight = self.inner.gate.enter().await;
        if !self.inner.gate.try_close(epoch) {
            debug!("Session epoch {} already closed; skipping teardown", epoch);
            return;
        }
        warn!("Session rejected by backend; clearing persisted session");
        clear_session(self.inner.storage.as_ref());
        self.inner.unauthorized.on_unauthorized(message).await;
    }
}

/// The `message` and `msg` fields of a JSON error body
fn extract_messages(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    (text("message"), text("msg"))
}

fn disposition_file_name(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';').map(str::trim) {
        if let Some(encoded) = param.strip_prefix("filename*=") {
            let encoded = encoded
                .split_once("''")
                .map_or(encoded, |(_, value)| value)
                .trim_matches('"');
            if let Ok(decoded) = percent_decode_str(encoded).decode_utf8() {
                return Some(decoded.into_owned());
            }
        } else if let Some(value) = param.strip_prefix("filename=") {
            plain = Some(value.trim_matches('"').to_string());
        }
    }
    plain
}
