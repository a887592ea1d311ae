//! Multi-endpoint request dispatch.
//!
//! The portal is deployed behind several possible backend addresses and some
//! resources have moved between path variants over time. A [`Dispatcher`]
//! walks every (base URL, path) candidate in order, returns the first 2xx
//! response, and otherwise reports the last real failure it saw.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ApiSettings;
use crate::error::{PortalError, RemoteFailure};
use crate::http::credentials::{Anonymous, CredentialProvider};
use crate::http::envelope::{message_from_body, unwrap_data};
use crate::metrics::{DISPATCH_ATTEMPTS_TOTAL, DISPATCH_EXHAUSTED_TOTAL, DISPATCH_FAILOVERS_TOTAL};
use crate::observability::request_id::{inject_request_id, new_request_id};

/// One logical request, possibly reachable under several path variants.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    paths: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl DispatchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            paths: vec![path.into()],
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Add another path under which the same resource may live.
    pub fn or_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, PortalError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

/// A successful (2xx) response, already read into memory.
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub url: String,
    pub status: StatusCode,
    body: Bytes,
}

impl DispatchResponse {
    /// Decode the payload, unwrapping the `{status, code, message, data}`
    /// envelope when present.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, PortalError> {
        unwrap_data(&self.url, &self.body)
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    base_urls: Vec<String>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Dispatcher {
    pub fn new(
        base_urls: Vec<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PortalError> {
        Self::with_client(Client::new(), base_urls, credentials)
    }

    pub fn with_client(
        client: Client,
        base_urls: Vec<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PortalError> {
        if base_urls.is_empty() {
            return Err(PortalError::Config(
                "dispatcher needs at least one base URL".to_string(),
            ));
        }
        Ok(Self {
            client,
            base_urls,
            credentials,
        })
    }

    /// Build from settings, honouring the configured timeout and static token.
    pub fn from_settings(
        settings: &ApiSettings,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Self, PortalError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| PortalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = match (credentials, &settings.access_token) {
            (Some(provider), _) => provider,
            (None, Some(token)) => Arc::new(crate::http::credentials::StaticCredentials::new(
                token.clone(),
            )) as Arc<dyn CredentialProvider>,
            (None, None) => Arc::new(Anonymous) as Arc<dyn CredentialProvider>,
        };

        Self::with_client(client, settings.base_urls.clone(), credentials)
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// Try every candidate in order until one answers with 2xx.
    ///
    /// Base URLs are the outer loop and path variants the inner one, so a
    /// reachable host is fully explored before moving to the next host.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, PortalError> {
        if request.paths.is_empty() {
            return Err(PortalError::Config(
                "request has no candidate paths".to_string(),
            ));
        }

        let request_id = new_request_id();
        let method_label = request.method.as_str().to_string();
        let mut last_failure: Option<RemoteFailure> = None;
        let mut attempt = 0usize;

        for base in &self.base_urls {
            for path in &request.paths {
                let url = join_url(base, path);
                attempt += 1;

                match self.attempt(&request, &url, &request_id).await {
                    Ok(response) => {
                        DISPATCH_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
                        if attempt > 1 {
                            DISPATCH_FAILOVERS_TOTAL
                                .with_label_values(&[method_label.as_str()])
                                .inc();
                            info!(
                                url = %url,
                                attempt,
                                request_id = %request_id,
                                "Request succeeded after failover"
                            );
                        }
                        return Ok(response);
                    }
                    Err(failure) => {
                        let outcome = if failure.status.is_some() {
                            "http_error"
                        } else {
                            "transport_error"
                        };
                        DISPATCH_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
                        warn!(
                            url = %failure.url,
                            status = ?failure.status,
                            message = %failure.message,
                            attempt,
                            request_id = %request_id,
                            "Candidate failed, trying next"
                        );
                        last_failure = Some(failure);
                    }
                }
            }
        }

        DISPATCH_EXHAUSTED_TOTAL
            .with_label_values(&[method_label.as_str()])
            .inc();

        match last_failure {
            Some(failure) => Err(PortalError::RemoteUnavailable(failure)),
            None => Err(PortalError::Config("no candidates were attempted".to_string())),
        }
    }

    /// Dispatch and decode the (possibly enveloped) payload.
    pub async fn fetch<T: DeserializeOwned>(&self, request: DispatchRequest) -> Result<T, PortalError> {
        self.dispatch(request).await?.data()
    }

    async fn attempt(
        &self,
        request: &DispatchRequest,
        url: &str,
        request_id: &str,
    ) -> Result<DispatchResponse, RemoteFailure> {
        let mut headers = request.headers.clone();
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        inject_request_id(&mut headers, request_id);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.credentials.bearer_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "Dispatching request");

        let response = builder.send().await.map_err(|e| RemoteFailure {
            url: url.to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| RemoteFailure {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        if status.is_success() {
            return Ok(DispatchResponse {
                url: url.to_string(),
                status,
                body,
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate();
        }

        Err(RemoteFailure {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: failure_message(status, &body),
        })
    }
}

/// Prefer the backend's own message, then the raw body, then the reason phrase.
fn failure_message(status: StatusCode, body: &[u8]) -> String {
    if let Some(message) = message_from_body(body) {
        return message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && text.len() <= 512 {
        return text.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
