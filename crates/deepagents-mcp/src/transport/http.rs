//! Streamable HTTP transport.
//!
//! Every client message is a POST to the server URL. The reply body is either
//! a single JSON message or an SSE stream carrying one or more messages; both
//! end up in a FIFO queue drained by `receive`. The `mcp-session-id` header
//! handed out by the server is echoed on every later request.
//!
//! ```rust,ignore
//! let transport = HttpTransport::builder("https://mcp.example.com/mcp")
//!     .header("Authorization", "Bearer token")
//!     .build()?;
//! let client = McpClient::connect(transport).await?;
//! ```

use crate::protocol::McpError;
use crate::transport::Transport;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tracing::{debug, trace};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    headers: BTreeMap<String, String>,
    session_id: Option<String>,
    inbox: VecDeque<String>,
    connected: bool,
}

impl HttpTransport {
    pub fn builder(url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn request(&self, method: reqwest::Method) -> Result<reqwest::RequestBuilder, McpError> {
        let mut headers = header_map(&self.headers)?;
        if let Some(session) = &self.session_id {
            let value = HeaderValue::from_str(session)
                .map_err(|e| McpError::transport(format!("invalid session id: {}", e)))?;
            headers.insert(HeaderName::from_static(SESSION_HEADER), value);
        }
        Ok(self.client.request(method, &self.url).headers(headers))
    }
}

pub struct HttpTransportBuilder {
    url: String,
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl HttpTransportBuilder {
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpTransport, McpError> {
        // Reject bad header names now rather than on first send
        header_map(&self.headers)?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| McpError::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(HttpTransport {
            url: self.url,
            client,
            headers: self.headers,
            session_id: None,
            inbox: VecDeque::new(),
            connected: true,
        })
    }
}

pub(crate) fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, McpError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| McpError::transport(format!("invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| McpError::transport(format!("invalid value for header '{}': {}", key, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// True for a JSON-RPC response (as opposed to a request or notification).
pub(crate) fn is_response(raw: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value.get("id").is_some() && value.get("method").is_none(),
        Err(_) => false,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        if !self.connected {
            return Err(McpError::transport("transport is closed"));
        }
        trace!(url = %self.url, message = %message, "-> http");

        let response = self
            .request(reqwest::Method::POST)?
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| McpError::transport(format!("HTTP request failed: {}", e)))?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if self.session_id.as_deref() != Some(session) {
                debug!(url = %self.url, "MCP session established");
                self.session_id = Some(session.to_string());
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::transport(format!("HTTP {}: {}", status, body.trim())));
        }
        if status == reqwest::StatusCode::ACCEPTED {
            return Ok(());
        }

        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("text/event-stream"));

        if is_stream {
            let mut events = std::pin::pin!(response.bytes_stream().eventsource());
            while let Some(event) = events.next().await {
                let event =
                    event.map_err(|e| McpError::transport(format!("SSE stream error: {}", e)))?;
                if event.data.trim().is_empty() {
                    continue;
                }
                let done = is_response(&event.data);
                self.inbox.push_back(event.data);
                if done {
                    break;
                }
            }
        } else {
            let body = response
                .text()
                .await
                .map_err(|e| McpError::transport(format!("failed to read response: {}", e)))?;
            let body = body.trim();
            if !body.is_empty() {
                self.inbox.push_back(body.to_string());
            }
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, McpError> {
        match self.inbox.pop_front() {
            Some(message) => {
                trace!(url = %self.url, message = %message, "<- http");
                Ok(message)
            }
            None => Err(McpError::transport("no pending message from HTTP server")),
        }
    }

    async fn close(&mut self) -> Result<(), McpError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        if self.session_id.is_some() {
            // Servers may not support session termination; ignore the outcome
            if let Ok(request) = self.request(reqwest::Method::DELETE) {
                let _ = request.send().await;
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("session", &self.session_id.is_some())
            .field("connected", &self.connected)
            .finish()
    }
}
