//! Legacy HTTP+SSE transport.
//!
//! A long-lived GET opens an event stream. Its first `endpoint` event names
//! the URL that client messages are POSTed to; server messages then arrive as
//! `message` events on the same stream.

use crate::protocol::McpError;
use crate::transport::{http::header_map, Transport};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SseTransport {
    url: String,
    endpoint: Url,
    client: reqwest::Client,
    headers: BTreeMap<String, String>,
    inbox: mpsc::UnboundedReceiver<Result<String, McpError>>,
    reader: JoinHandle<()>,
    connected: bool,
}

impl SseTransport {
    /// Open the event stream and wait for the server's `endpoint` event.
    pub async fn connect(
        url: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Result<Self, McpError> {
        let url = url.into();
        let base = Url::parse(&url)
            .map_err(|e| McpError::transport(format!("invalid SSE url '{}': {}", url, e)))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::transport(format!("failed to create HTTP client: {}", e)))?;

        debug!(url = %url, "opening MCP event stream");
        let response = client
            .get(base.clone())
            .headers(header_map(&headers)?)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::transport(format!("SSE connect failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(McpError::transport(format!(
                "SSE connect failed: HTTP {}",
                response.status()
            )));
        }

        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_events(response, base, endpoint_tx, inbox_tx));

        let endpoint = match tokio::time::timeout(ENDPOINT_TIMEOUT, endpoint_rx).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) => {
                reader.abort();
                return Err(McpError::protocol(
                    "SSE stream ended before the server announced its endpoint",
                ));
            }
            Err(_) => {
                reader.abort();
                return Err(McpError::Timeout(ENDPOINT_TIMEOUT));
            }
        };
        debug!(url = %url, endpoint = %endpoint, "MCP endpoint announced");

        Ok(Self {
            url,
            endpoint,
            client,
            headers,
            inbox,
            reader,
            connected: true,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

async fn read_events(
    response: reqwest::Response,
    base: Url,
    endpoint_tx: oneshot::Sender<Url>,
    inbox: mpsc::UnboundedSender<Result<String, McpError>>,
) {
    let mut endpoint_tx = Some(endpoint_tx);
    let mut events = std::pin::pin!(response.bytes_stream().eventsource());

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                let _ = inbox.send(Err(McpError::transport(format!("SSE stream error: {}", e))));
                return;
            }
        };

        match event.event.as_str() {
            "endpoint" => match (endpoint_tx.take(), base.join(event.data.trim())) {
                (Some(tx), Ok(endpoint)) => {
                    let _ = tx.send(endpoint);
                }
                (Some(_), Err(e)) => {
                    warn!(error = %e, data = %event.data, "unusable MCP endpoint");
                    return;
                }
                (None, _) => trace!("ignoring repeated endpoint event"),
            },
            "" | "message" => {
                if event.data.trim().is_empty() {
                    continue;
                }
                if inbox.send(Ok(event.data)).is_err() {
                    return;
                }
            }
            other => trace!(event = %other, "ignoring SSE event"),
        }
    }
    let _ = inbox.send(Err(McpError::transport("SSE stream closed by server")));
}

#[async_trait]
impl Transport for SseTransport {
    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        if !self.connected {
            return Err(McpError::transport("transport is closed"));
        }
        trace!(endpoint = %self.endpoint, message = %message, "-> sse");

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(header_map(&self.headers)?)
            .header(CONTENT_TYPE, "application/json")
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| McpError::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::transport(format!("HTTP {}: {}", status, body.trim())));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, McpError> {
        match self.inbox.recv().await {
            Some(Ok(message)) => {
                trace!(message = %message, "<- sse");
                Ok(message)
            }
            Some(Err(e)) => {
                self.connected = false;
                Err(e)
            }
            None => {
                self.connected = false;
                Err(McpError::transport("SSE stream closed"))
            }
        }
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.connected = false;
        self.reader.abort();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for SseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseTransport")
            .field("url", &self.url)
            .field("endpoint", &self.endpoint.as_str())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("connected", &self.connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let err = SseTransport::connect("not a url", BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
    }

    #[test]
    fn test_endpoint_join() {
        let base = Url::parse("https://mcp.example.com/sse").unwrap();
        let endpoint = base.join("/messages?session_id=abc").unwrap();
        assert_eq!(endpoint.as_str(), "https://mcp.example.com/messages?session_id=abc");
    }
}
