//! Protocol-level MCP session over any [`Transport`].

use crate::protocol::{
    error_codes, CallToolParams, CallToolResult, ClientInfo, IncomingMessage, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcResponse, ListToolsParams, ListToolsResult, McpError,
    McpTool, OutgoingMessage, OutgoingResponse, RequestId,
};
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Upper bound for one request/response exchange
    pub request_timeout: Duration,
    pub client_info: ClientInfo,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            client_info: ClientInfo::default(),
        }
    }
}

/// An initialized connection to one MCP server.
///
/// Requests are serialized: the transport lock is held from send until the
/// matching response arrives, so ids never interleave.
pub struct McpClient {
    transport: Mutex<Box<dyn Transport>>,
    request_id: AtomicU64,
    initialized: AtomicBool,
    config: McpClientConfig,
    server_info: Option<InitializeResult>,
    tools: Vec<McpTool>,
}

impl McpClient {
    pub async fn connect<T: Transport + 'static>(transport: T) -> Result<Self, McpError> {
        Self::connect_with_config(Box::new(transport), McpClientConfig::default()).await
    }

    /// Run the `initialize` handshake and fetch every page of `tools/list`.
    #[instrument(skip(transport, config), name = "mcp_connect")]
    pub async fn connect_with_config(
        transport: Box<dyn Transport>,
        config: McpClientConfig,
    ) -> Result<Self, McpError> {
        let mut client = Self::new(transport, config);
        client.initialize().await?;

        let supports_tools = client
            .server_info
            .as_ref()
            .map_or(false, |info| info.capabilities.supports_tools());
        if supports_tools {
            client.tools = client.list_tools().await?;
            info!(tool_count = client.tools.len(), "discovered MCP tools");
        } else {
            debug!("server does not advertise tools");
        }
        Ok(client)
    }

    fn new(transport: Box<dyn Transport>, config: McpClientConfig) -> Self {
        Self {
            transport: Mutex::new(transport),
            request_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            config,
            server_info: None,
            tools: Vec::new(),
        }
    }

    async fn initialize(&mut self) -> Result<(), McpError> {
        let params = InitializeParams::new(self.config.client_info.clone());
        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        match &result.server_info {
            Some(server) => info!(
                server_name = %server.name,
                server_version = ?server.version,
                protocol_version = %result.protocol_version,
                "MCP server initialized"
            ),
            None => info!(protocol_version = %result.protocol_version, "MCP server initialized"),
        }
        self.server_info = Some(result);

        self.notify("notifications/initialized").await?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: ListToolsResult = self
                .request("tools/list", Some(ListToolsParams { cursor: cursor.clone() }))
                .await?;
            for tool in &page.tools {
                trace!(tool_name = %tool.name, "found MCP tool");
            }
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next)
                }
                _ => break,
            }
        }
        Ok(tools)
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    #[instrument(skip(self, arguments), fields(tool_name = %name))]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        self.ensure_initialized()?;
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result: CallToolResult = self.request("tools/call", Some(params)).await?;
        if result.is_error {
            warn!(tool_name = %name, "MCP tool reported an error");
        } else {
            debug!(tool_name = %name, blocks = result.content.len(), "MCP tool call finished");
        }
        Ok(result)
    }

    pub async fn close(&self) -> Result<(), McpError> {
        self.initialized.store(false, Ordering::SeqCst);
        let mut transport = self.transport.lock().await;
        transport.close().await
    }

    fn ensure_initialized(&self) -> Result<(), McpError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(McpError::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.request_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, McpError> {
        let id = self.next_request_id();
        let params = params.map(serde_json::to_value).transpose()?;
        let frame = serde_json::to_string(&OutgoingMessage::request(id.clone(), method, params))?;
        trace!(method = %method, id = %id, "sending request");

        let response = timeout(self.config.request_timeout, async {
            let mut transport = self.transport.lock().await;
            transport.send(&frame).await?;
            loop {
                let raw = transport.receive().await?;
                match IncomingMessage::parse(&raw)? {
                    IncomingMessage::Response(response) if is_stale(&response.id, &id) => {
                        debug!(id = %response.id, expected = %id, "dropping late response");
                    }
                    IncomingMessage::Response(response) => {
                        return Ok::<JsonRpcResponse, McpError>(response)
                    }
                    IncomingMessage::Notification { method, .. } => {
                        trace!(method = %method, "skipping server notification");
                    }
                    IncomingMessage::Request {
                        id: server_id,
                        method,
                        ..
                    } => {
                        let reply = answer_server_request(server_id, &method);
                        transport.send(&serde_json::to_string(&reply)?).await?;
                    }
                }
            }
        })
        .await
        .map_err(|_| McpError::Timeout(self.config.request_timeout))??;

        if response.id != id {
            return Err(McpError::ResponseIdMismatch {
                expected: id.to_string(),
                actual: response.id.to_string(),
            });
        }
        let result = response.into_result()?;
        Ok(serde_json::from_value(result)?)
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let frame = serde_json::to_string(&OutgoingMessage::notification(method, None))?;
        trace!(method = %method, "sending notification");
        let mut transport = self.transport.lock().await;
        transport.send(&frame).await
    }
}

/// A response to an earlier request that already timed out.
fn is_stale(received: &RequestId, current: &RequestId) -> bool {
    match (received, current) {
        (RequestId::Number(received), RequestId::Number(current)) => received < current,
        _ => false,
    }
}

/// The client offers no capabilities, so only `ping` is answered.
fn answer_server_request(id: RequestId, method: &str) -> OutgoingResponse {
    if method == "ping" {
        OutgoingResponse::result(id, Value::Object(Default::default()))
    } else {
        debug!(method = %method, "rejecting unsupported server request");
        OutgoingResponse::error(
            id,
            JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
        )
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("initialized", &self.is_initialized())
            .field("tools", &self.tools.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    struct MockTransport {
        responses: VecDeque<String>,
        sent: Arc<StdMutex<Vec<String>>>,
    }

    impl MockTransport {
        fn new(responses: &[&str]) -> (Self, Arc<StdMutex<Vec<String>>>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let transport = Self {
                responses: responses.iter().map(|s| s.to_string()).collect(),
                sent: sent.clone(),
            };
            (transport, sent)
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: &str) -> Result<(), McpError> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }

        async fn receive(&mut self) -> Result<String, McpError> {
            self.responses
                .pop_front()
                .ok_or_else(|| McpError::transport("no more mock responses"))
        }

        async fn close(&mut self) -> Result<(), McpError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    /// Replies arrive in order; each may be held back by a delay first.
    struct LateTransport {
        replies: VecDeque<(Duration, String)>,
    }

    #[async_trait::async_trait]
    impl Transport for LateTransport {
        async fn send(&mut self, _message: &str) -> Result<(), McpError> {
            Ok(())
        }

        async fn receive(&mut self) -> Result<String, McpError> {
            let delay = match self.replies.front_mut() {
                Some((delay, _)) => std::mem::take(delay),
                None => return Err(McpError::transport("no more replies")),
            };
            tokio::time::sleep(delay).await;
            self.replies
                .pop_front()
                .map(|(_, reply)| reply)
                .ok_or_else(|| McpError::transport("no more replies"))
        }

        async fn close(&mut self) -> Result<(), McpError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn ready_client(responses: &[&str]) -> (McpClient, Arc<StdMutex<Vec<String>>>) {
        let (transport, sent) = MockTransport::new(responses);
        let client = McpClient::new(Box::new(transport), McpClientConfig::default());
        client.initialized.store(true, Ordering::SeqCst);
        (client, sent)
    }

    #[test]
    fn test_request_ids_increase() {
        let (client, _) = ready_client(&[]);
        assert_eq!(client.next_request_id(), RequestId::Number(1));
        assert_eq!(client.next_request_id(), RequestId::Number(2));
    }

    #[tokio::test]
    async fn test_connect_lists_all_pages() {
        let (transport, sent) = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-06-18","capabilities":{"tools":{}},"serverInfo":{"name":"tavily"}}}"#,
            r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"search"}],"nextCursor":"p2"}}"#,
            r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[{"name":"extract"}]}}"#,
        ]);
        let client = McpClient::connect(transport).await.unwrap();

        let names: Vec<_> = client.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search", "extract"]);
        assert!(client.is_initialized());

        let sent = sent.lock().unwrap();
        assert!(sent[0].contains("\"initialize\""));
        assert!(sent[1].contains("notifications/initialized"));
        assert!(sent[3].contains("\"cursor\":\"p2\""));
    }

    #[tokio::test]
    async fn test_connect_without_tools_capability() {
        let (transport, sent) = MockTransport::new(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-06-18","capabilities":{}}}"#,
        ]);
        let client = McpClient::connect(transport).await.unwrap();
        assert!(client.tools().is_empty());
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_notifications_are_skipped() {
        let (client, _) = ready_client(&[
            r#"{"jsonrpc":"2.0","method":"notifications/tools/list_changed"}"#,
            r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#,
        ]);
        let result: Value = client.request("test/method", None::<()>).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        let (client, sent) = ready_client(&[
            r#"{"jsonrpc":"2.0","id":"srv-1","method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":"srv-2","method":"sampling/createMessage"}"#,
            r#"{"jsonrpc":"2.0","id":1,"result":{}}"#,
        ]);
        let _: Value = client.request("test/method", None::<()>).await.unwrap();

        let sent = sent.lock().unwrap();
        let ping: Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(ping, json!({"jsonrpc": "2.0", "id": "srv-1", "result": {}}));
        let rejected: Value = serde_json::from_str(&sent[2]).unwrap();
        assert_eq!(rejected["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_id_mismatch() {
        let (client, _) = ready_client(&[r#"{"jsonrpc":"2.0","id":999,"result":{}}"#]);
        let result: Result<Value, _> = client.request("test/method", None::<()>).await;
        assert!(matches!(result, Err(McpError::ResponseIdMismatch { .. })));
    }

    #[tokio::test]
    async fn test_client_recovers_after_timeout() {
        let reply = |id: u64, text: &str| {
            json!({"jsonrpc": "2.0", "id": id, "result": {"content": [{"type": "text", "text": text}]}})
                .to_string()
        };
        let transport = LateTransport {
            replies: VecDeque::from([
                (Duration::from_millis(300), reply(1, "slow")),
                (Duration::ZERO, reply(2, "second")),
                (Duration::ZERO, reply(3, "third")),
            ]),
        };
        let config = McpClientConfig {
            request_timeout: Duration::from_millis(100),
            ..McpClientConfig::default()
        };
        let client = McpClient::new(Box::new(transport), config);
        client.initialized.store(true, Ordering::SeqCst);

        let err = client.call_tool("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::Timeout(_)));

        let second = client.call_tool("search", json!({})).await.unwrap();
        assert_eq!(second.content[0].as_text(), Some("second"));
        let third = client.call_tool("search", json!({})).await.unwrap();
        assert_eq!(third.content[0].as_text(), Some("third"));
    }

    #[test]
    fn test_only_older_numeric_ids_are_stale() {
        assert!(is_stale(&RequestId::Number(1), &RequestId::Number(2)));
        assert!(!is_stale(&RequestId::Number(3), &RequestId::Number(2)));
        assert!(!is_stale(&RequestId::from("1"), &RequestId::Number(2)));
    }

    #[tokio::test]
    async fn test_json_rpc_error_surfaces() {
        let (client, _) = ready_client(&[
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#,
        ]);
        let err = client.call_tool("search", json!({})).await.unwrap_err();
        match err {
            McpError::Server(e) => assert_eq!(e.code, error_codes::INVALID_PARAMS),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_tool_sends_arguments() {
        let (client, sent) = ready_client(&[
            r#"{"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"ok"}]}}"#,
        ]);
        let result = client.call_tool("search", json!({"q": "hello"})).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("ok"));

        let request: Value = serde_json::from_str(&sent.lock().unwrap()[0]).unwrap();
        assert_eq!(request["method"], "tools/call");
        assert_eq!(request["params"], json!({"name": "search", "arguments": {"q": "hello"}}));
    }

    #[tokio::test]
    async fn test_call_before_initialize_fails() {
        let (transport, _) = MockTransport::new(&[]);
        let client = McpClient::new(Box::new(transport), McpClientConfig::default());
        let err = client.call_tool("search", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotInitialized));
    }
}
