//! Child-process transport: newline-delimited JSON over stdin/stdout.
//!
//! The server's stderr is drained on a background task and forwarded to
//! `tracing` so that chatty servers never block on a full pipe.

use crate::protocol::McpError;
use crate::transport::Transport;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, error, trace, warn};

/// How to launch a stdio MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioServerParams {
    pub command: String,
    pub args: Vec<String>,
    /// Added on top of the inherited process environment
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl StdioServerParams {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// `command arg1 arg2`, for log lines and error messages.
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Bytes of the frame being read; survives a cancelled `receive`
    pending: Vec<u8>,
    connected: bool,
    command_line: String,
}

impl StdioTransport {
    pub async fn spawn(params: StdioServerParams) -> Result<Self, McpError> {
        let command_line = params.display_command();
        debug!(command = %command_line, "spawning MCP server");

        let mut cmd = Command::new(&params.command);
        cmd.args(&params.args)
            .envs(&params.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &params.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!(error = %e, command = %command_line, "failed to spawn MCP server");
            McpError::ProcessSpawn(format!("{}: {}", command_line, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::ProcessSpawn("stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::ProcessSpawn("stdout was not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let server = params.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %server, "{}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            pending: Vec::new(),
            connected: true,
            command_line,
        })
    }

    fn check_process(&mut self) -> Result<(), McpError> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.connected = false;
                warn!(command = %self.command_line, exit_code = ?status.code(), "MCP server exited");
                Err(McpError::ProcessExited)
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.connected = false;
                Err(McpError::Io(e))
            }
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.check_process()?;
        trace!(message = %message, "-> stdio");

        let mut frame = Vec::with_capacity(message.len() + 1);
        frame.extend_from_slice(message.as_bytes());
        frame.push(b'\n');

        self.stdin
            .write_all(&frame)
            .await
            .map_err(|e| McpError::transport(format!("write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| McpError::transport(format!("flush failed: {}", e)))
    }

    async fn receive(&mut self) -> Result<String, McpError> {
        loop {
            let read = self
                .stdout
                .read_until(b'\n', &mut self.pending)
                .await
                .map_err(|e| McpError::transport(format!("read failed: {}", e)))?;

            if read == 0 {
                self.connected = false;
                return Err(McpError::ProcessExited);
            }

            let frame = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&frame);
            let line = line.trim();
            // Blank keep-alive lines are not frames
            if line.is_empty() {
                continue;
            }
            trace!(message = %line, "<- stdio");
            return Ok(line.to_string());
        }
    }

    async fn close(&mut self) -> Result<(), McpError> {
        if !self.connected {
            return Ok(());
        }
        debug!(command = %self.command_line, "closing MCP server");
        self.connected = false;

        // Closing stdin is the protocol's shutdown signal
        let _ = self.stdin.shutdown().await;
        match tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => self.child.kill().await.map_err(McpError::Io),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let params = StdioServerParams::new("npx")
            .args(["-y", "tavily-mcp"])
            .arg("--verbose")
            .env("TAVILY_API_KEY", "tvly-123")
            .cwd("/work");

        assert_eq!(params.args.len(), 3);
        assert_eq!(params.env.get("TAVILY_API_KEY").map(String::as_str), Some("tvly-123"));
        assert_eq!(params.cwd, Some(PathBuf::from("/work")));
        assert_eq!(params.display_command(), "npx -y tavily-mcp --verbose");
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let err = StdioTransport::spawn(StdioServerParams::new("definitely-not-a-real-mcp-server"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::ProcessSpawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_round_trip_through_cat() {
        let mut transport = StdioTransport::spawn(StdioServerParams::new("cat")).await.unwrap();
        transport.send(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await.unwrap();
        let echoed = transport.receive().await.unwrap();
        assert_eq!(echoed, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_receive_keeps_partial_frame() {
        let params = StdioServerParams::new("sh")
            .arg("-c")
            .arg(r#"printf '{"jsonrpc":"2.0",'; sleep 1; printf '"id":7,"result":{}}\n'"#);
        let mut transport = StdioTransport::spawn(params).await.unwrap();

        let first = tokio::time::timeout(Duration::from_millis(300), transport.receive()).await;
        assert!(first.is_err());

        let frame = transport.receive().await.unwrap();
        assert_eq!(frame, r#"{"jsonrpc":"2.0","id":7,"result":{}}"#);
    }
}
