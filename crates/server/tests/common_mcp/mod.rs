use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimal line-delimited JSON-RPC client driving the `newsapi-mcp` binary over stdio.
///
/// Exists only for integration tests; it speaks just enough MCP to initialize and call tools.
pub struct McpStdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl McpStdioSession {
    /// Spawn the server against `base_url` and complete the `initialize` handshake.
    pub async fn start(base_url: &str, api_key: Option<&str>) -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_newsapi-mcp");
        let mut cmd = Command::new(bin);
        cmd.arg("--base-url")
            .arg(base_url)
            .env_remove("NEWSAPI_KEY")
            .env_remove("NEWSAPI_MIN_INTERVAL_MS")
            .env("NEWSAPI_MCP_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(key) = api_key {
            cmd.env("NEWSAPI_KEY", key);
        }

        let mut child = cmd.spawn().context("spawn newsapi-mcp")?;
        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
        };

        let init = session
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "newsapi-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(
            init.pointer("/result/serverInfo/name") == Some(&json!("newsapi-mcp")),
            "unexpected initialize response: {init}"
        );

        session
            .send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await?;
        Ok(session)
    }

    /// Send a request and wait for the response carrying the same id.
    pub async fn request(&mut self, method: &str, params: Value) -> anyhow::Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(RESPONSE_TIMEOUT, self.read_response(id))
            .await
            .with_context(|| format!("timeout waiting for '{method}' response"))?
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .context("write to server stdin")?;
        self.stdin.flush().await.context("flush server stdin")?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<Value> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: Value = serde_json::from_str(line).context("server wrote non-JSON line")?;
            // Skip server notifications and anything addressed to another request.
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
        anyhow::bail!("server closed stdout before answering request {id}")
    }
}

/// Parse `result.content[0].text` of a `tools/call` response as JSON.
pub fn tool_text_json(msg: &Value) -> anyhow::Result<Value> {
    let text = tool_text(msg)?;
    serde_json::from_str(text).context("tools/call text is not JSON")
}

pub fn tool_text(msg: &Value) -> anyhow::Result<&str> {
    msg.pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .context("tools/call missing result.content[0].text")
}
