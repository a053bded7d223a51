//! Line-oriented tool protocol shared by the errand tool servers.
//!
//! A host writes one [`ToolRequest`] per line on the server's stdin and reads
//! one [`ToolResponse`] per line back from stdout.

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::future::Future;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

mod result;

pub use result::ToolResult;

/// Reserved tool name answered by every server with its tool descriptors.
pub const LIST_TOOLS: &str = "list_tools";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub params: JsonValue,
}

impl ToolRequest {
    pub fn new(tool: impl Into<String>, params: JsonValue) -> Self {
        Self { tool: tool.into(), params }
    }

    /// Decodes `params` into a typed parameter struct. Missing `params` decode
    /// as an empty object so that all-default structs still succeed.
    pub fn decode<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let params = match &self.params {
            JsonValue::Null => JsonValue::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| anyhow!("bad params for {}: {}", self.tool, e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: JsonValue,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok(result: JsonValue) -> Self { Self { ok: true, result, error: None } }
    pub fn err(msg: impl Into<String>) -> Self { Self { ok: false, result: JsonValue::Null, error: Some(msg.into()) } }
}

impl From<anyhow::Result<JsonValue>> for ToolResponse {
    fn from(res: anyhow::Result<JsonValue>) -> Self {
        match res {
            Ok(v) => ToolResponse::ok(v),
            Err(e) => ToolResponse::err(e.to_string()),
        }
    }
}

/// Name, human description and JSON-schema parameter shape of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params_schema: JsonValue,
}

pub fn list_tools(tools: &[ToolDescriptor]) -> JsonValue {
    json!({ "tools": tools })
}

/// Reads request lines until EOF, answering each through `handler`.
///
/// Blank lines are skipped. A line that does not parse as a [`ToolRequest`]
/// is answered with an error response and the loop keeps going.
pub async fn serve<R, W, H, Fut>(reader: R, mut writer: W, mut handler: H) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: FnMut(ToolRequest) -> Fut,
    Fut: Future<Output = ToolResponse>,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() { continue; }
        let resp = match serde_json::from_str::<ToolRequest>(&line) {
            Ok(req) => {
                debug!(tool = %req.tool, "tool request");
                handler(req).await
            }
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                ToolResponse::err(format!("bad request: {}", e))
            }
        };
        let mut out = serde_json::to_vec(&resp).map_err(io::Error::other)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}
