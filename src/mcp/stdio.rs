//! Newline-delimited JSON-RPC transport over stdin/stdout
//!
//! One message (or batch) per line in, one compact JSON line per response out. Messages are
//! handled strictly in arrival order.

use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_value;
use crate::AppState;

pub async fn run_stdio(state: &AppState) -> io::Result<()> {
    serve(state, BufReader::new(io::stdin()), io::stdout()).await
}

pub async fn serve<R, W>(state: &AppState, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("listening for MCP messages on stdio");
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(response) = handle_line(state, trimmed).await {
            write_message(&mut writer, &response).await?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}

async fn handle_line(state: &AppState, line: &[u8]) -> Option<Value> {
    let payload: Value = match serde_json::from_slice(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "discarding unparseable message");
            return Some(json_rpc_error(None, -32700, "Parse error"));
        }
    };

    let Some(batch) = payload.as_array() else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            -32600,
            "Invalid Request",
        )]));
    }

    debug!(size = batch.len(), "handling batch");
    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item.clone()).await {
            responses.push(response);
        }
    }

    (!responses.is_empty()).then_some(Value::Array(responses))
}

async fn write_message<W>(writer: &mut W, message: &Value) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(message).map_err(io::Error::other)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}
