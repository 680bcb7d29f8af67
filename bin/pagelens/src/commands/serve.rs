//! Stdio serve loop: newline-delimited JSON-RPC 2.0.
//!
//! The transport stays thin: it validates framing, dispatches `tools/call`
//! into the registry, and wraps results into content responses. Tool errors
//! become `isError` content responses; they never surface as transport
//! errors.

use pagelens_tools::{ToolContext, ToolRegistry};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

pub async fn run(ctx: ToolContext, registry: ToolRegistry) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    info!("pagelens serving on stdio");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if let Some(response) = handle_line(&ctx, &registry, line).await {
                            let mut out = serde_json::to_string(&response)?;
                            out.push('\n');
                            stdout.write_all(out.as_bytes()).await?;
                            stdout.flush().await?;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Force-close the session best-effort; an in-flight audit is not
    // flushed.
    ctx.sessions.lock().await.close().await;
    Ok(())
}

async fn handle_line(ctx: &ToolContext, registry: &ToolRegistry, line: &str) -> Option<Value> {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return Some(error_response(
                Value::Null,
                -32700,
                &format!("Parse error: {}", e),
            ))
        }
    };

    let method = request
        .get("method")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_string();

    // Requests without an id are notifications; nothing to answer.
    let id = match request.get("id") {
        Some(id) => id.clone(),
        None => {
            debug!(method = %method, "Ignoring notification");
            return None;
        }
    };

    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    let result = match method.as_str() {
        "initialize" => json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {
                "name": "pagelens",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {"tools": {}},
        }),
        "tools/list" => json!({"tools": registry.get_tool_schemas()}),
        "tools/call" => {
            let name = params
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match registry.execute(name, ctx.clone(), arguments).await {
                Ok(value) => {
                    let text = serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string());
                    json!({
                        "content": [{"type": "text", "text": text}],
                        "isError": false,
                    })
                }
                Err(e) => {
                    warn!(tool = name, error = %e, "Tool call failed");
                    json!({
                        "content": [{"type": "text", "text": e.to_string()}],
                        "isError": true,
                    })
                }
            }
        }
        other => {
            return Some(error_response(
                id,
                -32601,
                &format!("Method not found: {}", other),
            ))
        }
    };

    Some(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message},
    })
}
