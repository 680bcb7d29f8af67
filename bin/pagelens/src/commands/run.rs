//! One-shot tool invocation from the command line.

use pagelens_tools::{ToolContext, ToolRegistry};
use serde_json::Value;

pub async fn run(
    ctx: ToolContext,
    registry: ToolRegistry,
    tool: &str,
    params: &str,
) -> anyhow::Result<()> {
    let params: Value = serde_json::from_str(params)
        .map_err(|e| anyhow::anyhow!("Invalid params JSON: {}", e))?;

    let result = registry.execute(tool, ctx.clone(), params).await;

    // Idempotent; tools have already released the session on their own
    // exit paths.
    ctx.sessions.lock().await.close().await;

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
