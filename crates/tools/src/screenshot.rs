//! take-screenshot — page capture tool.

use async_trait::async_trait;
use chrono::Utc;
use pagelens_core::{Error, Result};
use serde_json::{json, Value};

use crate::browser::SessionManager;
use crate::{Tool, ToolContext, ToolSchema};

/// JPEG quality for captured screenshots.
const JPEG_QUALITY: u8 = 80;

pub struct TakeScreenshotTool;

async fn capture(
    sessions: &mut SessionManager,
    ctx: &ToolContext,
    url: &str,
    full_page: bool,
) -> Result<Value> {
    sessions.navigate(url).await?;

    let session = sessions.ensure().await?;
    let bytes = session.cdp.screenshot_jpeg(full_page, JPEG_QUALITY).await?;

    let file_name = format!("screenshot-{}.jpg", Utc::now().timestamp_millis());
    let saved_path = ctx.paths.screenshots_dir().join(&file_name);
    tokio::fs::write(&saved_path, &bytes)
        .await
        .map_err(|e| Error::Screenshot(format!("Failed to save screenshot: {}", e)))?;

    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

    Ok(json!({
        "message": format!("Screenshot captured for {}", url),
        "savedPath": saved_path.display().to_string(),
        "imageBase64": encoded,
        "mimeType": "image/jpeg",
    }))
}

#[async_trait]
impl Tool for TakeScreenshotTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "take-screenshot",
            description: "Capture a JPEG screenshot of a URL. Saves the image to disk and returns it base64-encoded.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL of the page to capture"
                    },
                    "full_page": {
                        "type": "boolean",
                        "description": "Capture the full scrollable page instead of the viewport (default: false)"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        let url = params
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Validation("Missing required parameter: url".to_string()))?;
        url::Url::parse(url)
            .map_err(|e| Error::Validation(format!("Invalid URL '{}': {}", url, e)))?;
        if let Some(full_page) = params.get("full_page") {
            if !full_page.is_boolean() {
                return Err(Error::Validation("full_page must be a boolean".to_string()));
            }
        }
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let url = params["url"].as_str().unwrap().to_string();
        let full_page = params
            .get("full_page")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let sessions = ctx.sessions.clone();
        let mut sessions = sessions.lock().await;
        let result = capture(&mut sessions, &ctx, &url, full_page).await;
        // The session is released on every exit path, success or error.
        sessions.close().await;
        result
    }
}
