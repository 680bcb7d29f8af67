//! run-lighthouse — page-quality audit tool.

use async_trait::async_trait;
use chrono::Utc;
use pagelens_core::{Error, Result};
use serde_json::{json, Value};

use crate::audit::{render, report_file_name, summarize, AuditRunner, Category, ResultResolver};
use crate::browser::SessionManager;
use crate::{Tool, ToolContext, ToolSchema};

const DEFAULT_MAX_ITEMS: u64 = 3;

pub struct RunLighthouseTool;

/// Parse and validate the request parameters.
fn parse_request(params: &Value) -> Result<(String, Vec<Category>, usize)> {
    let url = params
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Validation("Missing required parameter: url".to_string()))?;
    let parsed = url::Url::parse(url)
        .map_err(|e| Error::Validation(format!("Invalid URL '{}': {}", url, e)))?;
    if parsed.host_str().is_none() {
        return Err(Error::Validation(format!("URL '{}' has no host", url)));
    }

    let mut categories = Vec::new();
    if let Some(list) = params.get("categories") {
        let list = list
            .as_array()
            .ok_or_else(|| Error::Validation("categories must be an array".to_string()))?;
        for entry in list {
            let name = entry
                .as_str()
                .ok_or_else(|| Error::Validation("categories entries must be strings".to_string()))?;
            let category = Category::parse(name)
                .ok_or_else(|| Error::Validation(format!("Unknown category: {}", name)))?;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }
    if categories.is_empty() {
        categories.push(Category::Performance);
    }

    let max_items = params
        .get("max_items")
        .map(|v| {
            v.as_u64()
                .filter(|n| (1..=5).contains(n))
                .ok_or_else(|| {
                    Error::Validation("max_items must be an integer between 1 and 5".to_string())
                })
        })
        .transpose()?
        .unwrap_or(DEFAULT_MAX_ITEMS);

    Ok((url.to_string(), categories, max_items as usize))
}

/// Navigate, audit, resolve, aggregate, render. The caller owns session
/// cleanup.
async fn audit_pipeline(
    sessions: &mut SessionManager,
    ctx: &ToolContext,
    url: &str,
    categories: &[Category],
    max_items: usize,
) -> Result<Value> {
    sessions.navigate(url).await?;

    let report_name = report_file_name(url, Utc::now())?;
    let report_path = ctx.paths.reports_dir().join(&report_name);
    let debug_port = sessions.ensure().await?.debug_port;

    let runner = AuditRunner::new(ctx.config.audit.clone());
    let raw = runner.run(url, debug_port, &report_path).await?;

    let resolver = ResultResolver::new(report_path.clone(), ctx.paths.reports_dir());
    let (report, _source) = resolver.resolve(raw.as_ref())?;

    let summary = summarize(&report, categories, max_items, report_path);
    let rendered = render(&summary);

    Ok(json!({
        "scoreText": rendered.score_text,
        "improvementText": rendered.improvement_text,
        "reportPath": summary.report_path.display().to_string(),
    }))
}

#[async_trait]
impl Tool for RunLighthouseTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "run-lighthouse",
            description: "Run a page-quality audit against a URL. Reports per-category scores and the top improvement items, and saves the full JSON report to disk.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL of the page to audit"
                    },
                    "categories": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["performance", "accessibility", "best-practices", "seo", "pwa"]
                        },
                        "description": "Audit categories to include (default: [\"performance\"])"
                    },
                    "max_items": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 5,
                        "description": "Improvement-item budget per requested category (default: 3). Applied as one cutoff over the merged item list."
                    }
                },
                "required": ["url"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        parse_request(params).map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let (url, categories, max_items) = parse_request(&params)?;

        let sessions = ctx.sessions.clone();
        let mut sessions = sessions.lock().await;
        let result = audit_pipeline(&mut sessions, &ctx, &url, &categories, max_items).await;
        // The session is released on every exit path, success or error.
        sessions.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_name() {
        let tool = RunLighthouseTool;
        assert_eq!(tool.schema().name, "run-lighthouse");
    }

    #[test]
    fn test_validate_requires_url() {
        let tool = RunLighthouseTool;
        assert!(tool.validate(&json!({})).is_err());
        assert!(tool.validate(&json!({"url": "https://example.com"})).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let tool = RunLighthouseTool;
        assert!(tool.validate(&json!({"url": "not a url"})).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let tool = RunLighthouseTool;
        let params = json!({"url": "https://example.com", "categories": ["speed"]});
        assert!(tool.validate(&params).is_err());
    }

    #[test]
    fn test_validate_max_items_range() {
        let tool = RunLighthouseTool;
        for bad in [0, 6] {
            let params = json!({"url": "https://example.com", "max_items": bad});
            assert!(tool.validate(&params).is_err());
        }
        let params = json!({"url": "https://example.com", "max_items": 5});
        assert!(tool.validate(&params).is_ok());
    }

    #[test]
    fn test_parse_request_defaults() {
        let (url, categories, max_items) =
            parse_request(&json!({"url": "https://example.com"})).unwrap();
        assert_eq!(url, "https://example.com");
        assert_eq!(categories, vec![Category::Performance]);
        assert_eq!(max_items, 3);
    }

    #[test]
    fn test_parse_request_preserves_order_and_dedupes() {
        let params = json!({
            "url": "https://example.com",
            "categories": ["seo", "performance", "seo"]
        });
        let (_, categories, _) = parse_request(&params).unwrap();
        assert_eq!(categories, vec![Category::Seo, Category::Performance]);
    }
}
