pub mod audit;
pub mod browser;
pub mod lighthouse;
pub mod registry;
pub mod screenshot;

use async_trait::async_trait;
use pagelens_core::{Config, Paths, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use browser::SessionManager;

pub use registry::ToolRegistry;

/// Shared state handed to every tool invocation.
///
/// The session manager is injected here rather than living in module-level
/// state; the mutex serializes invocations that would otherwise race on the
/// shared browser handles.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Config,
    pub paths: Paths,
    pub sessions: Arc<Mutex<SessionManager>>,
}

impl ToolContext {
    pub fn new(config: Config, paths: Paths) -> Self {
        let sessions = SessionManager::new(config.browser.clone(), paths.base.clone());
        Self {
            config,
            paths,
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }
}

pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;
    fn validate(&self, params: &Value) -> Result<()>;
    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value>;
}
