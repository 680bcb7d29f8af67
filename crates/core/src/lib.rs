pub mod config;
pub mod error;
pub mod paths;

pub use config::{AuditConfig, BrowserConfig, Config};
pub use error::{Error, Result};
pub use paths::Paths;
