//! Audit pipeline: engine invocation, result resolution, aggregation,
//! rendering.

pub mod aggregate;
pub mod format;
pub mod resolver;
pub mod runner;

pub use aggregate::{summarize, AuditSummary, Category, CategoryScore, ImprovementItem, Tier};
pub use format::{render, Rendered};
pub use resolver::{RawReport, ResolvedSource, ResultResolver};
pub use runner::{report_file_name, AuditRunner};
