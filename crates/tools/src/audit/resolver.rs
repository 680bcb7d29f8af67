//! Recovery of a usable audit result.
//!
//! The engine may hand back an in-memory result, write a report file, or
//! both; some runs produce neither at the expected path. Resolution walks an
//! ordered list of strategies, first match wins:
//!
//! 1. Direct — the in-memory result, when it carries a non-empty category set
//! 2. ExactFile — the report file at the path the run was configured with
//! 3. LatestFile — the most recent report file in the reports directory
//!
//! A parse failure inside tier 2 or 3 is a hard [`Error::ReportParse`], not a
//! fall-through; only an unmet precondition advances the chain.

use pagelens_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validated shape of an engine report. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    pub categories: HashMap<String, RawCategory>,
    /// Absent on direct results from engines that only stream categories.
    #[serde(default)]
    pub audits: HashMap<String, RawAudit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub audit_refs: Vec<AuditRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAudit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Which fallback tier supplied the result. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSource {
    Direct,
    ExactFile,
    LatestFile,
    NotFound,
}

/// Filenames must end with this to be considered report files.
const REPORT_SUFFIX: &str = ".json";

pub struct ResultResolver {
    exact_report_path: PathBuf,
    reports_dir: PathBuf,
}

impl ResultResolver {
    pub fn new(exact_report_path: PathBuf, reports_dir: PathBuf) -> Self {
        Self {
            exact_report_path,
            reports_dir,
        }
    }

    /// Walk the fallback chain. Fails with [`Error::ReportNotFound`] when
    /// every tier's precondition is unmet.
    pub fn resolve(&self, raw_result: Option<&Value>) -> Result<(RawReport, ResolvedSource)> {
        if let Some(report) = self.try_direct(raw_result)? {
            debug!(source = ?ResolvedSource::Direct, "Audit result resolved");
            return Ok((report, ResolvedSource::Direct));
        }
        if let Some(report) = self.try_exact_file()? {
            debug!(source = ?ResolvedSource::ExactFile, "Audit result resolved");
            return Ok((report, ResolvedSource::ExactFile));
        }
        if let Some(report) = self.try_latest_file()? {
            debug!(source = ?ResolvedSource::LatestFile, "Audit result resolved");
            return Ok((report, ResolvedSource::LatestFile));
        }

        debug!(source = ?ResolvedSource::NotFound, "Audit result resolution exhausted");
        Err(Error::ReportNotFound(format!(
            "no usable audit result: no direct result, no report at {}, no report files under {}",
            self.exact_report_path.display(),
            self.reports_dir.display()
        )))
    }

    /// Tier 1: the in-memory result, when it exposes a non-empty categories
    /// mapping.
    fn try_direct(&self, raw_result: Option<&Value>) -> Result<Option<RawReport>> {
        let value = match raw_result {
            Some(v) => v,
            None => return Ok(None),
        };
        let has_categories = value
            .get("categories")
            .and_then(|c| c.as_object())
            .map(|c| !c.is_empty())
            .unwrap_or(false);
        if !has_categories {
            return Ok(None);
        }

        let report: RawReport = serde_json::from_value(value.clone())
            .map_err(|e| Error::ReportParse(format!("direct result: {}", e)))?;
        Ok(Some(report))
    }

    /// Tier 2: the file at the exact path the engine was configured to write.
    fn try_exact_file(&self) -> Result<Option<RawReport>> {
        if !self.exact_report_path.exists() {
            return Ok(None);
        }
        parse_report_file(&self.exact_report_path).map(Some)
    }

    /// Tier 3: the lexicographically greatest report filename in the
    /// directory. The embedded timestamp makes that the most recent one.
    fn try_latest_file(&self) -> Result<Option<RawReport>> {
        let entries = match std::fs::read_dir(&self.reports_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(None),
        };

        let mut latest: Option<String> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(REPORT_SUFFIX) {
                continue;
            }
            if latest.as_deref().map(|l| name.as_str() > l).unwrap_or(true) {
                latest = Some(name);
            }
        }

        match latest {
            Some(name) => parse_report_file(&self.reports_dir.join(name)).map(Some),
            None => Ok(None),
        }
    }
}

/// Parse and validate a report file. A malformed file or one without both a
/// `categories` and an `audits` mapping is a hard error.
fn parse_report_file(path: &Path) -> Result<RawReport> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::ReportParse(format!("{}: {}", path.display(), e)))?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::ReportParse(format!("{}: {}", path.display(), e)))?;

    if value.get("categories").and_then(|v| v.as_object()).is_none() {
        return Err(Error::ReportParse(format!(
            "{}: missing categories mapping",
            path.display()
        )));
    }
    if value.get("audits").and_then(|v| v.as_object()).is_none() {
        return Err(Error::ReportParse(format!(
            "{}: missing audits mapping",
            path.display()
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::ReportParse(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_report_json() -> Value {
        json!({
            "categories": {
                "performance": {
                    "title": "Performance",
                    "score": 0.42,
                    "auditRefs": [{"id": "first-paint", "weight": 10}]
                }
            },
            "audits": {
                "first-paint": {
                    "title": "First Paint",
                    "description": "Time to first paint",
                    "score": 0.2
                }
            }
        })
    }

    fn write_report(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_direct_result_wins_over_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        std::fs::write(&exact, valid_report_json().to_string()).unwrap();

        let resolver = ResultResolver::new(exact, dir.path().to_path_buf());
        let direct = valid_report_json();
        let (_, source) = resolver.resolve(Some(&direct)).unwrap();
        assert_eq!(source, ResolvedSource::Direct);
    }

    #[test]
    fn test_direct_precondition_unmet_falls_to_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        std::fs::write(&exact, valid_report_json().to_string()).unwrap();

        let resolver = ResultResolver::new(exact, dir.path().to_path_buf());
        // Empty categories mapping does not meet the Direct precondition.
        let empty = json!({"categories": {}});
        let (report, source) = resolver.resolve(Some(&empty)).unwrap();
        assert_eq!(source, ResolvedSource::ExactFile);
        assert!(report.categories.contains_key("performance"));
    }

    #[test]
    fn test_exact_file_wins_over_newer_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        std::fs::write(&exact, valid_report_json().to_string()).unwrap();
        write_report(
            dir.path(),
            "lighthouse-example-com-2024-06-01T00-00-00.json",
            &json!({"categories": {"seo": {"score": 1.0}}, "audits": {}}).to_string(),
        );

        let resolver = ResultResolver::new(exact, dir.path().to_path_buf());
        let (report, source) = resolver.resolve(None).unwrap();
        assert_eq!(source, ResolvedSource::ExactFile);
        assert!(report.categories.contains_key("performance"));
    }

    #[test]
    fn test_latest_file_picks_lexicographically_greatest() {
        let dir = tempfile::tempdir().unwrap();
        write_report(
            dir.path(),
            "lighthouse-example-com-2024-01-01T00-00-00.json",
            &json!({"categories": {"performance": {"score": 0.1}}, "audits": {}}).to_string(),
        );
        write_report(
            dir.path(),
            "lighthouse-example-com-2024-06-01T00-00-00.json",
            &json!({"categories": {"performance": {"score": 0.9}}, "audits": {}}).to_string(),
        );

        let missing = dir.path().join("lighthouse-other-host-2024-01-01T00-00-00.json");
        let resolver = ResultResolver::new(missing, dir.path().to_path_buf());
        let (report, source) = resolver.resolve(None).unwrap();
        assert_eq!(source, ResolvedSource::LatestFile);
        assert_eq!(report.categories["performance"].score, Some(0.9));
    }

    #[test]
    fn test_exhausted_chain_is_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        let resolver = ResultResolver::new(missing, dir.path().to_path_buf());
        let err = resolver.resolve(None).unwrap_err();
        assert!(matches!(err, Error::ReportNotFound(_)));
    }

    #[test]
    fn test_malformed_exact_file_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        std::fs::write(&exact, "not json at all").unwrap();
        // A valid fallback file exists, but tier 2 must not silently skip.
        write_report(
            dir.path(),
            "lighthouse-example-com-2024-06-01T00-00-00.json",
            &valid_report_json().to_string(),
        );

        let resolver = ResultResolver::new(exact, dir.path().to_path_buf());
        let err = resolver.resolve(None).unwrap_err();
        assert!(matches!(err, Error::ReportParse(_)));
    }

    #[test]
    fn test_file_without_audits_mapping_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let exact = dir.path().join("lighthouse-example-com-2024-01-01T00-00-00.json");
        std::fs::write(
            &exact,
            json!({"categories": {"performance": {"score": 0.5}}}).to_string(),
        )
        .unwrap();

        let resolver = ResultResolver::new(exact, dir.path().to_path_buf());
        let err = resolver.resolve(None).unwrap_err();
        assert!(matches!(err, Error::ReportParse(_)));
    }

    #[test]
    fn test_direct_result_without_audits_still_usable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let resolver = ResultResolver::new(missing, dir.path().to_path_buf());

        let direct = json!({"categories": {"performance": {"score": 0.5}}});
        let (report, source) = resolver.resolve(Some(&direct)).unwrap();
        assert_eq!(source, ResolvedSource::Direct);
        assert!(report.audits.is_empty());
    }
}
