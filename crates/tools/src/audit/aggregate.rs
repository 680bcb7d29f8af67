//! Aggregation of a resolved audit report into scores and improvement items.

use super::resolver::RawReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audit category understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
    Pwa,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
        Category::Pwa,
    ];

    /// Wire id as the engine reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
            Category::Pwa => "pwa",
        }
    }

    /// Human-readable label for rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Accessibility => "Accessibility",
            Category::BestPractices => "Best Practices",
            Category::Seo => "SEO",
            Category::Pwa => "PWA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

/// Qualitative bucket for a category score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Good,
    Medium,
    Poor,
    Unmeasurable,
}

impl Tier {
    /// Bucket a 0-100 score: good >= 90, medium >= 50, poor below.
    pub fn from_points(points: u32) -> Self {
        if points >= 90 {
            Tier::Good
        } else if points >= 50 {
            Tier::Medium
        } else {
            Tier::Poor
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Tier::Good => "🟢",
            Tier::Medium => "🟠",
            Tier::Poor => "🔴",
            Tier::Unmeasurable => "⚪️",
        }
    }
}

/// Score of one requested category, as reported by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    /// 0-100, or None when the engine could not measure the category.
    pub score: Option<u32>,
    pub tier: Tier,
}

impl CategoryScore {
    fn from_raw(category: Category, raw_score: Option<f64>) -> Self {
        match raw_score {
            Some(score) => {
                let points = (score * 100.0).round() as u32;
                Self {
                    category,
                    score: Some(points),
                    tier: Tier::from_points(points),
                }
            }
            None => Self {
                category,
                score: None,
                tier: Tier::Unmeasurable,
            },
        }
    }
}

/// One audit that scored below the improvement threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ImprovementItem {
    pub category: Category,
    pub title: String,
    pub description: String,
}

/// Aggregated audit result for one request.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    /// One entry per requested category present in the report, request order.
    pub scores: Vec<CategoryScore>,
    /// Sorted by (category, title), truncated to
    /// `max_items * |categories present|`.
    pub items: Vec<ImprovementItem>,
    pub report_path: PathBuf,
}

/// Audits scoring below this (missing score counts as 0) become items.
const IMPROVEMENT_THRESHOLD: f64 = 0.9;

/// Extract per-category scores and under-threshold findings from a resolved
/// report.
///
/// Requested categories missing from the report are dropped, never
/// fabricated. The item cutoff is a single aggregate truncation over the
/// merged sorted list, not a per-category cap.
pub fn summarize(
    report: &RawReport,
    requested: &[Category],
    max_items: usize,
    report_path: PathBuf,
) -> AuditSummary {
    let mut scores = Vec::new();
    let mut items = Vec::new();

    for &category in requested {
        let raw_category = match report.categories.get(category.as_str()) {
            Some(c) => c,
            None => continue,
        };

        scores.push(CategoryScore::from_raw(category, raw_category.score));

        for audit_ref in &raw_category.audit_refs {
            let audit = match report.audits.get(&audit_ref.id) {
                Some(a) => a,
                None => continue,
            };
            if audit.score.unwrap_or(0.0) < IMPROVEMENT_THRESHOLD {
                items.push(ImprovementItem {
                    category,
                    title: audit.title.clone(),
                    description: audit.description.clone(),
                });
            }
        }
    }

    items.sort_by(|a, b| {
        (a.category.as_str(), a.title.as_str()).cmp(&(b.category.as_str(), b.title.as_str()))
    });
    items.truncate(max_items * scores.len());

    AuditSummary {
        scores,
        items,
        report_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::resolver::{AuditRef, RawAudit, RawCategory};

    fn category_with_audits(score: Option<f64>, audit_ids: &[&str]) -> RawCategory {
        RawCategory {
            title: String::new(),
            score,
            audit_refs: audit_ids
                .iter()
                .map(|id| AuditRef { id: id.to_string() })
                .collect(),
        }
    }

    fn failing_audit(title: &str) -> RawAudit {
        RawAudit {
            title: title.to_string(),
            description: format!("{} description", title),
            score: Some(0.3),
        }
    }

    fn report(
        categories: Vec<(&str, RawCategory)>,
        audits: Vec<(&str, RawAudit)>,
    ) -> RawReport {
        RawReport {
            categories: categories
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            audits: audits
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_points(100), Tier::Good);
        assert_eq!(Tier::from_points(90), Tier::Good);
        assert_eq!(Tier::from_points(89), Tier::Medium);
        assert_eq!(Tier::from_points(50), Tier::Medium);
        assert_eq!(Tier::from_points(49), Tier::Poor);
        assert_eq!(Tier::from_points(0), Tier::Poor);
    }

    #[test]
    fn test_null_score_is_unmeasurable() {
        let score = CategoryScore::from_raw(Category::Performance, None);
        assert_eq!(score.tier, Tier::Unmeasurable);
        assert!(score.score.is_none());
    }

    #[test]
    fn test_score_rounds_to_nearest_point() {
        let score = CategoryScore::from_raw(Category::Performance, Some(0.895));
        assert_eq!(score.score, Some(90));
        assert_eq!(score.tier, Tier::Good);

        let score = CategoryScore::from_raw(Category::Performance, Some(0.42));
        assert_eq!(score.score, Some(42));
        assert_eq!(score.tier, Tier::Poor);
    }

    #[test]
    fn test_category_wire_ids() {
        assert_eq!(Category::BestPractices.as_str(), "best-practices");
        assert_eq!(Category::parse("seo"), Some(Category::Seo));
        assert_eq!(Category::parse("bogus"), None);
    }

    #[test]
    fn test_absent_requested_category_is_dropped() {
        let report = report(
            vec![("performance", category_with_audits(Some(0.95), &[]))],
            vec![],
        );
        let summary = summarize(
            &report,
            &[Category::Performance, Category::Pwa],
            3,
            PathBuf::from("/tmp/r.json"),
        );
        assert_eq!(summary.scores.len(), 1);
        assert_eq!(summary.scores[0].category, Category::Performance);
    }

    #[test]
    fn test_aggregate_truncation_across_categories() {
        // Two categories, four failing audits each, max_items = 3:
        // the cutoff is 3 * 2 = 6 over the merged list, not 3 per category.
        let report = report(
            vec![
                (
                    "performance",
                    category_with_audits(Some(0.5), &["p1", "p2", "p3", "p4"]),
                ),
                (
                    "seo",
                    category_with_audits(Some(0.5), &["s1", "s2", "s3", "s4"]),
                ),
            ],
            vec![
                ("p1", failing_audit("P One")),
                ("p2", failing_audit("P Two")),
                ("p3", failing_audit("P Three")),
                ("p4", failing_audit("P Four")),
                ("s1", failing_audit("S One")),
                ("s2", failing_audit("S Two")),
                ("s3", failing_audit("S Three")),
                ("s4", failing_audit("S Four")),
            ],
        );
        let summary = summarize(
            &report,
            &[Category::Performance, Category::Seo],
            3,
            PathBuf::from("/tmp/r.json"),
        );
        assert_eq!(summary.items.len(), 6);
    }

    #[test]
    fn test_items_sorted_by_category_then_title() {
        let report = report(
            vec![
                ("seo", category_with_audits(Some(0.5), &["s1"])),
                ("performance", category_with_audits(Some(0.5), &["p2", "p1"])),
            ],
            vec![
                ("s1", failing_audit("Alpha")),
                ("p1", failing_audit("Beta")),
                ("p2", failing_audit("Zulu")),
            ],
        );
        // Request order seo-first must not affect the sort.
        let summary = summarize(
            &report,
            &[Category::Seo, Category::Performance],
            5,
            PathBuf::from("/tmp/r.json"),
        );
        let keys: Vec<(&str, &str)> = summary
            .items
            .iter()
            .map(|i| (i.category.as_str(), i.title.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("performance", "Beta"),
                ("performance", "Zulu"),
                ("seo", "Alpha"),
            ]
        );
    }

    #[test]
    fn test_missing_audit_score_counts_as_failing() {
        let report = report(
            vec![("performance", category_with_audits(Some(0.9), &["p1", "p2"]))],
            vec![
                (
                    "p1",
                    RawAudit {
                        title: "No Score".to_string(),
                        description: String::new(),
                        score: None,
                    },
                ),
                (
                    "p2",
                    RawAudit {
                        title: "Passing".to_string(),
                        description: String::new(),
                        score: Some(0.95),
                    },
                ),
            ],
        );
        let summary = summarize(
            &report,
            &[Category::Performance],
            3,
            PathBuf::from("/tmp/r.json"),
        );
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].title, "No Score");
    }
}
