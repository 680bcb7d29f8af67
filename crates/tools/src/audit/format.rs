//! Text rendering of an aggregated audit result.

use super::aggregate::AuditSummary;

/// Text blocks returned to the caller.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub score_text: String,
    pub improvement_text: String,
}

/// Render the summary: one glyph line per category in request order, then
/// the improvement items grouped by category, with the report file path
/// appended as a separate line.
pub fn render(summary: &AuditSummary) -> Rendered {
    let mut score_lines = Vec::new();
    for score in &summary.scores {
        let value = match score.score {
            Some(points) => format!("{}/100", points),
            None => "Not measurable".to_string(),
        };
        score_lines.push(format!(
            "{} {}: {}",
            score.tier.glyph(),
            score.category.label(),
            value
        ));
    }

    let mut improvement = String::new();
    if summary.items.is_empty() {
        improvement.push_str("No improvement items found.");
    } else {
        let mut groups = Vec::new();
        for score in &summary.scores {
            let titles: Vec<&str> = summary
                .items
                .iter()
                .filter(|item| item.category == score.category)
                .map(|item| item.title.as_str())
                .collect();
            if titles.is_empty() {
                continue;
            }
            let mut group = format!("{}:", score.category.label());
            for title in titles {
                group.push_str(&format!("\n- {}", title));
            }
            groups.push(group);
        }
        improvement.push_str(&groups.join("\n\n"));
    }
    improvement.push_str(&format!(
        "\n\nReport saved to: {}",
        summary.report_path.display()
    ));

    Rendered {
        score_text: score_lines.join("\n"),
        improvement_text: improvement,
    }
}
