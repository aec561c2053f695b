use std::collections::BTreeMap;
use std::fmt::Write;

use super::math::MathBreakdown;
use super::narrative::{self, escape_html};
use super::{Content, RenderError, Slot, Surface};

/// Collects HTML fragments per slot for the standalone report.
#[derive(Debug, Default)]
pub struct HtmlSurface {
    fragments: BTreeMap<Slot, String>,
}

impl HtmlSurface {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.fragments.get(&slot).map(String::as_str)
    }
}

impl Surface for HtmlSurface {
    fn write(&mut self, slot: Slot, content: Content<'_>) -> Result<(), RenderError> {
        let html = match content {
            Content::Badge(badge) => format!(
                "<span class=\"risk-badge {}\" style=\"background:{}\">{} {}</span>",
                badge.class_name, badge.color, badge.icon, badge.label
            ),
            Content::Probability(percent) => format!("<strong>{percent}%</strong>"),
            Content::Narrative(blocks) => narrative::to_html(blocks),
            Content::Math(breakdown) => math_html(breakdown),
        };
        self.fragments.insert(slot, html);
        Ok(())
    }
}

fn math_html(breakdown: &MathBreakdown) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<p class=\"formula\">{}</p><p class=\"formula\">{}</p>",
        escape_html(&breakdown.logit_formula),
        escape_html(&breakdown.sigmoid_formula)
    );
    let _ = write!(
        html,
        "<table><thead><tr><th>Variable</th><th>Scaled</th><th>Coefficient</th><th>Impact</th></tr></thead><tbody>"
    );
    for row in &breakdown.rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td></tr>",
            escape_html(&row.feature),
            row.scaled,
            row.coefficient,
            row.impact
        );
    }
    let _ = write!(
        html,
        "</tbody></table><p>Intercept: {:.4}</p><p>{}</p><p>{}</p>",
        breakdown.intercept,
        escape_html(&breakdown.logit_calculation),
        escape_html(&breakdown.probability_calculation)
    );
    html
}
