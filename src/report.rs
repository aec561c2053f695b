use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::form::FormControls;
use crate::render::html::HtmlSurface;
use crate::render::narrative::escape_html;
use crate::render::svg::SvgCharts;
use crate::render::Slot;

const STYLE: &str = "body{font-family:sans-serif;max-width:860px;margin:2em auto}\
.risk-badge{color:#fff;padding:.3em .8em;border-radius:1em}\
.bullet{margin-left:1em}.nested{margin-left:2.5em;font-size:.9em}\
table{border-collapse:collapse}td,th{padding:.3em .8em;border-bottom:1px solid #ddd}";

pub fn build_report(
    controls: &FormControls,
    surface: &HtmlSurface,
    charts: &SvgCharts,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(
        output,
        "<html><head><meta charset=\"utf-8\"><title>Academic Risk Report</title><style>{STYLE}</style></head><body>"
    );
    let _ = writeln!(output, "<h1>Academic Risk Report</h1>");
    let _ = writeln!(
        output,
        "<p>Generated {}</p>",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    let _ = writeln!(output, "<h2>Submitted Metrics</h2><ul>");
    for (name, value) in controls.display_values() {
        let _ = writeln!(output, "<li>{}: {}</li>", name, escape_html(&value));
    }
    let _ = writeln!(output, "</ul>");

    for slot in Slot::ALL {
        let body = match surface.get(slot) {
            Some(html) => html.to_string(),
            None => match charts.rendered(slot) {
                Some(svg) => svg.to_string(),
                None => "<p>Not available.</p>".to_string(),
            },
        };
        let _ = writeln!(output, "<h2>{}</h2>", slot.title());
        let _ = writeln!(output, "{body}");
    }

    let _ = writeln!(output, "</body></html>");
    output
}
