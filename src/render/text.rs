use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::{self, Write};

use super::charts::{BarChart, ChartBackend, ChartHandle, ChartSpec, Gauge};
use super::math::MathBreakdown;
use super::narrative;
use super::{Content, RenderError, Slot};

const BAR_WIDTH: usize = 30;

#[derive(Debug, Default)]
pub struct TextSurface {
    targets: BTreeSet<Slot>,
    slots: BTreeMap<Slot, String>,
}

impl TextSurface {
    pub fn with_all_targets() -> Self {
        Self {
            targets: Slot::ALL.into_iter().collect(),
            slots: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn without(mut self, slot: Slot) -> Self {
        self.targets.remove(&slot);
        self
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }
}

impl super::Surface for TextSurface {
    fn write(&mut self, slot: Slot, content: Content<'_>) -> Result<(), RenderError> {
        if !self.targets.contains(&slot) {
            return Err(RenderError::MissingTarget(slot));
        }

        let text = match content {
            Content::Badge(badge) => badge.text(),
            Content::Probability(percent) => format!("{percent}%"),
            Content::Narrative(blocks) => narrative::to_plain(blocks),
            Content::Math(breakdown) => math_table(breakdown),
        };
        self.slots.insert(slot, text);
        Ok(())
    }
}

pub fn math_table(breakdown: &MathBreakdown) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Logit:   {}", breakdown.logit_formula);
    let _ = writeln!(out, "Sigmoid: {}", breakdown.sigmoid_formula);
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>12} {:>10}",
        "Variable", "Scaled", "Coefficient", "Impact"
    );
    for row in &breakdown.rows {
        let _ = writeln!(
            out,
            "{:<12} {:>10.4} {:>12.4} {:>10.4}",
            row.feature, row.scaled, row.coefficient, row.impact
        );
    }
    let _ = writeln!(out, "Intercept: {:.4}", breakdown.intercept);
    let _ = writeln!(out, "{}", breakdown.logit_calculation);
    let _ = writeln!(out, "{}", breakdown.probability_calculation);
    out
}

/// Chart backend drawing into strings, one canvas per chart slot.
#[derive(Debug, Default)]
pub struct TextCharts {
    canvases: BTreeSet<Slot>,
    live: BTreeMap<ChartHandle, (Slot, String)>,
    #[cfg(test)]
    destroyed: Vec<ChartHandle>,
    next_id: u64,
}

impl TextCharts {
    pub fn with_all_canvases() -> Self {
        Self {
            canvases: [
                Slot::GaugeChart,
                Slot::EngagementChart,
                Slot::GradesChart,
                Slot::AttendanceChart,
            ]
            .into_iter()
            .collect(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn without(mut self, slot: Slot) -> Self {
        self.canvases.remove(&slot);
        self
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[cfg(test)]
    pub fn destroyed(&self) -> &[ChartHandle] {
        &self.destroyed
    }

    /// Drawing currently shown in `slot`.
    pub fn rendered(&self, slot: Slot) -> Option<&str> {
        self.live
            .values()
            .find(|(owner, _)| *owner == slot)
            .map(|(_, drawing)| drawing.as_str())
    }
}

impl ChartBackend for TextCharts {
    fn create(&mut self, slot: Slot, spec: &ChartSpec) -> Result<ChartHandle, RenderError> {
        if !self.canvases.contains(&slot) {
            return Err(RenderError::MissingTarget(slot));
        }

        let drawing = match spec {
            ChartSpec::Gauge(gauge) => draw_gauge(gauge),
            ChartSpec::Bar(chart) => draw_bars(chart),
        };
        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.live.insert(handle, (slot, drawing));
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live.remove(&handle).is_some() {
            #[cfg(test)]
            self.destroyed.push(handle);
        }
    }
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn draw_gauge(gauge: &Gauge) -> String {
    format!(
        "[{}] {}% {}",
        bar(gauge.value, 100.0),
        gauge.value.round(),
        gauge.caption
    )
}

fn draw_bars(chart: &BarChart) -> String {
    let max = chart.y_axis.map(|axis| axis.max).unwrap_or_else(|| {
        chart
            .series
            .iter()
            .flat_map(|series| series.values.iter().copied())
            .fold(0.0, f64::max)
    });

    let mut out = String::new();
    if chart.labels.is_empty() {
        let _ = writeln!(out, "(no data)");
        return out;
    }
    for (index, label) in chart.labels.iter().enumerate() {
        let _ = writeln!(out, "{label}");
        for series in &chart.series {
            if let Some(value) = series.values.get(index) {
                let _ = writeln!(out, "  {:<16} {} {value}", series.name, bar(*value, max));
            }
        }
    }
    if let Some(axis) = chart.y_axis {
        let _ = writeln!(
            out,
            "  scale {}..{} step {}",
            axis.min, axis.max, axis.step
        );
    }
    out
}

/// Prints the results panel in slot order.
pub fn print_results(
    out: &mut impl Write,
    surface: &TextSurface,
    charts: &TextCharts,
) -> io::Result<()> {
    for slot in Slot::ALL {
        let body = surface.get(slot).or_else(|| charts.rendered(slot));
        if let Some(body) = body {
            writeln!(out, "== {} ==", slot.title())?;
            writeln!(out, "{}", body.trim_end())?;
            writeln!(out)?;
        }
    }
    Ok(())
}
