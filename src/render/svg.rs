use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt::Write;

use super::charts::{BarChart, ChartBackend, ChartHandle, ChartSpec, Gauge};
use super::narrative::escape_html;
use super::{RenderError, Slot};

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 240.0;
const MARGIN: f64 = 40.0;

#[derive(Debug, Default)]
pub struct SvgCharts {
    live: BTreeMap<ChartHandle, (Slot, String)>,
    next_id: u64,
}

impl SvgCharts {
    pub fn rendered(&self, slot: Slot) -> Option<&str> {
        self.live
            .values()
            .find(|(owner, _)| *owner == slot)
            .map(|(_, svg)| svg.as_str())
    }
}

impl ChartBackend for SvgCharts {
    fn create(&mut self, slot: Slot, spec: &ChartSpec) -> Result<ChartHandle, RenderError> {
        let svg = match spec {
            ChartSpec::Gauge(gauge) => gauge_svg(gauge),
            ChartSpec::Bar(chart) => bars_svg(chart),
        };
        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.live.insert(handle, (slot, svg));
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.live.remove(&handle);
    }
}

fn gauge_svg(gauge: &Gauge) -> String {
    let cx = WIDTH / 2.0;
    let cy = HEIGHT - MARGIN;
    let r = HEIGHT - 2.0 * MARGIN;
    let angle = PI * gauge.value / 100.0;
    let end_x = cx - r * angle.cos();
    let end_y = cy - r * angle.sin();

    format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <path d="M{:.1},{cy:.1} A{r:.1},{r:.1} 0 0,1 {:.1},{cy:.1}" fill="none" stroke="{}" stroke-width="28"/>
  <path d="M{:.1},{cy:.1} A{r:.1},{r:.1} 0 0,1 {end_x:.1},{end_y:.1}" fill="none" stroke="{}" stroke-width="28"/>
  <text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="40" font-weight="700" fill="{}">{}%</text>
  <text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="14" fill="#6b7280">{}</text>
</svg>"##,
        cx - r,
        cx + r,
        gauge.track_color,
        cx - r,
        gauge.color,
        cy - 20.0,
        gauge.color,
        gauge.value.round(),
        cy + 5.0,
        gauge.caption,
    )
}

fn bars_svg(chart: &BarChart) -> String {
    let plot_width = WIDTH - 2.0 * MARGIN;
    let plot_height = HEIGHT - 2.0 * MARGIN;
    let max = chart
        .y_axis
        .map(|axis| axis.max)
        .unwrap_or_else(|| {
            chart
                .series
                .iter()
                .flat_map(|series| series.values.iter().copied())
                .fold(0.0, f64::max)
        })
        .max(f64::EPSILON);

    let groups = chart.labels.len().max(1) as f64;
    let group_width = plot_width / groups;
    let bar_width = group_width * 0.8 / chart.series.len().max(1) as f64;

    let mut body = String::new();
    for (index, label) in chart.labels.iter().enumerate() {
        let group_x = MARGIN + index as f64 * group_width + group_width * 0.1;
        for (offset, series) in chart.series.iter().enumerate() {
            let Some(value) = series.values.get(index) else {
                continue;
            };
            let height = (value / max).clamp(0.0, 1.0) * plot_height;
            let _ = write!(
                body,
                r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"##,
                group_x + offset as f64 * bar_width,
                MARGIN + plot_height - height,
                bar_width,
                height,
                series.color
            );
        }
        let _ = write!(
            body,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="#374151">{}</text>"##,
            MARGIN + (index as f64 + 0.5) * group_width,
            HEIGHT - MARGIN + 16.0,
            escape_html(label)
        );
    }

    if let Some(axis) = chart.y_axis {
        let mut tick = axis.min;
        while tick <= axis.max + f64::EPSILON && axis.step > 0.0 {
            let y = MARGIN + plot_height - (tick / max) * plot_height;
            let _ = write!(
                body,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10" fill="#6b7280">{tick}</text>"##,
                MARGIN - 4.0,
                y + 3.0
            );
            tick += axis.step;
        }
    }

    let mut legend = String::new();
    for (offset, series) in chart.series.iter().enumerate() {
        let x = MARGIN + offset as f64 * 140.0;
        let _ = write!(
            legend,
            r##"<rect x="{x:.1}" y="10" width="12" height="12" fill="{}"/><text x="{:.1}" y="21" font-size="12" fill="#374151">{}</text>"##,
            series.color,
            x + 16.0,
            series.name
        );
    }

    format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <line x1="{MARGIN}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#e5e7eb" stroke-width="2"/>
  {legend}
  {body}
</svg>"##,
        HEIGHT - MARGIN,
        WIDTH - MARGIN,
        HEIGHT - MARGIN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, RiskLevel};
    use crate::render::charts::{self, ChartManager};

    #[test]
    fn gauge_uses_level_color() {
        let svg = gauge_svg(&charts::gauge(82.4, RiskLevel::High));
        assert!(svg.contains(crate::config::DANGER));
        assert!(svg.contains(">82%</text>"));
    }

    #[test]
    fn grouped_bars_draw_one_rect_per_value() {
        let svg = bars_svg(&charts::engagement(&fixtures::result().radar_series));
        // two legend swatches plus two labels times two series
        assert_eq!(svg.matches("<rect").count(), 6);
        assert!(svg.contains(">Logins</text>"));
    }

    #[test]
    fn grade_axis_ticks_follow_step() {
        let svg = bars_svg(&charts::grades(&fixtures::result().radar_series));
        assert!(svg.contains(">0.5</text>"));
        assert!(svg.contains(">5</text>"));
    }

    #[test]
    fn replacing_a_chart_keeps_one_drawing_per_slot() {
        let mut backend = SvgCharts::default();
        let mut manager = ChartManager::default();
        let series = fixtures::result().radar_series;
        manager.draw_attendance(&mut backend, &series).unwrap();
        manager.draw_attendance(&mut backend, &series).unwrap();
        assert_eq!(backend.live.len(), 1);
        assert!(backend.rendered(Slot::AttendanceChart).is_some());
    }
}
