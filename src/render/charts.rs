use tracing::warn;

use crate::config::{Feature, GRAY, PASSING_SERIES, PRIMARY, STUDENT_SERIES, SUCCESS};
use crate::models::{RadarSeries, RiskLevel};
use crate::render::badge::RiskBadge;
use crate::render::{RenderError, Slot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub color: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub y_axis: Option<AxisRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub value: f64,
    pub color: &'static str,
    pub track_color: &'static str,
    pub caption: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Gauge(Gauge),
    Bar(BarChart),
}

pub fn gauge(risk_percentage: f64, level: RiskLevel) -> Gauge {
    Gauge {
        value: risk_percentage.clamp(0.0, 100.0),
        color: RiskBadge::for_level(level).color,
        track_color: GRAY,
        caption: "risk",
    }
}

fn comparison(
    series: &RadarSeries,
    indices: impl IntoIterator<Item = usize>,
    y_axis: Option<AxisRange>,
) -> BarChart {
    let mut labels = Vec::new();
    let mut student = Vec::new();
    let mut passing = Vec::new();

    for index in indices {
        match (
            series.labels.get(index),
            series.student_values.get(index),
            series.passing_average_values.get(index),
        ) {
            (Some(label), Some(mine), Some(average)) => {
                labels.push(label.clone());
                student.push(*mine);
                passing.push(*average);
            }
            _ => warn!(index, "radar series columns have different lengths, skipping point"),
        }
    }

    BarChart {
        labels,
        series: vec![
            Series {
                name: STUDENT_SERIES,
                color: PRIMARY,
                values: student,
            },
            Series {
                name: PASSING_SERIES,
                color: SUCCESS,
                values: passing,
            },
        ],
        y_axis,
    }
}

fn indices_for(series: &RadarSeries, wanted: &[Feature]) -> Vec<usize> {
    series
        .labels
        .iter()
        .enumerate()
        .filter(|(_, label)| Feature::from_label(label).is_some_and(|f| wanted.contains(&f)))
        .map(|(index, _)| index)
        .collect()
}

pub fn engagement(series: &RadarSeries) -> BarChart {
    comparison(
        series,
        indices_for(series, &[Feature::Attendance, Feature::Logins]),
        None,
    )
}

pub fn grades(series: &RadarSeries) -> BarChart {
    comparison(
        series,
        indices_for(series, &[Feature::Tracking, Feature::Midterm1]),
        Some(AxisRange {
            min: 0.0,
            max: 5.0,
            step: 0.5,
        }),
    )
}

/// Index of the attendance point, or 0 when no label mentions attendance.
pub fn attendance_index(series: &RadarSeries) -> usize {
    series
        .labels
        .iter()
        .position(|label| Feature::Attendance.mentioned_in(label))
        .unwrap_or_else(|| {
            warn!(labels = ?series.labels, "no attendance label, using first element");
            0
        })
}

pub fn attendance(series: &RadarSeries) -> Result<BarChart, RenderError> {
    if series.labels.is_empty() {
        return Err(RenderError::EmptySeries);
    }
    Ok(comparison(
        series,
        [attendance_index(series)],
        Some(AxisRange {
            min: 0.0,
            max: 100.0,
            step: 10.0,
        }),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartHandle(pub u64);

/// Chart renderer capability: draw a spec into a canvas slot, destroy it later.
pub trait ChartBackend {
    fn create(&mut self, slot: Slot, spec: &ChartSpec) -> Result<ChartHandle, RenderError>;

    fn destroy(&mut self, handle: ChartHandle);
}

/// Owns at most one live chart for a canvas slot.
#[derive(Debug)]
pub struct ChartSlot {
    slot: Slot,
    live: Option<ChartHandle>,
}

impl ChartSlot {
    pub fn new(slot: Slot) -> Self {
        Self { slot, live: None }
    }

    #[cfg(test)]
    pub fn live(&self) -> Option<ChartHandle> {
        self.live
    }

    /// Releases the previous chart before drawing its replacement.
    pub fn replace<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        spec: &ChartSpec,
    ) -> Result<ChartHandle, RenderError> {
        self.release(backend);
        let handle = backend.create(self.slot, spec)?;
        self.live = Some(handle);
        Ok(handle)
    }

    pub fn release<B: ChartBackend>(&mut self, backend: &mut B) {
        if let Some(handle) = self.live.take() {
            backend.destroy(handle);
        }
    }
}

/// The four chart slots of the results panel.
#[derive(Debug)]
pub struct ChartManager {
    pub gauge: ChartSlot,
    pub engagement: ChartSlot,
    pub grades: ChartSlot,
    pub attendance: ChartSlot,
}

impl Default for ChartManager {
    fn default() -> Self {
        Self {
            gauge: ChartSlot::new(Slot::GaugeChart),
            engagement: ChartSlot::new(Slot::EngagementChart),
            grades: ChartSlot::new(Slot::GradesChart),
            attendance: ChartSlot::new(Slot::AttendanceChart),
        }
    }
}

impl ChartManager {
    pub fn draw_gauge<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        risk_percentage: f64,
        level: RiskLevel,
    ) -> Result<ChartHandle, RenderError> {
        let spec = ChartSpec::Gauge(gauge(risk_percentage, level));
        self.gauge.replace(backend, &spec)
    }

    pub fn draw_engagement<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        series: &RadarSeries,
    ) -> Result<ChartHandle, RenderError> {
        self.engagement
            .replace(backend, &ChartSpec::Bar(engagement(series)))
    }

    pub fn draw_grades<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        series: &RadarSeries,
    ) -> Result<ChartHandle, RenderError> {
        self.grades.replace(backend, &ChartSpec::Bar(grades(series)))
    }

    pub fn draw_attendance<B: ChartBackend>(
        &mut self,
        backend: &mut B,
        series: &RadarSeries,
    ) -> Result<ChartHandle, RenderError> {
        // a failed projection must not leave the previous result's chart behind
        self.attendance.release(backend);
        let spec = ChartSpec::Bar(attendance(series)?);
        self.attendance.replace(backend, &spec)
    }

    pub fn release_all<B: ChartBackend>(&mut self, backend: &mut B) {
        self.gauge.release(backend);
        self.engagement.release(backend);
        self.grades.release(backend);
        self.attendance.release(backend);
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::models::fixtures;
    use crate::render::text::TextCharts;

    fn series(labels: &[&str]) -> RadarSeries {
        RadarSeries {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            student_values: (0..labels.len()).map(|i| i as f64 + 1.0).collect(),
            passing_average_values: (0..labels.len()).map(|i| i as f64 + 10.0).collect(),
        }
    }

    #[test]
    fn engagement_keeps_only_attendance_and_logins() {
        let chart = engagement(&series(&["Asistencia", "Seguimiento", "Extra", "Logins"]));
        assert_eq!(chart.labels, vec!["Asistencia", "Logins"]);
        assert_eq!(chart.series[0].values, vec![1.0, 4.0]);
        assert_eq!(chart.series[1].values, vec![10.0, 13.0]);
        assert_eq!(chart.y_axis, None);
    }

    #[test]
    fn grades_use_fixed_scale() {
        let chart = grades(&fixtures::result().radar_series);
        assert_eq!(chart.labels, vec!["Tracking", "Midterm 1"]);
        assert_eq!(chart.series[0].values, vec![3.5, 3.2]);
        assert_eq!(
            chart.y_axis,
            Some(AxisRange {
                min: 0.0,
                max: 5.0,
                step: 0.5
            })
        );
    }

    #[test]
    fn projections_only_reference_present_labels() {
        let input = series(&["Mystery", "Logins", "Unknown"]);
        for chart in [engagement(&input), grades(&input)] {
            for label in &chart.labels {
                assert!(input.labels.contains(label));
            }
        }
        assert!(grades(&input).labels.is_empty());
    }

    #[test]
    fn attendance_matches_by_substring() {
        let input = fixtures::result().radar_series;
        assert_eq!(attendance_index(&input), 0);

        let shifted = series(&["Logins", "Avg. attendance %"]);
        assert_eq!(attendance_index(&shifted), 1);
        let chart = attendance(&shifted).unwrap();
        assert_eq!(chart.labels, vec!["Avg. attendance %"]);
        assert_eq!(chart.y_axis.unwrap().max, 100.0);
    }

    #[test]
    #[traced_test]
    fn attendance_falls_back_to_first_point() {
        let chart = attendance(&series(&["X", "Y"])).unwrap();
        assert_eq!(chart.labels, vec!["X"]);
        assert_eq!(chart.series[0].values, vec![1.0]);
        assert!(logs_contain("no attendance label, using first element"));
    }

    #[test]
    fn attendance_on_empty_series_is_an_error() {
        assert!(matches!(
            attendance(&series(&[])),
            Err(RenderError::EmptySeries)
        ));
    }

    #[test]
    fn ragged_series_skips_missing_points() {
        let mut input = series(&["Attendance", "Logins"]);
        input.passing_average_values.truncate(1);
        let chart = engagement(&input);
        assert_eq!(chart.labels, vec!["Attendance"]);
    }

    #[test]
    fn gauge_uses_risk_color() {
        let spec = gauge(82.4, RiskLevel::High);
        assert_eq!(spec.color, crate::config::DANGER);
        assert_eq!(spec.value, 82.4);
    }

    #[test]
    fn redrawing_disposes_previous_chart() {
        let mut backend = TextCharts::with_all_canvases();
        let mut manager = ChartManager::default();
        let input = fixtures::result().radar_series;

        let first = manager.draw_attendance(&mut backend, &input).unwrap();
        let second = manager.draw_attendance(&mut backend, &input).unwrap();

        assert_ne!(first, second);
        assert_eq!(backend.live_count(), 1);
        assert_eq!(backend.destroyed(), &[first]);
        assert_eq!(manager.attendance.live(), Some(second));
    }

    #[test]
    fn release_all_leaves_no_live_charts() {
        let mut backend = TextCharts::with_all_canvases();
        let mut manager = ChartManager::default();
        let result = fixtures::result();

        manager
            .draw_gauge(&mut backend, result.risk_percentage, result.risk_level)
            .unwrap();
        manager
            .draw_engagement(&mut backend, &result.radar_series)
            .unwrap();
        assert_eq!(backend.live_count(), 2);

        manager.release_all(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }
}
