pub mod badge;
pub mod charts;
pub mod html;
pub mod math;
pub mod narrative;
pub mod svg;
pub mod text;

use tracing::warn;

use crate::models::PredictionResult;

use self::badge::{approval_probability, RiskBadge};
use self::charts::{ChartBackend, ChartManager};
use self::math::MathBreakdown;
use self::narrative::Block;

/// Named render targets of the results panel and the math modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    RiskBadge,
    ApprovalProbability,
    Analysis,
    GaugeChart,
    EngagementChart,
    GradesChart,
    AttendanceChart,
    MathBreakdown,
}

impl Slot {
    pub const ALL: [Slot; 8] = [
        Slot::RiskBadge,
        Slot::ApprovalProbability,
        Slot::Analysis,
        Slot::GaugeChart,
        Slot::EngagementChart,
        Slot::GradesChart,
        Slot::AttendanceChart,
        Slot::MathBreakdown,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Slot::RiskBadge => "Risk level",
            Slot::ApprovalProbability => "Probability of passing",
            Slot::Analysis => "Analysis",
            Slot::GaugeChart => "Risk gauge",
            Slot::EngagementChart => "Engagement vs passing students",
            Slot::GradesChart => "Grades vs passing students",
            Slot::AttendanceChart => "Attendance",
            Slot::MathBreakdown => "Model breakdown",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Badge(&'a RiskBadge),
    Probability(u8),
    Narrative(&'a [Block]),
    Math(&'a MathBreakdown),
}

/// Text-bearing render targets. Chart canvases live behind [`ChartBackend`].
pub trait Surface {
    fn write(&mut self, slot: Slot, content: Content<'_>) -> Result<(), RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render target {0:?} not found")]
    MissingTarget(Slot),

    #[error("radar series has no points")]
    EmptySeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Badge,
    Probability,
    Narrative,
    Gauge,
    EngagementChart,
    GradesChart,
    AttendanceChart,
    Math,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub rendered: Vec<Projection>,
    pub skipped: Vec<(Projection, String)>,
}

impl RenderReport {
    fn record<T>(&mut self, projection: Projection, outcome: Result<T, RenderError>) {
        match outcome {
            Ok(_) => self.rendered.push(projection),
            Err(err) => {
                warn!(?projection, error = %err, "projection skipped");
                self.skipped.push((projection, err.to_string()));
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Renders results; owns the chart slots so repeated renders replace charts.
#[derive(Debug, Default)]
pub struct ResultRenderer {
    charts: ChartManager,
}

impl ResultRenderer {
    /// Runs every projection; a failing one is logged and the rest still run.
    pub fn render<S: Surface, B: ChartBackend>(
        &mut self,
        result: &PredictionResult,
        surface: &mut S,
        backend: &mut B,
    ) -> RenderReport {
        let mut report = RenderReport::default();

        let badge = RiskBadge::for_level(result.risk_level);
        report.record(
            Projection::Badge,
            surface.write(Slot::RiskBadge, Content::Badge(&badge)),
        );

        report.record(
            Projection::Probability,
            surface.write(
                Slot::ApprovalProbability,
                Content::Probability(approval_probability(result.risk_percentage)),
            ),
        );

        let blocks = narrative::parse(&result.narrative_analysis);
        report.record(
            Projection::Narrative,
            surface.write(Slot::Analysis, Content::Narrative(&blocks)),
        );

        let series = &result.radar_series;
        report.record(
            Projection::Gauge,
            self.charts
                .draw_gauge(backend, result.risk_percentage, result.risk_level),
        );
        report.record(
            Projection::EngagementChart,
            self.charts.draw_engagement(backend, series),
        );
        report.record(
            Projection::GradesChart,
            self.charts.draw_grades(backend, series),
        );
        report.record(
            Projection::AttendanceChart,
            self.charts.draw_attendance(backend, series),
        );

        let breakdown = MathBreakdown::from_details(&result.math_details);
        report.record(
            Projection::Math,
            surface.write(Slot::MathBreakdown, Content::Math(&breakdown)),
        );

        report
    }

    pub fn release_charts<B: ChartBackend>(&mut self, backend: &mut B) {
        self.charts.release_all(backend);
    }
}
