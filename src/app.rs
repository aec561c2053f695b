use tracing::{info, warn};

use crate::chat::{ChatSession, Visibility};
use crate::client::{ClientError, Operation, PredictionApi};
use crate::form::{FormControls, FormView, Panel};
use crate::models::{PredictionResult, StudentMetrics};
use crate::render::charts::ChartBackend;
use crate::render::math::MathBreakdown;
use crate::render::{RenderReport, ResultRenderer, Surface};

/// Where user-facing failure text goes.
pub trait ErrorDisplay {
    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Default)]
pub struct StderrErrors;

impl ErrorDisplay for StderrErrors {
    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Rendered(RenderReport),
    Failed(String),
    /// A prediction was already in flight.
    Ignored,
}

#[derive(Debug)]
pub struct AppController {
    form: FormView,
    renderer: ResultRenderer,
    chat: ChatSession,
    math_modal: Visibility,
    current: Option<PredictionResult>,
    in_flight: bool,
}

impl Default for AppController {
    fn default() -> Self {
        Self {
            form: FormView::default(),
            renderer: ResultRenderer::default(),
            chat: ChatSession::default(),
            math_modal: Visibility::Hidden,
            current: None,
            in_flight: false,
        }
    }
}

impl AppController {
    pub fn panel(&self) -> Panel {
        self.form.panel()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }

    pub fn current(&self) -> Option<&PredictionResult> {
        self.current.as_ref()
    }

    /// Starts a submission, or returns `None` while one is still in flight.
    pub fn begin_submit(&mut self, controls: &FormControls) -> Option<StudentMetrics> {
        if self.in_flight {
            warn!("prediction already in flight, ignoring submit");
            return None;
        }
        self.in_flight = true;
        self.form.show_loading();

        let metrics = controls.collect();
        info!(?metrics, "submitting prediction");
        Some(metrics)
    }

    pub fn finish_submit<S: Surface, B: ChartBackend, E: ErrorDisplay>(
        &mut self,
        metrics: StudentMetrics,
        outcome: Result<PredictionResult, ClientError>,
        surface: &mut S,
        backend: &mut B,
        errors: &mut E,
    ) -> SubmitOutcome {
        self.in_flight = false;
        self.form.hide_loading();

        match outcome {
            Ok(result) => {
                info!(
                    risk = result.risk_percentage,
                    level = result.risk_level.as_str(),
                    "prediction received"
                );
                self.form.show_results_state();
                let report = self.renderer.render(&result, surface, backend);
                self.chat.set_context(result.clone(), metrics);
                self.current = Some(result);
                SubmitOutcome::Rendered(report)
            }
            Err(err) => {
                warn!(error = %err, "prediction failed");
                self.form.show_initial_state();
                let message = err.user_message(Operation::Predict);
                errors.show_error(&message);
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn submit<A: PredictionApi, S: Surface, B: ChartBackend, E: ErrorDisplay>(
        &mut self,
        controls: &FormControls,
        api: &A,
        surface: &mut S,
        backend: &mut B,
        errors: &mut E,
    ) -> SubmitOutcome {
        let Some(metrics) = self.begin_submit(controls) else {
            return SubmitOutcome::Ignored;
        };
        let outcome = api.predict(&metrics).await;
        self.finish_submit(metrics, outcome, surface, backend, errors)
    }

    /// Opens the math modal; the breakdown is `None` before any prediction.
    pub fn show_math(&mut self) -> Option<MathBreakdown> {
        self.math_modal = Visibility::Visible;
        self.current
            .as_ref()
            .map(|result| MathBreakdown::from_details(&result.math_details))
    }

    pub fn hide_math(&mut self) {
        self.math_modal = Visibility::Hidden;
    }

    pub fn math_modal(&self) -> Visibility {
        self.math_modal
    }

    pub fn release_charts<B: ChartBackend>(&mut self, backend: &mut B) {
        self.renderer.release_charts(backend);
    }
}
