use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{Operation, PredictionApi};
use crate::form::{FormControls, ATTENDANCE, LOGINS, MIDTERM, TRACKING, TUTORING};
use crate::models::RiskLevel;
use crate::render::badge::approval_probability;

/// One CSV row; every column is raw text so bad cells degrade like form input.
#[derive(Debug, Deserialize)]
struct CsvRow {
    name: Option<String>,
    attendance: Option<String>,
    tracking: Option<String>,
    midterm: Option<String>,
    logins: Option<String>,
    tutoring: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchInput {
    pub name: String,
    pub controls: FormControls,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPrediction {
    pub name: String,
    pub attendance: f64,
    pub tracking: f64,
    pub midterm: f64,
    pub logins: u32,
    pub tutoring: u8,
    pub risk_percentage: f64,
    pub risk_level: &'static str,
    pub approval_probability: u8,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub avg_risk: f64,
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn predicted(&self) -> usize {
        self.low + self.medium + self.high
    }
}

pub fn read_inputs<R: Read>(reader: R) -> anyhow::Result<Vec<BatchInput>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut inputs = Vec::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.with_context(|| format!("invalid CSV row {}", index + 1))?;
        let mut controls = FormControls::new();
        controls.set_opt(ATTENDANCE, row.attendance.as_deref());
        controls.set_opt(TRACKING, row.tracking.as_deref());
        controls.set_opt(MIDTERM, row.midterm.as_deref());
        controls.set_opt(LOGINS, row.logins.as_deref());
        controls.set_opt(TUTORING, row.tutoring.as_deref());

        inputs.push(BatchInput {
            name: row
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("row {}", index + 1)),
            controls,
        });
    }

    Ok(inputs)
}

pub fn read_inputs_from_path(path: &Path) -> anyhow::Result<Vec<BatchInput>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_inputs(file)
}

/// Predicts rows one at a time; a failed row is recorded and skipped.
pub async fn predict_all<A: PredictionApi>(
    inputs: &[BatchInput],
    api: &A,
) -> (Vec<BatchPrediction>, BatchSummary) {
    let mut predictions = Vec::new();
    let mut summary = BatchSummary::default();
    let mut total_risk = 0.0;

    for input in inputs {
        let metrics = input.controls.collect();
        match api.predict(&metrics).await {
            Ok(result) => {
                match result.risk_level {
                    RiskLevel::Low => summary.low += 1,
                    RiskLevel::Medium => summary.medium += 1,
                    RiskLevel::High => summary.high += 1,
                }
                total_risk += result.risk_percentage;
                predictions.push(BatchPrediction {
                    name: input.name.clone(),
                    attendance: metrics.attendance_rate,
                    tracking: metrics.tracking_score,
                    midterm: metrics.midterm_grade,
                    logins: metrics.login_count,
                    tutoring: u8::from(metrics.uses_tutoring),
                    risk_percentage: result.risk_percentage,
                    risk_level: result.risk_level.as_str(),
                    approval_probability: approval_probability(result.risk_percentage),
                });
            }
            Err(err) => {
                warn!(name = %input.name, error = %err, "batch row failed");
                summary
                    .failures
                    .push((input.name.clone(), err.user_message(Operation::Predict)));
            }
        }
    }

    let predicted = summary.predicted();
    summary.avg_risk = if predicted == 0 {
        0.0
    } else {
        total_risk / predicted as f64
    };

    (predictions, summary)
}

pub fn write_predictions(path: &Path, predictions: &[BatchPrediction]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for prediction in predictions {
        writer.serialize(prediction)?;
    }
    writer.flush()?;
    Ok(())
}
