use crate::config::Feature;
use crate::models::MathDetails;

#[derive(Debug, Clone, PartialEq)]
pub struct MathRow {
    pub feature: String,
    pub scaled: f64,
    pub coefficient: f64,
    pub impact: f64,
}

/// Display-only view of the model arithmetic. Nothing is recomputed except
/// the per-row product shown in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct MathBreakdown {
    pub rows: Vec<MathRow>,
    pub intercept: f64,
    pub logit_formula: String,
    pub sigmoid_formula: String,
    pub logit_calculation: String,
    pub probability_calculation: String,
}

impl MathBreakdown {
    pub fn from_details(details: &MathDetails) -> Self {
        let rows = details
            .scaled_features
            .iter()
            .zip(&details.coefficients)
            .enumerate()
            .map(|(index, (scaled, coefficient))| MathRow {
                feature: Feature::ALL
                    .get(index)
                    .map(|feature| feature.name().to_string())
                    .unwrap_or_else(|| format!("x{}", index + 1)),
                scaled: *scaled,
                coefficient: *coefficient,
                impact: scaled * coefficient,
            })
            .collect();

        Self {
            rows,
            intercept: details.intercept,
            logit_formula: details.logit_formula.clone(),
            sigmoid_formula: details.sigmoid_formula.clone(),
            logit_calculation: details.logit_calculation_text.clone(),
            probability_calculation: details.probability_calculation_text.clone(),
        }
    }
}
