use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMetrics {
    #[serde(rename = "promedio_asistencia")]
    pub attendance_rate: f64,
    #[serde(rename = "promedio_seguimiento")]
    pub tracking_score: f64,
    #[serde(rename = "nota_parcial_1")]
    pub midterm_grade: f64,
    #[serde(rename = "inicios_sesion_plataforma")]
    pub login_count: u32,
    #[serde(rename = "uso_tutorias", with = "tutoring_flag")]
    pub uses_tutoring: bool,
}

/// The API encodes tutoring as `0 | 1`.
mod tutoring_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Int(u8),
            Bool(bool),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(other) => Err(de::Error::custom(format!(
                "tutoring flag must be 0 or 1, got {other}"
            ))),
            Flag::Bool(value) => Ok(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "BAJO", alias = "LOW")]
    Low,
    #[serde(rename = "MEDIO", alias = "MEDIUM")]
    Medium,
    #[serde(rename = "ALTO", alias = "HIGH")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub labels: Vec<String>,
    #[serde(rename = "estudiante")]
    pub student_values: Vec<f64>,
    #[serde(rename = "promedio_aprobado")]
    pub passing_average_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathDetails {
    #[serde(rename = "intercepto")]
    pub intercept: f64,
    #[serde(rename = "coeficientes")]
    pub coefficients: Vec<f64>,
    #[serde(rename = "features_scaled")]
    pub scaled_features: Vec<f64>,
    #[serde(rename = "formula_logit")]
    pub logit_formula: String,
    #[serde(rename = "formula_sigmoide")]
    pub sigmoid_formula: String,
    #[serde(rename = "calculo_logit_texto")]
    pub logit_calculation_text: String,
    #[serde(rename = "calculo_probabilidad_texto")]
    pub probability_calculation_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "porcentaje_riesgo")]
    pub risk_percentage: f64,
    #[serde(rename = "nivel_riesgo")]
    pub risk_level: RiskLevel,
    #[serde(rename = "analisis_ia")]
    pub narrative_analysis: String,
    #[serde(rename = "datos_radar")]
    pub radar_series: RadarSeries,
    #[serde(rename = "detalles_matematicos")]
    pub math_details: MathDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    #[serde(rename = "pregunta")]
    pub question: &'a str,
    #[serde(rename = "datos_estudiante")]
    pub metrics: &'a StudentMetrics,
    #[serde(rename = "prediccion_actual")]
    pub prediction: &'a PredictionResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "respuesta")]
    pub answer: String,
}
