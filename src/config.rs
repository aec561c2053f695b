use std::time::Duration;

pub const API_BASE_URL: &str = "https://academic-risk-predictor-api.onrender.com";
pub const PREDICT_PATH: &str = "/predict";
pub const CHAT_PATH: &str = "/chat";
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

pub const PRIMARY: &str = "rgb(102, 126, 234)";
pub const SUCCESS: &str = "rgb(16, 185, 129)";
pub const DANGER: &str = "#ef4444";
pub const WARNING: &str = "#f59e0b";
pub const LOW_RISK: &str = "#10b981";
pub const GRAY: &str = "#e5e7eb";

pub const STUDENT_SERIES: &str = "Your data";
pub const PASSING_SERIES: &str = "Passing average";

/// Connection settings for the prediction API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Model inputs in the order the API reports coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Attendance,
    Tracking,
    Midterm1,
    Logins,
    Tutoring,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Attendance,
        Feature::Tracking,
        Feature::Midterm1,
        Feature::Logins,
        Feature::Tutoring,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Attendance => "Attendance",
            Feature::Tracking => "Tracking",
            Feature::Midterm1 => "Midterm 1",
            Feature::Logins => "Logins",
            Feature::Tutoring => "Tutoring",
        }
    }

    /// Names the API may use for this feature in `datos_radar.labels`.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Feature::Attendance => &["attendance", "asistencia"],
            Feature::Tracking => &["tracking", "seguimiento"],
            Feature::Midterm1 => &["midterm 1", "parcial 1"],
            Feature::Logins => &["logins"],
            Feature::Tutoring => &["tutoring", "tutorías", "tutorias"],
        }
    }

    /// Canonical feature for a radar label, compared case-insensitively.
    pub fn from_label(label: &str) -> Option<Feature> {
        let wanted = label.trim().to_lowercase();
        Feature::ALL
            .into_iter()
            .find(|feature| feature.aliases().iter().any(|alias| *alias == wanted))
    }

    /// Whether `label` mentions this feature anywhere, in any supported language.
    pub fn mentioned_in(&self, label: &str) -> bool {
        let lowered = label.to_lowercase();
        self.aliases().iter().any(|alias| lowered.contains(alias))
    }
}
