use std::collections::HashMap;

use tracing::debug;

use crate::models::StudentMetrics;

pub const ATTENDANCE: &str = "attendance";
pub const TRACKING: &str = "tracking";
pub const MIDTERM: &str = "midterm";
pub const LOGINS: &str = "logins";
pub const TUTORING: &str = "tutoring";

pub const CONTROL_NAMES: [&str; 5] = [ATTENDANCE, TRACKING, MIDTERM, LOGINS, TUTORING];

/// Raw values of the input controls, keyed by control name.
#[derive(Debug, Clone, Default)]
pub struct FormControls {
    values: HashMap<String, String>,
}

impl FormControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn set_opt(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Reads the five controls into a payload; bad input degrades to zero/false.
    pub fn collect(&self) -> StudentMetrics {
        let attendance = self.number(ATTENDANCE).clamp(0.0, 100.0);
        let logins = self.number(LOGINS);

        StudentMetrics {
            attendance_rate: attendance,
            tracking_score: self.number(TRACKING),
            midterm_grade: self.number(MIDTERM),
            login_count: if logins > 0.0 {
                logins.trunc().min(u32::MAX as f64) as u32
            } else {
                0
            },
            uses_tutoring: self.checked(TUTORING),
        }
    }

    /// Read-outs shown next to each control.
    pub fn display_values(&self) -> Vec<(&'static str, String)> {
        let metrics = self.collect();
        vec![
            (ATTENDANCE, format!("{}%", metrics.attendance_rate)),
            (TRACKING, format!("{:.1}", metrics.tracking_score)),
            (MIDTERM, format!("{:.1}", metrics.midterm_grade)),
            (LOGINS, metrics.login_count.to_string()),
            (TUTORING, tutoring_label(metrics.uses_tutoring).to_string()),
        ]
    }

    fn number(&self, name: &str) -> f64 {
        let Some(raw) = self.get(name) else {
            return 0.0;
        };

        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                debug!(control = name, raw, "unparseable control value, using 0");
                0.0
            }
        }
    }

    fn checked(&self, name: &str) -> bool {
        self.get(name)
            .map(|raw| {
                matches!(
                    raw.trim().to_lowercase().as_str(),
                    "1" | "true" | "on" | "yes" | "checked"
                )
            })
            .unwrap_or(false)
    }
}

pub fn tutoring_label(uses_tutoring: bool) -> &'static str {
    if uses_tutoring {
        "Yes, I use tutoring"
    } else {
        "I don't use tutoring"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Initial,
    Loading,
    Results,
}

/// Which of the mutually exclusive result panels is showing.
#[derive(Debug)]
pub struct FormView {
    panel: Panel,
}

impl Default for FormView {
    fn default() -> Self {
        Self {
            panel: Panel::Initial,
        }
    }
}

impl FormView {
    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn show_loading(&mut self) {
        self.panel = Panel::Loading;
    }

    pub fn hide_loading(&mut self) {
        if self.panel == Panel::Loading {
            self.panel = Panel::Initial;
        }
    }

    pub fn show_initial_state(&mut self) {
        self.panel = Panel::Initial;
    }

    pub fn show_results_state(&mut self) {
        self.panel = Panel::Results;
    }
}
