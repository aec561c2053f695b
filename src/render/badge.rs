use crate::config::{DANGER, LOW_RISK, WARNING};
use crate::models::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskBadge {
    pub icon: &'static str,
    pub label: &'static str,
    pub class_name: &'static str,
    pub color: &'static str,
}

impl RiskBadge {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => RiskBadge {
                icon: "✅",
                label: "RISK LOW",
                class_name: "risk-low",
                color: LOW_RISK,
            },
            RiskLevel::Medium => RiskBadge {
                icon: "⚠️",
                label: "RISK MEDIUM",
                class_name: "risk-medium",
                color: WARNING,
            },
            RiskLevel::High => RiskBadge {
                icon: "🚨",
                label: "RISK HIGH",
                class_name: "risk-high",
                color: DANGER,
            },
        }
    }

    pub fn text(&self) -> String {
        format!("{} {}", self.icon, self.label)
    }
}

/// Displayed pass probability. Derived from the risk, not modeled separately.
pub fn approval_probability(risk_percentage: f64) -> u8 {
    (100.0 - risk_percentage).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_risk_scenario() {
        let badge = RiskBadge::for_level(RiskLevel::High);
        assert_eq!(badge.text(), "🚨 RISK HIGH");
        assert_eq!(approval_probability(82.4), 18);
    }

    #[test]
    fn every_level_has_a_distinct_badge() {
        assert_eq!(RiskBadge::for_level(RiskLevel::Low).text(), "✅ RISK LOW");
        assert_eq!(RiskBadge::for_level(RiskLevel::Medium).text(), "⚠️ RISK MEDIUM");
        assert_eq!(RiskBadge::for_level(RiskLevel::Medium).class_name, "risk-medium");
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(approval_probability(0.0), 100);
        assert_eq!(approval_probability(100.0), 0);
        assert_eq!(approval_probability(130.0), 0);
        assert_eq!(approval_probability(-5.0), 100);
    }
}
