use serde::Serialize;

use crate::model::SimulationResult;

pub const HIGH_IMPACT_PERCENT: f64 = 20.0;
pub const NEGATIVE_IMPACT_PERCENT: f64 = -10.0;
pub const LOW_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: String,
    pub priority: Priority,
}

/// Rules are independent; each contributes at most one entry.
pub fn generate(result: &SimulationResult) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let high = result
        .direct_impacts()
        .filter(|(_, i)| i.change_percent.abs() > HIGH_IMPACT_PERCENT)
        .count();
    if high > 0 {
        out.push(Recommendation {
            icon: "🚨",
            title: "High-Impact Changes Detected",
            description: format!(
                "{} KPIs show significant changes (>20%). Monitor these closely.",
                high
            ),
            priority: Priority::High,
        });
    }

    let negative = result
        .direct_impacts()
        .filter(|(_, i)| i.change_percent < NEGATIVE_IMPACT_PERCENT)
        .count();
    if negative > 0 {
        out.push(Recommendation {
            icon: "⚠️",
            title: "Negative Performance Impact",
            description: format!(
                "{} KPIs show negative changes. Consider mitigation strategies.",
                negative
            ),
            priority: Priority::High,
        });
    }

    if !result.predicted_outcomes.is_empty() {
        out.push(Recommendation {
            icon: "🔄",
            title: "Cascade Effects Identified",
            description: format!(
                "Changes affect {} additional KPIs through causal relationships.",
                result.predicted_outcomes.len()
            ),
            priority: Priority::Medium,
        });
    }

    if result.overall_impact_score < LOW_SCORE {
        out.push(Recommendation {
            icon: "⚡",
            title: "Optimization Opportunity",
            description: "Low overall impact suggests room for more aggressive improvements."
                .to_string(),
            priority: Priority::Medium,
        });
    }

    out
}
