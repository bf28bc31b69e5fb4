//! Canonical visual tables: one mapping per (enum, attribute) pair.
//!
//! Renderers never match on raw strings; they ask the enum for its class,
//! color or icon here, and the fallback lives in exactly one place.

use crate::model::{GoalStatus, InsightKind, Severity, Status, Trend};

pub const NEUTRAL_TEXT: &str = "text-gray-600";
pub const NEUTRAL_COLOR: &str = "#64748b";
pub const ACCENT_COLOR: &str = "#2563eb";

impl Status {
    pub fn text_class(&self) -> &'static str {
        match self {
            Status::Excellent => "text-green-600",
            Status::Good => "text-blue-600",
            Status::Warning => "text-yellow-600",
            Status::Critical => "text-red-600",
            Status::Unknown => NEUTRAL_TEXT,
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            Status::Excellent => "#059669",
            Status::Good => "#0891b2",
            Status::Warning => "#f59e0b",
            Status::Critical => "#dc2626",
            Status::Unknown => NEUTRAL_COLOR,
        }
    }
}

impl Trend {
    pub fn glyph(&self) -> &'static str {
        match self {
            Trend::Improving => r#"<span class="text-green-500">↗️</span>"#,
            Trend::Declining => r#"<span class="text-red-500">↘️</span>"#,
            Trend::Stable => r#"<span class="text-gray-500">➡️</span>"#,
            Trend::Fluctuating => r#"<span class="text-yellow-500">〰️</span>"#,
        }
    }
}

impl InsightKind {
    pub fn icon(&self) -> &'static str {
        match self {
            InsightKind::Performance => "📊",
            InsightKind::Causal => "🔗",
            InsightKind::Prediction => "🔮",
            InsightKind::Optimization => "⚡",
            InsightKind::Critical => "🚨",
            InsightKind::Warning => "⚠️",
            InsightKind::Other => "💡",
        }
    }
}

impl Severity {
    pub fn badge_class(&self) -> &'static str {
        match self {
            Severity::High => "bg-red-100 text-red-800",
            Severity::Medium => "bg-yellow-100 text-yellow-800",
            Severity::Low => "bg-green-100 text-green-800",
            Severity::Other => "bg-gray-100 text-gray-800",
        }
    }

    /// Left border of a recommendation card.
    pub fn accent(&self) -> &'static str {
        match self {
            Severity::High => "#dc2626",
            Severity::Medium => "#f59e0b",
            Severity::Low => "#059669",
            Severity::Other => ACCENT_COLOR,
        }
    }
}

impl GoalStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            GoalStatus::OnTrack => "🎯",
            GoalStatus::Other(_) => "⚠️",
        }
    }
}

pub fn goal_progress_class(progress: f64) -> &'static str {
    if progress >= 85.0 {
        "bg-green-500"
    } else if progress >= 70.0 {
        "bg-yellow-500"
    } else {
        "bg-red-500"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            ToastKind::Success => "bg-green-600",
            ToastKind::Error => "bg-red-600",
            ToastKind::Warning => "bg-yellow-600",
            ToastKind::Info => "bg-blue-600",
        }
    }
}

/// Direction of a percent change, bucketed at +/- 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeBand {
    Raised,
    Lowered,
    Neutral,
}

impl ChangeBand {
    pub fn of(change_percent: f64) -> Self {
        if change_percent > 5.0 {
            ChangeBand::Raised
        } else if change_percent < -5.0 {
            ChangeBand::Lowered
        } else {
            ChangeBand::Neutral
        }
    }

    pub fn change_class(&self) -> &'static str {
        match self {
            ChangeBand::Raised => "change-positive",
            ChangeBand::Lowered => "change-negative",
            ChangeBand::Neutral => "change-neutral",
        }
    }

    pub fn slider_track(&self) -> &'static str {
        match self {
            ChangeBand::Raised => "linear-gradient(to right, #e2e8f0 0%, #dcfce7 100%)",
            ChangeBand::Lowered => "linear-gradient(to right, #e2e8f0 0%, #fee2e2 100%)",
            ChangeBand::Neutral => "#e2e8f0",
        }
    }
}

/// Sign-only classification used on impact cards.
pub fn impact_class(change: f64) -> &'static str {
    if change > 0.0 {
        "impact-positive"
    } else if change < 0.0 {
        "impact-negative"
    } else {
        "impact-neutral"
    }
}

pub fn impact_glyph(change: f64) -> &'static str {
    if change > 0.0 {
        "📈"
    } else if change < 0.0 {
        "📉"
    } else {
        "➡️"
    }
}
