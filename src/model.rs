//! Payload types shared by the three pages.
//!
//! Everything here is transient view-state decoded from backend JSON. Closed
//! enums decode from free-form strings and fall back to a generic variant
//! instead of failing the whole payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Excellent,
    Good,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Excellent => "excellent",
            Status::Good => "good",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Unknown => "unknown",
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "excellent" => Status::Excellent,
            "good" => Status::Good,
            "warning" => Status::Warning,
            "critical" => Status::Critical,
            _ => Status::Unknown,
        }
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    Fluctuating,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::Fluctuating => "fluctuating",
        }
    }
}

impl From<String> for Trend {
    fn from(s: String) -> Self {
        match s.as_str() {
            "improving" => Trend::Improving,
            "declining" => Trend::Declining,
            "fluctuating" => Trend::Fluctuating,
            _ => Trend::Stable,
        }
    }
}

impl From<Trend> for String {
    fn from(t: Trend) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InsightKind {
    Performance,
    Causal,
    Prediction,
    Optimization,
    Critical,
    Warning,
    #[default]
    Other,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Performance => "performance",
            InsightKind::Causal => "causal",
            InsightKind::Prediction => "prediction",
            InsightKind::Optimization => "optimization",
            InsightKind::Critical => "critical",
            InsightKind::Warning => "warning",
            InsightKind::Other => "other",
        }
    }
}

impl From<String> for InsightKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "performance" => InsightKind::Performance,
            "causal" => InsightKind::Causal,
            "prediction" => InsightKind::Prediction,
            "optimization" => InsightKind::Optimization,
            "critical" => InsightKind::Critical,
            "warning" => InsightKind::Warning,
            _ => InsightKind::Other,
        }
    }
}

impl From<InsightKind> for String {
    fn from(k: InsightKind) -> Self {
        k.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
    Other,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Other => "other",
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Other,
        }
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalStatus {
    OnTrack,
    Other(String),
}

impl From<String> for GoalStatus {
    fn from(s: String) -> Self {
        if s == "on_track" {
            GoalStatus::OnTrack
        } else {
            GoalStatus::Other(s)
        }
    }
}

impl From<GoalStatus> for String {
    fn from(s: GoalStatus) -> Self {
        match s {
            GoalStatus::OnTrack => "on_track".to_string(),
            GoalStatus::Other(s) => s,
        }
    }
}

// =============================================================================
// KPIs and insights
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub uri: Option<String>,
    pub value: f64,
    pub status: Status,
    #[serde(default)]
    pub timestamp: String,
}

impl Observation {
    /// Wall-clock part of the observation timestamp, or the raw string when
    /// it is not ISO-8601.
    pub fn time_label(&self) -> String {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&self.timestamp) {
            return dt.format("%H:%M:%S").to_string();
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
            return dt.format("%H:%M:%S").to_string();
        }
        self.timestamp.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub uri: String,
    pub label: String,
    #[serde(default)]
    pub unit: String,
    pub target: f64,
    pub observation: Observation,
    #[serde(default)]
    pub trend: Option<Trend>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub goal_name: Option<String>,
}

impl Kpi {
    pub fn value(&self) -> f64 {
        self.observation.value
    }

    pub fn trend(&self) -> Trend {
        self.trend.unwrap_or(Trend::Stable)
    }

    /// value / target x 100; zero when the target is not positive.
    pub fn performance_ratio(&self) -> f64 {
        performance_ratio(self.observation.value, self.target)
    }
}

pub fn performance_ratio(value: f64, target: f64) -> f64 {
    if target > 0.0 {
        value / target * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: InsightKind,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub kpis: Vec<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Insight {
    pub fn severity(&self) -> Severity {
        self.severity.unwrap_or_default()
    }

    pub fn recommendation(&self) -> Option<&str> {
        self.recommendation.as_deref().filter(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CausalChain {
    #[serde(default)]
    pub chain: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub impact: f64,
    #[serde(default)]
    pub length: usize,
}

impl CausalChain {
    /// Chain members shortened to the fragment after `#`.
    pub fn labels(&self) -> Vec<&str> {
        self.chain.iter().map(|uri| local_name(uri)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningReport {
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub causal_chains: Vec<CausalChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsPayload {
    #[serde(default)]
    pub insights: Vec<Insight>,
}

// =============================================================================
// Graph
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub target: f64,
    #[serde(default = "unknown_status")]
    pub status: Status,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

fn unknown_status() -> Status {
    Status::Unknown
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub relationship: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Either list may be absent in a malformed update; see `GraphSnapshot::parts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Option<Vec<GraphNode>>,
    #[serde(default)]
    pub edges: Option<Vec<GraphEdge>>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            nodes: Some(nodes),
            edges: Some(edges),
        }
    }

    /// Both lists, or `None` when either is missing.
    pub fn parts(&self) -> Option<(&[GraphNode], &[GraphEdge])> {
        match (&self.nodes, &self.edges) {
            (Some(n), Some(e)) => Some((n.as_slice(), e.as_slice())),
            _ => None,
        }
    }
}

// =============================================================================
// Strategic goals
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicGoal {
    pub name: String,
    #[serde(default)]
    pub progress: f64,
    pub status: GoalStatus,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub contributing_kpis: Vec<String>,
}

impl StrategicGoal {
    pub fn risk_level(&self) -> &str {
        self.risk_level.as_deref().unwrap_or("low")
    }
}

// =============================================================================
// Simulation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactKpi {
    pub label: String,
    #[serde(default)]
    pub target: f64,
    #[serde(default)]
    pub unit: String,
    pub current_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluencedKpi {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectImpact {
    pub kpi: ImpactKpi,
    pub new_value: f64,
    pub change_percent: f64,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub influenced_kpis: Vec<InfluencedKpi>,
}

/// The backend answers `{"error": ...}` for a KPI it cannot resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImpactEntry {
    Resolved(DirectImpact),
    Unresolved { error: String },
}

impl ImpactEntry {
    pub fn resolved(&self) -> Option<&DirectImpact> {
        match self {
            ImpactEntry::Resolved(impact) => Some(impact),
            ImpactEntry::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedOutcome {
    #[serde(default)]
    pub kpi_uri: String,
    pub kpi_label: String,
    pub original_value: f64,
    pub projected_value: f64,
    #[serde(default)]
    pub change_amount: f64,
    #[serde(default)]
    pub influenced_by: String,
    #[serde(default)]
    pub relationship_type: String,
    #[serde(default)]
    pub depth: u32,
}

impl PredictedOutcome {
    pub fn influencer(&self) -> &str {
        local_name(&self.influenced_by)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default)]
    pub original_values: BTreeMap<String, f64>,
    #[serde(default)]
    pub new_values: BTreeMap<String, f64>,
    #[serde(default)]
    pub impacts: BTreeMap<String, ImpactEntry>,
    #[serde(default)]
    pub predicted_outcomes: Vec<PredictedOutcome>,
    #[serde(default)]
    pub overall_impact_score: f64,
}

impl SimulationResult {
    pub fn direct_impacts(&self) -> impl Iterator<Item = (&str, &DirectImpact)> {
        self.impacts
            .iter()
            .filter_map(|(uri, entry)| entry.resolved().map(|i| (uri.as_str(), i)))
    }
}

/// KPI uri -> proposed value, as posted to the simulation endpoint.
pub type ChangeSet = BTreeMap<String, f64>;

// =============================================================================
// Historical trend
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyData {
    pub date: String,
    #[serde(default)]
    pub departments: BTreeMap<String, Vec<NamedValue>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub daily_data: Vec<DailyData>,
}

/// Last segment of an ontology uri (`http://x/ontology#LOS` -> `LOS`).
pub fn local_name(uri: &str) -> &str {
    uri.rsplit('#').next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_enum_strings_fall_back() {
        let obs: Observation =
            serde_json::from_value(json!({"value": 1.0, "status": "degraded"})).unwrap();
        assert_eq!(obs.status, Status::Unknown);

        let insight: Insight = serde_json::from_value(json!({
            "title": "t", "message": "m", "type": "mystery", "severity": "urgent"
        }))
        .unwrap();
        assert_eq!(insight.kind, InsightKind::Other);
        assert_eq!(insight.severity(), Severity::Other);
    }

    #[test]
    fn test_missing_severity_defaults_to_medium() {
        let insight: Insight =
            serde_json::from_value(json!({"title": "t", "message": "m", "type": "causal"})).unwrap();
        assert_eq!(insight.severity(), Severity::Medium);
        let nulled: Insight =
            serde_json::from_value(json!({"title": "t", "severity": null})).unwrap();
        assert_eq!(nulled.severity(), Severity::Medium);
    }

    #[test]
    fn test_kpi_trend_defaults_to_stable() {
        let kpi: Kpi = serde_json::from_value(json!({
            "uri": "kpi:los", "label": "LOS", "unit": "days", "target": 4.0,
            "observation": {"value": 5.0, "status": "warning", "timestamp": "2024-01-01T10:11:12"}
        }))
        .unwrap();
        assert_eq!(kpi.trend(), Trend::Stable);
        assert_eq!(kpi.observation.time_label(), "10:11:12");
        assert!((kpi.performance_ratio() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_zero_target() {
        assert_eq!(performance_ratio(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_graph_parts_requires_both_lists() {
        let partial: GraphSnapshot = serde_json::from_value(json!({"nodes": []})).unwrap();
        assert!(partial.parts().is_none());
        let full: GraphSnapshot = serde_json::from_value(json!({"nodes": [], "edges": []})).unwrap();
        assert!(full.parts().is_some());
    }

    #[test]
    fn test_unresolved_impacts_are_skipped() {
        let result: SimulationResult = serde_json::from_value(json!({
            "impacts": {
                "kpi:a": {"error": "KPI not found"},
                "kpi:b": {
                    "kpi": {"label": "B", "target": 1.0, "unit": "days", "current_value": 2.0},
                    "new_value": 3.0, "change_percent": 50.0
                }
            },
            "overall_impact_score": 1.5
        }))
        .unwrap();
        let direct: Vec<_> = result.direct_impacts().map(|(uri, _)| uri).collect();
        assert_eq!(direct, vec!["kpi:b"]);
        assert!(result.predicted_outcomes.is_empty());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://hospital-kpi.org/ontology#LOS"), "LOS");
        assert_eq!(local_name("plain"), "plain");
    }
}
