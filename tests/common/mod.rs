//! Canned `KpiBackend` for driving the page controllers without a server.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use kpiboard::api::{ApiError, Endpoint, KpiBackend};
use kpiboard::model::{
    ChangeSet, GraphEdge, GraphNode, GraphSnapshot, HistoricalData, Insight, InsightKind, Kpi,
    Observation, ReasoningReport, Severity, SimulationResult, Status, StrategicGoal,
};

pub struct StubBackend {
    pub kpis: Result<Vec<Kpi>, ApiError>,
    pub insights: Result<Vec<Insight>, ApiError>,
    pub graph: Result<GraphSnapshot, ApiError>,
    pub goals: Result<Vec<StrategicGoal>, ApiError>,
    pub reasoning: Result<ReasoningReport, ApiError>,
    pub simulate: Result<SimulationResult, ApiError>,
    pub historical: Result<HistoricalData, ApiError>,
    pub simulate_calls: AtomicUsize,
    pub posted: Mutex<Vec<ChangeSet>>,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self {
            kpis: Ok(vec![
                kpi("kpi:los", "Average Length of Stay", 5.0, 4.0, "days"),
                kpi("kpi:wait", "ER Wait Time", 40.0, 30.0, "minutes"),
            ]),
            insights: Ok(vec![
                insight("Bed shortage", InsightKind::Critical, Some(Severity::High), Some("Open overflow ward")),
                insight("Discharge delays", InsightKind::Performance, None, None),
                insight("Staff rota", InsightKind::Optimization, Some(Severity::Low), Some("Shift rota earlier")),
            ]),
            graph: Ok(graph()),
            goals: Ok(vec![serde_json::from_value(json!({
                "name": "Enhance Patient Experience", "progress": 88.0, "status": "on_track"
            }))
            .unwrap()]),
            reasoning: Ok(ReasoningReport::default()),
            simulate: Ok(los_result()),
            historical: Ok(HistoricalData::default()),
            simulate_calls: AtomicUsize::new(0),
            posted: Mutex::new(Vec::new()),
        }
    }
}

impl StubBackend {
    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KpiBackend for StubBackend {
    async fn kpis(&self) -> Result<Vec<Kpi>, ApiError> {
        self.kpis.clone()
    }

    async fn insights(&self) -> Result<Vec<Insight>, ApiError> {
        self.insights.clone()
    }

    async fn graph(&self) -> Result<GraphSnapshot, ApiError> {
        self.graph.clone()
    }

    async fn strategic_goals(&self) -> Result<Vec<StrategicGoal>, ApiError> {
        self.goals.clone()
    }

    async fn reasoning(&self, _focus_area: &str) -> Result<ReasoningReport, ApiError> {
        self.reasoning.clone()
    }

    async fn simulate(&self, changes: &ChangeSet) -> Result<SimulationResult, ApiError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.posted.lock().unwrap().push(changes.clone());
        self.simulate.clone()
    }

    async fn historical(&self, _days: u32) -> Result<HistoricalData, ApiError> {
        self.historical.clone()
    }
}

pub fn refused(endpoint: Endpoint) -> ApiError {
    ApiError::transport(endpoint, "connection refused")
}

pub fn kpi(uri: &str, label: &str, value: f64, target: f64, unit: &str) -> Kpi {
    Kpi {
        uri: uri.into(),
        label: label.into(),
        unit: unit.into(),
        target,
        observation: Observation {
            uri: None,
            value,
            status: Status::Warning,
            timestamp: "2024-05-01T09:00:00".into(),
        },
        trend: None,
        department: None,
        domain_name: None,
        goal_name: None,
    }
}

pub fn insight(
    title: &str,
    kind: InsightKind,
    severity: Option<Severity>,
    recommendation: Option<&str>,
) -> Insight {
    Insight {
        title: title.into(),
        message: format!("{} detected", title),
        kind,
        severity,
        recommendation: recommendation.map(str::to_string),
        kpis: vec![],
        relationship: None,
        timestamp: None,
        source: None,
    }
}

pub fn graph() -> GraphSnapshot {
    let node = |id: &str| GraphNode {
        id: id.into(),
        label: id.to_uppercase(),
        value: 1.0,
        target: 2.0,
        status: Status::Good,
        unit: "days".into(),
        size: None,
        color: None,
    };
    GraphSnapshot::new(
        vec![node("los"), node("wait")],
        vec![GraphEdge {
            source: "los".into(),
            target: "wait".into(),
            relationship: "influences".into(),
            weight: None,
            color: None,
        }],
    )
}

/// `kpi:los` 5.0 -> 4.2 with one propagated outcome.
pub fn los_result() -> SimulationResult {
    serde_json::from_value(json!({
        "original_values": {"kpi:los": 5.0},
        "new_values": {"kpi:los": 4.2},
        "impacts": {
            "kpi:los": {
                "kpi": {"label": "Average Length of Stay", "target": 4.0, "unit": "days", "current_value": 5.0},
                "new_value": 4.2,
                "change_percent": -16.0
            }
        },
        "predicted_outcomes": [{
            "kpi_uri": "kpi:occ", "kpi_label": "Bed Occupancy",
            "original_value": 91.0, "projected_value": 87.0, "change_amount": -4.0,
            "influenced_by": "http://hospital-kpi.org/ontology#LOS",
            "relationship_type": "influences", "depth": 1
        }],
        "overall_impact_score": 3.2
    }))
    .unwrap()
}
