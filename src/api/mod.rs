use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{
    ChangeSet, GraphSnapshot, HistoricalData, Insight, Kpi, ReasoningReport, SimulationResult,
    StrategicGoal,
};

mod http;
pub mod retry;

pub use http::HttpBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Kpis,
    Insights,
    Graph,
    StrategicGoals,
    Reasoning,
    Simulate,
    Historical,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Kpis => "/api/kpis",
            Endpoint::Insights => "/api/insights",
            Endpoint::Graph => "/api/graph",
            Endpoint::StrategicGoals => "/api/strategic-goals",
            Endpoint::Reasoning => "/api/reasoning",
            Endpoint::Simulate => "/api/simulate",
            Endpoint::Historical => "/api/historical",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("{endpoint}: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
        retryable: bool,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("{endpoint}: invalid payload: {message}")]
    Decode { endpoint: &'static str, message: String },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn transport(endpoint: Endpoint, message: impl Into<String>) -> Self {
        ApiError::Transport {
            endpoint: endpoint.path(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn status(endpoint: Endpoint, status: u16) -> Self {
        ApiError::Status {
            endpoint: endpoint.path(),
            status,
        }
    }

    /// Non-success HTTP status, as opposed to a transport or decode failure.
    pub fn is_status(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { retryable, .. } => *retryable,
            ApiError::Status { status, .. } => retry::is_retryable_http_error(*status),
            ApiError::Decode { .. } | ApiError::Url(_) => false,
        }
    }
}

/// `{ "success": bool, "data": T }`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// The REST surface the pages consume.
#[async_trait]
pub trait KpiBackend: Send + Sync {
    async fn kpis(&self) -> Result<Vec<Kpi>, ApiError>;
    async fn insights(&self) -> Result<Vec<Insight>, ApiError>;
    async fn graph(&self) -> Result<GraphSnapshot, ApiError>;
    async fn strategic_goals(&self) -> Result<Vec<StrategicGoal>, ApiError>;
    async fn reasoning(&self, focus_area: &str) -> Result<ReasoningReport, ApiError>;
    async fn simulate(&self, changes: &ChangeSet) -> Result<SimulationResult, ApiError>;
    async fn historical(&self, days: u32) -> Result<HistoricalData, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ApiError::status(Endpoint::Kpis, 404).is_status());
        assert!(!ApiError::status(Endpoint::Kpis, 404).is_retryable());
        assert!(ApiError::status(Endpoint::Kpis, 503).is_retryable());
        assert!(!ApiError::transport(Endpoint::Graph, "refused").is_status());
    }

    #[test]
    fn test_error_display_names_endpoint() {
        let err = ApiError::status(Endpoint::Simulate, 500);
        assert_eq!(err.to_string(), "/api/simulate returned HTTP 500");
    }
}
