use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::retry::{is_retryable_network_error, retry_async, RetryConfig};
use super::{ApiError, Endpoint, Envelope, KpiBackend};
use crate::config::Config;
use crate::logging::{agg_increment, log_fetch};
use crate::model::{
    ChangeSet, GraphSnapshot, HistoricalData, Insight, InsightsPayload, Kpi, ReasoningReport,
    SimulationResult, StrategicGoal,
};

/// `KpiBackend` over HTTP. GETs are retried on transient failures; POSTs
/// (reasoning, simulate) are sent once.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    retry: RetryConfig,
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(cfg.http_timeout())
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: "client",
                message: e.to_string(),
                retryable: false,
            })?;
        Self::with_client(client, &cfg.api_base)
    }

    pub fn with_client(client: Client, api_base: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base: base_url(api_base)?,
            retry: RetryConfig::default(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        Ok(self.base.join(endpoint.path().trim_start_matches('/'))?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let elapsed = || started.elapsed().as_secs_f64() * 1000.0;
        agg_increment("fetch");

        let resp = request.send().await.map_err(|e| {
            log_fetch(endpoint.path(), None, elapsed(), "transport_error");
            agg_increment("fetch_failure");
            ApiError::Transport {
                endpoint: endpoint.path(),
                message: e.to_string(),
                retryable: is_retryable_network_error(&e),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            log_fetch(endpoint.path(), Some(status.as_u16()), elapsed(), "skipped");
            agg_increment("fetch_failure");
            return Err(ApiError::status(endpoint, status.as_u16()));
        }

        let body: Envelope<T> = resp.json().await.map_err(|e| {
            log_fetch(endpoint.path(), Some(status.as_u16()), elapsed(), "decode_error");
            agg_increment("fetch_failure");
            ApiError::Decode {
                endpoint: endpoint.path(),
                message: e.to_string(),
            }
        })?;
        log_fetch(endpoint.path(), Some(status.as_u16()), elapsed(), "ok");
        Ok(body.data)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint)?;
        retry_async(&self.retry, endpoint.path(), ApiError::is_retryable, || {
            self.send(endpoint, self.client.get(url.clone()).query(query))
        })
        .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint)?;
        self.send(endpoint, self.client.post(url).json(&body)).await
    }
}

fn base_url(api_base: &str) -> Result<Url, ApiError> {
    let mut base = api_base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?)
}

#[async_trait]
impl KpiBackend for HttpBackend {
    async fn kpis(&self) -> Result<Vec<Kpi>, ApiError> {
        self.get(Endpoint::Kpis, &[]).await
    }

    async fn insights(&self) -> Result<Vec<Insight>, ApiError> {
        let payload: InsightsPayload = self.get(Endpoint::Insights, &[]).await?;
        Ok(payload.insights)
    }

    async fn graph(&self) -> Result<GraphSnapshot, ApiError> {
        self.get(Endpoint::Graph, &[]).await
    }

    async fn strategic_goals(&self) -> Result<Vec<StrategicGoal>, ApiError> {
        self.get(Endpoint::StrategicGoals, &[]).await
    }

    async fn reasoning(&self, focus_area: &str) -> Result<ReasoningReport, ApiError> {
        self.post(Endpoint::Reasoning, json!({ "focus_area": focus_area }))
            .await
    }

    async fn simulate(&self, changes: &ChangeSet) -> Result<SimulationResult, ApiError> {
        self.post(Endpoint::Simulate, json!({ "changes": changes })).await
    }

    async fn historical(&self, days: u32) -> Result<HistoricalData, ApiError> {
        self.get(Endpoint::Historical, &[("days", days.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls_keep_base_path() {
        let backend = HttpBackend::with_client(Client::new(), "http://host:5000/app").unwrap();
        assert_eq!(
            backend.url(Endpoint::Kpis).unwrap().as_str(),
            "http://host:5000/app/api/kpis"
        );
        assert_eq!(
            backend.url(Endpoint::StrategicGoals).unwrap().as_str(),
            "http://host:5000/app/api/strategic-goals"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            HttpBackend::with_client(Client::new(), "not a url"),
            Err(ApiError::Url(_))
        ));
    }
}
