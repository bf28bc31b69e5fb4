//! Insights page against a stub backend.

mod common;

use chrono::Utc;
use serde_json::json;

use common::{refused, StubBackend};
use kpiboard::api::Endpoint;
use kpiboard::config::Config;
use kpiboard::insights::{InsightFilter, InsightSummary, InsightsController};
use kpiboard::model::{CausalChain, HistoricalData, ReasoningReport, Severity};
use kpiboard::theme::ToastKind;

fn backend() -> StubBackend {
    let history: HistoricalData = serde_json::from_value(json!({
        "period": "30 days",
        "daily_data": [
            {"date": "2024-05-01", "departments": {"ER": [{"name": "Wait", "value": 80.0}]}},
            {"date": "2024-05-02", "departments": {"ER": [{"name": "Wait", "value": 70.0}]}}
        ]
    }))
    .unwrap();
    StubBackend {
        reasoning: Ok(ReasoningReport {
            insights: vec![],
            causal_chains: vec![CausalChain {
                chain: vec!["o#StaffRatio".into(), "o#WaitTime".into()],
                relationships: vec!["influences".into()],
                impact: 0.42,
                length: 2,
            }],
        }),
        historical: Ok(history),
        ..Default::default()
    }
}

#[tokio::test]
async fn load_fills_list_chains_and_trend() {
    let mut page = InsightsController::new(&Config::default());
    page.load(&backend()).await;

    assert_eq!(page.view.insights.len(), 3);
    assert_eq!(page.view.causal_chains.len(), 1);
    assert!(!page.view.loading);

    let snapshot = page.page(Utc::now());
    let html = snapshot.to_html();
    assert!(html.contains("Impact: 42.0%"));
    assert!(html.contains("Open overflow ward"));
    assert!(html.contains("Shift rota earlier"));
    assert_eq!(snapshot.charts["trend-chart"]["series"][0]["data"], json!([80.0, 70.0]));
}

#[tokio::test]
async fn critical_filter_is_a_subset_and_all_restores() {
    let mut page = InsightsController::new(&Config::default());
    page.load(&backend()).await;
    let original = page.view.insights.clone();

    page.set_filter(InsightFilter::Critical);
    let critical = page.filtered();
    assert_eq!(critical.len(), 1);
    assert!(critical.iter().all(|i| i.severity() == Severity::High));
    assert_eq!(page.page(Utc::now()).to_html().matches("insight-card ").count(), 1);

    page.set_filter(InsightFilter::All);
    let all: Vec<_> = page.filtered().into_iter().cloned().collect();
    assert_eq!(all, original);
    assert_eq!(page.view.insights, original);
}

#[tokio::test]
async fn summary_counts_missing_severity_as_medium() {
    let mut page = InsightsController::new(&Config::default());
    page.load(&backend()).await;
    assert_eq!(
        page.summary(),
        InsightSummary {
            total: 3,
            critical: 1,
            warning: 1,
            optimization: 1
        }
    );
}

#[tokio::test]
async fn failed_history_keeps_other_panels() {
    let stub = StubBackend {
        historical: Err(refused(Endpoint::Historical)),
        ..backend()
    };
    let mut page = InsightsController::new(&Config::default());
    page.load(&stub).await;
    assert_eq!(page.view.insights.len(), 3);
    assert!(page.view.history.is_none());
    assert!(page.page(Utc::now()).charts.get("trend-chart").is_none());
    assert!(page
        .toasts
        .contains(ToastKind::Error, "Failed to load insights data"));
}

#[tokio::test]
async fn refresh_reloads_without_touching_the_filter() {
    let mut page = InsightsController::new(&Config::default());
    page.load(&backend()).await;
    page.set_filter(InsightFilter::Optimization);
    page.refresh(&backend()).await;
    assert_eq!(page.view.filter, InsightFilter::Optimization);
    assert_eq!(page.filtered().len(), 1);
}
