//! Insights page: filterable insight list, recommendations, causal chains and
//! the trend chart.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::KpiBackend;
use crate::config::Config;
use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::model::{CausalChain, HistoricalData, Insight, InsightKind, Severity};
use crate::render::cards::{render_causal_chains, render_insights, render_recommendations, InsightLayout};
use crate::render::charts::trend_option;
use crate::render::{loading_overlay, PageSnapshot, Toasts};
use crate::theme::ToastKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsightFilter {
    #[default]
    All,
    Critical,
    Warning,
    Optimization,
}

impl InsightFilter {
    pub const ALL: [InsightFilter; 4] = [
        InsightFilter::All,
        InsightFilter::Critical,
        InsightFilter::Warning,
        InsightFilter::Optimization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightFilter::All => "all",
            InsightFilter::Critical => "critical",
            InsightFilter::Warning => "warning",
            InsightFilter::Optimization => "optimization",
        }
    }

    pub fn matches(&self, insight: &Insight) -> bool {
        match self {
            InsightFilter::All => true,
            InsightFilter::Critical => insight.severity() == Severity::High,
            InsightFilter::Warning => insight.severity() == Severity::Medium,
            InsightFilter::Optimization => insight.kind == InsightKind::Optimization,
        }
    }

    pub fn button_class(&self, active: InsightFilter) -> &'static str {
        if *self == active {
            "px-4 py-2 bg-blue-600 text-white rounded-lg text-sm font-medium"
        } else {
            "px-4 py-2 bg-gray-100 text-gray-700 rounded-lg text-sm font-medium hover:bg-gray-200"
        }
    }
}

impl fmt::Display for InsightFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsightFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown filter: {}", s))
    }
}

/// Counters shown above the insight list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsightSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub optimization: usize,
}

impl InsightSummary {
    pub fn of(insights: &[Insight]) -> Self {
        let count = |f: InsightFilter| insights.iter().filter(|i| f.matches(i)).count();
        Self {
            total: insights.len(),
            critical: count(InsightFilter::Critical),
            warning: count(InsightFilter::Warning),
            optimization: count(InsightFilter::Optimization),
        }
    }

    pub fn render(&self) -> String {
        format!(
            r#"<div id="total-insights">{}</div><div id="critical-insights">{}</div><div id="warning-insights">{}</div><div id="optimization-insights">{}</div>"#,
            self.total, self.critical, self.warning, self.optimization
        )
    }
}

#[derive(Debug, Default)]
pub struct InsightsView {
    /// Full list as fetched; filtering never mutates it.
    pub insights: Vec<Insight>,
    pub causal_chains: Vec<CausalChain>,
    pub history: Option<HistoricalData>,
    pub filter: InsightFilter,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct InsightsController {
    pub view: InsightsView,
    pub toasts: Toasts,
    history_days: u32,
}

impl InsightsController {
    pub fn new(config: &Config) -> Self {
        Self {
            view: InsightsView::default(),
            toasts: Toasts::new(config.toast_ttl()),
            history_days: config.history_days,
        }
    }

    pub fn filtered(&self) -> Vec<&Insight> {
        self.view
            .insights
            .iter()
            .filter(|i| self.view.filter.matches(i))
            .collect()
    }

    pub fn set_filter(&mut self, filter: InsightFilter) {
        self.view.filter = filter;
        log(
            Level::Debug,
            Domain::Insights,
            "filter_changed",
            obj(&[
                ("filter", v_str(filter.as_str())),
                ("visible", v_num(self.filtered().len() as f64)),
            ]),
        );
    }

    pub fn summary(&self) -> InsightSummary {
        InsightSummary::of(&self.view.insights)
    }

    /// Insights, causal chains and trend history, fetched concurrently. A
    /// panel whose request fails keeps its previous content.
    pub async fn load(&mut self, backend: &dyn KpiBackend) {
        let _scope = ProfileScope::new("insights_load");
        self.view.loading = true;
        let (insights, reasoning, history) = tokio::join!(
            backend.insights(),
            backend.reasoning("all"),
            backend.historical(self.history_days)
        );
        let mut failed = false;
        match insights {
            Ok(list) => self.view.insights = list,
            Err(err) => failed |= !err.is_status(),
        }
        match reasoning {
            Ok(report) => self.view.causal_chains = report.causal_chains,
            Err(err) => failed |= !err.is_status(),
        }
        match history {
            Ok(h) => self.view.history = Some(h),
            Err(err) => failed |= !err.is_status(),
        }
        if failed {
            log(Level::Warn, Domain::Insights, "load_failed", obj(&[]));
            self.toasts.push(ToastKind::Error, "Failed to load insights data");
        }
        self.view.loading = false;
        self.view.last_updated = Some(Utc::now());
        log(
            Level::Info,
            Domain::Insights,
            "loaded",
            obj(&[
                ("insights", v_num(self.view.insights.len() as f64)),
                ("chains", v_num(self.view.causal_chains.len() as f64)),
            ]),
        );
    }

    pub async fn refresh(&mut self, backend: &dyn KpiBackend) {
        self.load(backend).await;
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.toasts.prune(now);
    }

    fn render_filter_buttons(&self) -> String {
        InsightFilter::ALL
            .iter()
            .map(|f| {
                format!(
                    r#"<button id="filter-{name}" class="{class}">{name}</button>"#,
                    name = f.as_str(),
                    class = f.button_class(self.view.filter)
                )
            })
            .collect()
    }

    pub fn page(&self, now: DateTime<Utc>) -> PageSnapshot {
        let visible: Vec<Insight> = self.filtered().into_iter().cloned().collect();
        PageSnapshot::new("Insights")
            .section("insights-summary", self.summary().render())
            .section("filters", self.render_filter_buttons())
            .section(
                "insights-list",
                render_insights(Some(visible.as_slice()), InsightLayout::Full),
            )
            .section("recommendations-list", render_recommendations(&self.view.insights))
            .section("causal-analysis", render_causal_chains(&self.view.causal_chains))
            .section("loading", loading_overlay(self.view.loading))
            .section("toasts", self.toasts.render(now))
            .chart("trend-chart", self.view.history.as_ref().and_then(trend_option))
    }
}
