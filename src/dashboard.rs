//! Main dashboard: KPI cards, insight preview, relationship graph and goals,
//! kept current by push events.

use chrono::{DateTime, Utc};

use crate::api::{ApiError, KpiBackend};
use crate::config::Config;
use crate::guard::InFlight;
use crate::live::{ClientCommand, ConnectionStatus, PushEvent};
use crate::logging::{log, log_push, obj, v_str, Domain, Level, ProfileScope};
use crate::model::{GraphSnapshot, Insight, Kpi, StrategicGoal};
use crate::render::cards::{render_goals, render_insights, render_kpi_cards, InsightLayout};
use crate::render::graph::GraphChart;
use crate::render::{html_escape, loading_overlay, PageSnapshot, Toasts};
use crate::sync::{Panel, RevisionClock, Ticket};
use crate::theme::ToastKind;

pub const START_LABEL: &str = "Start Real-Time Updates";
pub const STOP_LABEL: &str = "Stop Real-Time Updates";

/// How one panel's initial fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLoad {
    Loaded,
    /// Non-success HTTP status; the panel keeps its prior state.
    Skipped,
    /// A push event replaced the panel while the fetch was outstanding.
    Superseded,
    Failed,
}

impl PanelLoad {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelLoad::Loaded => "loaded",
            PanelLoad::Skipped => "skipped",
            PanelLoad::Superseded => "superseded",
            PanelLoad::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub kpis: PanelLoad,
    pub insights: PanelLoad,
    pub graph: PanelLoad,
    pub goals: PanelLoad,
}

impl LoadReport {
    pub fn any_failed(&self) -> bool {
        [self.kpis, self.insights, self.graph, self.goals].contains(&PanelLoad::Failed)
    }
}

/// Revisions captured before the initial fetches are issued.
#[derive(Debug, Clone, Copy)]
pub struct LoadTickets {
    kpis: Ticket,
    insights: Ticket,
    graph: Ticket,
    goals: Ticket,
}

/// Raw responses of the four initial fetches.
#[derive(Debug)]
pub struct LoadResults {
    pub kpis: Result<Vec<Kpi>, ApiError>,
    pub insights: Result<Vec<Insight>, ApiError>,
    pub graph: Result<GraphSnapshot, ApiError>,
    pub goals: Result<Vec<StrategicGoal>, ApiError>,
}

/// Issue the four requests concurrently; each resolves on its own.
pub async fn fetch_all(backend: &dyn KpiBackend) -> LoadResults {
    let _scope = ProfileScope::new("dashboard_fetch_all");
    let (kpis, insights, graph, goals) = tokio::join!(
        backend.kpis(),
        backend.insights(),
        backend.graph(),
        backend.strategic_goals()
    );
    LoadResults {
        kpis,
        insights,
        graph,
        goals,
    }
}

#[derive(Debug)]
pub struct DashboardView {
    pub kpis: Vec<Kpi>,
    pub insights: Vec<Insight>,
    pub goals: Vec<StrategicGoal>,
    pub connection: ConnectionStatus,
    pub realtime_active: bool,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            kpis: Vec::new(),
            insights: Vec::new(),
            goals: Vec::new(),
            connection: ConnectionStatus::Disconnected,
            realtime_active: false,
            loading: false,
            last_updated: None,
        }
    }
}

pub struct DashboardController {
    pub view: DashboardView,
    pub toasts: Toasts,
    pub graph: GraphChart,
    clock: RevisionClock,
    analysis: InFlight,
}

impl DashboardController {
    pub fn new(config: &Config) -> Self {
        Self {
            view: DashboardView::default(),
            toasts: Toasts::new(config.toast_ttl()),
            graph: GraphChart::new("network-graph"),
            clock: RevisionClock::new(),
            analysis: InFlight::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Push events
    // -------------------------------------------------------------------------

    pub fn apply_push(&mut self, event: PushEvent, now: DateTime<Utc>) {
        match event {
            PushEvent::Connect => {
                self.view.connection = ConnectionStatus::Connected;
                log_push("connect", None);
            }
            PushEvent::Disconnect => {
                self.view.connection = ConnectionStatus::Disconnected;
                log_push("disconnect", None);
            }
            PushEvent::KpiUpdate { kpis } => {
                log_push("kpi_update", Some(kpis.len()));
                self.clock.bump(Panel::Kpis);
                self.view.kpis = kpis;
                self.view.last_updated = Some(now);
            }
            PushEvent::InsightsUpdate { insights } => {
                log_push("insights_update", Some(insights.len()));
                self.clock.bump(Panel::Insights);
                self.view.insights = insights;
            }
            PushEvent::GraphUpdate { graph_data } => {
                let applied = graph_data
                    .as_ref()
                    .map(|g| self.graph.update(g))
                    .unwrap_or(false);
                if applied {
                    self.clock.bump(Panel::Graph);
                }
                log_push("graph_update", graph_data.and_then(|g| g.nodes).map(|n| n.len()));
            }
            PushEvent::Error { message } => {
                log_push("error", None);
                self.toasts
                    .push_at(ToastKind::Error, format!("Connection error: {}", message), now);
            }
            other @ (PushEvent::Connected { .. }
            | PushEvent::RealtimeStarted { .. }
            | PushEvent::RealtimeStopped { .. }) => {
                log(
                    Level::Debug,
                    Domain::Live,
                    "event_ignored",
                    obj(&[("event", v_str(other.name()))]),
                );
            }
        }
    }

    // -------------------------------------------------------------------------
    // Initial load
    // -------------------------------------------------------------------------

    /// Capture panel revisions and raise the loading indicator.
    pub fn begin_load(&mut self) -> LoadTickets {
        self.view.loading = true;
        LoadTickets {
            kpis: self.clock.issue(Panel::Kpis),
            insights: self.clock.issue(Panel::Insights),
            graph: self.clock.issue(Panel::Graph),
            goals: self.clock.issue(Panel::Goals),
        }
    }

    fn settle<T>(&self, ticket: Ticket, result: Result<T, ApiError>) -> (PanelLoad, Option<T>) {
        let outcome = match result {
            Ok(value) if self.clock.is_fresh(ticket) => (PanelLoad::Loaded, Some(value)),
            Ok(_) => (PanelLoad::Superseded, None),
            Err(err) if err.is_status() => (PanelLoad::Skipped, None),
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Dashboard,
                    "panel_load_failed",
                    obj(&[
                        ("panel", v_str(ticket.panel().as_str())),
                        ("error", v_str(&err.to_string())),
                    ]),
                );
                (PanelLoad::Failed, None)
            }
        };
        if outcome.0 == PanelLoad::Superseded {
            log(
                Level::Debug,
                Domain::Dashboard,
                "fetch_superseded",
                obj(&[("panel", v_str(ticket.panel().as_str()))]),
            );
        }
        outcome
    }

    /// Apply the fetched panels whose revisions are still current. At most
    /// one error toast is raised however many panels failed.
    pub fn finish_load(&mut self, tickets: LoadTickets, results: LoadResults, now: DateTime<Utc>) -> LoadReport {
        let (kpis, fetched) = self.settle(tickets.kpis, results.kpis);
        if let Some(v) = fetched {
            self.view.kpis = v;
        }
        let (insights, fetched) = self.settle(tickets.insights, results.insights);
        if let Some(v) = fetched {
            self.view.insights = v;
        }
        let (mut graph, fetched) = self.settle(tickets.graph, results.graph);
        if let Some(v) = fetched {
            if !self.graph.update(&v) {
                graph = PanelLoad::Skipped;
            }
        }
        let (goals, fetched) = self.settle(tickets.goals, results.goals);
        if let Some(v) = fetched {
            self.view.goals = v;
        }

        let report = LoadReport {
            kpis,
            insights,
            graph,
            goals,
        };
        if report.any_failed() {
            self.toasts
                .push_at(ToastKind::Error, "Failed to load dashboard data", now);
        }
        self.view.loading = false;
        self.view.last_updated = Some(now);
        log(
            Level::Info,
            Domain::Dashboard,
            "initial_load",
            obj(&[
                ("kpis", v_str(kpis.as_str())),
                ("insights", v_str(insights.as_str())),
                ("graph", v_str(graph.as_str())),
                ("goals", v_str(goals.as_str())),
            ]),
        );
        report
    }

    pub async fn initial_load(&mut self, backend: &dyn KpiBackend) -> LoadReport {
        let tickets = self.begin_load();
        let results = fetch_all(backend).await;
        self.finish_load(tickets, results, Utc::now())
    }

    // -------------------------------------------------------------------------
    // User actions
    // -------------------------------------------------------------------------

    /// Flip real-time mode; the returned command goes out on the push channel.
    pub fn toggle_realtime(&mut self) -> ClientCommand {
        self.view.realtime_active = !self.view.realtime_active;
        let command = if self.view.realtime_active {
            ClientCommand::StartRealtime
        } else {
            ClientCommand::StopRealtime
        };
        log(
            Level::Info,
            Domain::Dashboard,
            "realtime_toggled",
            obj(&[("active", serde_json::json!(self.view.realtime_active))]),
        );
        command
    }

    pub fn realtime_label(&self) -> &'static str {
        if self.view.realtime_active {
            STOP_LABEL
        } else {
            START_LABEL
        }
    }

    /// False (with an info toast) when an analysis is already outstanding.
    pub fn begin_analysis(&mut self) -> bool {
        if !self.analysis.try_begin() {
            self.toasts.push(ToastKind::Info, "Analysis already in progress");
            return false;
        }
        self.view.loading = true;
        true
    }

    pub fn finish_analysis(&mut self, response: Result<Vec<Insight>, ApiError>, now: DateTime<Utc>) {
        self.analysis.finish();
        self.view.loading = false;
        match response {
            Ok(insights) => {
                self.view.insights = insights;
                self.toasts
                    .push_at(ToastKind::Success, "Analysis completed successfully", now);
            }
            Err(err) if err.is_status() => {
                self.toasts.push_at(ToastKind::Error, "Failed to run analysis", now);
            }
            Err(err) => {
                self.toasts
                    .push_at(ToastKind::Error, format!("Analysis error: {}", err), now);
            }
        }
    }

    pub async fn run_analysis(&mut self, backend: &dyn KpiBackend) -> bool {
        if !self.begin_analysis() {
            return false;
        }
        let response = backend.reasoning("all").await.map(|r| r.insights);
        self.finish_analysis(response, Utc::now());
        true
    }

    pub fn is_analysis_busy(&self) -> bool {
        self.analysis.is_busy()
    }

    pub fn zoom_in(&mut self) {
        self.graph.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.graph.zoom_out();
    }

    pub fn center(&mut self) {
        self.graph.center();
    }

    /// Viewport changed; the chart's single observer re-fits the drawing.
    pub fn resize(&mut self) {
        self.graph.on_resize();
    }

    /// Drill-down stub: announces the KPI under the given card.
    pub fn show_kpi_details(&mut self, index: usize) -> bool {
        let Some(kpi) = self.view.kpis.get(index) else {
            return false;
        };
        let message = format!("Viewing details for {}", kpi.label);
        self.toasts.push(ToastKind::Info, message);
        true
    }

    /// Periodic refresh: expire toasts and, while real-time mode is off,
    /// restamp "last updated".
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.toasts.prune(now);
        if self.view.realtime_active {
            return false;
        }
        self.view.last_updated = Some(now);
        true
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    pub fn header(&self) -> String {
        let updated = self
            .view
            .last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        format!(
            r#"<div class="flex items-center space-x-4"><div id="connection-status" class="{indicator}"></div><button id="realtime-toggle">{label}</button><span id="last-updated">Last updated: {updated}</span></div>"#,
            indicator = self.view.connection.indicator_class(),
            label = self.realtime_label(),
            updated = html_escape(&updated),
        )
    }

    pub fn page(&self, now: DateTime<Utc>) -> PageSnapshot {
        let actions: Vec<serde_json::Value> = self.graph.pending().iter().map(|a| a.to_json()).collect();
        let actions = (!actions.is_empty()).then(|| serde_json::Value::Array(actions));
        PageSnapshot::new("Hospital KPI Dashboard")
            .section("header", self.header())
            .section("kpi-cards", render_kpi_cards(&self.view.kpis))
            .section(
                "insights-panel",
                render_insights(Some(self.view.insights.as_slice()), InsightLayout::Preview),
            )
            .section("strategic-goals", render_goals(&self.view.goals))
            .section("loading", loading_overlay(self.view.loading))
            .section("toasts", self.toasts.render(now))
            .chart("network-graph", self.graph.option().cloned())
            .chart("network-graph-actions", actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_toggle_labels() {
        let mut dash = DashboardController::new(&Config::default());
        assert_eq!(dash.realtime_label(), START_LABEL);
        assert_eq!(dash.toggle_realtime(), ClientCommand::StartRealtime);
        assert_eq!(dash.realtime_label(), STOP_LABEL);
        assert_eq!(dash.toggle_realtime(), ClientCommand::StopRealtime);
    }

    #[test]
    fn test_tick_only_restamps_when_realtime_off() {
        let mut dash = DashboardController::new(&Config::default());
        let now = Utc::now();
        assert!(dash.tick(now));
        assert_eq!(dash.view.last_updated, Some(now));
        dash.toggle_realtime();
        assert!(!dash.tick(now + chrono::Duration::seconds(30)));
        assert_eq!(dash.view.last_updated, Some(now));
    }

    #[test]
    fn test_push_error_raises_connection_toast() {
        let mut dash = DashboardController::new(&Config::default());
        dash.apply_push(PushEvent::Error { message: "socket closed".into() }, Utc::now());
        assert!(dash
            .toasts
            .contains(ToastKind::Error, "Connection error: socket closed"));
    }

    #[test]
    fn test_connection_indicator() {
        let mut dash = DashboardController::new(&Config::default());
        dash.apply_push(PushEvent::Connect, Utc::now());
        assert!(dash.header().contains("bg-green-400"));
        dash.apply_push(PushEvent::Disconnect, Utc::now());
        assert!(dash.header().contains("bg-red-400"));
    }

    #[test]
    fn test_details_for_missing_card() {
        let mut dash = DashboardController::new(&Config::default());
        assert!(!dash.show_kpi_details(3));
        assert!(dash.toasts.active().is_empty());
    }
}
