//! What-if simulation page: sliders, runs, results and scenario history.

pub mod recommend;
pub mod scenario;
pub mod sliders;

use chrono::{DateTime, Utc};

use crate::api::{ApiError, KpiBackend};
use crate::config::Config;
use crate::guard::InFlight;
use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::model::{ChangeSet, Kpi, SimulationResult};
use crate::render::charts::{comparison_option, impact_network_option, render_chart_buttons, ChartType};
use crate::render::impact::{
    render_impact_results, render_impact_summary, render_recommendation_cards,
    render_scenario_history, render_sliders, success_modal,
};
use crate::render::{loading_overlay, Modal, PageSnapshot, Toasts};
use crate::theme::ToastKind;

use recommend::Recommendation;
use scenario::{ScenarioError, ScenarioHistory};
use sliders::SliderBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    NoChanges,
    Busy,
    Rejected,
    Failed,
}

/// Everything the simulation page renders from.
#[derive(Debug, Default)]
pub struct SimulationView {
    pub kpis: Vec<Kpi>,
    pub sliders: SliderBoard,
    pub result: Option<SimulationResult>,
    pub last_changes: ChangeSet,
    pub recommendations: Vec<Recommendation>,
    pub history: ScenarioHistory,
    pub chart_type: ChartType,
    pub loading: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct SimulationController {
    pub view: SimulationView,
    pub toasts: Toasts,
    modal: Modal,
    modal_ttl: chrono::Duration,
    guard: InFlight,
}

impl SimulationController {
    pub fn new(config: &Config) -> Self {
        Self {
            view: SimulationView::default(),
            toasts: Toasts::new(config.toast_ttl()),
            modal: Modal::default(),
            modal_ttl: config.modal_ttl(),
            guard: InFlight::new(),
        }
    }

    /// Fetch KPIs and rebuild the sliders at their baselines.
    pub async fn load_kpis(&mut self, backend: &dyn KpiBackend) -> bool {
        self.view.loading = true;
        let fetched = backend.kpis().await;
        self.view.loading = false;
        match fetched {
            Ok(kpis) => {
                self.set_kpis(kpis);
                true
            }
            Err(err) if err.is_status() => false,
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Simulation,
                    "kpi_load_failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                );
                self.toasts.push(ToastKind::Error, "Failed to load KPI data");
                false
            }
        }
    }

    pub fn set_kpis(&mut self, kpis: Vec<Kpi>) {
        self.view.sliders = SliderBoard::from_kpis(&kpis);
        self.view.kpis = kpis;
    }

    pub fn set_value(&mut self, uri: &str, value: f64) -> Option<f64> {
        self.view.sliders.set(uri, value)
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Validate and enter the in-flight state. The returned change-set is
    /// what must be posted; `Err` carries the reason nothing was sent.
    pub fn prepare_run(&mut self) -> Result<ChangeSet, RunOutcome> {
        if !self.guard.try_begin() {
            self.toasts.push(ToastKind::Info, "Simulation already in progress");
            return Err(RunOutcome::Busy);
        }
        let changes = self.view.sliders.changes();
        if changes.is_empty() {
            self.guard.finish();
            self.toasts
                .push(ToastKind::Warning, "Please adjust at least one KPI value");
            return Err(RunOutcome::NoChanges);
        }
        self.view.loading = true;
        log(
            Level::Info,
            Domain::Simulation,
            "run_started",
            obj(&[("changes", v_num(changes.len() as f64))]),
        );
        Ok(changes)
    }

    pub fn complete_run(
        &mut self,
        changes: ChangeSet,
        response: Result<SimulationResult, ApiError>,
        now: DateTime<Utc>,
    ) -> RunOutcome {
        self.guard.finish();
        self.view.loading = false;
        match response {
            Ok(result) => {
                let score = result.overall_impact_score;
                self.view.recommendations = recommend::generate(&result);
                self.view.history.record_auto(changes.clone(), result.clone(), now);
                self.view.last_changes = changes;
                self.view.result = Some(result);
                self.view.completed_at = Some(now);
                self.modal.show(now, self.modal_ttl);
                self.toasts.push_at(
                    ToastKind::Success,
                    "Simulation completed successfully",
                    now,
                );
                log(
                    Level::Info,
                    Domain::Simulation,
                    "run_completed",
                    obj(&[("score", v_num(score))]),
                );
                RunOutcome::Completed
            }
            Err(err) if err.is_status() => {
                self.toasts.push_at(ToastKind::Error, "Failed to run simulation", now);
                RunOutcome::Rejected
            }
            Err(err) => {
                self.toasts
                    .push_at(ToastKind::Error, format!("Simulation error: {}", err), now);
                RunOutcome::Failed
            }
        }
    }

    pub async fn run(&mut self, backend: &dyn KpiBackend) -> RunOutcome {
        let changes = match self.prepare_run() {
            Ok(c) => c,
            Err(outcome) => return outcome,
        };
        let _scope = ProfileScope::with_context(
            "simulation_run",
            &[("changes", v_num(changes.len() as f64))],
        );
        let response = backend.simulate(&changes).await;
        self.complete_run(changes, response, Utc::now())
    }

    /// Sliders back to baseline and results cleared.
    pub fn reset(&mut self) {
        self.view.sliders.reset();
        self.clear_results();
        self.toasts
            .push(ToastKind::Info, "Simulation reset to original values");
    }

    fn clear_results(&mut self) {
        self.view.result = None;
        self.view.recommendations.clear();
        self.view.completed_at = None;
        self.modal.hide();
    }

    pub fn save_scenario(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), ScenarioError> {
        let saved = self
            .view
            .history
            .save(name, &self.view.last_changes, self.view.result.as_ref(), now)
            .map(|s| s.name.clone());
        match saved {
            Ok(name) => {
                self.toasts.push_at(
                    ToastKind::Success,
                    format!("Scenario \"{}\" saved successfully", name),
                    now,
                );
                Ok(())
            }
            Err(err) => {
                self.toasts.push_at(ToastKind::Warning, err.to_string(), now);
                Err(err)
            }
        }
    }

    /// Reset to baseline, then apply only the scenario's recorded changes.
    pub fn load_scenario(&mut self, index: usize) -> Result<usize, ScenarioError> {
        let scenario = self.view.history.get(index)?.clone();
        self.view.sliders.reset();
        self.clear_results();
        let applied = self.view.sliders.apply(&scenario.changes);
        self.toasts
            .push(ToastKind::Info, format!("Loaded scenario: {}", scenario.name));
        log(
            Level::Info,
            Domain::Simulation,
            "scenario_loaded",
            obj(&[
                ("name", v_str(&scenario.name)),
                ("applied", v_num(applied as f64)),
            ]),
        );
        Ok(applied)
    }

    pub fn delete_scenario(&mut self, index: usize, confirmed: bool) -> Result<bool, ScenarioError> {
        let removed = self.view.history.delete(index, confirmed)?;
        if removed.is_some() {
            self.toasts.push(ToastKind::Info, "Scenario deleted");
        }
        Ok(removed.is_some())
    }

    /// Switch the comparison chart form; the stored result is reused.
    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.view.chart_type = chart_type;
    }

    pub fn modal_visible(&self, now: DateTime<Utc>) -> bool {
        self.modal.is_visible(now)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.toasts.prune(now);
    }

    pub fn page(&self, now: DateTime<Utc>) -> PageSnapshot {
        let view = &self.view;
        let mut page = PageSnapshot::new("Scenario Simulation")
            .section("kpi-controls", render_sliders(&view.sliders))
            .section("chart-type", render_chart_buttons(view.chart_type))
            .section("scenario-history", render_scenario_history(&view.history));
        if let Some(result) = &view.result {
            page = page
                .section("impact-results", render_impact_results(result))
                .section(
                    "impact-summary",
                    render_impact_summary(result, view.completed_at.unwrap_or(now)),
                )
                .section(
                    "simulation-recommendations",
                    render_recommendation_cards(&view.recommendations),
                )
                .chart("comparison-chart", Some(comparison_option(result, view.chart_type)))
                .chart("network-impact", Some(impact_network_option(result)));
        }
        page.section("success-modal", success_modal(self.modal_visible(now)))
            .section("loading", loading_overlay(view.loading))
            .section("toasts", self.toasts.render(now))
    }
}
