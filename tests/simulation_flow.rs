//! Simulation page against a stub backend.

mod common;

use chrono::Utc;

use common::{refused, StubBackend};
use kpiboard::api::{ApiError, Endpoint};
use kpiboard::config::Config;
use kpiboard::render::charts::ChartType;
use kpiboard::simulation::scenario::ScenarioError;
use kpiboard::simulation::{RunOutcome, SimulationController};
use kpiboard::theme::ToastKind;

async fn loaded(backend: &StubBackend) -> SimulationController {
    let mut sim = SimulationController::new(&Config::default());
    assert!(sim.load_kpis(backend).await);
    sim
}

#[tokio::test]
async fn untouched_sliders_never_reach_the_backend() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 5.05);

    assert_eq!(sim.run(&backend).await, RunOutcome::NoChanges);
    assert_eq!(backend.simulate_calls(), 0);
    assert!(sim
        .toasts
        .contains(ToastKind::Warning, "Please adjust at least one KPI value"));
    assert!(!sim.is_busy());
}

#[tokio::test]
async fn los_run_renders_before_and_after() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 4.2);

    assert_eq!(sim.run(&backend).await, RunOutcome::Completed);
    let posted = backend.posted.lock().unwrap().clone();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].len(), 1);
    assert_eq!(posted[0].get("kpi:los"), Some(&4.2));

    let now = Utc::now();
    let html = sim.page(now).to_html();
    assert!(html.contains(r#"Before</div><div class="text-lg font-bold text-gray-900">5.0</div>"#));
    assert!(html.contains(r#"After</div><div class="text-lg font-bold text-blue-600">4.2</div>"#));
    assert!(html.contains("-16.0%"));
    assert!(html.contains(">3.20<"));
    assert!(sim
        .toasts
        .contains(ToastKind::Success, "Simulation completed successfully"));
    assert!(sim.modal_visible(now));
    assert!(!sim.modal_visible(now + chrono::Duration::seconds(4)));
}

#[tokio::test]
async fn recommendations_follow_the_result() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 4.2);
    sim.run(&backend).await;

    let titles: Vec<_> = sim.view.recommendations.iter().map(|r| r.title).collect();
    assert!(titles.contains(&"Optimization Opportunity"));
    assert!(titles.contains(&"Cascade Effects Identified"));
    assert!(titles.contains(&"Negative Performance Impact"));
    assert!(!titles.contains(&"High-Impact Changes Detected"));
}

#[tokio::test]
async fn history_is_capped_at_ten() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:wait", 50.0);
    for _ in 0..11 {
        assert_eq!(sim.run(&backend).await, RunOutcome::Completed);
    }
    assert_eq!(sim.view.history.len(), 10);
    assert_eq!(sim.view.history.get(0).unwrap().name, "Scenario 11");
    assert_eq!(sim.view.history.get(9).unwrap().name, "Scenario 2");
}

#[tokio::test]
async fn loading_a_scenario_then_reset_restores_baseline() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 4.2);
    sim.run(&backend).await;
    sim.reset();
    assert!(sim.view.sliders.changes().is_empty());
    assert!(sim.view.result.is_none());

    assert_eq!(sim.load_scenario(0).unwrap(), 1);
    assert_eq!(sim.view.sliders.get("kpi:los").unwrap().value(), 4.2);
    assert!(sim
        .toasts
        .contains(ToastKind::Info, "Loaded scenario: Scenario 1"));

    sim.reset();
    for slider in sim.view.sliders.sliders() {
        assert_eq!(slider.value(), slider.baseline);
    }
}

#[tokio::test]
async fn second_run_is_rejected_while_in_flight() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 4.2);

    let changes = sim.prepare_run().unwrap();
    assert_eq!(sim.prepare_run().unwrap_err(), RunOutcome::Busy);
    assert!(sim.toasts.contains(ToastKind::Info, "Simulation already in progress"));

    let outcome = sim.complete_run(changes, Ok(common::los_result()), Utc::now());
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(!sim.is_busy());
}

#[tokio::test]
async fn failures_are_reported_and_release_the_guard() {
    let rejected = StubBackend {
        simulate: Err(ApiError::status(Endpoint::Simulate, 500)),
        ..Default::default()
    };
    let mut sim = loaded(&rejected).await;
    sim.set_value("kpi:los", 4.2);
    assert_eq!(sim.run(&rejected).await, RunOutcome::Rejected);
    assert!(sim.toasts.contains(ToastKind::Error, "Failed to run simulation"));
    assert!(sim.view.history.is_empty());

    let unreachable = StubBackend {
        simulate: Err(refused(Endpoint::Simulate)),
        ..Default::default()
    };
    assert_eq!(sim.run(&unreachable).await, RunOutcome::Failed);
    assert!(sim.toasts.contains(
        ToastKind::Error,
        "Simulation error: /api/simulate: connection refused"
    ));
    assert!(!sim.is_busy());
}

#[tokio::test]
async fn saving_needs_a_result_and_a_name() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    let now = Utc::now();
    assert_eq!(sim.save_scenario("Plan A", now), Err(ScenarioError::NoResult));
    assert!(sim
        .toasts
        .contains(ToastKind::Warning, "No simulation results to save"));

    sim.set_value("kpi:los", 4.2);
    sim.run(&backend).await;
    assert_eq!(sim.save_scenario("  ", now), Err(ScenarioError::EmptyName));
    assert_eq!(sim.save_scenario("Plan A", now), Ok(()));
    assert_eq!(sim.view.history.get(0).unwrap().name, "Plan A");
    assert_eq!(sim.view.history.len(), 2);

    assert_eq!(sim.delete_scenario(0, false), Ok(false));
    assert_eq!(sim.delete_scenario(0, true), Ok(true));
    assert_eq!(sim.view.history.len(), 1);
}

#[tokio::test]
async fn switching_chart_type_reuses_the_result() {
    let backend = StubBackend::default();
    let mut sim = loaded(&backend).await;
    sim.set_value("kpi:los", 4.2);
    sim.run(&backend).await;

    sim.set_chart_type(ChartType::Radar);
    let page = sim.page(Utc::now());
    assert_eq!(page.charts["comparison-chart"]["series"][0]["type"], "radar");
    assert_eq!(page.charts["network-impact"]["series"][0]["data"][0]["symbolSize"], 30.0);
    assert_eq!(backend.simulate_calls(), 1);
}
