//! Simulation page fragments: sliders, impact cards, summary, recommendations
//! and the scenario history.

use chrono::{DateTime, Utc};

use super::{fmt_value, html_escape, Animation};
use crate::logging::log_render;
use crate::model::{DirectImpact, PredictedOutcome, SimulationResult};
use crate::simulation::recommend::Recommendation;
use crate::simulation::scenario::ScenarioHistory;
use crate::simulation::sliders::{Slider, SliderBoard};
use crate::theme::{impact_class, impact_glyph, ChangeBand};

pub const IMPACT_ANIMATION: Animation = Animation::new("slide-right", 100, 500);
pub const RECOMMENDATION_ANIMATION: Animation = Animation::new("scale-in", 100, 500);

fn signed_percent(change: f64) -> String {
    if change > 0.0 {
        format!("+{:.1}%", change)
    } else {
        format!("{:.1}%", change)
    }
}

pub fn render_slider(slider: &Slider, index: usize) -> String {
    format!(
        r#"<div class="bg-white rounded-lg shadow-sm border border-gray-200 p-4">
  <div class="mb-4">
    <h3 class="text-sm font-semibold text-gray-900 mb-1">{label}</h3>
    <div class="flex items-center justify-between text-xs text-gray-500"><span>Current: {current}</span><span>Target: {target}</span></div>
  </div>
  <div class="slider-container mb-2">
    <input type="range" id="slider-{index}" class="slider" min="{min}" max="{max}" value="{value}" step="{step}" style="background: {track}">
  </div>
  <div class="flex items-center justify-between">
    <span class="text-xs text-gray-500">{unit}</span>
    <span id="value-{index}" class="text-sm font-medium text-blue-600">{display}</span>
  </div>
</div>"#,
        label = html_escape(&slider.label),
        current = fmt_value(slider.baseline),
        target = fmt_value(slider.target),
        index = index,
        min = fmt_value(slider.min),
        max = fmt_value(slider.max),
        value = fmt_value(slider.value()),
        step = fmt_value(slider.step),
        track = slider.band().slider_track(),
        unit = html_escape(&slider.unit),
        display = slider.display(),
    )
}

pub fn render_sliders(board: &SliderBoard) -> String {
    log_render("kpi-controls", board.len());
    board
        .sliders()
        .iter()
        .enumerate()
        .map(|(i, s)| render_slider(s, i))
        .collect()
}

pub fn render_direct_impact(impact: &DirectImpact) -> String {
    let change = impact.change_percent;
    let explanation = impact
        .explanation
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(|e| {
            format!(
                r#"<div class="mt-3 p-3 bg-blue-50 rounded-lg"><p class="text-xs text-blue-800">{}</p></div>"#,
                html_escape(e)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="impact-card simulation-card rounded-lg p-4 mb-4 {class}">
  <div class="flex items-center justify-between mb-3">
    <h3 class="text-sm font-semibold text-gray-900">{label}</h3>
    <span class="text-lg">{glyph}</span>
  </div>
  <div class="before-after mb-3">
    <div class="text-center"><div class="text-xs text-gray-500 mb-1">Before</div><div class="text-lg font-bold text-gray-900">{before:.1}</div></div>
    <div class="text-center"><div class="text-xs text-gray-500 mb-1">After</div><div class="text-lg font-bold text-blue-600">{after:.1}</div></div>
  </div>
  <div class="flex items-center justify-between">
    <span class="change-indicator {band}">{percent}</span>
    <span class="text-xs text-gray-500">{unit}</span>
  </div>
  {explanation}
</div>"#,
        class = impact_class(change),
        label = html_escape(&impact.kpi.label),
        glyph = impact_glyph(change),
        before = impact.kpi.current_value,
        after = impact.new_value,
        band = ChangeBand::of(change).change_class(),
        percent = signed_percent(change),
        unit = html_escape(&impact.kpi.unit),
        explanation = explanation,
    )
}

pub fn render_propagated_impact(outcome: &PredictedOutcome) -> String {
    let class = if outcome.change_amount > 0.0 {
        "impact-positive"
    } else {
        "impact-negative"
    };
    format!(
        r#"<div class="impact-card simulation-card rounded-lg p-4 mb-4 impact-propagated {class}">
  <div class="flex items-center justify-between mb-3">
    <h3 class="text-sm font-semibold text-gray-900">{label}</h3>
    <span class="text-xs px-2 py-1 bg-purple-100 text-purple-800 rounded">{relationship}</span>
  </div>
  <div class="before-after mb-3">
    <div class="text-center"><div class="text-xs text-gray-500 mb-1">Original</div><div class="text-lg font-bold text-gray-900">{original:.1}</div></div>
    <div class="text-center"><div class="text-xs text-gray-500 mb-1">Projected</div><div class="text-lg font-bold text-purple-600">{projected:.1}</div></div>
  </div>
  <div class="text-xs text-gray-500">Influenced by: {influencer}</div>
</div>"#,
        class = class,
        label = html_escape(&outcome.kpi_label),
        relationship = html_escape(&outcome.relationship_type),
        original = outcome.original_value,
        projected = outcome.projected_value,
        influencer = html_escape(outcome.influencer()),
    )
}

pub fn render_impact_results(result: &SimulationResult) -> String {
    let mut html = String::new();
    let mut cards = 0;
    for (_, impact) in result.direct_impacts() {
        html.push_str(&render_direct_impact(impact));
        cards += 1;
    }
    if !result.predicted_outcomes.is_empty() {
        html.push_str(r#"<h3 class="text-lg font-semibold text-gray-900 mt-6 mb-4">Propagated Impacts</h3>"#);
        for outcome in &result.predicted_outcomes {
            html.push_str(&render_propagated_impact(outcome));
            cards += 1;
        }
    }
    log_render("impact-results", cards);
    format!(r#"<div id="impact-results" {}>{}</div>"#, IMPACT_ANIMATION.attrs(), html)
}

pub fn render_impact_summary(result: &SimulationResult, completed_at: DateTime<Utc>) -> String {
    let direct = result.direct_impacts().count();
    let propagated = result.predicted_outcomes.len();
    format!(
        r#"<div class="text-center mb-4"><div class="text-3xl font-bold text-blue-600">{total}</div><div class="text-sm text-gray-600">Total KPIs Affected</div></div>
<div class="space-y-3">
  <div class="flex justify-between items-center"><span class="text-sm text-gray-600">Direct Changes</span><span class="text-sm font-medium">{direct}</span></div>
  <div class="flex justify-between items-center"><span class="text-sm text-gray-600">Propagated Effects</span><span class="text-sm font-medium">{propagated}</span></div>
  <div class="flex justify-between items-center"><span class="text-sm text-gray-600">Overall Impact</span><span class="text-sm font-medium text-blue-600">{score:.2}</span></div>
</div>
<div class="mt-4 pt-4 border-t border-gray-200"><div class="text-xs text-gray-500 text-center">Simulation completed at<br/>{at}</div></div>"#,
        total = direct + propagated,
        direct = direct,
        propagated = propagated,
        score = result.overall_impact_score,
        at = completed_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn render_recommendation_cards(recommendations: &[Recommendation]) -> String {
    log_render("simulation-recommendations", recommendations.len());
    let cards: String = recommendations
        .iter()
        .map(|rec| {
            format!(
                r#"<div class="bg-white rounded-lg shadow-sm border border-gray-200 p-4">
  <div class="flex items-start space-x-3">
    <div class="flex-shrink-0 text-2xl">{icon}</div>
    <div class="flex-1 min-w-0">
      <h3 class="text-sm font-semibold text-gray-900 mb-2">{title}</h3>
      <p class="text-xs text-gray-600 mb-2">{description}</p>
      <div class="text-xs text-blue-600 font-medium">Priority: {priority}</div>
    </div>
  </div>
</div>"#,
                icon = rec.icon,
                title = rec.title,
                description = html_escape(&rec.description),
                priority = rec.priority.as_str(),
            )
        })
        .collect();
    format!(
        r#"<div id="simulation-recommendations" {}>{}</div>"#,
        RECOMMENDATION_ANIMATION.attrs(),
        cards
    )
}

pub fn render_scenario_history(history: &ScenarioHistory) -> String {
    log_render("scenario-history", history.len());
    if history.is_empty() {
        return r#"<div class="text-center py-4 text-gray-500"><div class="text-2xl mb-2">📊</div><p class="text-xs">No saved scenarios</p></div>"#.to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, scenario)| {
            format!(
                r#"<div class="bg-gray-50 rounded-lg p-3 cursor-pointer hover:bg-gray-100 transition-colors" data-scenario="{index}">
  <div class="flex items-center justify-between mb-2">
    <h4 class="text-sm font-medium text-gray-900 truncate">{name}</h4>
    <button class="text-xs text-red-600 hover:text-red-800" data-delete="{index}">Delete</button>
  </div>
  <div class="text-xs text-gray-600 mb-1">{summary}</div>
  <div class="text-xs text-gray-500">{timestamp}</div>
</div>"#,
                index = i,
                name = html_escape(&scenario.name),
                summary = scenario.change_summary(),
                timestamp = scenario.timestamp.format("%Y-%m-%d %H:%M:%S"),
            )
        })
        .collect()
}

pub fn success_modal(visible: bool) -> String {
    let hidden = if visible { "" } else { " hidden" };
    format!(
        r#"<div id="success-modal" class="fixed inset-0 bg-black bg-opacity-50 flex items-center justify-center z-50{}"><div class="bg-white rounded-lg p-6 text-center"><div class="text-4xl mb-4">✅</div><h3 class="text-lg font-semibold text-gray-900">Simulation Complete</h3></div></div>"#,
        hidden
    )
}
