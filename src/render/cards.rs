//! Card factories for KPIs, insights, goals and causal chains.

use super::{fmt_value, html_escape, Animation};
use crate::logging::log_render;
use crate::model::{CausalChain, Insight, Kpi, StrategicGoal};
use crate::theme::goal_progress_class;

pub const KPI_ANIMATION: Animation = Animation::new("slide-up", 100, 500);
pub const INSIGHT_ANIMATION: Animation = Animation::new("slide-left", 150, 600);
pub const GOAL_ANIMATION: Animation = Animation::new("scale-in", 100, 500);

pub const INSIGHT_PREVIEW_LIMIT: usize = 6;
pub const RECOMMENDATION_LIMIT: usize = 5;
pub const CAUSAL_CHAIN_LIMIT: usize = 3;

// =============================================================================
// KPI cards
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard<'a> {
    pub kpi: &'a Kpi,
    pub ratio: f64,
    pub bar_width: f64,
}

impl<'a> KpiCard<'a> {
    pub fn new(kpi: &'a Kpi) -> Self {
        let ratio = kpi.performance_ratio();
        Self {
            kpi,
            ratio,
            bar_width: ratio.clamp(0.0, 100.0),
        }
    }

    pub fn render(&self, index: usize) -> String {
        let kpi = self.kpi;
        let status = kpi.observation.status;
        format!(
            r#"<div class="kpi-card bg-white rounded-lg shadow-sm border border-gray-200 p-6 status-{status} fade-in" data-index="{index}">
  <div class="flex items-center justify-between mb-4">
    <h3 class="text-lg font-semibold text-gray-900 truncate">{label}</h3>
    <div class="flex items-center space-x-1"><span class="text-xs text-gray-500">{unit}</span>{trend}</div>
  </div>
  <div class="mb-4">
    <div class="flex items-baseline space-x-2 mb-2">
      <span class="text-3xl font-bold {color}">{value}</span>
      <span class="text-sm text-gray-500">/ {target}</span>
    </div>
    <div class="text-sm text-gray-600">Performance: <span class="font-medium">{ratio:.1}%</span></div>
  </div>
  <div class="mb-4">
    <div class="w-full bg-gray-200 rounded-full h-2">
      <div class="h-2 rounded-full transition-all duration-500" style="width: {width}%; background-color: {background}"></div>
    </div>
  </div>
  <div class="flex items-center justify-between text-xs text-gray-500">
    <span>Status: <span class="font-medium {color}">{status_label}</span></span>
    <span>{time}</span>
  </div>
</div>"#,
            status = status.as_str(),
            index = index,
            label = html_escape(&kpi.label),
            unit = html_escape(&kpi.unit),
            trend = kpi.trend().glyph(),
            color = status.text_class(),
            value = fmt_value(kpi.observation.value),
            target = fmt_value(kpi.target),
            ratio = self.ratio,
            width = fmt_value(self.bar_width),
            background = status.background(),
            status_label = status.as_str().to_uppercase(),
            time = html_escape(&kpi.observation.time_label()),
        )
    }
}

/// Replaces the whole KPI card container.
pub fn render_kpi_cards(kpis: &[Kpi]) -> String {
    log_render("kpi-cards", kpis.len());
    let cards: String = kpis
        .iter()
        .enumerate()
        .map(|(i, kpi)| KpiCard::new(kpi).render(i))
        .collect();
    format!(r#"<div id="kpi-cards" {}>{}</div>"#, KPI_ANIMATION.attrs(), cards)
}

// =============================================================================
// Insight cards
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightLayout {
    /// Dashboard panel, first six only
    Preview,
    /// Insights page, every entry
    Full,
}

impl InsightLayout {
    pub fn visible<'a>(&self, insights: &'a [Insight]) -> &'a [Insight] {
        match self {
            InsightLayout::Preview => &insights[..insights.len().min(INSIGHT_PREVIEW_LIMIT)],
            InsightLayout::Full => insights,
        }
    }
}

pub fn render_insight_card(insight: &Insight) -> String {
    let severity = insight.severity();
    let recommendation = insight
        .recommendation()
        .map(|r| {
            format!(
                r#"<div class="bg-blue-50 border border-blue-200 rounded-lg p-3"><p class="text-xs text-blue-800 font-medium mb-1">Recommendation:</p><p class="text-xs text-blue-700">{}</p></div>"#,
                html_escape(r)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="insight-card bg-white rounded-lg shadow-sm border border-gray-200 p-4 severity-{severity} fade-in">
  <div class="flex items-start space-x-3">
    <div class="flex-shrink-0 text-2xl">{icon}</div>
    <div class="flex-1 min-w-0">
      <div class="flex items-center justify-between mb-2">
        <h3 class="text-sm font-semibold text-gray-900 truncate">{title}</h3>
        <span class="text-xs px-2 py-1 rounded-full {badge}">{severity}</span>
      </div>
      <p class="text-sm text-gray-600 mb-3">{message}</p>
      {recommendation}
    </div>
  </div>
</div>"#,
        severity = severity.as_str(),
        icon = insight.kind.icon(),
        title = html_escape(&insight.title),
        badge = severity.badge_class(),
        message = html_escape(&insight.message),
        recommendation = recommendation,
    )
}

pub fn render_insights(insights: Option<&[Insight]>, layout: InsightLayout) -> String {
    let insights = insights.unwrap_or_default();
    if insights.is_empty() {
        log_render("insights", 0);
        return r#"<div class="text-center py-8 text-gray-500"><div class="text-4xl mb-4">🔍</div><p>No insights available at the moment</p></div>"#.to_string();
    }
    let visible = layout.visible(insights);
    log_render("insights", visible.len());
    let cards: String = visible.iter().map(render_insight_card).collect();
    format!(r#"<div class="insights" {}>{}</div>"#, INSIGHT_ANIMATION.attrs(), cards)
}

/// Insights carrying a recommendation, capped for the side list.
pub fn recommended(insights: &[Insight]) -> Vec<&Insight> {
    insights
        .iter()
        .filter(|i| i.recommendation().is_some())
        .take(RECOMMENDATION_LIMIT)
        .collect()
}

pub fn render_recommendations(insights: &[Insight]) -> String {
    let picked = recommended(insights);
    log_render("recommendations", picked.len());
    picked
        .iter()
        .map(|insight| {
            let severity = insight.severity();
            format!(
                r#"<div class="recommendation-card rounded-lg p-4 border-l-4" style="border-left-color: {accent}">
  <div class="flex items-start space-x-3">
    <div class="flex-shrink-0 text-lg">{icon}</div>
    <div class="flex-1 min-w-0">
      <h3 class="text-sm font-semibold text-gray-900 mb-1">{title}</h3>
      <p class="text-xs text-gray-600 mb-2">{text}</p>
      <div class="text-xs text-gray-500">Priority: <span class="font-medium">{priority}</span></div>
    </div>
  </div>
</div>"#,
                accent = severity.accent(),
                icon = insight.kind.icon(),
                title = html_escape(&insight.title),
                text = html_escape(insight.recommendation().unwrap_or_default()),
                priority = severity.as_str(),
            )
        })
        .collect()
}

// =============================================================================
// Causal chains
// =============================================================================

pub fn render_causal_chains(chains: &[CausalChain]) -> String {
    let top = &chains[..chains.len().min(CAUSAL_CHAIN_LIMIT)];
    log_render("causal-analysis", top.len());
    top.iter()
        .enumerate()
        .map(|(i, chain)| {
            let labels = chain
                .labels()
                .iter()
                .map(|l| format!("<span>{}</span>", html_escape(l)))
                .collect::<Vec<_>>()
                .join("<span>→</span>");
            format!(
                r#"<div class="bg-gray-50 rounded-lg p-4 mb-4">
  <div class="flex items-center justify-between mb-3">
    <h3 class="text-sm font-semibold text-gray-900">Causal Chain {n}</h3>
    <span class="text-xs px-2 py-1 bg-blue-100 text-blue-800 rounded">Impact: {impact:.1}%</span>
  </div>
  <div class="flex items-center space-x-2 text-sm text-gray-600">{labels}</div>
</div>"#,
                n = i + 1,
                impact = chain.impact * 100.0,
                labels = labels,
            )
        })
        .collect()
}

// =============================================================================
// Strategic goals
// =============================================================================

pub fn render_goal_card(goal: &StrategicGoal) -> String {
    let progress = goal.progress.clamp(0.0, 100.0);
    format!(
        r#"<div class="goal-card bg-white rounded-lg shadow-sm border border-gray-200 p-4 fade-in">
  <div class="text-center">
    <div class="text-2xl mb-2">{icon}</div>
    <h3 class="text-sm font-semibold text-gray-900 mb-2">{name}</h3>
    <div class="mb-3"><div class="text-2xl font-bold text-gray-900">{progress}%</div><div class="text-xs text-gray-500">Progress</div></div>
    <div class="w-full bg-gray-200 rounded-full h-2 mb-3"><div class="h-2 rounded-full {bar} transition-all duration-500" style="width: {width}%"></div></div>
    <div class="text-xs text-gray-500">Risk: <span class="font-medium">{risk}</span></div>
  </div>
</div>"#,
        icon = goal.status.icon(),
        name = html_escape(&goal.name),
        progress = fmt_value(goal.progress),
        bar = goal_progress_class(goal.progress),
        width = fmt_value(progress),
        risk = html_escape(goal.risk_level()),
    )
}

pub fn render_goals(goals: &[StrategicGoal]) -> String {
    log_render("strategic-goals", goals.len());
    let cards: String = goals.iter().map(render_goal_card).collect();
    format!(r#"<div id="strategic-goals" {}>{}</div>"#, GOAL_ANIMATION.attrs(), cards)
}
