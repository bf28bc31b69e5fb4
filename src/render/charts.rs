//! Option documents for the simulation and insights charts.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use super::graph::{force_series, ForceLayout};
use crate::model::{HistoricalData, SimulationResult};
use crate::theme::{ACCENT_COLOR, NEUTRAL_COLOR};

pub const CHANGED_NODE_SIZE: f64 = 30.0;
pub const CHANGED_NODE_COLOR: &str = "#dc2626";
pub const PROPAGATED_NODE_SIZE: f64 = 20.0;
pub const PROPAGATED_COLOR: &str = "#f59e0b";

const SERIES_ORIGINAL: &str = "Original";
const SERIES_AFTER: &str = "After Changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Radar,
}

impl ChartType {
    pub const ALL: [ChartType; 3] = [ChartType::Bar, ChartType::Line, ChartType::Radar];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Radar => "radar",
        }
    }

    pub fn button_class(&self, active: ChartType) -> &'static str {
        if *self == active {
            "px-3 py-1 bg-blue-600 text-white rounded text-sm"
        } else {
            "px-3 py-1 bg-gray-100 text-gray-700 rounded text-sm hover:bg-gray-200"
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "radar" => Ok(ChartType::Radar),
            other => Err(format!("unknown chart type: {}", other)),
        }
    }
}

pub fn render_chart_buttons(active: ChartType) -> String {
    ChartType::ALL
        .iter()
        .map(|t| {
            format!(
                r#"<button id="chart-type-{name}" class="{class}">{name}</button>"#,
                name = t.as_str(),
                class = t.button_class(active)
            )
        })
        .collect()
}

/// One category of the before/after comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub label: String,
    pub original: f64,
    pub after: f64,
}

/// Direct impacts first (in key order), then propagated outcomes.
pub fn comparison_rows(result: &SimulationResult) -> Vec<ComparisonRow> {
    let direct = result.direct_impacts().map(|(_, impact)| ComparisonRow {
        label: impact.kpi.label.clone(),
        original: impact.kpi.current_value,
        after: impact.new_value,
    });
    let propagated = result.predicted_outcomes.iter().map(|o| ComparisonRow {
        label: o.kpi_label.clone(),
        original: o.original_value,
        after: o.projected_value,
    });
    direct.chain(propagated).collect()
}

pub fn comparison_option(result: &SimulationResult, chart_type: ChartType) -> Value {
    let rows = comparison_rows(result);
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let original: Vec<f64> = rows.iter().map(|r| r.original).collect();
    let after: Vec<f64> = rows.iter().map(|r| r.after).collect();

    match chart_type {
        ChartType::Bar | ChartType::Line => {
            let kind = chart_type.as_str();
            json!({
                "backgroundColor": "transparent",
                "tooltip": { "trigger": "axis", "axisPointer": { "type": "shadow" } },
                "legend": { "data": [SERIES_ORIGINAL, SERIES_AFTER] },
                "xAxis": {
                    "type": "category",
                    "data": labels,
                    "axisLabel": { "rotate": 45, "fontSize": 10 }
                },
                "yAxis": { "type": "value" },
                "series": [
                    { "name": SERIES_ORIGINAL, "type": kind, "data": original, "itemStyle": { "color": NEUTRAL_COLOR } },
                    { "name": SERIES_AFTER, "type": kind, "data": after, "itemStyle": { "color": ACCENT_COLOR } }
                ]
            })
        }
        ChartType::Radar => {
            let indicators: Vec<Value> = rows
                .iter()
                .map(|r| {
                    let peak = r.original.max(r.after);
                    let max = if peak > 0.0 { peak * 1.2 } else { 1.0 };
                    json!({ "name": r.label, "max": max })
                })
                .collect();
            json!({
                "backgroundColor": "transparent",
                "tooltip": { "trigger": "item" },
                "legend": { "data": [SERIES_ORIGINAL, SERIES_AFTER] },
                "radar": { "indicator": indicators },
                "series": [{
                    "type": "radar",
                    "data": [
                        { "name": SERIES_ORIGINAL, "value": original, "itemStyle": { "color": NEUTRAL_COLOR } },
                        { "name": SERIES_AFTER, "value": after, "itemStyle": { "color": ACCENT_COLOR } }
                    ]
                }]
            })
        }
    }
}

/// Changed KPIs as large red nodes, propagated KPIs as amber satellites
/// linked from their influencer. A label already present keeps its first node.
pub fn impact_network_option(result: &SimulationResult) -> Value {
    let mut labels: BTreeMap<&str, &str> = BTreeMap::new();
    let mut seen = BTreeSet::new();
    let mut data = Vec::new();
    for (uri, impact) in result.direct_impacts() {
        labels.insert(uri, impact.kpi.label.as_str());
        if seen.insert(impact.kpi.label.clone()) {
            data.push(json!({
                "id": impact.kpi.label,
                "name": impact.kpi.label,
                "symbolSize": CHANGED_NODE_SIZE,
                "itemStyle": { "color": CHANGED_NODE_COLOR }
            }));
        }
    }
    for outcome in &result.predicted_outcomes {
        if !outcome.kpi_uri.is_empty() {
            labels
                .entry(outcome.kpi_uri.as_str())
                .or_insert(outcome.kpi_label.as_str());
        }
    }
    let mut links = Vec::new();
    for outcome in &result.predicted_outcomes {
        let source = labels
            .get(outcome.influenced_by.as_str())
            .copied()
            .unwrap_or_else(|| outcome.influencer());
        if seen.insert(outcome.kpi_label.clone()) {
            data.push(json!({
                "id": outcome.kpi_label,
                "name": outcome.kpi_label,
                "symbolSize": PROPAGATED_NODE_SIZE,
                "itemStyle": { "color": PROPAGATED_COLOR }
            }));
        }
        links.push(json!({
            "source": source,
            "target": outcome.kpi_label,
            "lineStyle": { "color": PROPAGATED_COLOR, "width": 2 }
        }));
    }
    json!({
        "backgroundColor": "transparent",
        "tooltip": { "trigger": "item" },
        "series": [force_series(data, links, ForceLayout::IMPACT)]
    })
}

/// Mean of every department value per day; days without values are skipped.
pub fn daily_averages(history: &HistoricalData) -> Vec<(String, f64)> {
    history
        .daily_data
        .iter()
        .filter_map(|day| {
            let values: Vec<f64> = day
                .departments
                .values()
                .flat_map(|kpis| kpis.iter().map(|k| k.value))
                .collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some((day.date.clone(), mean))
        })
        .collect()
}

pub fn trend_option(history: &HistoricalData) -> Option<Value> {
    let points = daily_averages(history);
    if points.is_empty() {
        return None;
    }
    let (dates, values): (Vec<String>, Vec<f64>) = points.into_iter().unzip();
    Some(json!({
        "backgroundColor": "transparent",
        "tooltip": { "trigger": "axis" },
        "xAxis": { "type": "category", "data": dates },
        "yAxis": { "type": "value", "scale": true },
        "series": [{
            "data": values,
            "type": "line",
            "smooth": true,
            "lineStyle": { "color": ACCENT_COLOR },
            "areaStyle": {
                "color": {
                    "type": "linear",
                    "x": 0, "y": 0, "x2": 0, "y2": 1,
                    "colorStops": [
                        { "offset": 0, "color": "rgba(37, 99, 235, 0.3)" },
                        { "offset": 1, "color": "rgba(37, 99, 235, 0.1)" }
                    ]
                }
            }
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result() -> SimulationResult {
        serde_json::from_value(json!({
            "impacts": {
                "kpi:los": {
                    "kpi": {"label": "LOS", "target": 4.0, "unit": "days", "current_value": 5.0},
                    "new_value": 4.2, "change_percent": -16.0
                },
                "kpi:gone": {"error": "KPI not found"}
            },
            "predicted_outcomes": [{
                "kpi_uri": "kpi:sat", "kpi_label": "Satisfaction",
                "original_value": 80.0, "projected_value": 84.0, "change_amount": 4.0,
                "influenced_by": "http://hospital-kpi.org/ontology#LOS",
                "relationship_type": "influences", "depth": 1
            }],
            "overall_impact_score": 3.5
        }))
        .unwrap()
    }

    #[test]
    fn test_comparison_rows_direct_then_propagated() {
        let rows = comparison_rows(&result());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "LOS");
        assert_eq!(rows[1].after, 84.0);
    }

    #[test]
    fn test_chart_type_switch() {
        let r = result();
        let bar = comparison_option(&r, ChartType::Bar);
        assert_eq!(bar["series"][1]["type"], "bar");
        assert_eq!(bar["series"][0]["itemStyle"]["color"], "#64748b");
        assert_eq!(bar["xAxis"]["axisLabel"]["rotate"], 45);
        let line = comparison_option(&r, ChartType::Line);
        assert_eq!(line["series"][0]["type"], "line");
        let radar = comparison_option(&r, ChartType::Radar);
        assert_eq!(radar["series"][0]["type"], "radar");
        assert_eq!(radar["radar"]["indicator"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_chart_type() {
        assert_eq!("Radar".parse::<ChartType>().unwrap(), ChartType::Radar);
        assert!("pie".parse::<ChartType>().is_err());
        assert!(render_chart_buttons(ChartType::Line)
            .contains(r#"id="chart-type-line" class="px-3 py-1 bg-blue-600"#));
    }

    #[test]
    fn test_impact_network_nodes_and_links() {
        let option = impact_network_option(&result());
        let series = &option["series"][0];
        assert_eq!(series["data"][0]["symbolSize"], 30.0);
        assert_eq!(series["data"][0]["itemStyle"]["color"], "#dc2626");
        assert_eq!(series["data"][1]["symbolSize"], 20.0);
        assert_eq!(series["links"][0]["source"], "LOS");
        assert_eq!(series["links"][0]["target"], "Satisfaction");
        assert_eq!(series["links"][0]["lineStyle"]["width"], 2);
        assert_eq!(series["force"]["repulsion"], 200.0);
    }

    #[test]
    fn test_impact_network_links_resolve_labels_by_uri() {
        let r: SimulationResult = serde_json::from_value(json!({
            "impacts": {
                "http://hospital-kpi.org/ontology#AverageLengthOfStay": {
                    "kpi": {"label": "Average Length of Stay", "target": 4.0, "unit": "days", "current_value": 5.0},
                    "new_value": 4.2, "change_percent": -16.0
                }
            },
            "predicted_outcomes": [
                {
                    "kpi_uri": "http://hospital-kpi.org/ontology#BedOccupancy", "kpi_label": "Bed Occupancy",
                    "original_value": 91.0, "projected_value": 87.0,
                    "influenced_by": "http://hospital-kpi.org/ontology#AverageLengthOfStay", "depth": 1
                },
                {
                    "kpi_uri": "http://hospital-kpi.org/ontology#ERWaitTime", "kpi_label": "ER Wait Time",
                    "original_value": 40.0, "projected_value": 36.0,
                    "influenced_by": "http://hospital-kpi.org/ontology#BedOccupancy", "depth": 2
                }
            ]
        }))
        .unwrap();
        let option = impact_network_option(&r);
        let series = &option["series"][0];
        let ids: Vec<&str> = series["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["Average Length of Stay", "Bed Occupancy", "ER Wait Time"]);
        for link in series["links"].as_array().unwrap() {
            assert!(ids.contains(&link["source"].as_str().unwrap()));
            assert!(ids.contains(&link["target"].as_str().unwrap()));
        }
        assert_eq!(series["links"][0]["source"], "Average Length of Stay");
        assert_eq!(series["links"][1]["source"], "Bed Occupancy");
    }

    #[test]
    fn test_trend_averages_departments() {
        let history: HistoricalData = serde_json::from_value(json!({
            "period": "2 days",
            "daily_data": [
                {"date": "2024-05-01", "departments": {
                    "ER": [{"name": "Wait", "value": 80.0}],
                    "ICU": [{"name": "Beds", "value": 90.0}, {"name": "Staff", "value": 100.0}]
                }},
                {"date": "2024-05-02", "departments": {}}
            ]
        }))
        .unwrap();
        assert_eq!(daily_averages(&history), vec![("2024-05-01".to_string(), 90.0)]);
        let option = trend_option(&history).unwrap();
        assert_eq!(option["series"][0]["smooth"], true);
        assert!(trend_option(&HistoricalData::default()).is_none());
    }
}
