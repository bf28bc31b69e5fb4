//! KPI relationship network chart.
//!
//! A `GraphChart` is created once per page and then only updated. It holds a
//! single resize observer for its whole life; updates never register more.

use serde_json::{json, Value};

use super::{fmt_value, html_escape};
use crate::logging::{log, log_render, obj, v_str, Domain, Level};
use crate::model::{performance_ratio, GraphEdge, GraphNode, GraphSnapshot};
use crate::theme::ACCENT_COLOR;

pub const DEFAULT_NODE_SIZE: f64 = 15.0;
pub const DEFAULT_EDGE_WIDTH: f64 = 1.0;
pub const ZOOM_IN: f64 = 1.2;
pub const ZOOM_OUT: f64 = 0.8;

/// Force layout parameters for a graph series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceLayout {
    pub repulsion: f64,
    pub gravity: f64,
    pub edge_length: f64,
}

impl ForceLayout {
    pub const NETWORK: ForceLayout = ForceLayout {
        repulsion: 100.0,
        gravity: 0.1,
        edge_length: 80.0,
    };
    pub const IMPACT: ForceLayout = ForceLayout {
        repulsion: 200.0,
        gravity: 0.1,
        edge_length: 100.0,
    };
}

/// One `graph` series with the shared roam and adjacency emphasis settings.
pub fn force_series(data: Vec<Value>, links: Vec<Value>, force: ForceLayout) -> Value {
    json!({
        "type": "graph",
        "layout": "force",
        "data": data,
        "links": links,
        "roam": true,
        "label": { "show": true, "position": "right", "fontSize": 10 },
        "force": {
            "repulsion": force.repulsion,
            "gravity": force.gravity,
            "edgeLength": force.edge_length,
            "layoutAnimation": true
        },
        "emphasis": { "focus": "adjacency", "lineStyle": { "width": 3 } }
    })
}

pub fn node_tooltip(node: &GraphNode) -> String {
    format!(
        r#"<div class="text-sm"><strong>{label}</strong><br/>Value: {value} {unit}<br/>Target: {target}<br/>Status: {status}<br/>Performance: {ratio:.1}%</div>"#,
        label = html_escape(&node.label),
        value = fmt_value(node.value),
        unit = html_escape(&node.unit),
        target = fmt_value(node.target),
        status = node.status.as_str(),
        ratio = performance_ratio(node.value, node.target),
    )
}

pub fn edge_tooltip(edge: &GraphEdge) -> String {
    format!(
        "{} → {}<br/>Type: {}",
        html_escape(&edge.source),
        html_escape(&edge.target),
        html_escape(&edge.relationship)
    )
}

/// Requests queued for the chart library on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartAction {
    Scale(f64),
    Restore,
    Resize,
}

impl ChartAction {
    pub fn to_json(&self) -> Value {
        match self {
            ChartAction::Scale(factor) => json!({"type": "graphRoam", "zoom": factor}),
            ChartAction::Restore => json!({"type": "restore"}),
            ChartAction::Resize => json!({"type": "resize"}),
        }
    }
}

#[derive(Debug)]
pub struct GraphChart {
    container: String,
    snapshot: Option<GraphSnapshot>,
    option: Option<Value>,
    pending: Vec<ChartAction>,
    resize_observers: usize,
    updates: u64,
    disposed: bool,
}

impl GraphChart {
    pub fn new(container: impl Into<String>) -> Self {
        let container = container.into();
        log(
            Level::Debug,
            Domain::Render,
            "chart_created",
            obj(&[("panel", v_str(&container))]),
        );
        Self {
            container,
            snapshot: None,
            option: None,
            pending: Vec::new(),
            resize_observers: 1,
            updates: 0,
            disposed: false,
        }
    }

    /// Replace the chart data. Snapshots missing either list are ignored and
    /// leave the current drawing intact.
    pub fn update(&mut self, snapshot: &GraphSnapshot) -> bool {
        if self.disposed {
            return false;
        }
        let Some((nodes, edges)) = snapshot.parts() else {
            log(
                Level::Debug,
                Domain::Render,
                "graph_update_ignored",
                obj(&[("panel", v_str(&self.container))]),
            );
            return false;
        };
        self.option = Some(Self::build_option(nodes, edges));
        self.snapshot = Some(snapshot.clone());
        self.updates += 1;
        log_render(&self.container, nodes.len());
        true
    }

    fn build_option(nodes: &[GraphNode], edges: &[GraphEdge]) -> Value {
        let data = nodes
            .iter()
            .map(|n| {
                json!({
                    "id": n.id,
                    "name": n.label,
                    "label": n.label,
                    "value": n.value,
                    "symbolSize": n.size.unwrap_or(DEFAULT_NODE_SIZE),
                    "itemStyle": { "color": n.color.as_deref().unwrap_or(ACCENT_COLOR) },
                    "tooltip": { "formatter": node_tooltip(n) }
                })
            })
            .collect();
        let links = edges
            .iter()
            .map(|e| {
                json!({
                    "source": e.source,
                    "target": e.target,
                    "type": e.relationship,
                    "lineStyle": {
                        "color": e.color.as_deref().unwrap_or(ACCENT_COLOR),
                        "width": e.weight.unwrap_or(DEFAULT_EDGE_WIDTH)
                    },
                    "tooltip": { "formatter": edge_tooltip(e) }
                })
            })
            .collect();
        json!({
            "backgroundColor": "transparent",
            "tooltip": { "trigger": "item" },
            "series": [force_series(data, links, ForceLayout::NETWORK)]
        })
    }

    pub fn option(&self) -> Option<&Value> {
        self.option.as_ref()
    }

    pub fn snapshot(&self) -> Option<&GraphSnapshot> {
        self.snapshot.as_ref()
    }

    /// Hover text for a node id or, failing that, an edge `source->target`.
    pub fn tooltip(&self, key: &str) -> Option<String> {
        let (nodes, edges) = self.snapshot.as_ref()?.parts()?;
        if let Some(node) = nodes.iter().find(|n| n.id == key) {
            return Some(node_tooltip(node));
        }
        let (source, target) = key.split_once("->")?;
        edges
            .iter()
            .find(|e| e.source == source && e.target == target)
            .map(edge_tooltip)
    }

    pub fn zoom_in(&mut self) {
        self.dispatch(ChartAction::Scale(ZOOM_IN));
    }

    pub fn zoom_out(&mut self) {
        self.dispatch(ChartAction::Scale(ZOOM_OUT));
    }

    pub fn center(&mut self) {
        self.dispatch(ChartAction::Restore);
    }

    pub fn on_resize(&mut self) {
        self.dispatch(ChartAction::Resize);
    }

    fn dispatch(&mut self, action: ChartAction) {
        // zoom and center act on the drawing; before the first update there is none
        if self.disposed || (self.option.is_none() && action != ChartAction::Resize) {
            return;
        }
        self.pending.push(action);
    }

    pub fn pending(&self) -> &[ChartAction] {
        &self.pending
    }

    pub fn take_actions(&mut self) -> Vec<ChartAction> {
        std::mem::take(&mut self.pending)
    }

    pub fn resize_observers(&self) -> usize {
        self.resize_observers
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.resize_observers = 0;
        self.pending.clear();
        self.option = None;
        log(
            Level::Debug,
            Domain::Render,
            "chart_disposed",
            obj(&[("panel", v_str(&self.container))]),
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for GraphChart {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn node(id: &str, value: f64, target: f64) -> GraphNode {
        GraphNode {
            id: id.into(),
            label: format!("{} label", id),
            value,
            target,
            status: Status::Good,
            unit: "days".into(),
            size: None,
            color: None,
        }
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            relationship: "influences".into(),
            weight: Some(2.0),
            color: None,
        }
    }

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot::new(vec![node("a", 3.0, 4.0), node("b", 1.0, 1.0)], vec![edge("a", "b")])
    }

    #[test]
    fn test_updates_keep_single_resize_observer() {
        let mut chart = GraphChart::new("network-graph");
        for _ in 0..5 {
            assert!(chart.update(&snapshot()));
        }
        assert_eq!(chart.updates(), 5);
        assert_eq!(chart.resize_observers(), 1);
        chart.dispose();
        assert!(chart.is_disposed());
        assert_eq!(chart.resize_observers(), 0);
        assert!(!chart.update(&snapshot()));
        chart.on_resize();
        assert!(chart.pending().is_empty());
    }

    #[test]
    fn test_malformed_update_keeps_previous_drawing() {
        let mut chart = GraphChart::new("network-graph");
        chart.update(&snapshot());
        let before = chart.option().cloned();
        let broken = GraphSnapshot {
            nodes: Some(vec![node("z", 1.0, 1.0)]),
            edges: None,
        };
        assert!(!chart.update(&broken));
        assert_eq!(chart.option().cloned(), before);
    }

    #[test]
    fn test_option_defaults() {
        let mut chart = GraphChart::new("network-graph");
        chart.update(&snapshot());
        let series = &chart.option().unwrap()["series"][0];
        assert_eq!(series["data"][0]["symbolSize"], 15.0);
        assert_eq!(series["data"][0]["itemStyle"]["color"], "#2563eb");
        assert_eq!(series["links"][0]["lineStyle"]["width"], 2.0);
        assert_eq!(series["force"]["repulsion"], 100.0);
        assert_eq!(series["emphasis"]["focus"], "adjacency");
    }

    #[test]
    fn test_tooltips() {
        let mut chart = GraphChart::new("network-graph");
        chart.update(&snapshot());
        let hover = chart.tooltip("a").unwrap();
        assert!(hover.contains("Value: 3 days"));
        assert!(hover.contains("Performance: 75.0%"));
        assert_eq!(chart.tooltip("a->b").unwrap(), "a → b<br/>Type: influences");
        assert!(chart.tooltip("missing").is_none());
    }

    #[test]
    fn test_zoom_and_center_actions() {
        let mut chart = GraphChart::new("network-graph");
        chart.zoom_in();
        assert!(chart.pending().is_empty());
        chart.on_resize();
        assert_eq!(chart.take_actions(), vec![ChartAction::Resize]);
        chart.update(&snapshot());
        chart.zoom_in();
        chart.zoom_out();
        chart.center();
        assert_eq!(
            chart.take_actions(),
            vec![ChartAction::Scale(1.2), ChartAction::Scale(0.8), ChartAction::Restore]
        );
        assert!(chart.pending().is_empty());
    }
}
