//! Push-update channel: event types and the socket task.

use serde::{Deserialize, Serialize};

use crate::model::{GraphSnapshot, Insight, Kpi};

mod socket;

pub use socket::{connect, LiveHandle};

/// Server -> client events. Frames are `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    Connect,
    Disconnect,
    KpiUpdate {
        kpis: Vec<Kpi>,
    },
    InsightsUpdate {
        insights: Vec<Insight>,
    },
    GraphUpdate {
        #[serde(default)]
        graph_data: Option<GraphSnapshot>,
    },
    Error {
        message: String,
    },
    Connected {
        #[serde(default)]
        data: Option<String>,
    },
    RealtimeStarted {
        #[serde(default)]
        message: Option<String>,
    },
    RealtimeStopped {
        #[serde(default)]
        message: Option<String>,
    },
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::Connect => "connect",
            PushEvent::Disconnect => "disconnect",
            PushEvent::KpiUpdate { .. } => "kpi_update",
            PushEvent::InsightsUpdate { .. } => "insights_update",
            PushEvent::GraphUpdate { .. } => "graph_update",
            PushEvent::Error { .. } => "error",
            PushEvent::Connected { .. } => "connected",
            PushEvent::RealtimeStarted { .. } => "realtime_started",
            PushEvent::RealtimeStopped { .. } => "realtime_stopped",
        }
    }
}

/// Client -> server commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientCommand {
    StartRealtime,
    StopRealtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn indicator_class(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "w-3 h-3 bg-green-400 rounded-full pulse",
            ConnectionStatus::Disconnected => "w-3 h-3 bg-red-400 rounded-full",
        }
    }
}

/// Decode one text frame; anything unrecognised yields `None`.
pub fn decode_frame(text: &str) -> Option<PushEvent> {
    serde_json::from_str(text).ok()
}
