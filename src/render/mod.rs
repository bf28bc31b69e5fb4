//! Shared rendering utilities: HTML fragments, toasts, loading overlay and
//! page snapshots.
//!
//! Panels render to self-contained HTML fragments; charts render to option
//! documents consumed by the chart library on the static page.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::logging::{agg_increment, log, log_toast, obj, v_str, Domain, Level};
use crate::theme::ToastKind;

pub mod cards;
pub mod charts;
pub mod graph;
pub mod impact;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Numbers as the page shows them: integers without a fraction, others as-is.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Entrance animation for a freshly rendered container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub stagger_ms: u32,
    pub duration_ms: u32,
    pub effect: &'static str,
}

impl Animation {
    pub const fn new(effect: &'static str, stagger_ms: u32, duration_ms: u32) -> Self {
        Self {
            stagger_ms,
            duration_ms,
            effect,
        }
    }

    pub fn attrs(&self) -> String {
        format!(
            r#"data-animate="{}" data-stagger="{}" data-duration="{}" data-easing="easeOutQuart""#,
            self.effect, self.stagger_ms, self.duration_ms
        )
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn render(&self) -> String {
        format!(
            r#"<div class="toast fixed top-4 right-4 z-50 px-6 py-3 rounded-lg shadow-lg text-white max-w-sm {}">{}</div>"#,
            self.kind.class(),
            html_escape(&self.message)
        )
    }
}

/// Transient notifications with a fixed time-to-live.
#[derive(Debug, Clone)]
pub struct Toasts {
    items: Vec<Toast>,
    ttl: chrono::Duration,
}

impl Toasts {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            items: Vec::new(),
            ttl,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.push_at(kind, message, Utc::now());
    }

    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: DateTime<Utc>) {
        let message = message.into();
        log_toast(kind.as_str(), &message);
        self.items.push(Toast {
            kind,
            message,
            expires_at: now + self.ttl,
        });
    }

    /// Drop expired toasts; returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items.retain(|t| t.expires_at > now);
        before - self.items.len()
    }

    pub fn active(&self) -> &[Toast] {
        &self.items
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn contains(&self, kind: ToastKind, message: &str) -> bool {
        self.items.iter().any(|t| t.kind == kind && t.message == message)
    }

    /// Markup for the toasts still live at `now`.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        self.items
            .iter()
            .filter(|t| t.expires_at > now)
            .map(Toast::render)
            .collect()
    }
}

/// A modal that hides itself after a deadline.
#[derive(Debug, Clone, Default)]
pub struct Modal {
    visible_until: Option<DateTime<Utc>>,
}

impl Modal {
    pub fn show(&mut self, now: DateTime<Utc>, ttl: chrono::Duration) {
        self.visible_until = Some(now + ttl);
    }

    pub fn hide(&mut self) {
        self.visible_until = None;
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.visible_until.map(|t| t > now).unwrap_or(false)
    }
}

pub fn loading_overlay(show: bool) -> String {
    let hidden = if show { "" } else { " hidden" };
    format!(
        r#"<div id="loading-overlay" class="fixed inset-0 bg-black bg-opacity-50 flex items-center justify-center z-50{}"></div>"#,
        hidden
    )
}

// =============================================================================
// Page snapshots
// =============================================================================

/// One rendered page: named HTML sections plus chart option documents.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub title: String,
    pub sections: Vec<(String, String)>,
    pub charts: Map<String, Value>,
}

impl PageSnapshot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn section(mut self, id: &str, html: String) -> Self {
        self.sections.push((id.to_string(), html));
        self
    }

    pub fn chart(mut self, id: &str, option: Option<Value>) -> Self {
        if let Some(option) = option {
            self.charts.insert(id.to_string(), option);
        }
        self
    }

    pub fn to_html(&self) -> String {
        let body: String = self
            .sections
            .iter()
            .map(|(id, html)| format!("<section id=\"{}\">{}</section>\n", html_escape(id), html))
            .collect();
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body>
{body}</body>
</html>"#,
            title = html_escape(&self.title),
            body = body,
        )
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_html().as_bytes());
        hasher.update(Value::Object(self.charts.clone()).to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Writes `<name>.html` and `<name>.charts.json`, skipping unchanged pages.
#[derive(Debug)]
pub struct SnapshotWriter {
    dir: PathBuf,
    written: HashMap<String, String>,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: HashMap::new(),
        }
    }

    /// Returns false when the page was identical to the last write.
    pub fn write(&mut self, name: &str, page: &PageSnapshot) -> Result<bool> {
        let fingerprint = page.fingerprint();
        if self.written.get(name) == Some(&fingerprint) {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let html_path = self.dir.join(format!("{}.html", name));
        fs::write(&html_path, page.to_html())
            .with_context(|| format!("writing {}", html_path.display()))?;
        let charts_path = self.dir.join(format!("{}.charts.json", name));
        fs::write(&charts_path, serde_json::to_string_pretty(&page.charts)?)
            .with_context(|| format!("writing {}", charts_path.display()))?;
        agg_increment("render");
        log(
            Level::Info,
            Domain::Render,
            "page_written",
            obj(&[
                ("page", v_str(name)),
                ("sha256", v_str(&fingerprint)),
                ("path", v_str(&html_path.to_string_lossy())),
            ]),
        );
        self.written.insert(name.to_string(), fingerprint);
        Ok(true)
    }
}
