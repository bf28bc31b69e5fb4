use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::interval;

use kpiboard::api::retry::RetryConfig;
use kpiboard::api::{ApiError, HttpBackend, KpiBackend};
use kpiboard::config::Config;
use kpiboard::dashboard::{fetch_all, DashboardController, LoadResults};
use kpiboard::live::{connect, LiveHandle, PushEvent};
use kpiboard::logging::{log, obj, tick_aggregator, v_num, v_str, Domain, Level};
use kpiboard::model::Insight;
use kpiboard::render::SnapshotWriter;
use kpiboard::theme::ToastKind;

#[derive(Debug, PartialEq)]
enum Command {
    Realtime,
    Analyze,
    ZoomIn,
    ZoomOut,
    Center,
    Resize,
    Details(usize),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let cmd = match parts.next()? {
        "realtime" => Command::Realtime,
        "analyze" => Command::Analyze,
        "zoom-in" => Command::ZoomIn,
        "zoom-out" => Command::ZoomOut,
        "center" => Command::Center,
        "resize" => Command::Resize,
        // 1-based on the command line
        "details" => Command::Details(parts.next()?.parse::<usize>().ok()?.checked_sub(1)?),
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Next push event, or pending forever once the channel is gone.
async fn next_event(events: &mut Option<mpsc::Receiver<PushEvent>>) -> Option<PushEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("page", v_str("dashboard")),
            ("api_base", v_str(&cfg.api_base)),
            ("push_url", v_str(&cfg.push_url)),
        ]),
    );

    let backend = Arc::new(HttpBackend::new(&cfg)?);
    let mut dash = DashboardController::new(&cfg);
    let mut writer = SnapshotWriter::new(&cfg.output_dir);

    let retry = RetryConfig {
        max_retries: cfg.connect_retries,
        ..Default::default()
    };
    let (live, mut events): (Option<LiveHandle>, _) = match connect(&cfg.push_url, &retry, 64).await {
        Ok((handle, rx)) => (Some(handle), Some(rx)),
        Err(err) => {
            log(
                Level::Warn,
                Domain::Live,
                "connect_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
            dash.toasts
                .push(ToastKind::Error, format!("Connection error: {}", err));
            (None, None)
        }
    };

    // Initial fetches run in their own task so push events keep flowing.
    let mut tickets = Some(dash.begin_load());
    let (load_tx, mut load_rx) = mpsc::channel::<LoadResults>(1);
    {
        let backend = backend.clone();
        tokio::spawn(async move {
            let results = fetch_all(backend.as_ref()).await;
            let _ = load_tx.send(results).await;
        });
    }

    let (analysis_tx, mut analysis_rx) = mpsc::channel::<Result<Vec<Insight>, ApiError>>(1);
    let mut ticker = interval(cfg.poll_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = next_event(&mut events) => match event {
                Some(event) => dash.apply_push(event, Utc::now()),
                None => events = None,
            },
            Some(results) = load_rx.recv() => {
                if let Some(t) = tickets.take() {
                    let report = dash.finish_load(t, results, Utc::now());
                    log(
                        Level::Debug,
                        Domain::Dashboard,
                        "load_report",
                        obj(&[("any_failed", serde_json::json!(report.any_failed()))]),
                    );
                }
            }
            Some(response) = analysis_rx.recv() => dash.finish_analysis(response, Utc::now()),
            _ = ticker.tick() => {
                dash.tick(Utc::now());
                tick_aggregator();
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Realtime) => {
                        let command = dash.toggle_realtime();
                        if let Some(live) = &live {
                            if let Err(err) = live.send(command).await {
                                log(Level::Warn, Domain::Live, "command_failed", obj(&[("error", v_str(&err.to_string()))]));
                            }
                        }
                    }
                    Some(Command::Analyze) => {
                        if dash.begin_analysis() {
                            let backend = backend.clone();
                            let tx = analysis_tx.clone();
                            tokio::spawn(async move {
                                let response = backend.reasoning("all").await.map(|r| r.insights);
                                let _ = tx.send(response).await;
                            });
                        }
                    }
                    Some(Command::ZoomIn) => dash.zoom_in(),
                    Some(Command::ZoomOut) => dash.zoom_out(),
                    Some(Command::Center) => dash.center(),
                    Some(Command::Resize) => dash.resize(),
                    Some(Command::Details(index)) => {
                        if !dash.show_kpi_details(index) {
                            eprintln!("[dashboard] no KPI card #{}", index + 1);
                        }
                    }
                    None => eprintln!("commands: realtime | analyze | zoom-in | zoom-out | center | resize | details <n> | quit"),
                }
            }
        }

        if let Err(err) = writer.write("dashboard", &dash.page(Utc::now())) {
            log(
                Level::Warn,
                Domain::Render,
                "page_write_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
        for action in dash.graph.take_actions() {
            log(
                Level::Debug,
                Domain::Render,
                "chart_action",
                obj(&[("panel", v_str("network-graph")), ("action", action.to_json())]),
            );
        }
    }

    dash.graph.dispose();
    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("page", v_str("dashboard")),
            ("kpis", v_num(dash.view.kpis.len() as f64)),
        ]),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_position_is_one_based() {
        assert_eq!(parse_command("details 1"), Some(Command::Details(0)));
        assert_eq!(parse_command("details 2"), Some(Command::Details(1)));
        assert_eq!(parse_command("details 0"), None);
        assert_eq!(parse_command("details x"), None);
        assert_eq!(parse_command("resize"), Some(Command::Resize));
    }
}
