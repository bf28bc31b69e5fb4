use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;

use kpiboard::api::HttpBackend;
use kpiboard::config::Config;
use kpiboard::logging::{log, obj, tick_aggregator, v_str, Domain, Level};
use kpiboard::render::charts::ChartType;
use kpiboard::render::SnapshotWriter;
use kpiboard::simulation::SimulationController;

const HELP: &str = "commands: <kpi-uri>=<value> | run | reset | save <name> | load <n> | delete <n> | chart bar|line|radar | quit";

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("page", v_str("simulation")), ("api_base", v_str(&cfg.api_base))]),
    );

    let backend = HttpBackend::new(&cfg)?;
    let mut sim = SimulationController::new(&cfg);
    let mut writer = SnapshotWriter::new(&cfg.output_dir);

    sim.load_kpis(&backend).await;
    writer.write("simulation", &sim.page(Utc::now()))?;
    eprintln!("[simulate] {} KPIs loaded. {}", sim.view.sliders.len(), HELP);

    let mut ticker = interval(cfg.poll_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sim.tick(Utc::now());
                tick_aggregator();
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
                match word {
                    "" => {}
                    "quit" | "exit" => break,
                    "run" => {
                        sim.run(&backend).await;
                    }
                    "reset" => sim.reset(),
                    "save" => {
                        let _ = sim.save_scenario(rest, Utc::now());
                    }
                    "load" | "delete" => match rest.trim().parse::<usize>() {
                        // positions are shown 1-based
                        Ok(n) if n > 0 => {
                            let outcome = if word == "load" {
                                sim.load_scenario(n - 1).map(|_| ())
                            } else {
                                sim.delete_scenario(n - 1, true).map(|_| ())
                            };
                            if let Err(err) = outcome {
                                eprintln!("[simulate] {}", err);
                            }
                        }
                        _ => eprintln!("{}", HELP),
                    },
                    "chart" => match rest.parse::<ChartType>() {
                        Ok(chart_type) => sim.set_chart_type(chart_type),
                        Err(err) => eprintln!("[simulate] {}", err),
                    },
                    _ => match line.split_once('=') {
                        Some((uri, value)) => match value.trim().parse::<f64>() {
                            Ok(v) => match sim.set_value(uri.trim(), v) {
                                Some(stored) => eprintln!("[simulate] {} = {:.1}", uri.trim(), stored),
                                None => eprintln!("[simulate] unknown KPI {}", uri.trim()),
                            },
                            Err(_) => eprintln!("{}", HELP),
                        },
                        None => eprintln!("{}", HELP),
                    },
                }
            }
        }

        if let Err(err) = writer.write("simulation", &sim.page(Utc::now())) {
            log(
                Level::Warn,
                Domain::Render,
                "page_write_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[("page", v_str("simulation"))]));
    Ok(())
}
