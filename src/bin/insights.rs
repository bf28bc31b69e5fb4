use anyhow::{bail, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;

use kpiboard::api::HttpBackend;
use kpiboard::config::Config;
use kpiboard::insights::{InsightFilter, InsightsController};
use kpiboard::logging::{log, obj, tick_aggregator, v_num, v_str, Domain, Level};
use kpiboard::render::SnapshotWriter;

fn parse_args() -> Result<InsightFilter> {
    let mut filter = InsightFilter::All;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--filter" => {
                let Some(value) = args.next() else {
                    bail!("--filter needs one of all|critical|warning|optimization");
                };
                filter = value.parse().map_err(anyhow::Error::msg)?;
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(filter)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let filter = parse_args()?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("page", v_str("insights")), ("filter", v_str(filter.as_str()))]),
    );

    let backend = HttpBackend::new(&cfg)?;
    let mut page = InsightsController::new(&cfg);
    let mut writer = SnapshotWriter::new(&cfg.output_dir);

    page.load(&backend).await;
    page.set_filter(filter);
    writer.write("insights", &page.page(Utc::now()))?;
    eprintln!(
        "[insights] {} insights, {} shown. commands: filter <name> | refresh | quit",
        page.view.insights.len(),
        page.filtered().len()
    );

    let mut ticker = interval(cfg.poll_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                page.tick(Utc::now());
                tick_aggregator();
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let mut parts = line.split_whitespace();
                match parts.next() {
                    Some("quit") | Some("exit") => break,
                    Some("refresh") => page.refresh(&backend).await,
                    Some("filter") => match parts.next().unwrap_or("all").parse::<InsightFilter>() {
                        Ok(f) => page.set_filter(f),
                        Err(err) => eprintln!("[insights] {}", err),
                    },
                    Some(other) => eprintln!("[insights] unknown command {}", other),
                    None => {}
                }
            }
        }

        if let Err(err) = writer.write("insights", &page.page(Utc::now())) {
            log(
                Level::Warn,
                Domain::Render,
                "page_write_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }

    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("page", v_str("insights")),
            ("insights", v_num(page.view.insights.len() as f64)),
        ]),
    );
    Ok(())
}
