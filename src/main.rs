use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use rum_reporter::config::{load_config, within_schedule};
use rum_reporter::pipeline::MonitorPipeline;
use rum_reporter::telegram::TelegramClient;
use rum_reporter::zoho::ZohoClient;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    let labels: Vec<&str> = cfg.monitors.iter().map(|m| m.label.as_str()).collect();
    info!("monitors = {:?}", labels);

    let now = Utc::now();
    if !within_schedule(cfg.report_hours_utc.as_deref(), now) {
        info!("Outside reporting hours ({}), skipping run", now.format("%H:%M UTC"));
        return Ok(());
    }

    let zoho = ZohoClient::from_config(&cfg);
    let telegram = TelegramClient::from_config(&cfg);

    // No report can go out without a token, so this ends the run.
    let token = zoho
        .refresh_access_token()
        .await
        .context("Could not obtain Zoho access token")?;

    let pipeline = MonitorPipeline::from_config(&zoho, &telegram, &cfg);
    let summary = pipeline.run(&cfg.monitors, &token).await;

    info!(
        "Run finished: {}/{} monitors reported, {} message(s) delivered",
        summary.reported.len(),
        summary.total_monitors(),
        summary.blocks_delivered
    );
    if summary.has_failures() {
        info!("Failed monitors: {:?}", summary.failed);
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
