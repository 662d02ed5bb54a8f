mod config;
mod main_lib;
mod sink;

use config::Config;
use main_lib::{add_configured_codes, build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_format);
    let state = build_state(&config)?;

    for line in state.status_report().to_string().lines() {
        tracing::info!("{}", line);
    }

    add_configured_codes(&state, &config).await;

    if config.run_once {
        let summary = state.monitor.run_once().await;
        tracing::info!("Single cycle done: {}", summary);
        return Ok(());
    }

    state.monitor.start();
    tracing::info!(
        "Monitoring {} instruments every {}s, press Ctrl-C to stop",
        state.instruments.len(),
        config.interval_secs
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    state.monitor.stop();
    state.monitor.join().await;
    Ok(())
}
