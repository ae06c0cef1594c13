use std::sync::Arc;
use std::time::Duration;

use stretch_input::{discover, Bridge, BridgeOptions, Config};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path =
        std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.example.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(
        host = %cfg.stretch.host,
        poll_interval_secs = cfg.poll.interval_secs,
        throttle_secs = cfg.stretch.throttle_secs,
        "loaded config"
    );

    let bridge = Arc::new(Bridge::with_options(
        &cfg.stretch.host,
        &cfg.stretch.password,
        BridgeOptions::from(&cfg.stretch),
    )?);

    let mut sensors = discover(Arc::clone(&bridge)).await?;
    info!("discovered {} appliance sensor(s)", sensors.len());
    for sensor in &sensors {
        info!(
            entity_id = %sensor.entity_id(),
            name = %sensor.name(),
            value = ?sensor.state(),
            unit = %sensor.unit_of_measurement(),
            "registered sensor"
        );
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.poll.interval_secs));
    // Discovery just fetched; skip the immediate first tick.
    ticker.tick().await;

    let sig = tokio::signal::ctrl_c();
    tokio::pin!(sig);
    loop {
        tokio::select! {
            biased;
            _ = &mut sig => {
                info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                for sensor in sensors.iter_mut() {
                    match sensor.refresh().await {
                        Ok(Some(value)) => info!(
                            entity_id = %sensor.entity_id(),
                            name = %sensor.name(),
                            value,
                            unit = %sensor.unit_of_measurement(),
                            "sensor refreshed"
                        ),
                        Ok(None) => debug!(
                            entity_id = %sensor.entity_id(),
                            "sensor has no value yet"
                        ),
                        Err(e) => warn!(
                            entity_id = %sensor.entity_id(),
                            error = %e,
                            "sensor refresh failed; keeping previous state"
                        ),
                    }
                }
            }
        }
    }

    Ok(())
}
