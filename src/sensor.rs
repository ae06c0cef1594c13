use std::sync::Arc;

use tracing::debug;

use crate::bridge::Bridge;
use crate::error::{AppError, Result};

pub const ENTITY_PREFIX: &str = "sensor.plugwise_";

/// Power reading of a single appliance, refreshed through the shared [`Bridge`].
#[derive(Debug)]
pub struct Sensor {
    bridge: Arc<Bridge>,
    name: String,
    state: Option<f64>,
    appliance_id: String,
    unit: String,
}

impl Sensor {
    pub fn new(
        bridge: Arc<Bridge>,
        name: impl Into<String>,
        initial: Option<f64>,
        appliance_id: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            bridge,
            name: name.into(),
            state: initial,
            appliance_id: appliance_id.into(),
            unit: unit.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last value read, `None` until the sensor has been populated.
    pub fn state(&self) -> Option<f64> {
        self.state
    }

    pub fn unit_of_measurement(&self) -> &str {
        &self.unit
    }

    pub fn appliance_id(&self) -> &str {
        &self.appliance_id
    }

    pub fn entity_id(&self) -> String {
        format!("{ENTITY_PREFIX}{}", self.appliance_id)
    }

    /// Trigger a (throttled) fetch and read this appliance's value from the
    /// bridge's latest snapshot.
    ///
    /// Errors leave the previous state in place. When the bridge has never
    /// stored a snapshot the state is kept and no error is returned.
    pub async fn refresh(&mut self) -> Result<Option<f64>> {
        self.bridge.fetch().await?;

        match self.bridge.lookup(&self.appliance_id).await {
            Ok(value) => self.state = Some(value),
            Err(AppError::NoSnapshot) => {
                debug!(
                    appliance_id = %self.appliance_id,
                    "no snapshot stored yet; keeping previous state"
                );
            }
            Err(e) => return Err(e),
        }

        Ok(self.state)
    }
}

/// Fetch the appliance listing once and create one sensor per appliance,
/// seeded with the power reported by that fetch.
///
/// Fails with [`AppError::NoSnapshot`] when the bridge is still throttled after
/// a failed call and holds no snapshot, so an empty result always means the
/// gateway reported no appliances.
pub async fn discover(bridge: Arc<Bridge>) -> Result<Vec<Sensor>> {
    let snapshot = bridge.fetch().await?.ok_or(AppError::NoSnapshot)?;

    Ok(snapshot
        .iter()
        .map(|appliance| {
            Sensor::new(
                Arc::clone(&bridge),
                appliance.name.clone(),
                Some(appliance.current_power),
                appliance.id.clone(),
                appliance.unit_of_measure,
            )
        })
        .collect())
}
