pub mod bridge;
pub mod config;
pub mod error;
pub mod minirest;
pub mod sensor;
pub mod snapshot;
pub mod throttle;

// Re-export commonly used items
pub use bridge::{Bridge, BridgeOptions};
pub use config::Config;
pub use error::{AppError, Result};
pub use sensor::{discover, Sensor};
pub use snapshot::{Appliance, Snapshot};
