mod relay_config;
mod superposition_relay;

pub use relay_config::RelayConfig;
pub use superposition_relay::{EngageReport, SuperpositionRelay};
