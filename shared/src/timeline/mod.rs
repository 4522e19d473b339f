mod config;
mod error;
mod multiplex;

pub use config::TimelineConfig;
pub use error::{ConfigError, MultiplexError};
pub use multiplex::Multiplex;
