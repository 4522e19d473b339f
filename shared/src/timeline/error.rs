use thiserror::Error;

use crate::types::TimesliceId;

/// Errors raised while validating a [`TimelineConfig`](super::TimelineConfig)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tick rate of zero was configured
    #[error("{field} must be greater than zero")]
    ZeroRate {
        field: &'static str,
    },

    /// More timeslices than an entity id can address
    #[error("num_timeslices is {requested} but entity ids can only address {max} timeslices")]
    TooManyTimeslices {
        requested: u8,
        max: u8,
    },

    /// No timeslices at all
    #[error("num_timeslices must be at least 1")]
    NoTimeslices,

    /// The delay between timeslices is zero, negative or not a number
    #[error("timeslice_delay_secs must be a positive number of seconds, got {value}")]
    InvalidDelay {
        value: f32,
    },

    /// The highest timeslice port does not fit in a u16
    #[error("origin_port {origin_port} plus {num_timeslices} timeslices overflows the port range")]
    PortOverflow {
        origin_port: u16,
        num_timeslices: u8,
    },
}

/// Errors raised by the [`Multiplex`](super::Multiplex)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultiplexError {
    /// The timeslice id has no queue in this multiplex
    #[error("Timeslice {id:?} is not part of the multiplex, which holds {num_timeslices} timeslices")]
    UnknownTimeslice {
        id: TimesliceId,
        num_timeslices: usize,
    },
}
