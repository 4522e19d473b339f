use std::time::Duration;

use crate::types::{TimesliceId, MAX_TIMESLICES};

use super::ConfigError;

/// Settings shared by every timeslice of a timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineConfig {
    /// Simulated seconds between adjacent timeslices
    pub timeslice_delay_secs: f32,
    pub num_timeslices: u8,
    /// Fixed update rate of every cosmos
    pub simulation_hz: u16,
    /// Rate at which timeslices exchange network traffic
    pub network_hz: u16,
    /// Port of timeslice 0, timeslice `n` listens on `origin_port + n`
    pub origin_port: u16,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            timeslice_delay_secs: 5.0,
            num_timeslices: 3,
            simulation_hz: 60,
            network_hz: 20,
            origin_port: 14191,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_hz == 0 {
            return Err(ConfigError::ZeroRate {
                field: "simulation_hz",
            });
        }
        if self.network_hz == 0 {
            return Err(ConfigError::ZeroRate {
                field: "network_hz",
            });
        }
        if self.num_timeslices == 0 {
            return Err(ConfigError::NoTimeslices);
        }
        if self.num_timeslices > MAX_TIMESLICES {
            return Err(ConfigError::TooManyTimeslices {
                requested: self.num_timeslices,
                max: MAX_TIMESLICES,
            });
        }
        if !(self.timeslice_delay_secs.is_finite() && self.timeslice_delay_secs > 0.0) {
            return Err(ConfigError::InvalidDelay {
                value: self.timeslice_delay_secs,
            });
        }
        if self
            .origin_port
            .checked_add(u16::from(self.num_timeslices) - 1)
            .is_none()
        {
            return Err(ConfigError::PortOverflow {
                origin_port: self.origin_port,
                num_timeslices: self.num_timeslices,
            });
        }
        Ok(())
    }

    /// Whole simulation ticks covering `secs`, rounded to nearest
    pub fn ticks_for_secs(&self, secs: f32) -> u16 {
        let ticks = (secs * f32::from(self.simulation_hz)).round();
        if ticks <= 0.0 {
            0
        } else if ticks >= f32::from(u16::MAX) {
            u16::MAX
        } else {
            ticks as u16
        }
    }

    /// Coherency distance between adjacent timeslices
    pub fn timeslice_delay_ticks(&self) -> u16 {
        self.ticks_for_secs(self.timeslice_delay_secs)
    }

    pub fn port_for(&self, id: TimesliceId) -> u16 {
        self.origin_port.wrapping_add(u16::from(id.value()))
    }

    /// Duration of a single fixed update
    pub fn fixed_timestep(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.simulation_hz.max(1)))
    }

    pub fn timeslice_ids(&self) -> impl Iterator<Item = TimesliceId> {
        (0..self.num_timeslices).map(TimesliceId::new)
    }
}
