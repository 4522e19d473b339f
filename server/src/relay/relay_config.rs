use crate::RelayError;

/// Contains Config properties which will be used by a
/// [`SuperpositionRelay`](crate::SuperpositionRelay)
#[derive(Clone, Debug, PartialEq)]
pub struct RelayConfig {
    /// Seconds an entity must stay forked before it becomes a resolution
    /// candidate
    pub forked_threshold_min_secs: f32,
    /// Seconds after which a forked candidate triggers a resolution
    pub forked_threshold_max_secs: f32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            forked_threshold_min_secs: 0.5,
            forked_threshold_max_secs: 2.0,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        for (field, value) in [
            ("forked_threshold_min_secs", self.forked_threshold_min_secs),
            ("forked_threshold_max_secs", self.forked_threshold_max_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RelayError::InvalidThreshold { field, value });
            }
        }
        if self.forked_threshold_max_secs < self.forked_threshold_min_secs {
            return Err(RelayError::ThresholdOrder {
                min: self.forked_threshold_min_secs,
                max: self.forked_threshold_max_secs,
            });
        }
        Ok(())
    }
}
