//! Run settings read by the execution engine

use serde::{Deserialize, Serialize};

/// How a sequence is replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Reshuffle the sequence at the start of every repetition
    #[serde(default = "default_true")]
    pub random_order: bool,

    /// Draw each inter-step delay uniformly from `delay_range`
    #[serde(default = "default_true")]
    pub random_delay: bool,

    /// Delay bounds in seconds (min, max)
    #[serde(default = "default_delay_range")]
    pub delay_range: (f64, f64),

    /// Delay in seconds when `random_delay` is off
    #[serde(default = "default_fixed_delay")]
    pub fixed_delay: f64,

    /// Loop over the sequence until stopped
    #[serde(default = "default_true")]
    pub repeat: bool,
}

fn default_true() -> bool {
    true
}

fn default_delay_range() -> (f64, f64) {
    (1.0, 5.0)
}

fn default_fixed_delay() -> f64 {
    1.0
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            random_order: true,
            random_delay: true,
            delay_range: default_delay_range(),
            fixed_delay: default_fixed_delay(),
            repeat: true,
        }
    }
}

impl RunSettings {
    /// Play the sequence once, in order, with a constant delay
    pub fn once(fixed_delay: f64) -> Self {
        Self {
            random_order: false,
            random_delay: false,
            fixed_delay,
            repeat: false,
            ..Self::default()
        }
    }

    /// Check the delay values can be turned into durations
    pub fn validate(&self) -> Result<(), String> {
        let (min, max) = self.delay_range;
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(format!("invalid delay range [{}, {}]", min, max));
        }
        if min > max {
            return Err(format!("delay range minimum {} exceeds maximum {}", min, max));
        }
        if !self.fixed_delay.is_finite() || self.fixed_delay < 0.0 {
            return Err(format!("invalid fixed delay {}", self.fixed_delay));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_settings_parse() {
        let json = r#"{"random_order": true, "random_delay": true, "delay_range": [1, 5]}"#;
        let settings: RunSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.delay_range, (1.0, 5.0));
        assert!(settings.repeat);
        assert_eq!(settings.fixed_delay, 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(RunSettings::default().validate().is_ok());
        assert!(RunSettings::once(0.0).validate().is_ok());

        let inverted = RunSettings {
            delay_range: (5.0, 1.0),
            ..RunSettings::default()
        };
        assert!(inverted.validate().is_err());

        let negative = RunSettings::once(-1.0);
        assert!(negative.validate().is_err());
    }
}
