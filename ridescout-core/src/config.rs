//! Engine tuning knobs and their validation.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PricingError;

/// Smallest padding factor accepted for viewport framing.
pub const MIN_REGION_PADDING: f64 = 1.1;

/// Settings for a discovery engine.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ridescout_core::EngineConfig;
///
/// let config = EngineConfig {
///     concurrency_limit: 4,
///     ..EngineConfig::default()
/// };
/// config.validate()?;
/// assert_eq!(config.per_call_timeout, Duration::from_secs(5));
/// # Ok::<(), ridescout_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Maximum number of routing calls in flight at once.
    pub concurrency_limit: usize,
    /// Upper bound on any single routing call.
    pub per_call_timeout: Duration,
    /// Upper bound on a whole ranking pass.
    pub overall_timeout: Duration,
    /// Multiplier applied to the bounding box spans.
    pub region_padding: f64,
    /// Span used when there is only one point to frame.
    pub default_span_degrees: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 8,
            per_call_timeout: Duration::from_secs(5),
            overall_timeout: Duration::from_secs(10),
            region_padding: 1.3,
            default_span_degrees: 0.01,
        }
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The concurrency limit was zero.
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
    /// A timeout was zero.
    #[error("{name} must be greater than zero")]
    ZeroTimeout { name: &'static str },
    /// The region padding was below the minimum or not finite.
    #[error("region padding {value} must be finite and at least 1.1")]
    RegionPadding { value: f64 },
    /// The default span was not a positive finite number.
    #[error("default span {value} must be a positive finite number of degrees")]
    DefaultSpan { value: f64 },
    /// The pricing rates were rejected.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl EngineConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.per_call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: "per_call_timeout",
            });
        }
        if self.overall_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: "overall_timeout",
            });
        }
        if !self.region_padding.is_finite() || self.region_padding < MIN_REGION_PADDING {
            return Err(ConfigError::RegionPadding {
                value: self.region_padding,
            });
        }
        if !self.default_span_degrees.is_finite() || self.default_span_degrees <= 0.0 {
            return Err(ConfigError::DefaultSpan {
                value: self.default_span_degrees,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_validate() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[rstest]
    fn zero_concurrency_is_rejected() {
        let config = EngineConfig {
            concurrency_limit: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[rstest]
    #[case(Duration::ZERO, Duration::from_secs(1), "per_call_timeout")]
    #[case(Duration::from_secs(1), Duration::ZERO, "overall_timeout")]
    fn zero_timeouts_are_rejected(
        #[case] per_call: Duration,
        #[case] overall: Duration,
        #[case] expected: &'static str,
    ) {
        let config = EngineConfig {
            per_call_timeout: per_call,
            overall_timeout: overall,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTimeout { name: expected })
        );
    }

    #[rstest]
    #[case(1.0)]
    #[case(1.09)]
    #[case(f64::NAN)]
    fn low_padding_is_rejected(#[case] padding: f64) {
        let config = EngineConfig {
            region_padding: padding,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RegionPadding { .. })
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(f64::INFINITY)]
    fn bad_default_span_is_rejected(#[case] span: f64) {
        let config = EngineConfig {
            default_span_degrees: span,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DefaultSpan { .. })
        ));
    }
}
