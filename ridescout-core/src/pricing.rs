//! Fare estimates from route distance and duration.
//!
//! Money is kept in [`Decimal`] so that rates compose without binary
//! floating point drift. Estimates are exact; rounding for display is left
//! to [`crate::RankedDriver::price_to_cents`].

use rust_decimal::prelude::{Decimal, FromPrimitive, RoundingStrategy};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places shown on a quoted price.
const CENTS_SCALE: u32 = 2;

/// Round `price` to cents, ties away from zero.
#[must_use]
pub(crate) fn to_cents(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(CENTS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rates used to turn a route into a price.
///
/// `price = base + distance_m * per_meter + duration_s * per_second`.
///
/// # Examples
///
/// ```
/// use ridescout_core::PricingConfig;
/// use rust_decimal::Decimal;
///
/// let pricing = PricingConfig::default();
/// let price = pricing.estimate(1_000.0, 120.0)?;
/// assert_eq!(price, Decimal::new(460, 2));
/// # Ok::<(), ridescout_core::PricingError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PricingConfig {
    /// Flat amount added to every trip.
    pub base_price: Decimal,
    /// Charge per metre travelled.
    pub per_meter_rate: Decimal,
    /// Charge per second of travel.
    pub per_second_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: Decimal::new(250, 2),
            per_meter_rate: Decimal::new(15, 4),
            per_second_rate: Decimal::new(5, 3),
        }
    }
}

/// Reasons a price cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PricingError {
    /// A configured rate was negative.
    #[error("{name} must not be negative, got {value}")]
    NegativeRate { name: String, value: Decimal },
    /// A route quantity was negative or not finite.
    #[error("{name} must be a finite non-negative number, got {value}")]
    InvalidQuantity { name: String, value: String },
    /// The computed price exceeded the decimal range.
    #[error("price computation overflowed")]
    Overflow,
}

impl PricingConfig {
    /// Reject negative rates.
    pub fn validate(&self) -> Result<(), PricingError> {
        for (name, value) in [
            ("base_price", self.base_price),
            ("per_meter_rate", self.per_meter_rate),
            ("per_second_rate", self.per_second_rate),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(PricingError::NegativeRate {
                    name: name.to_owned(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Price a route of `distance_meters` taking `duration_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] for negative or non-finite
    /// inputs and [`PricingError::Overflow`] when the result cannot be
    /// represented.
    pub fn estimate(
        &self,
        distance_meters: f64,
        duration_seconds: f64,
    ) -> Result<Decimal, PricingError> {
        let distance = to_quantity("distance_meters", distance_meters)?;
        let duration = to_quantity("duration_seconds", duration_seconds)?;

        let distance_charge = distance
            .checked_mul(self.per_meter_rate)
            .ok_or(PricingError::Overflow)?;
        let duration_charge = duration
            .checked_mul(self.per_second_rate)
            .ok_or(PricingError::Overflow)?;
        self.base_price
            .checked_add(distance_charge)
            .and_then(|sum| sum.checked_add(duration_charge))
            .ok_or(PricingError::Overflow)
    }
}

fn to_quantity(name: &str, value: f64) -> Result<Decimal, PricingError> {
    let invalid = || PricingError::InvalidQuantity {
        name: name.to_owned(),
        value: value.to_string(),
    };
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Decimal::from_f64(value).ok_or_else(invalid)
}
