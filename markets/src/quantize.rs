//! Symbol Validator / Quantizer (spec §4.3, component C3).
//!
//! Applies a venue's step size, tick size, minimum notional and minimum
//! quantity to a proposed order. Quantity is floored to the nearest
//! step; price is rounded to the nearest tick. This is accounting math,
//! so everything here is [`rust_decimal::Decimal`] — no floats (spec §9
//! redesign note on `Decimal` usage).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per `(exchange, symbol, market)` precision rules. In production these
/// are fetched from `ExchangeAdapter::get_precision` and cached; this
/// crate only owns the pure quantization math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrecisionRules {
    pub step_size: Decimal,
    pub tick_size: Decimal,
    pub min_notional: Decimal,
    pub min_qty: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantizeError {
    #[error("adjusted quantity is below the minimum tradeable quantity")]
    MinQuantity,
    #[error("order notional is below the venue's minimum notional")]
    MinNotional,
    #[error("quantity could not be aligned to the venue's step size")]
    Step,
    #[error("price could not be aligned to the venue's tick size")]
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedOrder {
    pub adjusted_quantity: Decimal,
    pub adjusted_price: Option<Decimal>,
    pub min_quantity: Decimal,
    pub step_size: Decimal,
    pub min_notional: Decimal,
}

/// Floors `value` to the nearest non-negative multiple of `step`.
/// `step <= 0` is treated as "no quantization" (returns `value` as-is) —
/// callers are expected to have validated `step > 0` in `PrecisionRules`
/// coming from a real venue; this guards test/mock fixtures only.
fn floor_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).floor() * step
}

fn round_to_tick(value: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return value;
    }
    (value / tick).round() * tick
}

/// `validate_order_params` (spec §4.3). Quantity is required and must be
/// `> 0`; price is optional (MARKET orders may have none yet).
pub fn validate_order_params(
    rules: &PrecisionRules,
    quantity: Decimal,
    price: Option<Decimal>,
) -> Result<QuantizedOrder, QuantizeError> {
    let adjusted_quantity = floor_to_step(quantity, rules.step_size);

    // A non-zero input that floors to zero is reported as `min_quantity`,
    // not a generic step failure, so callers can tell "too small" apart
    // from "not a multiple of the step" (spec §4.3).
    if adjusted_quantity <= Decimal::ZERO {
        return Err(QuantizeError::MinQuantity);
    }
    if adjusted_quantity < rules.min_qty {
        return Err(QuantizeError::MinQuantity);
    }

    let adjusted_price = price.map(|p| round_to_tick(p, rules.tick_size));

    if let Some(adjusted_price) = adjusted_price {
        if adjusted_price <= Decimal::ZERO {
            return Err(QuantizeError::Tick);
        }
        let notional = adjusted_quantity * adjusted_price;
        if notional < rules.min_notional {
            return Err(QuantizeError::MinNotional);
        }
    }

    Ok(QuantizedOrder {
        adjusted_quantity,
        adjusted_price,
        min_quantity: rules.min_qty,
        step_size: rules.step_size,
        min_notional: rules.min_notional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rules() -> PrecisionRules {
        PrecisionRules {
            step_size: dec!(0.001),
            tick_size: dec!(0.01),
            min_notional: dec!(10),
            min_qty: dec!(0.001),
        }
    }

    #[test]
    fn floors_quantity_to_step() {
        let result = validate_order_params(&rules(), dec!(0.0239), Some(dec!(50000))).unwrap();
        assert_eq!(result.adjusted_quantity, dec!(0.023));
    }

    #[test]
    fn zero_adjusted_quantity_is_a_min_quantity_error() {
        let err = validate_order_params(&rules(), dec!(0.0001), Some(dec!(50000))).unwrap_err();
        assert_eq!(err, QuantizeError::MinQuantity);
    }

    #[test]
    fn below_min_notional_is_rejected() {
        // 0.001 * 100 = 0.1 notional < 10 minimum
        let err = validate_order_params(&rules(), dec!(0.001), Some(dec!(100))).unwrap_err();
        assert_eq!(err, QuantizeError::MinNotional);
    }

    #[test]
    fn price_rounds_to_nearest_tick() {
        let result = validate_order_params(&rules(), dec!(1), Some(dec!(50000.004))).unwrap();
        assert_eq!(result.adjusted_price, Some(dec!(50000.00)));
    }
}
