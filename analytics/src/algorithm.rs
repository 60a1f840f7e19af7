//! Statistical helpers shared by the metrics in [`crate::metric`]:
//! turning a raw return series into the mean/standard-deviation inputs
//! [`crate::metric::sharpe::SharpeRatio::calculate`] expects.

use rust_decimal::{Decimal, MathematicalOps};

/// Arithmetic mean of `returns`. `None` for an empty series.
pub fn mean_return(returns: &[Decimal]) -> Option<Decimal> {
    if returns.is_empty() {
        return None;
    }
    let sum: Decimal = returns.iter().sum();
    sum.checked_div(Decimal::from(returns.len()))
}

/// Population standard deviation of `returns`. `None` for an empty
/// series; zero for a single-element series.
pub fn std_dev_returns(returns: &[Decimal]) -> Option<Decimal> {
    let mean = mean_return(returns)?;
    let sum_sq_diff: Decimal = returns.iter().map(|r| (*r - mean) * (*r - mean)).sum();
    let variance = sum_sq_diff.checked_div(Decimal::from(returns.len()))?;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mean_of_empty_series_is_none() {
        assert_eq!(mean_return(&[]), None);
    }

    #[test]
    fn mean_and_std_dev_of_a_flat_series() {
        let returns = vec![dec!(0.01), dec!(0.01), dec!(0.01)];
        assert_eq!(mean_return(&returns), Some(dec!(0.01)));
        assert_eq!(std_dev_returns(&returns), Some(Decimal::ZERO));
    }

    #[test]
    fn std_dev_of_a_varying_series() {
        let returns = vec![dec!(0.01), dec!(-0.01)];
        assert_eq!(mean_return(&returns), Some(Decimal::ZERO));
        assert_eq!(std_dev_returns(&returns), Some(dec!(0.01)));
    }
}
