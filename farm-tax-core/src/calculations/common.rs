//! Rounding shared by every calculator.
//!
//! Money amounts are rounded to cents where they are produced, so totals
//! built from them are exact sums. Rates derived from two totals are
//! rounded to four places.

use rust_decimal::{Decimal, RoundingStrategy};

const MONEY_PLACES: u32 = 2;
const RATE_PLACES: u32 = 4;

/// Midpoints round away from zero, for money and rates alike.
const STRATEGY: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Rounds a money amount to cents, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use farm_tax_core::calculations::common::round_half_up;
///
/// // 46175.00 × 2.9%
/// assert_eq!(round_half_up(dec!(1339.075)), dec!(1339.08));
/// assert_eq!(round_half_up(dec!(-11082.005)), dec!(-11082.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_PLACES, STRATEGY)
}

/// `numerator / denominator` to four places; zero when the denominator is
/// zero or negative.
///
/// ```
/// use rust_decimal_macros::dec;
/// use farm_tax_core::calculations::common::rate_of;
///
/// assert_eq!(rate_of(dec!(12106), dec!(100000)), dec!(0.1211));
/// assert_eq!(rate_of(dec!(500), dec!(0)), dec!(0));
/// ```
pub fn rate_of(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (numerator / denominator).round_dp_with_strategy(RATE_PLACES, STRATEGY)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_half_cent_up() {
        // 92.35 × 2.9% = 2.67815
        assert_eq!(round_half_up(dec!(2.67815)), dec!(2.68));
        assert_eq!(round_half_up(dec!(23350.005)), dec!(23350.01));
    }

    #[test]
    fn round_half_up_drops_fraction_below_half_cent() {
        // 92.35 × 12.4% = 11.4514
        assert_eq!(round_half_up(dec!(11.4514)), dec!(11.45));
    }

    #[test]
    fn round_half_up_rounds_losses_away_from_zero() {
        assert_eq!(round_half_up(dec!(-0.125)), dec!(-0.13));
    }

    // =========================================================================
    // rate_of tests
    // =========================================================================

    #[test]
    fn rate_of_rounds_effective_rate_to_four_places() {
        assert_eq!(rate_of(dec!(26605.58), dec!(101617.23)), dec!(0.2618));
        assert_eq!(rate_of(dec!(1), dec!(3)), dec!(0.3333));
    }

    #[test]
    fn rate_of_rounds_midpoint_up() {
        assert_eq!(rate_of(dec!(123.45), dec!(1000)), dec!(0.1235));
    }

    #[test]
    fn rate_of_returns_zero_without_positive_denominator() {
        assert_eq!(rate_of(dec!(100.00), dec!(0.00)), dec!(0));
        assert_eq!(rate_of(dec!(100.00), dec!(-5000.00)), dec!(0));
    }
}
