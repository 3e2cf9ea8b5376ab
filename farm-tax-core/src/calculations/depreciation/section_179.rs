use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DepreciationError;
use crate::DepreciationLimits;
use crate::calculations::common::round_half_up;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section179Result {
    pub deduction: Decimal,
    /// Limit after the investment phase-out.
    pub max_available: Decimal,
    pub remaining_basis: Decimal,
    pub fully_expensed: bool,
}

/// Computes the Section 179 deduction for one asset.
///
/// The year's limit is reduced dollar for dollar by the amount
/// `total_equipment_placed` exceeds the phase-out threshold, floored at zero.
/// The deduction is the smallest of the elected amount (the full cost when
/// absent), the cost, and the reduced limit. When `total_equipment_placed`
/// is absent no phase-out applies.
pub fn compute_section_179(
    asset_cost: Decimal,
    total_equipment_placed: Option<Decimal>,
    elected_amount: Option<Decimal>,
    limits: &DepreciationLimits,
) -> Result<Section179Result, DepreciationError> {
    if asset_cost < Decimal::ZERO {
        return Err(DepreciationError::NegativeCost(asset_cost));
    }
    if let Some(elected) = elected_amount.filter(|amount| *amount < Decimal::ZERO) {
        return Err(DepreciationError::NegativeElection(elected));
    }

    let excess = total_equipment_placed
        .map(|total| (total - limits.phase_out_threshold).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);
    let max_available = (limits.section_179_limit - excess).max(Decimal::ZERO);
    if max_available.is_zero() && excess > Decimal::ZERO {
        warn!(
            total_equipment_placed = ?total_equipment_placed,
            phase_out_threshold = %limits.phase_out_threshold,
            "Section 179 fully phased out by equipment placed in service"
        );
    }

    let deduction = round_half_up(
        elected_amount
            .unwrap_or(asset_cost)
            .min(asset_cost)
            .min(max_available),
    );
    let remaining_basis = asset_cost - deduction;

    debug!(
        asset_cost = %asset_cost,
        max_available = %max_available,
        deduction = %deduction,
        "Applied Section 179"
    );

    Ok(Section179Result {
        deduction,
        max_available,
        remaining_basis,
        fully_expensed: remaining_basis <= Decimal::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn limits_2024() -> DepreciationLimits {
        DepreciationLimits {
            tax_year: 2024,
            section_179_limit: dec!(1220000),
            phase_out_threshold: dec!(3050000),
        }
    }

    #[test]
    fn compute_section_179_uses_elected_amount() {
        let result = compute_section_179(dec!(100000), None, Some(dec!(50000)), &limits_2024())
            .unwrap();

        assert_eq!(
            result,
            Section179Result {
                deduction: dec!(50000),
                max_available: dec!(1220000),
                remaining_basis: dec!(50000),
                fully_expensed: false,
            }
        );
    }

    #[test]
    fn compute_section_179_defaults_to_full_cost() {
        let result = compute_section_179(dec!(85000), None, None, &limits_2024()).unwrap();

        assert_eq!(result.deduction, dec!(85000));
        assert!(result.fully_expensed);
    }

    #[test]
    fn compute_section_179_caps_election_at_cost() {
        let result =
            compute_section_179(dec!(40000), None, Some(dec!(60000)), &limits_2024()).unwrap();

        assert_eq!(result.deduction, dec!(40000));
        assert_eq!(result.remaining_basis, dec!(0));
    }

    #[test]
    fn compute_section_179_phases_out_dollar_for_dollar() {
        let result = compute_section_179(
            dec!(1500000),
            Some(dec!(3250000)),
            None,
            &limits_2024(),
        )
        .unwrap();

        // 1220000 − (3250000 − 3050000)
        assert_eq!(result.max_available, dec!(1020000));
        assert_eq!(result.deduction, dec!(1020000));
        assert_eq!(result.remaining_basis, dec!(480000));
    }

    #[test]
    fn compute_section_179_floors_phase_out_at_zero() {
        let result = compute_section_179(
            dec!(100000),
            Some(dec!(5000000)),
            None,
            &limits_2024(),
        )
        .unwrap();

        assert_eq!(result.max_available, dec!(0));
        assert_eq!(result.deduction, dec!(0));
        assert_eq!(result.remaining_basis, dec!(100000));
    }

    #[test]
    fn compute_section_179_skips_phase_out_without_equipment_total() {
        let result = compute_section_179(dec!(4000000), None, None, &limits_2024()).unwrap();

        assert_eq!(result.max_available, dec!(1220000));
        assert_eq!(result.deduction, dec!(1220000));
        assert_eq!(result.remaining_basis, dec!(2780000));
        assert!(!result.fully_expensed);
    }

    #[test]
    fn compute_section_179_rejects_negative_cost() {
        let result = compute_section_179(dec!(-1), None, None, &limits_2024());

        assert_eq!(result, Err(DepreciationError::NegativeCost(dec!(-1))));
    }

    #[test]
    fn compute_section_179_rejects_negative_election() {
        let result = compute_section_179(dec!(1000), None, Some(dec!(-5)), &limits_2024());

        assert_eq!(result, Err(DepreciationError::NegativeElection(dec!(-5))));
    }
}
