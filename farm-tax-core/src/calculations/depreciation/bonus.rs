use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DepreciationError;
use crate::calculations::common::round_half_up;
use crate::{BonusRateSchedule, TableError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusResult {
    pub rate: Decimal,
    pub bonus_amount: Decimal,
    pub remaining_basis: Decimal,
}

/// Bonus depreciation on the basis left after Section 179, at the rate in
/// force for the year the asset was placed in service.
pub fn compute_bonus(
    schedule: &BonusRateSchedule,
    remaining_basis: Decimal,
    placed_in_service_year: i32,
) -> Result<BonusResult, DepreciationError> {
    if remaining_basis < Decimal::ZERO {
        return Err(DepreciationError::NegativeBasis(remaining_basis));
    }
    let rate = schedule
        .rate_for(placed_in_service_year)
        .ok_or(TableError::EmptyBonusSchedule)?;

    let bonus_amount = round_half_up(remaining_basis * rate);

    debug!(
        placed_in_service_year,
        rate = %rate,
        bonus_amount = %bonus_amount,
        "Applied bonus depreciation"
    );

    Ok(BonusResult {
        rate,
        bonus_amount,
        remaining_basis: remaining_basis - bonus_amount,
    })
}
