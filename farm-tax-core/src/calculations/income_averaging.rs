//! Farm income averaging allocation.
//!
//! Only the allocation is computed: the elected farm income (current income
//! above the three-year prior average) is spread evenly across the three
//! prior years. Taxing each allocation at that year's marginal rate needs
//! the prior years' rates and taxable incomes, which the caller has to
//! supply; nothing here recomputes prior-year tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::round_half_up;

pub const PRIOR_YEARS: usize = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AveragingError {
    #[error("income averaging needs exactly {expected} prior-year incomes, got {got}")]
    WrongPriorYearCount { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeAveragingResult {
    pub current_year_income: Decimal,
    pub prior_year_incomes: [Decimal; PRIOR_YEARS],
    pub average_prior_income: Decimal,
    pub elected_farm_income: Decimal,
    pub allocated_per_year: Decimal,
    /// Per prior year, oldest first. The last entry absorbs any rounding
    /// remainder so the allocations add up to the elected amount.
    pub allocations: [Decimal; PRIOR_YEARS],
}

pub fn calculate_farm_income_averaging(
    current_year_income: Decimal,
    prior_year_incomes: &[Decimal],
) -> Result<IncomeAveragingResult, AveragingError> {
    let prior_year_incomes: [Decimal; PRIOR_YEARS] =
        prior_year_incomes
            .try_into()
            .map_err(|_| AveragingError::WrongPriorYearCount {
                expected: PRIOR_YEARS,
                got: prior_year_incomes.len(),
            })?;

    let divisor = Decimal::from(PRIOR_YEARS as u64);
    let average_prior_income =
        round_half_up(prior_year_incomes.iter().sum::<Decimal>() / divisor);
    let elected_farm_income =
        round_half_up(current_year_income - average_prior_income).max(Decimal::ZERO);
    let allocated_per_year = round_half_up(elected_farm_income / divisor);
    let allocations = [
        allocated_per_year,
        allocated_per_year,
        elected_farm_income - allocated_per_year * Decimal::TWO,
    ];

    debug!(
        average_prior_income = %average_prior_income,
        elected_farm_income = %elected_farm_income,
        "Allocated elected farm income"
    );

    Ok(IncomeAveragingResult {
        current_year_income,
        prior_year_incomes,
        average_prior_income,
        elected_farm_income,
        allocated_per_year,
        allocations,
    })
}
