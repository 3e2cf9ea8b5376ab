use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DepreciationError;
use crate::calculations::common::round_half_up;
use crate::{Convention, MacrsTables, MidMonthTable, RecoveryClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacrsResult {
    pub rate: Decimal,
    pub depreciation: Decimal,
    /// This is the last year the class recovers anything.
    pub final_year: bool,
    /// The requested year lies past the end of recovery, or there was no
    /// basis left to recover.
    pub fully_depreciated: bool,
}

impl MacrsResult {
    fn exhausted() -> Self {
        Self {
            rate: Decimal::ZERO,
            depreciation: Decimal::ZERO,
            final_year: false,
            fully_depreciated: true,
        }
    }
}

/// Rate for one year and whether it is the last one.
struct YearRate {
    rate: Decimal,
    final_year: bool,
}

/// One year of MACRS on `basis`.
///
/// The class's convention picks the table. Half-year classes read the
/// 1-based `year_in_service` entry of their percentage table. Mid-month
/// classes take the first-year rate for the month placed in service and the
/// annual rate afterwards. A class whose table is missing recovers
/// `1 / recovery_period` a year.
pub fn compute_macrs(
    tables: &MacrsTables,
    basis: Decimal,
    recovery_class: RecoveryClass,
    year_in_service: u32,
    placed_in_service_month: u32,
) -> Result<MacrsResult, DepreciationError> {
    if basis <= Decimal::ZERO {
        return Ok(MacrsResult::exhausted());
    }
    if year_in_service == 0 {
        return Err(DepreciationError::InvalidYearInService(year_in_service));
    }

    let table_rate = match recovery_class.convention() {
        Convention::HalfYear => tables
            .half_year(recovery_class)
            .map(|rates| Ok(half_year_rate(rates, year_in_service))),
        Convention::MidMonth => tables
            .mid_month(recovery_class)
            .map(|table| mid_month_rate(table, year_in_service, placed_in_service_month)),
    };
    let year_rate = match table_rate {
        Some(rate) => rate?,
        None => {
            debug!(
                recovery_class = %recovery_class,
                convention = ?recovery_class.convention(),
                "No percentage table for class; using straight-line"
            );
            straight_line_rate(recovery_class.recovery_period(), year_in_service)
        }
    };

    let Some(YearRate { rate, final_year }) = year_rate else {
        warn!(
            recovery_class = %recovery_class,
            year_in_service,
            "Requested year is past the end of recovery"
        );
        return Ok(MacrsResult::exhausted());
    };

    Ok(MacrsResult {
        rate,
        depreciation: round_half_up(basis * rate),
        final_year,
        fully_depreciated: false,
    })
}

fn half_year_rate(
    rates: &[Decimal],
    year_in_service: u32,
) -> Option<YearRate> {
    let index = usize::try_from(year_in_service).ok()?.checked_sub(1)?;
    rates.get(index).map(|rate| YearRate {
        rate: *rate,
        final_year: index + 1 == rates.len(),
    })
}

/// Later years recover the annual rate until the cumulative rate reaches
/// one; the final year takes what is left.
fn mid_month_rate(
    table: &MidMonthTable,
    year_in_service: u32,
    placed_in_service_month: u32,
) -> Result<Option<YearRate>, DepreciationError> {
    let month_index = usize::try_from(placed_in_service_month)
        .ok()
        .and_then(|month| month.checked_sub(1))
        .filter(|index| *index < 12)
        .ok_or(DepreciationError::InvalidPlacedInServiceMonth(
            placed_in_service_month,
        ))?;
    let first_year = table.first_year_by_month[month_index];
    if year_in_service == 1 {
        return Ok(Some(YearRate {
            rate: first_year,
            final_year: first_year >= Decimal::ONE,
        }));
    }

    let full_years_before = Decimal::from(year_in_service - 2);
    let remaining = Decimal::ONE - first_year - full_years_before * table.annual_rate;
    Ok(capped_rate(table.annual_rate, remaining))
}

fn straight_line_rate(
    recovery_period: Decimal,
    year_in_service: u32,
) -> Option<YearRate> {
    if recovery_period <= Decimal::ZERO {
        return None;
    }
    let annual_rate = Decimal::ONE / recovery_period;
    let remaining = Decimal::ONE - Decimal::from(year_in_service - 1) * annual_rate;
    capped_rate(annual_rate, remaining)
}

fn capped_rate(
    annual_rate: Decimal,
    remaining: Decimal,
) -> Option<YearRate> {
    if remaining <= Decimal::ZERO {
        return None;
    }
    Some(YearRate {
        rate: annual_rate.min(remaining),
        final_year: remaining <= annual_rate,
    })
}
