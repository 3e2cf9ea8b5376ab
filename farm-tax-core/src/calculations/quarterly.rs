//! Quarterly estimated payments and the safe-harbor required annual payment.
//!
//! The required annual payment is the smaller of:
//!
//! | Line | Description |
//! |------|-------------|
//! | 1    | Estimated current-year tax × 90% (66⅔% for farmers) |
//! | 2    | Prior-year tax × 100% (110% when prior-year AGI exceeds $150,000) |

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::TaxYearConfig;
use crate::calculations::common::round_half_up;

pub const QUARTERS: usize = 4;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuarterlyError {
    #[error("estimated annual tax must be non-negative, got {0}")]
    NegativeEstimate(Decimal),

    #[error("payment for quarter {quarter} must be non-negative, got {amount}")]
    NegativePayment { quarter: usize, amount: Decimal },

    #[error("no payment calendar for tax year {0}")]
    InvalidTaxYear(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyPayment {
    pub quarter: usize,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyEstimate {
    pub estimated_annual_tax: Decimal,
    pub quarterly_amount: Decimal,
    pub total_paid: Decimal,
    pub remaining_due: Decimal,
    pub unpaid_quarters: usize,
    pub recommended_next_payment: Decimal,
    pub schedule: Vec<QuarterlyPayment>,
}

/// Splits `estimated_annual_tax` into four installments and recommends the
/// next payment given what has been paid so far.
///
/// A quarter with a zero payment counts as unpaid. The remaining balance is
/// spread across the unpaid quarters.
pub fn estimate_quarterly_taxes(
    tax_year: i32,
    estimated_annual_tax: Decimal,
    payments_made: [Decimal; QUARTERS],
) -> Result<QuarterlyEstimate, QuarterlyError> {
    if estimated_annual_tax < Decimal::ZERO {
        return Err(QuarterlyError::NegativeEstimate(estimated_annual_tax));
    }
    if let Some((index, amount)) = payments_made
        .iter()
        .enumerate()
        .find(|(_, amount)| **amount < Decimal::ZERO)
    {
        return Err(QuarterlyError::NegativePayment {
            quarter: index + 1,
            amount: *amount,
        });
    }

    let quarterly_amount = round_half_up(estimated_annual_tax / Decimal::from(QUARTERS as u64));
    let total_paid: Decimal = payments_made.iter().sum();
    let remaining_due = (estimated_annual_tax - total_paid).max(Decimal::ZERO);
    let unpaid_quarters = payments_made.iter().filter(|p| p.is_zero()).count();
    let recommended_next_payment = if unpaid_quarters > 0 && remaining_due > Decimal::ZERO {
        round_half_up(remaining_due / Decimal::from(unpaid_quarters as u64))
    } else {
        Decimal::ZERO
    };

    let schedule = due_dates(tax_year)?
        .into_iter()
        .zip(payments_made)
        .enumerate()
        .map(|(index, (due_date, paid))| QuarterlyPayment {
            quarter: index + 1,
            due_date,
            // The fourth installment absorbs the rounding remainder.
            amount: if index + 1 == QUARTERS {
                estimated_annual_tax - quarterly_amount * Decimal::from(3)
            } else {
                quarterly_amount
            },
            paid,
        })
        .collect();

    debug!(
        estimated_annual_tax = %estimated_annual_tax,
        total_paid = %total_paid,
        remaining_due = %remaining_due,
        unpaid_quarters,
        "Estimated quarterly payments"
    );

    Ok(QuarterlyEstimate {
        estimated_annual_tax,
        quarterly_amount,
        total_paid,
        remaining_due,
        unpaid_quarters,
        recommended_next_payment,
        schedule,
    })
}

/// April 15, June 15, September 15, and January 15 of the following year.
fn due_dates(tax_year: i32) -> Result<[NaiveDate; QUARTERS], QuarterlyError> {
    let date = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, 15).ok_or(QuarterlyError::InvalidTaxYear(tax_year))
    };
    Ok([
        date(tax_year, 4)?,
        date(tax_year, 6)?,
        date(tax_year, 9)?,
        date(tax_year + 1, 1)?,
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarborInput {
    pub estimated_current_year_tax: Decimal,
    pub prior_year_tax: Decimal,
    pub prior_year_agi: Decimal,
    pub is_farmer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarborResult {
    pub current_year_requirement: Decimal,
    pub prior_year_requirement: Decimal,
    pub required_annual_payment: Decimal,
}

/// Required annual payment to avoid an underpayment penalty.
pub fn required_annual_payment(
    config: &TaxYearConfig,
    input: &SafeHarborInput,
) -> SafeHarborResult {
    let current_year_factor = if input.is_farmer {
        config.farmer_current_year_factor
    } else {
        config.safe_harbor_current_year_factor
    };
    let prior_year_factor = if input.prior_year_agi > config.high_income_agi_threshold {
        config.high_income_prior_year_factor
    } else {
        config.safe_harbor_prior_year_factor
    };

    let current_year_requirement =
        round_half_up(input.estimated_current_year_tax * current_year_factor);
    let prior_year_requirement = round_half_up(input.prior_year_tax * prior_year_factor);

    SafeHarborResult {
        current_year_requirement,
        prior_year_requirement,
        required_annual_payment: current_year_requirement.min(prior_year_requirement),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxTables;

    fn date(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn test_config() -> TaxYearConfig {
        TaxTables::tax_year_2024().year_config(2024).unwrap().clone()
    }

    // =========================================================================
    // estimate_quarterly_taxes tests
    // =========================================================================

    #[test]
    fn estimate_with_no_payments_splits_evenly() {
        let result = estimate_quarterly_taxes(2024, dec!(20000), [Decimal::ZERO; 4]).unwrap();

        assert_eq!(result.quarterly_amount, dec!(5000.00));
        assert_eq!(result.remaining_due, dec!(20000));
        assert_eq!(result.unpaid_quarters, 4);
        assert_eq!(result.recommended_next_payment, dec!(5000.00));
        assert_eq!(
            result
                .schedule
                .iter()
                .map(|q| q.due_date)
                .collect::<Vec<_>>(),
            vec![
                date(2024, 4, 15),
                date(2024, 6, 15),
                date(2024, 9, 15),
                date(2025, 1, 15),
            ]
        );
    }

    #[test]
    fn estimate_spreads_remaining_over_unpaid_quarters() {
        let result = estimate_quarterly_taxes(
            2024,
            dec!(20000),
            [dec!(5000), dec!(3000), dec!(0), dec!(0)],
        )
        .unwrap();

        assert_eq!(result.total_paid, dec!(8000));
        assert_eq!(result.remaining_due, dec!(12000));
        assert_eq!(result.unpaid_quarters, 2);
        assert_eq!(result.recommended_next_payment, dec!(6000.00));
    }

    #[test]
    fn estimate_recommends_nothing_when_all_quarters_paid() {
        let result = estimate_quarterly_taxes(
            2024,
            dec!(20000),
            [dec!(4000), dec!(4000), dec!(4000), dec!(4000)],
        )
        .unwrap();

        assert_eq!(result.remaining_due, dec!(4000));
        assert_eq!(result.unpaid_quarters, 0);
        assert_eq!(result.recommended_next_payment, dec!(0));
    }

    #[test]
    fn estimate_floors_remaining_at_zero_when_overpaid() {
        let result = estimate_quarterly_taxes(
            2024,
            dec!(10000),
            [dec!(12000), dec!(0), dec!(0), dec!(0)],
        )
        .unwrap();

        assert_eq!(result.remaining_due, dec!(0));
        assert_eq!(result.recommended_next_payment, dec!(0));
    }

    #[test]
    fn estimate_schedule_sums_to_annual_tax() {
        let result = estimate_quarterly_taxes(2024, dec!(10000.02), [Decimal::ZERO; 4]).unwrap();

        // 2500.005 rounds up for the first three installments
        let total: Decimal = result.schedule.iter().map(|q| q.amount).sum();
        assert_eq!(total, dec!(10000.02));
        assert_eq!(result.quarterly_amount, dec!(2500.01));
        assert_eq!(result.schedule[3].amount, dec!(2499.99));
    }

    #[test]
    fn estimate_rejects_negative_payment() {
        let result = estimate_quarterly_taxes(
            2024,
            dec!(10000),
            [dec!(0), dec!(-5), dec!(0), dec!(0)],
        );

        assert_eq!(
            result,
            Err(QuarterlyError::NegativePayment {
                quarter: 2,
                amount: dec!(-5),
            })
        );
    }

    // =========================================================================
    // required_annual_payment tests
    // =========================================================================

    #[test]
    fn required_annual_payment_uses_smaller_requirement() {
        let result = required_annual_payment(
            &test_config(),
            &SafeHarborInput {
                estimated_current_year_tax: dec!(10000),
                prior_year_tax: dec!(12000),
                prior_year_agi: dec!(90000),
                is_farmer: false,
            },
        );

        assert_eq!(result.current_year_requirement, dec!(9000.00));
        assert_eq!(result.prior_year_requirement, dec!(12000.00));
        assert_eq!(result.required_annual_payment, dec!(9000.00));
    }

    #[test]
    fn required_annual_payment_uses_two_thirds_for_farmers() {
        let result = required_annual_payment(
            &test_config(),
            &SafeHarborInput {
                estimated_current_year_tax: dec!(10000),
                prior_year_tax: dec!(12000),
                prior_year_agi: dec!(90000),
                is_farmer: true,
            },
        );

        assert_eq!(result.current_year_requirement, dec!(6666.67));
    }

    #[test]
    fn required_annual_payment_applies_110_percent_for_high_income() {
        let result = required_annual_payment(
            &test_config(),
            &SafeHarborInput {
                estimated_current_year_tax: dec!(50000),
                prior_year_tax: dec!(30000),
                prior_year_agi: dec!(200000),
                is_farmer: false,
            },
        );

        assert_eq!(result.prior_year_requirement, dec!(33000.00));
        assert_eq!(result.required_annual_payment, dec!(33000.00));
    }
}
