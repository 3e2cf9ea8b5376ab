//! Marginal-rate evaluation shared by every jurisdiction.
//!
//! Each bracket taxes only the slice of income between its lower bound and
//! the smaller of its upper bound or the taxable amount. The per-bracket tax
//! is rounded to cents and the total is the sum of those rounded amounts, so
//! the breakdown always adds up to the total.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use farm_tax_core::calculations::BracketTaxEvaluator;
//! use farm_tax_core::{FilingStatusCode, ScheduleKey, TaxTables};
//!
//! let tables = TaxTables::tax_year_2024();
//! let schedule = tables
//!     .schedule(&ScheduleKey::federal(2024, FilingStatusCode::MarriedFilingJointly))
//!     .unwrap();
//!
//! let result = BracketTaxEvaluator::new(schedule).calculate(dec!(100000));
//!
//! // 23200 × 10% + 71100 × 12% + 5700 × 22%
//! assert_eq!(result.total_tax, dec!(12106.00));
//! assert_eq!(result.breakdown.len(), 3);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TaxBracketSchedule;
use crate::calculations::common::{rate_of, round_half_up};

/// Tax attributed to a single bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub taxable_in_bracket: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTaxResult {
    pub taxable_income: Decimal,
    pub total_tax: Decimal,
    /// Total tax ÷ taxable income, zero when there is no taxable income.
    pub effective_rate: Decimal,
    /// Rate of the bracket the last dollar falls in.
    pub marginal_rate: Decimal,
    pub breakdown: Vec<BracketTax>,
}

impl BracketTaxResult {
    fn zero(taxable_income: Decimal) -> Self {
        Self {
            taxable_income,
            total_tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            marginal_rate: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BracketTaxEvaluator<'a> {
    schedule: &'a TaxBracketSchedule,
}

impl<'a> BracketTaxEvaluator<'a> {
    pub fn new(schedule: &'a TaxBracketSchedule) -> Self {
        Self { schedule }
    }

    /// Applies the schedule to `taxable_income`.
    ///
    /// Zero or negative income is not an error: it yields zero tax and an
    /// empty breakdown.
    pub fn calculate(
        &self,
        taxable_income: Decimal,
    ) -> BracketTaxResult {
        if taxable_income <= Decimal::ZERO {
            return BracketTaxResult::zero(taxable_income);
        }

        let breakdown: Vec<BracketTax> = self
            .schedule
            .brackets()
            .iter()
            .take_while(|bracket| bracket.min_income < taxable_income)
            .map(|bracket| {
                let upper = bracket
                    .max_income
                    .map_or(taxable_income, |max| max.min(taxable_income));
                let taxable_in_bracket = upper - bracket.min_income;
                BracketTax {
                    min_income: bracket.min_income,
                    max_income: bracket.max_income,
                    rate: bracket.tax_rate,
                    taxable_in_bracket,
                    tax: round_half_up(taxable_in_bracket * bracket.tax_rate),
                }
            })
            .collect();

        let total_tax: Decimal = breakdown.iter().map(|b| b.tax).sum();
        let marginal_rate = breakdown.last().map_or(Decimal::ZERO, |b| b.rate);
        let effective_rate = rate_of(total_tax, taxable_income);

        debug!(
            taxable_income = %taxable_income,
            total_tax = %total_tax,
            brackets_used = breakdown.len(),
            "Applied bracket schedule"
        );

        BracketTaxResult {
            taxable_income,
            total_tax,
            effective_rate,
            marginal_rate,
            breakdown,
        }
    }
}
