//! Federal liability for a farm operation.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Net farm profit: income − expenses − depreciation (a loss is allowed) |
//! | 2    | Self-employment tax on step 1 |
//! | 3    | AGI: step 1 + other income − deductible part of SE tax |
//! | 4    | Deduction: standard amount for the filing status, or itemized |
//! | 5    | Taxable income: step 3 − step 4, floored at zero |
//! | 6    | Income tax: bracket schedule applied to step 5 |
//! | 7    | Total federal tax: step 6 + total SE tax |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use farm_tax_core::calculations::{DeductionChoice, FarmTaxInput, FederalTaxCalculator};
//! use farm_tax_core::{FilingStatusCode, TaxTables};
//!
//! let tables = TaxTables::tax_year_2024();
//! let calculator =
//!     FederalTaxCalculator::new(&tables, FilingStatusCode::MarriedFilingJointly, 2024).unwrap();
//!
//! let result = calculator
//!     .calculate_farm_tax_liability(&FarmTaxInput {
//!         total_income: dec!(250000),
//!         total_expenses: dec!(150000),
//!         depreciation: dec!(50000),
//!         other_income: dec!(0),
//!         deduction: DeductionChoice::Standard,
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.net_farm_profit, dec!(50000));
//! assert_eq!(result.agi, dec!(46467.61));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{rate_of, round_half_up};
use crate::calculations::income_averaging::{IncomeAveragingResult, calculate_farm_income_averaging};
use crate::calculations::quarterly::{
    QuarterlyEstimate, SafeHarborInput, SafeHarborResult, estimate_quarterly_taxes,
    required_annual_payment,
};
use crate::calculations::{
    BracketTaxEvaluator, BracketTaxResult, SeTaxCalculator, SeTaxConfig, SeTaxResult,
    TaxCalculationError,
};
use crate::{
    FilingStatusCode, ScheduleKey, TableError, TaxBracketSchedule, TaxTables, TaxYearConfig,
};

/// Which deduction to take against AGI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum DeductionChoice {
    Standard,
    Itemized(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    Standard,
    Itemized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmTaxInput {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub depreciation: Decimal,
    pub other_income: Decimal,
    pub deduction: DeductionChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalTaxResult {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,
    pub net_farm_profit: Decimal,
    pub self_employment_tax: SeTaxResult,
    pub agi: Decimal,
    pub deduction_type: DeductionType,
    pub deduction_amount: Decimal,
    /// The part of the deduction AGI could absorb.
    pub deduction_applied: Decimal,
    pub taxable_income: Decimal,
    pub income_tax: BracketTaxResult,
    pub total_federal_tax: Decimal,
    /// Total federal tax ÷ AGI, zero when AGI is zero or negative.
    pub effective_total_rate: Decimal,
}

/// Federal calculator for one filing status and tax year.
///
/// The bracket schedule, standard deduction, and year configuration are
/// selected from the tables at construction.
#[derive(Debug, Clone)]
pub struct FederalTaxCalculator<'a> {
    tax_year: i32,
    filing_status: FilingStatusCode,
    schedule: &'a TaxBracketSchedule,
    standard_deduction: Decimal,
    year_config: &'a TaxYearConfig,
}

impl<'a> FederalTaxCalculator<'a> {
    pub fn new(
        tables: &'a TaxTables,
        filing_status: FilingStatusCode,
        tax_year: i32,
    ) -> Result<Self, TableError> {
        let key = ScheduleKey::federal(tax_year, filing_status);
        Ok(Self {
            tax_year,
            filing_status,
            schedule: tables.schedule(&key)?,
            standard_deduction: tables.standard_deduction(&key)?,
            year_config: tables.year_config(tax_year)?,
        })
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn filing_status(&self) -> FilingStatusCode {
        self.filing_status
    }

    pub fn standard_deduction(&self) -> Decimal {
        self.standard_deduction
    }

    pub fn calculate_self_employment_tax(
        &self,
        net_farm_profit: Decimal,
    ) -> Result<SeTaxResult, TaxCalculationError> {
        let config = SeTaxConfig::from_tax_year_config(self.year_config, self.filing_status);
        Ok(SeTaxCalculator::new(config).calculate(net_farm_profit)?)
    }

    pub fn calculate_income_tax(
        &self,
        taxable_income: Decimal,
    ) -> BracketTaxResult {
        BracketTaxEvaluator::new(self.schedule).calculate(taxable_income)
    }

    pub fn calculate_farm_tax_liability(
        &self,
        input: &FarmTaxInput,
    ) -> Result<FederalTaxResult, TaxCalculationError> {
        let net_farm_profit =
            round_half_up(input.total_income - input.total_expenses - input.depreciation);
        if net_farm_profit < Decimal::ZERO {
            warn!(
                net_farm_profit = %net_farm_profit,
                "Farm operation shows a loss"
            );
        }

        let self_employment_tax = self.calculate_self_employment_tax(net_farm_profit)?;
        let agi = round_half_up(
            net_farm_profit + input.other_income - self_employment_tax.deductible_se_tax,
        );

        let (deduction_type, deduction_amount) = self.determine_deduction(input.deduction);
        let deduction_applied = deduction_amount.min(agi.max(Decimal::ZERO));
        if deduction_amount > deduction_applied {
            warn!(
                agi = %agi,
                deduction = %deduction_amount,
                "Deduction exceeds AGI; taxable income floored at zero"
            );
        }
        let taxable_income = (agi - deduction_amount).max(Decimal::ZERO);

        let income_tax = self.calculate_income_tax(taxable_income);
        let total_federal_tax = income_tax.total_tax + self_employment_tax.total_se_tax;
        let effective_total_rate = rate_of(total_federal_tax, agi);

        debug!(
            net_farm_profit = %net_farm_profit,
            agi = %agi,
            taxable_income = %taxable_income,
            income_tax = %income_tax.total_tax,
            se_tax = %self_employment_tax.total_se_tax,
            "Calculated federal farm tax"
        );

        Ok(FederalTaxResult {
            tax_year: self.tax_year,
            filing_status: self.filing_status,
            net_farm_profit,
            self_employment_tax,
            agi,
            deduction_type,
            deduction_amount,
            deduction_applied,
            taxable_income,
            income_tax,
            total_federal_tax,
            effective_total_rate,
        })
    }

    /// See [`calculate_farm_income_averaging`].
    pub fn calculate_farm_income_averaging(
        &self,
        current_year_income: Decimal,
        prior_year_incomes: &[Decimal],
    ) -> Result<IncomeAveragingResult, TaxCalculationError> {
        Ok(calculate_farm_income_averaging(
            current_year_income,
            prior_year_incomes,
        )?)
    }

    /// See [`estimate_quarterly_taxes`]; due dates follow this calculator's
    /// tax year.
    pub fn estimate_quarterly_taxes(
        &self,
        estimated_annual_tax: Decimal,
        payments_made: [Decimal; 4],
    ) -> Result<QuarterlyEstimate, TaxCalculationError> {
        Ok(estimate_quarterly_taxes(
            self.tax_year,
            estimated_annual_tax,
            payments_made,
        )?)
    }

    pub fn required_annual_payment(
        &self,
        input: &SafeHarborInput,
    ) -> SafeHarborResult {
        required_annual_payment(self.year_config, input)
    }

    fn determine_deduction(
        &self,
        choice: DeductionChoice,
    ) -> (DeductionType, Decimal) {
        match choice {
            DeductionChoice::Standard => (DeductionType::Standard, self.standard_deduction),
            DeductionChoice::Itemized(amount) => {
                if amount < Decimal::ZERO {
                    warn!(itemized = %amount, "Negative itemized deduction treated as zero");
                }
                (
                    DeductionType::Itemized,
                    round_half_up(amount.max(Decimal::ZERO)),
                )
            }
        }
    }
}
