//! Federal plus state liability for one filing status and tax year.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use farm_tax_core::calculations::{
//!     CombinedTaxCalculator, DeductionChoice, FarmTaxInput, TaxComputationInput,
//! };
//! use farm_tax_core::{FilingStatusCode, StateCode, TaxTables};
//!
//! let tables = TaxTables::tax_year_2024();
//! let calculator = CombinedTaxCalculator::new(
//!     &tables,
//!     FilingStatusCode::MarriedFilingJointly,
//!     StateCode::new("LA").unwrap(),
//!     2024,
//! )
//! .unwrap();
//!
//! let result = calculator
//!     .calculate_combined_tax(&TaxComputationInput {
//!         farm: FarmTaxInput {
//!             total_income: dec!(250000),
//!             total_expenses: dec!(150000),
//!             depreciation: dec!(50000),
//!             other_income: dec!(0),
//!             deduction: DeductionChoice::Standard,
//!         },
//!         exemptions: 2,
//!         dependents: 0,
//!     })
//!     .unwrap();
//!
//! assert_eq!(result.total_tax_liability, dec!(9581.66));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculations::common::rate_of;
use crate::calculations::{
    FarmTaxInput, FederalTaxCalculator, FederalTaxResult, StateTaxCalculator, StateTaxResult,
    TaxCalculationError,
};
use crate::{FilingStatusCode, StateCode, TableError, TaxTables};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationInput {
    #[serde(flatten)]
    pub farm: FarmTaxInput,
    pub exemptions: i32,
    pub dependents: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,
    pub federal: FederalTaxResult,
    pub state: StateTaxResult,
    pub total_federal_tax: Decimal,
    pub total_state_tax: Decimal,
    pub total_tax_liability: Decimal,
    /// Combined tax ÷ federal AGI, zero when AGI is zero or negative.
    pub combined_effective_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct CombinedTaxCalculator<'a> {
    federal: FederalTaxCalculator<'a>,
    state: StateTaxCalculator<'a>,
}

impl<'a> CombinedTaxCalculator<'a> {
    pub fn new(
        tables: &'a TaxTables,
        filing_status: FilingStatusCode,
        state: StateCode,
        tax_year: i32,
    ) -> Result<Self, TableError> {
        Ok(Self {
            federal: FederalTaxCalculator::new(tables, filing_status, tax_year)?,
            state: StateTaxCalculator::new(tables, state, filing_status, tax_year)?,
        })
    }

    pub fn federal(&self) -> &FederalTaxCalculator<'a> {
        &self.federal
    }

    pub fn state(&self) -> &StateTaxCalculator<'a> {
        &self.state
    }

    /// Runs the federal calculation, feeds its net profit and deductible SE
    /// tax to the state calculation, and sums the two liabilities.
    pub fn calculate_combined_tax(
        &self,
        input: &TaxComputationInput,
    ) -> Result<TaxComputationResult, TaxCalculationError> {
        let federal = self.federal.calculate_farm_tax_liability(&input.farm)?;
        let state = self.state.calculate_state_farm_tax(
            federal.net_farm_profit,
            input.farm.other_income,
            federal.self_employment_tax.deductible_se_tax,
            input.exemptions,
            input.dependents,
            input.farm.deduction,
        )?;

        let total_federal_tax = federal.total_federal_tax;
        let total_state_tax = state.total_state_tax;
        let total_tax_liability = total_federal_tax + total_state_tax;
        let combined_effective_rate = rate_of(total_tax_liability, federal.agi);

        info!(
            tax_year = self.federal.tax_year(),
            state = %self.state.state(),
            total_federal_tax = %total_federal_tax,
            total_state_tax = %total_state_tax,
            total_tax_liability = %total_tax_liability,
            "Calculated combined tax liability"
        );

        Ok(TaxComputationResult {
            tax_year: self.federal.tax_year(),
            filing_status: self.federal.filing_status(),
            federal,
            state,
            total_federal_tax,
            total_state_tax,
            total_tax_liability,
            combined_effective_rate,
        })
    }
}
