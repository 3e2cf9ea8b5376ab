//! State income tax on AGI carried over from the federal chain.
//!
//! State AGI is net farm profit plus other income minus the federal
//! deductible SE tax; no state-specific additions or subtractions are
//! modeled. Taxable income is state AGI less the deduction and exemptions,
//! floored at zero, and is taxed on the state's bracket schedule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{rate_of, round_half_up};
use crate::calculations::{
    BracketTaxEvaluator, BracketTaxResult, DeductionChoice, DeductionType, TaxCalculationError,
};
use crate::{
    FilingStatusCode, ScheduleKey, StateCode, StateRules, TableError, TaxBracketSchedule,
    TaxTables,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateTaxError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount { field: &'static str, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxInput {
    pub state_agi: Decimal,
    pub exemptions: i32,
    pub dependents: i32,
    pub deduction: DeductionChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxResult {
    pub state: StateCode,
    pub tax_year: i32,
    pub state_agi: Decimal,
    pub deduction_type: DeductionType,
    pub deduction_amount: Decimal,
    pub personal_exemptions: Decimal,
    pub dependent_exemptions: Decimal,
    pub total_exemptions: Decimal,
    pub taxable_income: Decimal,
    pub income_tax: BracketTaxResult,
    pub total_state_tax: Decimal,
    /// Total state tax ÷ state AGI, zero when state AGI is zero or negative.
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct StateTaxCalculator<'a> {
    state: StateCode,
    tax_year: i32,
    schedule: &'a TaxBracketSchedule,
    standard_deduction: Decimal,
    rules: &'a StateRules,
}

impl<'a> StateTaxCalculator<'a> {
    pub fn new(
        tables: &'a TaxTables,
        state: StateCode,
        filing_status: FilingStatusCode,
        tax_year: i32,
    ) -> Result<Self, TableError> {
        let key = ScheduleKey::state(state.clone(), tax_year, filing_status);
        Ok(Self {
            schedule: tables.schedule(&key)?,
            standard_deduction: tables.standard_deduction(&key)?,
            rules: tables.state_rules(&state, tax_year)?,
            state,
            tax_year,
        })
    }

    pub fn state(&self) -> &StateCode {
        &self.state
    }

    pub fn calculate_state_income_tax(
        &self,
        input: &StateTaxInput,
    ) -> Result<StateTaxResult, TaxCalculationError> {
        let exemptions = non_negative("exemptions", input.exemptions)?;
        let dependents = non_negative("dependents", input.dependents)?;

        let (deduction_type, deduction_amount) = self.determine_deduction(input.deduction);
        let personal_exemptions = round_half_up(exemptions * self.rules.personal_exemption);
        let dependent_exemptions = round_half_up(dependents * self.rules.dependent_exemption);
        let total_exemptions = personal_exemptions + dependent_exemptions;

        let taxable_income =
            (input.state_agi - deduction_amount - total_exemptions).max(Decimal::ZERO);
        let income_tax = BracketTaxEvaluator::new(self.schedule).calculate(taxable_income);
        let total_state_tax = income_tax.total_tax;

        debug!(
            state = %self.state,
            state_agi = %input.state_agi,
            deduction = %deduction_amount,
            exemptions = %total_exemptions,
            taxable_income = %taxable_income,
            tax = %total_state_tax,
            "Calculated state income tax"
        );

        Ok(StateTaxResult {
            state: self.state.clone(),
            tax_year: self.tax_year,
            state_agi: input.state_agi,
            deduction_type,
            deduction_amount,
            personal_exemptions,
            dependent_exemptions,
            total_exemptions,
            taxable_income,
            effective_rate: rate_of(total_state_tax, input.state_agi),
            income_tax,
            total_state_tax,
        })
    }

    /// Derives state AGI from the federal figures, then calculates the tax.
    pub fn calculate_state_farm_tax(
        &self,
        net_farm_profit: Decimal,
        other_income: Decimal,
        federal_se_tax_deduction: Decimal,
        exemptions: i32,
        dependents: i32,
        deduction: DeductionChoice,
    ) -> Result<StateTaxResult, TaxCalculationError> {
        let state_agi = round_half_up(net_farm_profit + other_income - federal_se_tax_deduction);
        self.calculate_state_income_tax(&StateTaxInput {
            state_agi,
            exemptions,
            dependents,
            deduction,
        })
    }

    fn determine_deduction(
        &self,
        choice: DeductionChoice,
    ) -> (DeductionType, Decimal) {
        match choice {
            DeductionChoice::Standard => (DeductionType::Standard, self.standard_deduction),
            DeductionChoice::Itemized(amount) if self.rules.allows_federal_itemized => (
                DeductionType::Itemized,
                round_half_up(amount.max(Decimal::ZERO)),
            ),
            DeductionChoice::Itemized(amount) => {
                warn!(
                    state = %self.state,
                    itemized = %amount,
                    "State does not allow the federal itemized deduction; using zero"
                );
                (DeductionType::Itemized, Decimal::ZERO)
            }
        }
    }
}

fn non_negative(
    field: &'static str,
    value: i32,
) -> Result<Decimal, StateTaxError> {
    if value < 0 {
        return Err(StateTaxError::NegativeCount { field, value });
    }
    Ok(Decimal::from(value))
}
