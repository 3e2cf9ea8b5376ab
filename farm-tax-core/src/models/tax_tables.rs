use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    DepreciationLimits, DepreciationTables, FilingStatusCode, Jurisdiction, StateCode,
    StateRules, TaxBracketSchedule, TaxYearConfig,
};

/// A lookup into [`TaxTables`] found nothing for the requested key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("no {jurisdiction} bracket schedule for {tax_year} ({filing_status})")]
    MissingSchedule {
        jurisdiction: Jurisdiction,
        tax_year: i32,
        filing_status: FilingStatusCode,
    },

    #[error("no {jurisdiction} standard deduction for {tax_year} ({filing_status})")]
    MissingStandardDeduction {
        jurisdiction: Jurisdiction,
        tax_year: i32,
        filing_status: FilingStatusCode,
    },

    #[error("no tax year configuration for {0}")]
    MissingYearConfig(i32),

    #[error("no state rules for {state} in {tax_year}")]
    MissingStateRules { state: StateCode, tax_year: i32 },

    #[error("no Section 179 limits for {0}")]
    MissingDepreciationLimits(i32),

    #[error("bonus depreciation schedule is empty")]
    EmptyBonusSchedule,
}

/// Key for jurisdiction-specific tables that vary by year and filing status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    pub jurisdiction: Jurisdiction,
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,
}

impl ScheduleKey {
    pub fn new(
        jurisdiction: Jurisdiction,
        tax_year: i32,
        filing_status: FilingStatusCode,
    ) -> Self {
        Self {
            jurisdiction,
            tax_year,
            filing_status,
        }
    }

    pub fn federal(
        tax_year: i32,
        filing_status: FilingStatusCode,
    ) -> Self {
        Self::new(Jurisdiction::Federal, tax_year, filing_status)
    }

    pub fn state(
        state: StateCode,
        tax_year: i32,
        filing_status: FilingStatusCode,
    ) -> Self {
        Self::new(Jurisdiction::State(state), tax_year, filing_status)
    }
}

/// Every year-keyed rate, threshold, and schedule the calculators read.
///
/// Tables are assembled once (from [`TaxTables::tax_year_2024`] or a loader)
/// and then only borrowed; calculators select what they need at
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxTables {
    schedules: HashMap<ScheduleKey, TaxBracketSchedule>,
    standard_deductions: HashMap<ScheduleKey, Decimal>,
    year_configs: HashMap<i32, TaxYearConfig>,
    state_rules: HashMap<(StateCode, i32), StateRules>,
    depreciation: DepreciationTables,
}

impl TaxTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_schedule(
        &mut self,
        key: ScheduleKey,
        schedule: TaxBracketSchedule,
    ) {
        self.schedules.insert(key, schedule);
    }

    pub fn insert_standard_deduction(
        &mut self,
        key: ScheduleKey,
        amount: Decimal,
    ) {
        self.standard_deductions.insert(key, amount);
    }

    pub fn insert_year_config(
        &mut self,
        config: TaxYearConfig,
    ) {
        self.year_configs.insert(config.tax_year, config);
    }

    pub fn insert_state_rules(
        &mut self,
        state: StateCode,
        tax_year: i32,
        rules: StateRules,
    ) {
        self.state_rules.insert((state, tax_year), rules);
    }

    pub fn depreciation_mut(&mut self) -> &mut DepreciationTables {
        &mut self.depreciation
    }

    pub fn depreciation(&self) -> &DepreciationTables {
        &self.depreciation
    }

    pub fn schedule(
        &self,
        key: &ScheduleKey,
    ) -> Result<&TaxBracketSchedule, TableError> {
        self.schedules
            .get(key)
            .ok_or_else(|| TableError::MissingSchedule {
                jurisdiction: key.jurisdiction.clone(),
                tax_year: key.tax_year,
                filing_status: key.filing_status,
            })
    }

    pub fn standard_deduction(
        &self,
        key: &ScheduleKey,
    ) -> Result<Decimal, TableError> {
        self.standard_deductions
            .get(key)
            .copied()
            .ok_or_else(|| TableError::MissingStandardDeduction {
                jurisdiction: key.jurisdiction.clone(),
                tax_year: key.tax_year,
                filing_status: key.filing_status,
            })
    }

    pub fn year_config(
        &self,
        tax_year: i32,
    ) -> Result<&TaxYearConfig, TableError> {
        self.year_configs
            .get(&tax_year)
            .ok_or(TableError::MissingYearConfig(tax_year))
    }

    pub fn state_rules(
        &self,
        state: &StateCode,
        tax_year: i32,
    ) -> Result<&StateRules, TableError> {
        self.state_rules
            .get(&(state.clone(), tax_year))
            .ok_or_else(|| TableError::MissingStateRules {
                state: state.clone(),
                tax_year,
            })
    }

    pub fn depreciation_limits(
        &self,
        tax_year: i32,
    ) -> Result<&DepreciationLimits, TableError> {
        self.depreciation
            .limits
            .get(&tax_year)
            .ok_or(TableError::MissingDepreciationLimits(tax_year))
    }
}
