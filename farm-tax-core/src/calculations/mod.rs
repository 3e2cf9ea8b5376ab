//! Tax and depreciation calculations for farm entities.
//!
//! Calculators borrow their rate tables from a [`crate::TaxTables`] at
//! construction and hold no other state, so every calculation is a pure
//! function of its inputs.

mod aggregation;
mod bracket;
mod combined;
pub mod common;
mod depreciation;
mod error;
mod federal;
mod income_averaging;
mod quarterly;
mod self_emp;
mod state;

pub use aggregation::{PREPAID_EXPENSE_LIMIT, PrepaidExpenseCheck, TransactionAggregate};
pub use bracket::{BracketTax, BracketTaxEvaluator, BracketTaxResult};
pub use combined::{CombinedTaxCalculator, TaxComputationInput, TaxComputationResult};
pub use depreciation::{
    BonusApplied, BonusResult, DepreciationEngine, DepreciationError, DepreciationPipeline,
    EntityDepreciationSummary, FirstYearDepreciation, FirstYearRequest, MacrsApplied,
    MacrsResult, Placed, Section179Applied, Section179Election, Section179Result, compute_bonus,
    compute_macrs, compute_section_179, dispose,
};
pub use error::TaxCalculationError;
pub use federal::{
    DeductionChoice, DeductionType, FarmTaxInput, FederalTaxCalculator, FederalTaxResult,
};
pub use income_averaging::{
    AveragingError, IncomeAveragingResult, PRIOR_YEARS, calculate_farm_income_averaging,
};
pub use quarterly::{
    QUARTERS, QuarterlyError, QuarterlyEstimate, QuarterlyPayment, SafeHarborInput,
    SafeHarborResult, estimate_quarterly_taxes, required_annual_payment,
};
pub use self_emp::{SeTaxCalculator, SeTaxConfig, SeTaxError, SeTaxResult};
pub use state::{StateTaxCalculator, StateTaxError, StateTaxInput, StateTaxResult};
