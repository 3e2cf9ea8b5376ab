use thiserror::Error;

use crate::TableError;
use crate::calculations::{
    AveragingError, DepreciationError, QuarterlyError, SeTaxError, StateTaxError,
};

/// Any failure surfaced by the federal, state, or combined calculators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxCalculationError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    SeTax(#[from] SeTaxError),

    #[error(transparent)]
    Depreciation(#[from] DepreciationError),

    #[error(transparent)]
    Averaging(#[from] AveragingError),

    #[error(transparent)]
    Quarterly(#[from] QuarterlyError),

    #[error(transparent)]
    StateTax(#[from] StateTaxError),
}
