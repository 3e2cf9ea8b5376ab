mod asset;
mod builtin_2024;
mod depreciation_tables;
mod entity;
mod filing_status;
mod jurisdiction;
mod recovery_class;
mod tax_bracket;
mod tax_tables;
mod tax_year_config;
mod transaction;

pub use asset::{
    AssetBasis, AssetDisposal, AssetRecord, DepreciationYearResult, DisposalResult,
    FirstYearElections,
};
pub use depreciation_tables::{
    BonusRateSchedule, DepreciationLimits, DepreciationTables, MacrsTables, MidMonthTable,
};
pub use entity::{AccountingMethod, Entity, EntityType};
pub use filing_status::{FilingStatusCode, UnknownFilingStatus};
pub use jurisdiction::{InvalidStateCode, Jurisdiction, StateCode};
pub use recovery_class::{Convention, RecoveryClass, UnknownRecoveryClass};
pub use tax_bracket::{ScheduleError, TaxBracket, TaxBracketSchedule};
pub use tax_tables::{ScheduleKey, TableError, TaxTables};
pub use tax_year_config::{StateRules, TaxYearConfig};
pub use transaction::{FarmExpenseCategory, FarmIncomeCategory, Transaction, TransactionKind};
