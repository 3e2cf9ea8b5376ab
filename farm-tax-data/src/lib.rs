//! Loads rate tables from data files and runs TOML scenarios against them.

mod loader;
mod scenario;

pub use loader::{
    BonusRateRecord, FederalBracketRecord, MacrsRateRecord, MidMonthRecord,
    StandardDeductionRecord, StateBracketRecord, StateRulesRecord, TableLoader, TableLoaderError,
    TableParameters, TableSources,
};
pub use scenario::{AssetYearReport, PriorYear, Scenario, ScenarioError, ScenarioReport};
