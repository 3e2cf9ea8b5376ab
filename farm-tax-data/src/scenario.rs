//! A full-year computation for one entity described in TOML.
//!
//! A scenario names the entity, tax year, and filing status, and supplies
//! any mix of raw transactions, pre-summed totals, and asset records.
//! Running it aggregates the transactions, depreciates every asset through
//! the tax year, and feeds the results to the combined calculator.

use chrono::Datelike;
use farm_tax_core::calculations::{
    CombinedTaxCalculator, DeductionChoice, DepreciationEngine, DepreciationError,
    EntityDepreciationSummary, FarmTaxInput, PrepaidExpenseCheck, QuarterlyEstimate,
    SafeHarborInput, SafeHarborResult, TaxCalculationError, TaxComputationInput,
    TaxComputationResult, TransactionAggregate, dispose,
};
use farm_tax_core::{
    AssetRecord, DepreciationYearResult, DisposalResult, Entity, EntityType, FilingStatusCode,
    TaxTables, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Calculation(#[from] TaxCalculationError),
}

impl From<toml::de::Error> for ScenarioError {
    fn from(err: toml::de::Error) -> Self {
        ScenarioError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriorYear {
    pub tax: Decimal,
    pub agi: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub tax_year: i32,
    #[serde(deserialize_with = "deserialize_filing_status")]
    pub filing_status: FilingStatusCode,
    pub entity: Entity,
    /// Farm income already summed outside `transactions`.
    #[serde(default)]
    pub total_income: Decimal,
    #[serde(default)]
    pub total_expenses: Decimal,
    /// Depreciation on assets not listed under `assets`.
    #[serde(default)]
    pub additional_depreciation: Decimal,
    #[serde(default)]
    pub other_income: Decimal,
    #[serde(default = "standard_deduction")]
    pub deduction: DeductionChoice,
    #[serde(default)]
    pub exemptions: i32,
    #[serde(default)]
    pub dependents: i32,
    #[serde(default)]
    pub estimated_payments: [Decimal; 4],
    pub prior_year: Option<PriorYear>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

fn standard_deduction() -> DeductionChoice {
    DeductionChoice::Standard
}

fn deserialize_filing_status<'de, D>(deserializer: D) -> Result<FilingStatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// One asset's figures for the scenario year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetYearReport {
    pub asset_id: i64,
    pub description: String,
    pub depreciation: DepreciationYearResult,
    pub disposal: Option<DisposalResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub entity_id: i64,
    pub entity_name: String,
    pub tax_year: i32,
    pub transactions: TransactionAggregate,
    pub prepaid_expenses: PrepaidExpenseCheck,
    pub assets: Vec<AssetYearReport>,
    pub depreciation: EntityDepreciationSummary,
    pub tax: TaxComputationResult,
    pub quarterly: QuarterlyEstimate,
    pub safe_harbor: Option<SafeHarborResult>,
}

impl Scenario {
    pub fn from_toml(source: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(source)?)
    }

    pub fn run(
        &self,
        tables: &TaxTables,
    ) -> Result<ScenarioReport, ScenarioError> {
        let entity = &self.entity;
        let calculator = CombinedTaxCalculator::new(
            tables,
            self.filing_status,
            entity.filing_state.clone(),
            self.tax_year,
        )
        .map_err(TaxCalculationError::from)?;

        let transactions =
            TransactionAggregate::aggregate(entity, &self.transactions, self.tax_year);
        let prepaid_expenses = transactions.prepaid_expense_check();

        let engine = DepreciationEngine::new(tables.depreciation());
        let mut assets = Vec::new();
        for asset in self.assets.iter().filter(|a| a.entity_id == entity.id) {
            if let Some(report) = depreciate_through(&engine, asset, self.tax_year)
                .map_err(TaxCalculationError::from)?
            {
                assets.push(report);
            }
        }
        let depreciation = EntityDepreciationSummary::summarize(
            entity.id,
            self.tax_year,
            assets.iter().map(|a| &a.depreciation),
        );

        let input = TaxComputationInput {
            farm: FarmTaxInput {
                total_income: self.total_income + transactions.total_income,
                total_expenses: self.total_expenses + transactions.total_expenses,
                depreciation: depreciation.total_depreciation + self.additional_depreciation,
                other_income: self.other_income,
                deduction: self.deduction,
            },
            exemptions: self.exemptions,
            dependents: self.dependents,
        };
        let tax = calculator.calculate_combined_tax(&input)?;

        let quarterly = calculator
            .federal()
            .estimate_quarterly_taxes(tax.total_federal_tax, self.estimated_payments)?;
        let safe_harbor = self.prior_year.as_ref().map(|prior| {
            calculator.federal().required_annual_payment(&SafeHarborInput {
                estimated_current_year_tax: tax.total_federal_tax,
                prior_year_tax: prior.tax,
                prior_year_agi: prior.agi,
                is_farmer: entity.entity_type == EntityType::Farm,
            })
        });

        info!(
            entity = %entity.name,
            tax_year = self.tax_year,
            assets = assets.len(),
            total_tax = %tax.total_tax_liability,
            "Scenario complete"
        );

        Ok(ScenarioReport {
            entity_id: entity.id,
            entity_name: entity.name.clone(),
            tax_year: self.tax_year,
            transactions,
            prepaid_expenses,
            assets,
            depreciation,
            tax,
            quarterly,
            safe_harbor,
        })
    }
}

/// Computes every year from placement through `tax_year` and reports the
/// last one. Assets not yet placed, already disposed of, or fully
/// depreciated before `tax_year` report nothing.
fn depreciate_through(
    engine: &DepreciationEngine<'_>,
    asset: &AssetRecord,
    tax_year: i32,
) -> Result<Option<AssetYearReport>, DepreciationError> {
    if tax_year < asset.placed_in_service_year() {
        return Ok(None);
    }
    let disposal = match &asset.disposal {
        Some(d) if d.disposal_date.year() < tax_year => return Ok(None),
        Some(d) if d.disposal_date.year() == tax_year => Some(d),
        _ => None,
    };

    let mut history = Vec::new();
    for year in asset.placed_in_service_year()..=tax_year {
        match engine.compute_year(asset, &history, year) {
            Ok(result) => history.push(result),
            Err(DepreciationError::FullyDepreciated(_)) => {
                debug!(asset_id = asset.id, year, "Asset already fully depreciated");
                return Ok(None);
            }
            Err(err) => return Err(err),
        }
    }
    let Some(depreciation) = history.pop() else {
        return Ok(None);
    };

    Ok(Some(AssetYearReport {
        asset_id: asset.id,
        description: asset.description.clone(),
        disposal: disposal.map(|d| dispose(depreciation.ending_book_value, d.proceeds)),
        depreciation,
    }))
}
