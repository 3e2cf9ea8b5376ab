//! Cost recovery for a single depreciable asset.
//!
//! The first year applies, in this fixed order, the Section 179 election,
//! bonus depreciation on what the election leaves, and one year of MACRS on
//! what bonus leaves. Every later year applies MACRS only. The ordering is
//! carried by [`DepreciationPipeline`], whose type parameter records which
//! step has run.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use farm_tax_core::calculations::{DepreciationEngine, FirstYearRequest};
//! use farm_tax_core::{RecoveryClass, TaxTables};
//!
//! let tables = TaxTables::tax_year_2024();
//! let engine = DepreciationEngine::new(tables.depreciation());
//!
//! let first_year = engine
//!     .first_year(&FirstYearRequest {
//!         cost: dec!(100000),
//!         recovery_class: RecoveryClass::SevenYear,
//!         placed_in_service: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
//!         use_section_179: true,
//!         section_179_amount: Some(dec!(50000)),
//!         use_bonus: true,
//!         total_equipment_placed: None,
//!     })
//!     .unwrap();
//!
//! // 50000 + 50000 × 60% + 20000 × 14.29%
//! assert_eq!(first_year.result.total_depreciation, dec!(82858.00));
//! assert_eq!(first_year.result.ending_book_value, dec!(17142.00));
//! ```

mod bonus;
mod disposal;
mod macrs;
mod pipeline;
mod section_179;
mod summary;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use bonus::{BonusResult, compute_bonus};
pub use disposal::dispose;
pub use macrs::{MacrsResult, compute_macrs};
pub use pipeline::{
    BonusApplied, DepreciationPipeline, MacrsApplied, Placed, Section179Applied,
    Section179Election,
};
pub use section_179::{Section179Result, compute_section_179};
pub use summary::EntityDepreciationSummary;

use crate::{
    AssetRecord, BonusRateSchedule, DepreciationTables, DepreciationYearResult, RecoveryClass,
    TableError, UnknownRecoveryClass,
};

/// Errors that can occur while computing depreciation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DepreciationError {
    #[error(transparent)]
    UnknownRecoveryClass(#[from] UnknownRecoveryClass),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("asset cost must be non-negative, got {0}")]
    NegativeCost(Decimal),

    #[error("remaining basis must be non-negative, got {0}")]
    NegativeBasis(Decimal),

    #[error("elected Section 179 amount must be non-negative, got {0}")]
    NegativeElection(Decimal),

    #[error(
        "first-year Section 179 ({section_179}) plus bonus ({bonus}) exceeds asset cost {cost}"
    )]
    ElectionsExceedCost {
        section_179: Decimal,
        bonus: Decimal,
        cost: Decimal,
    },

    #[error("year in service is 1-based, got {0}")]
    InvalidYearInService(u32),

    #[error("month placed in service must be 1 through 12, got {0}")]
    InvalidPlacedInServiceMonth(u32),

    #[error("tax year {tax_year} is before the asset was placed in service in {placed_in_service_year}")]
    YearBeforePlacedInService {
        tax_year: i32,
        placed_in_service_year: i32,
    },

    #[error("cannot compute {tax_year} depreciation: no result recorded for {missing_year}")]
    MissingPriorYear { tax_year: i32, missing_year: i32 },

    #[error("depreciation for {0} has already been computed")]
    YearAlreadyComputed(i32),

    #[error("asset was disposed of in {disposal_year}; cannot compute {tax_year}")]
    AssetDisposed { tax_year: i32, disposal_year: i32 },

    #[error("asset was fully depreciated before {0}")]
    FullyDepreciated(i32),
}

/// Facts and elections for the first-year computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstYearRequest {
    pub cost: Decimal,
    pub recovery_class: RecoveryClass,
    pub placed_in_service: NaiveDate,
    pub use_section_179: bool,
    /// Elected Section 179 amount; the full cost when absent.
    pub section_179_amount: Option<Decimal>,
    pub use_bonus: bool,
    pub total_equipment_placed: Option<Decimal>,
}

impl FirstYearRequest {
    pub fn for_asset(asset: &AssetRecord) -> Self {
        Self {
            cost: asset.cost,
            recovery_class: asset.recovery_class,
            placed_in_service: asset.placed_in_service,
            use_section_179: asset.elections.use_section_179,
            section_179_amount: asset.elections.section_179_amount,
            use_bonus: asset.elections.use_bonus,
            total_equipment_placed: asset.elections.total_equipment_placed,
        }
    }

    fn section_179_election(&self) -> Option<Section179Election> {
        self.use_section_179.then_some(Section179Election {
            amount: self.section_179_amount,
            total_equipment_placed: self.total_equipment_placed,
        })
    }
}

/// Every component of the first year, plus the basis snapshot the caller
/// keeps for later years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstYearDepreciation {
    pub section_179: Option<Section179Result>,
    pub bonus: Option<BonusResult>,
    pub macrs: MacrsResult,
    pub result: DepreciationYearResult,
    pub basis: crate::AssetBasis,
}

/// Depreciation calculator over a set of injected tables.
#[derive(Debug, Clone, Copy)]
pub struct DepreciationEngine<'a> {
    tables: &'a DepreciationTables,
}

impl<'a> DepreciationEngine<'a> {
    pub fn new(tables: &'a DepreciationTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'a DepreciationTables {
        self.tables
    }

    pub fn bonus_rates(&self) -> &'a BonusRateSchedule {
        &self.tables.bonus_rates
    }

    /// Section 179 using the limits for `tax_year`.
    pub fn section_179(
        &self,
        asset_cost: Decimal,
        total_equipment_placed: Option<Decimal>,
        elected_amount: Option<Decimal>,
        tax_year: i32,
    ) -> Result<Section179Result, DepreciationError> {
        let limits = self
            .tables
            .limits
            .get(&tax_year)
            .ok_or(TableError::MissingDepreciationLimits(tax_year))?;
        compute_section_179(asset_cost, total_equipment_placed, elected_amount, limits)
    }

    pub fn bonus(
        &self,
        remaining_basis: Decimal,
        placed_in_service_year: i32,
    ) -> Result<BonusResult, DepreciationError> {
        compute_bonus(self.bonus_rates(), remaining_basis, placed_in_service_year)
    }

    /// One year of MACRS on `basis`. `placed_in_service_month` only matters
    /// for mid-month classes.
    pub fn macrs(
        &self,
        basis: Decimal,
        recovery_class: RecoveryClass,
        year_in_service: u32,
        placed_in_service_month: u32,
    ) -> Result<MacrsResult, DepreciationError> {
        compute_macrs(
            &self.tables.macrs,
            basis,
            recovery_class,
            year_in_service,
            placed_in_service_month,
        )
    }

    /// Same as [`DepreciationEngine::macrs`] for a class given by its label,
    /// such as `"7-year"`.
    pub fn macrs_by_label(
        &self,
        basis: Decimal,
        recovery_class: &str,
        year_in_service: u32,
        placed_in_service_month: u32,
    ) -> Result<MacrsResult, DepreciationError> {
        let class: RecoveryClass = recovery_class.parse()?;
        self.macrs(basis, class, year_in_service, placed_in_service_month)
    }

    /// Section 179, then bonus, then one year of MACRS.
    pub fn first_year(
        &self,
        request: &FirstYearRequest,
    ) -> Result<FirstYearDepreciation, DepreciationError> {
        let placed = DepreciationPipeline::place(
            self.tables,
            request.cost,
            request.recovery_class,
            request.placed_in_service,
        )?;

        let after_179 = placed.apply_section_179(request.section_179_election())?;
        let section_179 = after_179.section_179().cloned();

        let after_bonus = after_179.apply_bonus(request.use_bonus)?;
        let bonus = after_bonus.bonus().cloned();

        let year_one = after_bonus.apply_macrs()?;

        Ok(FirstYearDepreciation {
            section_179,
            bonus,
            macrs: year_one.macrs().clone(),
            result: year_one.result().clone(),
            basis: year_one.basis().clone(),
        })
    }

    /// Projects a multi-year schedule from fixed first-year Section 179 and
    /// bonus amounts.
    ///
    /// Years after the first apply MACRS only. Projection stops after
    /// `years_to_project` years (by default every year the class can touch)
    /// or once book value reaches zero.
    pub fn project_schedule(
        &self,
        cost: Decimal,
        recovery_class: RecoveryClass,
        placed_in_service: NaiveDate,
        first_year_section_179: Decimal,
        first_year_bonus: Decimal,
        years_to_project: Option<u32>,
    ) -> Result<Vec<DepreciationYearResult>, DepreciationError> {
        let years = years_to_project.unwrap_or_else(|| recovery_class.recovery_years());
        let mut schedule = Vec::new();
        if years == 0 {
            return Ok(schedule);
        }

        let mut year = DepreciationPipeline::place(
            self.tables,
            cost,
            recovery_class,
            placed_in_service,
        )?
        .record_first_year(first_year_section_179, first_year_bonus)?
        .apply_macrs()?;
        schedule.push(year.result().clone());

        while schedule.len() < years as usize && !year.result().fully_depreciated {
            year = year.advance()?;
            schedule.push(year.result().clone());
        }

        debug!(
            cost = %cost,
            recovery_class = %recovery_class,
            years = schedule.len(),
            "Projected depreciation schedule"
        );

        Ok(schedule)
    }

    /// Computes `tax_year` for a recorded asset given the results already
    /// stored for it.
    ///
    /// The first year runs the full election pipeline. A later year needs
    /// both the first year and the immediately preceding year in `history`,
    /// and reuses the first year's Section 179 and bonus amounts to derive
    /// the MACRS basis.
    pub fn compute_year(
        &self,
        asset: &AssetRecord,
        history: &[DepreciationYearResult],
        tax_year: i32,
    ) -> Result<DepreciationYearResult, DepreciationError> {
        let placed_in_service_year = asset.placed_in_service_year();
        let year_in_service =
            asset
                .year_in_service(tax_year)
                .ok_or(DepreciationError::YearBeforePlacedInService {
                    tax_year,
                    placed_in_service_year,
                })?;

        if let Some(disposal) = &asset.disposal {
            let disposal_year = chrono::Datelike::year(&disposal.disposal_date);
            if tax_year > disposal_year {
                return Err(DepreciationError::AssetDisposed {
                    tax_year,
                    disposal_year,
                });
            }
        }

        if history.iter().any(|r| r.tax_year == tax_year) {
            return Err(DepreciationError::YearAlreadyComputed(tax_year));
        }

        if year_in_service == 1 {
            return Ok(self.first_year(&FirstYearRequest::for_asset(asset))?.result);
        }

        let find = |year: i32| {
            history
                .iter()
                .find(|r| r.tax_year == year)
                .ok_or(DepreciationError::MissingPriorYear {
                    tax_year,
                    missing_year: year,
                })
        };
        let first = find(placed_in_service_year)?;
        let prior = find(tax_year - 1)?;

        if prior.fully_depreciated || prior.ending_book_value <= Decimal::ZERO {
            return Err(DepreciationError::FullyDepreciated(tax_year));
        }

        let resumed = DepreciationPipeline::resume(self.tables, asset, first, prior)?;
        Ok(resumed.advance()?.result().clone())
    }
}
