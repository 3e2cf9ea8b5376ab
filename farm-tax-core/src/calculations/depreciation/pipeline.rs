use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    BonusResult, DepreciationError, MacrsResult, Section179Result, compute_bonus, compute_macrs,
    compute_section_179, disposal,
};
use crate::{
    AssetBasis, AssetRecord, DepreciationTables, DepreciationYearResult, DisposalResult,
    RecoveryClass, TableError,
};

/// How much Section 179 to elect and the equipment total for the phase-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section179Election {
    pub amount: Option<Decimal>,
    pub total_equipment_placed: Option<Decimal>,
}

/// Asset placed in service; nothing applied yet.
#[derive(Debug, Clone)]
pub struct Placed;

#[derive(Debug, Clone)]
pub struct Section179Applied {
    section_179: Option<Section179Result>,
}

#[derive(Debug, Clone)]
pub struct BonusApplied {
    bonus: Option<BonusResult>,
}

/// At least one year of MACRS has been applied.
#[derive(Debug, Clone)]
pub struct MacrsApplied {
    macrs: MacrsResult,
    result: DepreciationYearResult,
}

/// Depreciation of one asset, advanced one step at a time.
///
/// The only path from [`Placed`] to [`MacrsApplied`] goes through Section
/// 179 and bonus, and [`MacrsApplied`] can only advance by further MACRS
/// years, so neither election can be made again after the first year.
#[derive(Debug, Clone)]
pub struct DepreciationPipeline<'a, S> {
    tables: &'a DepreciationTables,
    basis: AssetBasis,
    state: S,
}

impl<S> DepreciationPipeline<'_, S> {
    pub fn basis(&self) -> &AssetBasis {
        &self.basis
    }
}

impl<'a> DepreciationPipeline<'a, Placed> {
    pub fn place(
        tables: &'a DepreciationTables,
        cost: Decimal,
        recovery_class: RecoveryClass,
        placed_in_service: NaiveDate,
    ) -> Result<Self, DepreciationError> {
        if cost < Decimal::ZERO {
            return Err(DepreciationError::NegativeCost(cost));
        }
        Ok(Self {
            tables,
            basis: AssetBasis {
                original_cost: cost,
                placed_in_service_year: placed_in_service.year(),
                placed_in_service_month: placed_in_service.month(),
                recovery_class,
                elected_section_179: Decimal::ZERO,
                bonus_amount: Decimal::ZERO,
                remaining_basis: cost,
            },
            state: Placed,
        })
    }

    /// Applies Section 179 when `election` is present, using the limits for
    /// the year placed in service.
    pub fn apply_section_179(
        mut self,
        election: Option<Section179Election>,
    ) -> Result<DepreciationPipeline<'a, Section179Applied>, DepreciationError> {
        let section_179 = match election {
            Some(election) => {
                let tax_year = self.basis.placed_in_service_year;
                let limits = self
                    .tables
                    .limits
                    .get(&tax_year)
                    .ok_or(TableError::MissingDepreciationLimits(tax_year))?;
                let result = compute_section_179(
                    self.basis.original_cost,
                    election.total_equipment_placed,
                    election.amount,
                    limits,
                )?;
                self.basis.elected_section_179 = result.deduction;
                self.basis.remaining_basis = result.remaining_basis;
                Some(result)
            }
            None => None,
        };

        Ok(DepreciationPipeline {
            tables: self.tables,
            basis: self.basis,
            state: Section179Applied { section_179 },
        })
    }

    /// Takes first-year Section 179 and bonus amounts already decided by the
    /// caller instead of computing them.
    pub fn record_first_year(
        mut self,
        section_179: Decimal,
        bonus: Decimal,
    ) -> Result<DepreciationPipeline<'a, BonusApplied>, DepreciationError> {
        for amount in [section_179, bonus] {
            if amount < Decimal::ZERO {
                return Err(DepreciationError::NegativeElection(amount));
            }
        }
        if section_179 + bonus > self.basis.original_cost {
            return Err(DepreciationError::ElectionsExceedCost {
                section_179,
                bonus,
                cost: self.basis.original_cost,
            });
        }

        self.basis.elected_section_179 = section_179;
        self.basis.bonus_amount = bonus;
        self.basis.remaining_basis = self.basis.original_cost - section_179 - bonus;

        Ok(DepreciationPipeline {
            tables: self.tables,
            basis: self.basis,
            state: BonusApplied { bonus: None },
        })
    }

    /// Rebuilds the pipeline for an asset whose first year and most recent
    /// year are already recorded. The first year supplies the Section 179
    /// and bonus amounts; the most recent year supplies the book value.
    pub fn resume(
        tables: &'a DepreciationTables,
        asset: &AssetRecord,
        first_year: &DepreciationYearResult,
        prior_year: &DepreciationYearResult,
    ) -> Result<DepreciationPipeline<'a, MacrsApplied>, DepreciationError> {
        let placed = Self::place(
            tables,
            asset.cost,
            asset.recovery_class,
            asset.placed_in_service,
        )?;
        let mut basis = placed.basis;
        basis.elected_section_179 = first_year.section_179;
        basis.bonus_amount = first_year.bonus_depreciation;
        basis.remaining_basis = prior_year.ending_book_value;

        let macrs = compute_macrs(
            &tables.macrs,
            basis.macrs_basis(),
            basis.recovery_class,
            prior_year.year_in_service,
            basis.placed_in_service_month,
        )?;

        Ok(DepreciationPipeline {
            tables,
            basis,
            state: MacrsApplied {
                macrs,
                result: prior_year.clone(),
            },
        })
    }
}

impl<'a> DepreciationPipeline<'a, Section179Applied> {
    pub fn section_179(&self) -> Option<&Section179Result> {
        self.state.section_179.as_ref()
    }

    /// Applies bonus depreciation to the basis left after Section 179 when
    /// `elected`.
    pub fn apply_bonus(
        mut self,
        elected: bool,
    ) -> Result<DepreciationPipeline<'a, BonusApplied>, DepreciationError> {
        let bonus = if elected {
            let result = compute_bonus(
                &self.tables.bonus_rates,
                self.basis.remaining_basis,
                self.basis.placed_in_service_year,
            )?;
            self.basis.bonus_amount = result.bonus_amount;
            self.basis.remaining_basis = result.remaining_basis;
            Some(result)
        } else {
            None
        };

        Ok(DepreciationPipeline {
            tables: self.tables,
            basis: self.basis,
            state: BonusApplied { bonus },
        })
    }
}

impl<'a> DepreciationPipeline<'a, BonusApplied> {
    pub fn bonus(&self) -> Option<&BonusResult> {
        self.state.bonus.as_ref()
    }

    /// Applies the first year of MACRS and closes out year one.
    pub fn apply_macrs(mut self) -> Result<DepreciationPipeline<'a, MacrsApplied>, DepreciationError> {
        let (macrs, amount) = macrs_for_year(self.tables, &self.basis, 1)?;
        self.basis.remaining_basis -= amount;

        let section_179 = self.basis.elected_section_179;
        let bonus_depreciation = self.basis.bonus_amount;
        let ending_book_value = self.basis.remaining_basis;
        let result = DepreciationYearResult {
            tax_year: self.basis.placed_in_service_year,
            year_in_service: 1,
            section_179,
            bonus_depreciation,
            macrs_depreciation: amount,
            total_depreciation: section_179 + bonus_depreciation + amount,
            beginning_book_value: self.basis.original_cost,
            ending_book_value,
            fully_depreciated: ending_book_value <= Decimal::ZERO,
        };

        debug!(
            tax_year = result.tax_year,
            section_179 = %section_179,
            bonus = %bonus_depreciation,
            macrs = %amount,
            "Computed first-year depreciation"
        );

        Ok(DepreciationPipeline {
            tables: self.tables,
            basis: self.basis,
            state: MacrsApplied { macrs, result },
        })
    }
}

impl<'a> DepreciationPipeline<'a, MacrsApplied> {
    /// The most recently computed year.
    pub fn result(&self) -> &DepreciationYearResult {
        &self.state.result
    }

    pub fn macrs(&self) -> &MacrsResult {
        &self.state.macrs
    }

    /// Applies MACRS for the next tax year.
    pub fn advance(mut self) -> Result<Self, DepreciationError> {
        let previous = &self.state.result;
        let tax_year = previous.tax_year + 1;
        if previous.fully_depreciated || self.basis.is_fully_recovered() {
            return Err(DepreciationError::FullyDepreciated(tax_year));
        }
        let year_in_service = previous.year_in_service + 1;

        let beginning_book_value = self.basis.remaining_basis;
        let (macrs, amount) = macrs_for_year(self.tables, &self.basis, year_in_service)?;
        self.basis.remaining_basis -= amount;
        let ending_book_value = self.basis.remaining_basis;

        let result = DepreciationYearResult {
            tax_year,
            year_in_service,
            section_179: Decimal::ZERO,
            bonus_depreciation: Decimal::ZERO,
            macrs_depreciation: amount,
            total_depreciation: amount,
            beginning_book_value,
            ending_book_value,
            fully_depreciated: ending_book_value <= Decimal::ZERO || macrs.fully_depreciated,
        };

        debug!(
            tax_year,
            year_in_service,
            macrs = %amount,
            ending_book_value = %ending_book_value,
            "Computed MACRS depreciation"
        );

        Ok(Self {
            tables: self.tables,
            basis: self.basis,
            state: MacrsApplied { macrs, result },
        })
    }

    /// Disposes of the asset at its current book value. The pipeline is
    /// consumed, so no later year can be computed.
    pub fn dispose(
        self,
        proceeds: Decimal,
    ) -> DisposalResult {
        disposal::dispose(self.basis.remaining_basis, proceeds)
    }
}

/// MACRS for `year_in_service`, clamped so book value never goes negative.
/// The final recovery year takes exactly the remaining book value so the
/// rounded yearly amounts add up to the basis.
fn macrs_for_year(
    tables: &DepreciationTables,
    basis: &AssetBasis,
    year_in_service: u32,
) -> Result<(MacrsResult, Decimal), DepreciationError> {
    let macrs = compute_macrs(
        &tables.macrs,
        basis.macrs_basis(),
        basis.recovery_class,
        year_in_service,
        basis.placed_in_service_month,
    )?;

    let remaining = basis.remaining_basis.max(Decimal::ZERO);
    let amount = if macrs.final_year {
        remaining
    } else {
        macrs.depreciation.min(remaining)
    };
    Ok((macrs, amount))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxTables;

    fn placed(tables: &DepreciationTables) -> DepreciationPipeline<'_, Placed> {
        DepreciationPipeline::place(
            tables,
            dec!(100000),
            RecoveryClass::SevenYear,
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn basis_reductions_never_exceed_cost() {
        let tables = TaxTables::tax_year_2024();

        let year_one = placed(tables.depreciation())
            .apply_section_179(Some(Section179Election {
                amount: Some(dec!(50000)),
                total_equipment_placed: None,
            }))
            .unwrap()
            .apply_bonus(true)
            .unwrap()
            .apply_macrs()
            .unwrap();

        let basis = year_one.basis();
        assert_eq!(basis.elected_section_179, dec!(50000));
        assert_eq!(basis.bonus_amount, dec!(30000.00));
        assert_eq!(basis.remaining_basis, dec!(17142.00));
        assert!(year_one.result().total_depreciation <= basis.original_cost);
    }

    #[test]
    fn advance_applies_macrs_only() {
        let tables = TaxTables::tax_year_2024();
        let year_one = placed(tables.depreciation())
            .apply_section_179(None)
            .unwrap()
            .apply_bonus(false)
            .unwrap()
            .apply_macrs()
            .unwrap();

        let year_two = year_one.advance().unwrap();

        assert_eq!(year_two.result().tax_year, 2025);
        assert_eq!(year_two.result().macrs_depreciation, dec!(24490.00));
        assert_eq!(year_two.result().total_depreciation, dec!(24490.00));
        assert_eq!(year_two.macrs().rate, dec!(0.2449));
    }

    #[test]
    fn advance_rejects_fully_depreciated_asset() {
        let tables = TaxTables::tax_year_2024();
        let year_one = placed(tables.depreciation())
            .apply_section_179(Some(Section179Election::default()))
            .unwrap()
            .apply_bonus(false)
            .unwrap()
            .apply_macrs()
            .unwrap();

        let result = year_one.advance();

        assert!(matches!(
            result,
            Err(DepreciationError::FullyDepreciated(2025))
        ));
    }

    #[test]
    fn dispose_compares_proceeds_to_book_value() {
        let tables = TaxTables::tax_year_2024();
        let year_one = placed(tables.depreciation())
            .apply_section_179(None)
            .unwrap()
            .apply_bonus(true)
            .unwrap()
            .apply_macrs()
            .unwrap();

        // Bonus 60000, MACRS 40000 × 14.29% = 5716
        let disposal = year_one.dispose(dec!(40000));

        assert_eq!(disposal.book_value, dec!(34284.00));
        assert_eq!(disposal.gain_loss, dec!(5716.00));
        assert!(disposal.is_gain);
    }

    #[test]
    fn apply_section_179_requires_limits_for_placement_year() {
        let tables = TaxTables::tax_year_2024();
        let pipeline = DepreciationPipeline::place(
            tables.depreciation(),
            dec!(1000),
            RecoveryClass::FiveYear,
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        )
        .unwrap();

        let result = pipeline.apply_section_179(Some(Section179Election::default()));

        assert!(matches!(
            result,
            Err(DepreciationError::Table(
                TableError::MissingDepreciationLimits(2030)
            ))
        ));
    }

    #[test]
    fn place_rejects_negative_cost() {
        let tables = TaxTables::tax_year_2024();

        let result = DepreciationPipeline::place(
            tables.depreciation(),
            dec!(-1),
            RecoveryClass::FiveYear,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );

        assert!(matches!(result, Err(DepreciationError::NegativeCost(_))));
    }
}
