use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::RecoveryClass;

/// First-year elections recorded when an asset is placed in service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstYearElections {
    #[serde(default)]
    pub use_section_179: bool,
    /// Amount elected under Section 179; the full cost when absent.
    pub section_179_amount: Option<Decimal>,
    #[serde(default)]
    pub use_bonus: bool,
    /// Cost of all equipment the taxpayer placed in service that year, used
    /// for the Section 179 phase-out. No phase-out applies when absent.
    pub total_equipment_placed: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDisposal {
    pub disposal_date: NaiveDate,
    pub proceeds: Decimal,
}

/// A depreciable asset as recorded by the asset-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub entity_id: i64,
    pub description: String,
    pub cost: Decimal,
    pub placed_in_service: NaiveDate,
    pub recovery_class: RecoveryClass,
    #[serde(default)]
    pub elections: FirstYearElections,
    pub disposal: Option<AssetDisposal>,
}

impl AssetRecord {
    pub fn placed_in_service_year(&self) -> i32 {
        self.placed_in_service.year()
    }

    /// 1-based year in service for `tax_year`, or `None` before placement.
    pub fn year_in_service(
        &self,
        tax_year: i32,
    ) -> Option<u32> {
        u32::try_from(tax_year - self.placed_in_service_year() + 1)
            .ok()
            .filter(|year| *year >= 1)
    }
}

/// Cost recovery state of one asset, handed back and forth between the
/// caller and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBasis {
    pub original_cost: Decimal,
    pub placed_in_service_year: i32,
    pub placed_in_service_month: u32,
    pub recovery_class: RecoveryClass,
    pub elected_section_179: Decimal,
    pub bonus_amount: Decimal,
    pub remaining_basis: Decimal,
}

impl AssetBasis {
    /// Basis the MACRS percentages apply to: cost after the first-year
    /// Section 179 and bonus reductions.
    pub fn macrs_basis(&self) -> Decimal {
        self.original_cost - self.elected_section_179 - self.bonus_amount
    }

    pub fn is_fully_recovered(&self) -> bool {
        self.remaining_basis <= Decimal::ZERO
    }
}

/// One asset's depreciation for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationYearResult {
    pub tax_year: i32,
    pub year_in_service: u32,
    pub section_179: Decimal,
    pub bonus_depreciation: Decimal,
    pub macrs_depreciation: Decimal,
    pub total_depreciation: Decimal,
    pub beginning_book_value: Decimal,
    pub ending_book_value: Decimal,
    pub fully_depreciated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalResult {
    pub book_value: Decimal,
    pub proceeds: Decimal,
    pub gain_loss: Decimal,
    pub is_gain: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn tractor() -> AssetRecord {
        AssetRecord {
            id: 1,
            entity_id: 1,
            description: "Tractor".to_string(),
            cost: dec!(100000),
            placed_in_service: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            recovery_class: RecoveryClass::SevenYear,
            elections: FirstYearElections::default(),
            disposal: None,
        }
    }

    #[test]
    fn year_in_service_counts_from_placement_year() {
        let asset = tractor();

        assert_eq!(asset.year_in_service(2024), Some(1));
        assert_eq!(asset.year_in_service(2026), Some(3));
        assert_eq!(asset.year_in_service(2023), None);
    }

    #[test]
    fn macrs_basis_subtracts_first_year_elections() {
        let basis = AssetBasis {
            original_cost: dec!(100000),
            placed_in_service_year: 2024,
            placed_in_service_month: 3,
            recovery_class: RecoveryClass::SevenYear,
            elected_section_179: dec!(50000),
            bonus_amount: dec!(30000),
            remaining_basis: dec!(17142),
        };

        assert_eq!(basis.macrs_basis(), dec!(20000));
        assert!(!basis.is_fully_recovered());
    }
}
