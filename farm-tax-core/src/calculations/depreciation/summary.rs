use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::DepreciationYearResult;

/// Depreciation across all of an entity's assets for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDepreciationSummary {
    pub entity_id: i64,
    pub tax_year: i32,
    pub asset_count: usize,
    pub section_179_total: Decimal,
    pub bonus_total: Decimal,
    pub macrs_total: Decimal,
    pub total_depreciation: Decimal,
}

impl EntityDepreciationSummary {
    /// Totals the results recorded for `tax_year`, one per asset. Results
    /// for other years are ignored.
    pub fn summarize<'r>(
        entity_id: i64,
        tax_year: i32,
        results: impl IntoIterator<Item = &'r DepreciationYearResult>,
    ) -> Self {
        let mut summary = Self {
            entity_id,
            tax_year,
            asset_count: 0,
            section_179_total: Decimal::ZERO,
            bonus_total: Decimal::ZERO,
            macrs_total: Decimal::ZERO,
            total_depreciation: Decimal::ZERO,
        };

        for result in results.into_iter().filter(|r| r.tax_year == tax_year) {
            summary.asset_count += 1;
            summary.section_179_total += result.section_179;
            summary.bonus_total += result.bonus_depreciation;
            summary.macrs_total += result.macrs_depreciation;
            summary.total_depreciation += result.total_depreciation;
        }

        summary
    }
}
