use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::RecoveryClass;

/// Section 179 ceiling and investment phase-out threshold for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationLimits {
    pub tax_year: i32,
    pub section_179_limit: Decimal,
    pub phase_out_threshold: Decimal,
}

/// Bonus depreciation rate as a step function of the placed-in-service year.
///
/// A year between two entries uses the nearest earlier entry. Years before
/// the first entry use the first entry's rate, and years after the last
/// entry keep the last entry's rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRateSchedule {
    rates: BTreeMap<i32, Decimal>,
}

impl BonusRateSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        tax_year: i32,
        rate: Decimal,
    ) {
        self.rates.insert(tax_year, rate);
    }

    pub fn rate_for(
        &self,
        placed_in_service_year: i32,
    ) -> Option<Decimal> {
        self.rates
            .range(..=placed_in_service_year)
            .next_back()
            .or_else(|| self.rates.iter().next())
            .map(|(_, rate)| *rate)
    }
}

impl FromIterator<(i32, Decimal)> for BonusRateSchedule {
    fn from_iter<T: IntoIterator<Item = (i32, Decimal)>>(iter: T) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Mid-month convention table for real property.
///
/// The first year's rate depends on the month the property was placed in
/// service; every later year recovers `annual_rate` until the basis is
/// exhausted, with the final year taking whatever remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidMonthTable {
    pub first_year_by_month: [Decimal; 12],
    pub annual_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacrsTables {
    half_year: HashMap<RecoveryClass, Vec<Decimal>>,
    mid_month: HashMap<RecoveryClass, MidMonthTable>,
}

impl MacrsTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_half_year(
        &mut self,
        class: RecoveryClass,
        rates: Vec<Decimal>,
    ) {
        self.half_year.insert(class, rates);
    }

    pub fn insert_mid_month(
        &mut self,
        class: RecoveryClass,
        table: MidMonthTable,
    ) {
        self.mid_month.insert(class, table);
    }

    pub fn half_year(
        &self,
        class: RecoveryClass,
    ) -> Option<&[Decimal]> {
        self.half_year.get(&class).map(Vec::as_slice)
    }

    pub fn mid_month(
        &self,
        class: RecoveryClass,
    ) -> Option<&MidMonthTable> {
        self.mid_month.get(&class)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationTables {
    pub limits: BTreeMap<i32, DepreciationLimits>,
    pub bonus_rates: BonusRateSchedule,
    pub macrs: MacrsTables,
}

impl DepreciationTables {
    pub fn insert_limits(
        &mut self,
        limits: DepreciationLimits,
    ) {
        self.limits.insert(limits.tax_year, limits);
    }
}
