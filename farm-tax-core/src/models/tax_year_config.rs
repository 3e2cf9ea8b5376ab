use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::FilingStatusCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub ss_wage_max: Decimal,
    pub ss_tax_rate: Decimal,
    pub medicare_tax_rate: Decimal,
    pub se_net_earnings_factor: Decimal,
    pub se_deduction_factor: Decimal,
    pub additional_medicare_rate: Decimal,
    pub additional_medicare_threshold_joint: Decimal,
    pub additional_medicare_threshold_separate: Decimal,
    pub additional_medicare_threshold_other: Decimal,

    // Estimated tax safe harbor
    pub safe_harbor_current_year_factor: Decimal,
    pub farmer_current_year_factor: Decimal,
    pub safe_harbor_prior_year_factor: Decimal,
    pub high_income_prior_year_factor: Decimal,
    pub high_income_agi_threshold: Decimal,
}

impl TaxYearConfig {
    pub fn additional_medicare_threshold(
        &self,
        filing_status: FilingStatusCode,
    ) -> Decimal {
        match filing_status {
            FilingStatusCode::MarriedFilingJointly => self.additional_medicare_threshold_joint,
            FilingStatusCode::MarriedFilingSeparately => {
                self.additional_medicare_threshold_separate
            }
            FilingStatusCode::Single
            | FilingStatusCode::HeadOfHousehold
            | FilingStatusCode::QualifyingSurvivingSpouse => {
                self.additional_medicare_threshold_other
            }
        }
    }
}

/// Per-jurisdiction rules a state applies on top of its bracket schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRules {
    pub personal_exemption: Decimal,
    pub dependent_exemption: Decimal,
    /// Whether an itemizing taxpayer may carry the federal itemized figure
    /// over to the state return.
    pub allows_federal_itemized: bool,
}
