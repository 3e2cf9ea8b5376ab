//! Self-employment tax on net farm earnings.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Net earnings: net farm profit × 92.35% (if zero or less, stop) |
//! | 2    | Social security tax: smaller of step 1 or the wage base × 12.4% |
//! | 3    | Medicare tax: step 1 × 2.9%, uncapped |
//! | 4    | Additional Medicare tax: step 1 above the filing-status threshold × 0.9% |
//! | 5    | Total SE tax: steps 2 + 3 + 4 |
//! | 6    | Deductible part of SE tax: step 5 × 50% |
//!
//! Every step is rounded to cents. There is no minimum-earnings floor: any
//! positive net earnings are taxed.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use farm_tax_core::calculations::{SeTaxCalculator, SeTaxConfig};
//! use farm_tax_core::{FilingStatusCode, TaxTables};
//!
//! let tables = TaxTables::tax_year_2024();
//! let config = SeTaxConfig::from_tax_year_config(
//!     tables.year_config(2024).unwrap(),
//!     FilingStatusCode::Single,
//! );
//!
//! let result = SeTaxCalculator::new(config).calculate(dec!(50000)).unwrap();
//!
//! assert_eq!(result.net_earnings, dec!(46175.00));
//! assert_eq!(result.total_se_tax, dec!(7064.78));
//! assert_eq!(result.deductible_se_tax, dec!(3532.39));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::{FilingStatusCode, TaxYearConfig};

/// Errors that can occur during self-employment tax calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeTaxError {
    /// The net earnings factor must be between 0 and 1 (exclusive of 0).
    #[error("net earnings factor must be between 0 and 1, got {0}")]
    InvalidNetEarningsFactor(Decimal),

    #[error("social security tax rate must be between 0 and 1, got {0}")]
    InvalidSocialSecurityRate(Decimal),

    #[error("medicare tax rate must be between 0 and 1, got {0}")]
    InvalidMedicareRate(Decimal),

    #[error("additional medicare tax rate must be between 0 and 1, got {0}")]
    InvalidAdditionalMedicareRate(Decimal),

    #[error("deduction factor must be between 0 and 1, got {0}")]
    InvalidDeductionFactor(Decimal),

    #[error("social security wage maximum must be positive, got {0}")]
    InvalidSsWageMax(Decimal),

    #[error("additional medicare threshold must be non-negative, got {0}")]
    InvalidAdditionalMedicareThreshold(Decimal),
}

/// Rates and limits for one tax year and filing status.
///
/// Usually built with [`SeTaxConfig::from_tax_year_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxConfig {
    /// Maximum earnings subject to social security tax ($168,600 for 2024).
    pub ss_wage_max: Decimal,

    /// Combined employer and employee social security rate, typically 12.4%.
    pub ss_tax_rate: Decimal,

    /// Combined employer and employee Medicare rate, typically 2.9%.
    pub medicare_tax_rate: Decimal,

    /// Portion of net profit subject to SE tax, typically 92.35%.
    pub net_earnings_factor: Decimal,

    /// Portion of SE tax deductible when computing AGI, typically 50%.
    pub deduction_factor: Decimal,

    pub additional_medicare_rate: Decimal,

    /// Net earnings above this amount owe the additional Medicare tax. Varies
    /// by filing status.
    pub additional_medicare_threshold: Decimal,
}

impl SeTaxConfig {
    pub fn from_tax_year_config(
        config: &TaxYearConfig,
        filing_status: FilingStatusCode,
    ) -> Self {
        Self {
            ss_wage_max: config.ss_wage_max,
            ss_tax_rate: config.ss_tax_rate,
            medicare_tax_rate: config.medicare_tax_rate,
            net_earnings_factor: config.se_net_earnings_factor,
            deduction_factor: config.se_deduction_factor,
            additional_medicare_rate: config.additional_medicare_rate,
            additional_medicare_threshold: config.additional_medicare_threshold(filing_status),
        }
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`SeTaxError`] if:
    /// - `net_earnings_factor` is not in (0, 1]
    /// - any tax rate or `deduction_factor` is not in [0, 1]
    /// - `ss_wage_max` is not positive
    /// - `additional_medicare_threshold` is negative
    pub fn validate(&self) -> Result<(), SeTaxError> {
        let in_unit_range = |value: Decimal| (Decimal::ZERO..=Decimal::ONE).contains(&value);

        if self.net_earnings_factor <= Decimal::ZERO || self.net_earnings_factor > Decimal::ONE {
            return Err(SeTaxError::InvalidNetEarningsFactor(
                self.net_earnings_factor,
            ));
        }
        if !in_unit_range(self.ss_tax_rate) {
            return Err(SeTaxError::InvalidSocialSecurityRate(self.ss_tax_rate));
        }
        if !in_unit_range(self.medicare_tax_rate) {
            return Err(SeTaxError::InvalidMedicareRate(self.medicare_tax_rate));
        }
        if !in_unit_range(self.additional_medicare_rate) {
            return Err(SeTaxError::InvalidAdditionalMedicareRate(
                self.additional_medicare_rate,
            ));
        }
        if !in_unit_range(self.deduction_factor) {
            return Err(SeTaxError::InvalidDeductionFactor(self.deduction_factor));
        }
        if self.ss_wage_max <= Decimal::ZERO {
            return Err(SeTaxError::InvalidSsWageMax(self.ss_wage_max));
        }
        if self.additional_medicare_threshold < Decimal::ZERO {
            return Err(SeTaxError::InvalidAdditionalMedicareThreshold(
                self.additional_medicare_threshold,
            ));
        }
        Ok(())
    }
}

/// Every component of the SE tax is reported separately; AGI consumes
/// `deductible_se_tax` specifically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxResult {
    pub net_farm_profit: Decimal,
    pub net_earnings: Decimal,
    pub ss_taxable_earnings: Decimal,
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub additional_medicare_tax: Decimal,
    pub total_se_tax: Decimal,
    pub deductible_se_tax: Decimal,
}

impl SeTaxResult {
    fn zero(net_farm_profit: Decimal) -> Self {
        Self {
            net_farm_profit,
            net_earnings: Decimal::ZERO,
            ss_taxable_earnings: Decimal::ZERO,
            social_security_tax: Decimal::ZERO,
            medicare_tax: Decimal::ZERO,
            additional_medicare_tax: Decimal::ZERO,
            total_se_tax: Decimal::ZERO,
            deductible_se_tax: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeTaxCalculator {
    config: SeTaxConfig,
}

impl SeTaxCalculator {
    pub fn new(config: SeTaxConfig) -> Self {
        Self { config }
    }

    /// Calculates SE tax on `net_farm_profit`, which may be negative.
    ///
    /// # Errors
    ///
    /// Returns [`SeTaxError`] if the configuration is invalid.
    pub fn calculate(
        &self,
        net_farm_profit: Decimal,
    ) -> Result<SeTaxResult, SeTaxError> {
        self.config.validate()?;

        let net_earnings = self.net_earnings(net_farm_profit);
        if net_earnings <= Decimal::ZERO {
            warn!(
                net_farm_profit = %net_farm_profit,
                net_earnings = %net_earnings,
                "Net earnings from self-employment are zero or negative; no SE tax due"
            );
            return Ok(SeTaxResult::zero(net_farm_profit));
        }

        let ss_taxable_earnings = self.ss_taxable_earnings(net_earnings);
        let social_security_tax = self.social_security_tax(ss_taxable_earnings);
        let medicare_tax = self.medicare_tax(net_earnings);
        let additional_medicare_tax = self.additional_medicare_tax(net_earnings);
        let total_se_tax = social_security_tax + medicare_tax + additional_medicare_tax;
        let deductible_se_tax = self.deductible_se_tax(total_se_tax);

        debug!(
            net_earnings = %net_earnings,
            social_security_tax = %social_security_tax,
            medicare_tax = %medicare_tax,
            additional_medicare_tax = %additional_medicare_tax,
            total_se_tax = %total_se_tax,
            "Calculated self-employment tax"
        );

        Ok(SeTaxResult {
            net_farm_profit,
            net_earnings,
            ss_taxable_earnings,
            social_security_tax,
            medicare_tax,
            additional_medicare_tax,
            total_se_tax,
            deductible_se_tax,
        })
    }

    fn net_earnings(
        &self,
        net_farm_profit: Decimal,
    ) -> Decimal {
        round_half_up(net_farm_profit * self.config.net_earnings_factor)
    }

    /// Earnings above the wage base escape social security tax.
    fn ss_taxable_earnings(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        if net_earnings > self.config.ss_wage_max {
            debug!(
                net_earnings = %net_earnings,
                ss_wage_max = %self.config.ss_wage_max,
                "Net earnings exceed social security wage base"
            );
        }
        net_earnings.min(self.config.ss_wage_max)
    }

    fn social_security_tax(
        &self,
        ss_taxable_earnings: Decimal,
    ) -> Decimal {
        round_half_up(ss_taxable_earnings * self.config.ss_tax_rate)
    }

    fn medicare_tax(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        round_half_up(net_earnings * self.config.medicare_tax_rate)
    }

    fn additional_medicare_tax(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        let excess = (net_earnings - self.config.additional_medicare_threshold).max(Decimal::ZERO);
        round_half_up(excess * self.config.additional_medicare_rate)
    }

    fn deductible_se_tax(
        &self,
        total_se_tax: Decimal,
    ) -> Decimal {
        round_half_up(total_se_tax * self.config.deduction_factor)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    /// 2024 rates for a single filer.
    fn test_config() -> SeTaxConfig {
        SeTaxConfig {
            ss_wage_max: dec!(168600.00),
            ss_tax_rate: dec!(0.124),
            medicare_tax_rate: dec!(0.029),
            net_earnings_factor: dec!(0.9235),
            deduction_factor: dec!(0.50),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_threshold: dec!(200000.00),
        }
    }

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // SeTaxConfig::validate tests
    // =========================================================================

    #[test]
    fn validate_accepts_valid_config() {
        assert_eq!(test_config().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_net_earnings_factor() {
        let config = SeTaxConfig {
            net_earnings_factor: dec!(0.00),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidNetEarningsFactor(dec!(0.00)))
        );
    }

    #[test]
    fn validate_rejects_ss_tax_rate_greater_than_one() {
        let config = SeTaxConfig {
            ss_tax_rate: dec!(1.24),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidSocialSecurityRate(dec!(1.24)))
        );
    }

    #[test]
    fn validate_rejects_negative_additional_medicare_rate() {
        let config = SeTaxConfig {
            additional_medicare_rate: dec!(-0.009),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidAdditionalMedicareRate(dec!(-0.009)))
        );
    }

    #[test]
    fn validate_rejects_zero_ss_wage_max() {
        let config = SeTaxConfig {
            ss_wage_max: dec!(0.00),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidSsWageMax(dec!(0.00)))
        );
    }

    #[test]
    fn validate_rejects_negative_threshold() {
        let config = SeTaxConfig {
            additional_medicare_threshold: dec!(-1.00),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidAdditionalMedicareThreshold(dec!(-1.00)))
        );
    }

    // =========================================================================
    // from_tax_year_config tests
    // =========================================================================

    #[test]
    fn from_tax_year_config_selects_threshold_by_filing_status() {
        let tables = crate::TaxTables::tax_year_2024();
        let year = tables.year_config(2024).unwrap();

        let joint = SeTaxConfig::from_tax_year_config(year, FilingStatusCode::MarriedFilingJointly);
        let separate =
            SeTaxConfig::from_tax_year_config(year, FilingStatusCode::MarriedFilingSeparately);
        let single = SeTaxConfig::from_tax_year_config(year, FilingStatusCode::Single);

        assert_eq!(joint.additional_medicare_threshold, dec!(250000));
        assert_eq!(separate.additional_medicare_threshold, dec!(125000));
        assert_eq!(single, test_config());
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_returns_every_component_for_50k_profit() {
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(50000.00)).unwrap();

        // 50000 × 0.9235
        assert_eq!(result.net_earnings, dec!(46175.00));
        assert_eq!(result.ss_taxable_earnings, dec!(46175.00));
        // 46175 × 0.124
        assert_eq!(result.social_security_tax, dec!(5725.70));
        // 46175 × 0.029 = 1339.075
        assert_eq!(result.medicare_tax, dec!(1339.08));
        assert_eq!(result.additional_medicare_tax, dec!(0.00));
        assert_eq!(result.total_se_tax, dec!(7064.78));
        assert_eq!(result.deductible_se_tax, dec!(3532.39));
    }

    #[test]
    fn calculate_returns_zero_for_zero_profit() {
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(0.00)).unwrap();

        assert_eq!(result, SeTaxResult::zero(dec!(0.00)));
    }

    #[test]
    fn calculate_returns_zero_for_farm_loss() {
        let _guard = init_test_tracing();
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(-12000.00)).unwrap();

        assert_eq!(result.net_farm_profit, dec!(-12000.00));
        assert_eq!(result.net_earnings, dec!(0));
        assert_eq!(result.ss_taxable_earnings, dec!(0));
        assert_eq!(result.total_se_tax, dec!(0));
        assert_eq!(result.deductible_se_tax, dec!(0));
    }

    #[test]
    fn calculate_taxes_small_positive_earnings() {
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(100.00)).unwrap();

        // 92.35 × 0.124 = 11.4514; 92.35 × 0.029 = 2.67815
        assert_eq!(result.social_security_tax, dec!(11.45));
        assert_eq!(result.medicare_tax, dec!(2.68));
        assert_eq!(result.total_se_tax, dec!(14.13));
    }

    #[test]
    fn calculate_caps_ss_tax_at_wage_base() {
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(200000.00)).unwrap();

        // Net earnings 184700 exceed the 168600 wage base
        assert_eq!(result.net_earnings, dec!(184700.00));
        assert_eq!(result.ss_taxable_earnings, dec!(168600.00));
        assert_eq!(result.social_security_tax, dec!(20906.40));
        // Medicare is uncapped: 184700 × 0.029
        assert_eq!(result.medicare_tax, dec!(5356.30));
        assert_eq!(result.additional_medicare_tax, dec!(0.00));
    }

    #[test]
    fn calculate_applies_additional_medicare_above_threshold() {
        let calculator = SeTaxCalculator::new(test_config());

        let result = calculator.calculate(dec!(300000.00)).unwrap();

        // Net earnings 277050; excess over 200000 is 77050 × 0.009
        assert_eq!(result.net_earnings, dec!(277050.00));
        assert_eq!(result.additional_medicare_tax, dec!(693.45));
        assert_eq!(
            result.total_se_tax,
            result.social_security_tax + result.medicare_tax + dec!(693.45)
        );
    }

    #[test]
    fn calculate_returns_error_for_invalid_config() {
        let calculator = SeTaxCalculator::new(SeTaxConfig {
            deduction_factor: dec!(2),
            ..test_config()
        });

        let result = calculator.calculate(dec!(50000.00));

        assert_eq!(result, Err(SeTaxError::InvalidDeductionFactor(dec!(2))));
    }
}
