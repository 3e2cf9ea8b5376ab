//! Built-in rate tables for the 2024 tax year: federal brackets and
//! deductions for every filing status, Louisiana's graduated schedule, and
//! the depreciation limits and MACRS tables in force for 2022 through 2024
//! placements.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    BonusRateSchedule, DepreciationLimits, FilingStatusCode, MidMonthTable, RecoveryClass,
    ScheduleKey, StateCode, StateRules, TaxBracket, TaxBracketSchedule, TaxTables,
    TaxYearConfig,
};

const TAX_YEAR: i32 = 2024;

/// `(min, max, rate)` rows; `None` marks the unbounded top bracket.
type BracketRows = &'static [(Decimal, Option<Decimal>, Decimal)];

const FEDERAL_SINGLE: BracketRows = &[
    (dec!(0), Some(dec!(11600)), dec!(0.10)),
    (dec!(11600), Some(dec!(47150)), dec!(0.12)),
    (dec!(47150), Some(dec!(100525)), dec!(0.22)),
    (dec!(100525), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243725)), dec!(0.32)),
    (dec!(243725), Some(dec!(609350)), dec!(0.35)),
    (dec!(609350), None, dec!(0.37)),
];

const FEDERAL_JOINT: BracketRows = &[
    (dec!(0), Some(dec!(23200)), dec!(0.10)),
    (dec!(23200), Some(dec!(94300)), dec!(0.12)),
    (dec!(94300), Some(dec!(201050)), dec!(0.22)),
    (dec!(201050), Some(dec!(383900)), dec!(0.24)),
    (dec!(383900), Some(dec!(487450)), dec!(0.32)),
    (dec!(487450), Some(dec!(731200)), dec!(0.35)),
    (dec!(731200), None, dec!(0.37)),
];

const FEDERAL_SEPARATE: BracketRows = &[
    (dec!(0), Some(dec!(11600)), dec!(0.10)),
    (dec!(11600), Some(dec!(47150)), dec!(0.12)),
    (dec!(47150), Some(dec!(100525)), dec!(0.22)),
    (dec!(100525), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243725)), dec!(0.32)),
    (dec!(243725), Some(dec!(365600)), dec!(0.35)),
    (dec!(365600), None, dec!(0.37)),
];

const FEDERAL_HEAD_OF_HOUSEHOLD: BracketRows = &[
    (dec!(0), Some(dec!(16550)), dec!(0.10)),
    (dec!(16550), Some(dec!(63100)), dec!(0.12)),
    (dec!(63100), Some(dec!(100500)), dec!(0.22)),
    (dec!(100500), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243700)), dec!(0.32)),
    (dec!(243700), Some(dec!(609350)), dec!(0.35)),
    (dec!(609350), None, dec!(0.37)),
];

const LOUISIANA: BracketRows = &[
    (dec!(0), Some(dec!(12500)), dec!(0.0185)),
    (dec!(12500), Some(dec!(50000)), dec!(0.035)),
    (dec!(50000), None, dec!(0.0425)),
];

const MACRS_HALF_YEAR: &[(RecoveryClass, &[Decimal])] = &[
    (
        RecoveryClass::ThreeYear,
        &[dec!(0.3333), dec!(0.4445), dec!(0.1481), dec!(0.0741)],
    ),
    (
        RecoveryClass::FiveYear,
        &[
            dec!(0.2000),
            dec!(0.3200),
            dec!(0.1920),
            dec!(0.1152),
            dec!(0.1152),
            dec!(0.0576),
        ],
    ),
    (
        RecoveryClass::SevenYear,
        &[
            dec!(0.1429),
            dec!(0.2449),
            dec!(0.1749),
            dec!(0.1249),
            dec!(0.0893),
            dec!(0.0892),
            dec!(0.0893),
            dec!(0.0446),
        ],
    ),
    (
        RecoveryClass::TenYear,
        &[
            dec!(0.1000),
            dec!(0.1800),
            dec!(0.1440),
            dec!(0.1152),
            dec!(0.0922),
            dec!(0.0737),
            dec!(0.0655),
            dec!(0.0655),
            dec!(0.0656),
            dec!(0.0655),
            dec!(0.0328),
        ],
    ),
    (
        RecoveryClass::FifteenYear,
        &[
            dec!(0.0500),
            dec!(0.0950),
            dec!(0.0855),
            dec!(0.0770),
            dec!(0.0693),
            dec!(0.0623),
            dec!(0.0590),
            dec!(0.0590),
            dec!(0.0591),
            dec!(0.0590),
            dec!(0.0591),
            dec!(0.0590),
            dec!(0.0591),
            dec!(0.0590),
            dec!(0.0591),
            dec!(0.0295),
        ],
    ),
    (
        RecoveryClass::TwentyYear,
        &[
            dec!(0.0375),
            dec!(0.0722),
            dec!(0.0668),
            dec!(0.0618),
            dec!(0.0571),
            dec!(0.0528),
            dec!(0.0489),
            dec!(0.0452),
            dec!(0.0447),
            dec!(0.0447),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0446),
            dec!(0.0223),
        ],
    ),
];

fn schedule(rows: BracketRows) -> TaxBracketSchedule {
    TaxBracketSchedule::from_trusted(
        rows.iter()
            .map(|(min, max, rate)| TaxBracket::new(*min, *max, *rate))
            .collect(),
    )
}

fn louisiana() -> StateCode {
    StateCode::from_trusted("LA")
}

impl TaxTables {
    /// Federal and Louisiana tables for the 2024 tax year, with Section 179
    /// limits for 2022 through 2024 and the bonus depreciation phase-down.
    pub fn tax_year_2024() -> Self {
        let mut tables = TaxTables::new();

        for status in FilingStatusCode::ALL {
            let (rows, standard) = match status {
                FilingStatusCode::Single => (FEDERAL_SINGLE, dec!(14600)),
                FilingStatusCode::MarriedFilingJointly
                | FilingStatusCode::QualifyingSurvivingSpouse => (FEDERAL_JOINT, dec!(29200)),
                FilingStatusCode::MarriedFilingSeparately => (FEDERAL_SEPARATE, dec!(14600)),
                FilingStatusCode::HeadOfHousehold => (FEDERAL_HEAD_OF_HOUSEHOLD, dec!(21900)),
            };
            let key = ScheduleKey::federal(TAX_YEAR, status);
            tables.insert_schedule(key.clone(), schedule(rows));
            tables.insert_standard_deduction(key, standard);

            let state_standard = match status {
                FilingStatusCode::MarriedFilingJointly
                | FilingStatusCode::QualifyingSurvivingSpouse => dec!(9000),
                _ => dec!(4500),
            };
            let key = ScheduleKey::state(louisiana(), TAX_YEAR, status);
            tables.insert_schedule(key.clone(), schedule(LOUISIANA));
            tables.insert_standard_deduction(key, state_standard);
        }

        tables.insert_state_rules(
            louisiana(),
            TAX_YEAR,
            StateRules {
                personal_exemption: dec!(4500),
                dependent_exemption: dec!(1000),
                allows_federal_itemized: true,
            },
        );

        tables.insert_year_config(TaxYearConfig {
            tax_year: TAX_YEAR,
            ss_wage_max: dec!(168600),
            ss_tax_rate: dec!(0.124),
            medicare_tax_rate: dec!(0.029),
            se_net_earnings_factor: dec!(0.9235),
            se_deduction_factor: dec!(0.50),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_threshold_joint: dec!(250000),
            additional_medicare_threshold_separate: dec!(125000),
            additional_medicare_threshold_other: dec!(200000),
            safe_harbor_current_year_factor: dec!(0.90),
            farmer_current_year_factor: Decimal::TWO / Decimal::from(3),
            safe_harbor_prior_year_factor: dec!(1.00),
            high_income_prior_year_factor: dec!(1.10),
            high_income_agi_threshold: dec!(150000),
        });

        let depreciation = tables.depreciation_mut();
        for (tax_year, limit, threshold) in [
            (2022, dec!(1080000), dec!(2700000)),
            (2023, dec!(1160000), dec!(2890000)),
            (2024, dec!(1220000), dec!(3050000)),
        ] {
            depreciation.insert_limits(DepreciationLimits {
                tax_year,
                section_179_limit: limit,
                phase_out_threshold: threshold,
            });
        }

        depreciation.bonus_rates = BonusRateSchedule::from_iter([
            (2022, dec!(1.00)),
            (2023, dec!(0.80)),
            (2024, dec!(0.60)),
            (2025, dec!(0.40)),
            (2026, dec!(0.20)),
            (2027, dec!(0.00)),
        ]);

        for (class, rates) in MACRS_HALF_YEAR {
            depreciation.macrs.insert_half_year(*class, rates.to_vec());
        }
        depreciation.macrs.insert_mid_month(
            RecoveryClass::ResidentialRental,
            MidMonthTable {
                first_year_by_month: [
                    dec!(0.03485),
                    dec!(0.03182),
                    dec!(0.02879),
                    dec!(0.02576),
                    dec!(0.02273),
                    dec!(0.01970),
                    dec!(0.01667),
                    dec!(0.01364),
                    dec!(0.01061),
                    dec!(0.00758),
                    dec!(0.00455),
                    dec!(0.00152),
                ],
                annual_rate: dec!(0.03636),
            },
        );
        depreciation.macrs.insert_mid_month(
            RecoveryClass::NonresidentialReal,
            MidMonthTable {
                first_year_by_month: [
                    dec!(0.02461),
                    dec!(0.02247),
                    dec!(0.02033),
                    dec!(0.01819),
                    dec!(0.01605),
                    dec!(0.01391),
                    dec!(0.01177),
                    dec!(0.00963),
                    dec!(0.00749),
                    dec!(0.00535),
                    dec!(0.00321),
                    dec!(0.00107),
                ],
                annual_rate: dec!(0.02564),
            },
        );

        tables
    }
}
