use std::collections::BTreeMap;
use std::io::Read;

use farm_tax_core::{
    DepreciationLimits, FilingStatusCode, InvalidStateCode, Jurisdiction, MidMonthTable,
    RecoveryClass, ScheduleError, ScheduleKey, StateCode, StateRules, TaxBracket,
    TaxBracketSchedule, TaxTables, TaxYearConfig, UnknownFilingStatus, UnknownRecoveryClass,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading rate tables.
#[derive(Debug, Error)]
pub enum TableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error(transparent)]
    UnknownFilingStatus(#[from] UnknownFilingStatus),

    #[error(transparent)]
    UnknownRecoveryClass(#[from] UnknownRecoveryClass),

    #[error(transparent)]
    InvalidJurisdiction(#[from] InvalidStateCode),

    #[error("invalid {jurisdiction} schedule for {tax_year} ({filing_status}): {source}")]
    InvalidSchedule {
        jurisdiction: Jurisdiction,
        tax_year: i32,
        filing_status: FilingStatusCode,
        source: ScheduleError,
    },

    #[error("MACRS table for {class} expected year {expected}, found year {found}")]
    MacrsGap {
        class: RecoveryClass,
        expected: u32,
        found: u32,
    },
}

impl From<csv::Error> for TableLoaderError {
    fn from(err: csv::Error) -> Self {
        TableLoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for TableLoaderError {
    fn from(err: toml::de::Error) -> Self {
        TableLoaderError::TomlParse(err.to_string())
    }
}

/// A row of `federal_brackets.csv`.
///
/// `filing_status` accepts the short code (`MFJ`) or the snake-case name.
/// An empty `max_income` marks the unbounded top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FederalBracketRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

/// A row of `state_brackets.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateBracketRecord {
    pub state: String,
    pub tax_year: i32,
    pub filing_status: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

/// A row of `standard_deductions.csv`; `jurisdiction` is `federal` or a
/// state code.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandardDeductionRecord {
    pub jurisdiction: String,
    pub tax_year: i32,
    pub filing_status: String,
    pub amount: Decimal,
}

/// A row of `macrs_half_year.csv`: the rate for one year in service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MacrsRateRecord {
    pub recovery_period: String,
    pub year: u32,
    pub rate: Decimal,
}

/// A row of `bonus_rates.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BonusRateRecord {
    pub tax_year: i32,
    pub rate: Decimal,
}

/// The scalar parameters kept in `parameters.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TableParameters {
    #[serde(default, rename = "year")]
    pub years: Vec<TaxYearConfig>,
    #[serde(default)]
    pub state_rules: Vec<StateRulesRecord>,
    #[serde(default)]
    pub depreciation_limits: Vec<DepreciationLimits>,
    #[serde(default)]
    pub mid_month: Vec<MidMonthRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateRulesRecord {
    pub state: String,
    pub tax_year: i32,
    #[serde(flatten)]
    pub rules: StateRules,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MidMonthRecord {
    pub recovery_class: RecoveryClass,
    #[serde(flatten)]
    pub table: MidMonthTable,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// The text of every table file for one data set.
#[derive(Debug, Clone, Copy)]
pub struct TableSources<'a> {
    pub federal_brackets: &'a str,
    pub state_brackets: &'a str,
    pub standard_deductions: &'a str,
    pub macrs_half_year: &'a str,
    pub bonus_rates: &'a str,
    pub parameters: &'a str,
}

/// Loader for rate tables from CSV and TOML sources.
///
/// Each `load_*` method inserts into an existing [`TaxTables`], replacing
/// any table already present under the same key, so loading the same data
/// twice gives the same tables.
pub struct TableLoader;

impl TableLoader {
    /// Parse CSV records of any row type from a reader.
    pub fn parse<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, TableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: T = result?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn parse_parameters(source: &str) -> Result<TableParameters, TableLoaderError> {
        Ok(toml::from_str(source)?)
    }

    /// Builds a fresh set of tables from every source; the built-in tables
    /// are not consulted.
    pub fn load_all(sources: &TableSources<'_>) -> Result<TaxTables, TableLoaderError> {
        let mut tables = TaxTables::new();

        let federal = Self::parse::<FederalBracketRecord, _>(sources.federal_brackets.as_bytes())?;
        let state = Self::parse::<StateBracketRecord, _>(sources.state_brackets.as_bytes())?;
        let deductions =
            Self::parse::<StandardDeductionRecord, _>(sources.standard_deductions.as_bytes())?;
        let macrs = Self::parse::<MacrsRateRecord, _>(sources.macrs_half_year.as_bytes())?;
        let bonus = Self::parse::<BonusRateRecord, _>(sources.bonus_rates.as_bytes())?;
        let parameters = Self::parse_parameters(sources.parameters)?;

        let schedules = Self::load_federal_brackets(&mut tables, &federal)?
            + Self::load_state_brackets(&mut tables, &state)?;
        let deduction_count = Self::load_standard_deductions(&mut tables, &deductions)?;
        let macrs_classes = Self::load_macrs_half_year(&mut tables, &macrs)?;
        Self::load_bonus_rates(&mut tables, &bonus);
        Self::load_parameters(&mut tables, parameters)?;

        info!(
            schedules,
            standard_deductions = deduction_count,
            macrs_classes,
            bonus_years = bonus.len(),
            "Loaded rate tables"
        );

        Ok(tables)
    }

    /// Groups rows by (year, filing status) and inserts one validated
    /// schedule per group. Returns the number of schedules inserted.
    pub fn load_federal_brackets(
        tables: &mut TaxTables,
        records: &[FederalBracketRecord],
    ) -> Result<usize, TableLoaderError> {
        let rows = records
            .iter()
            .map(|r| {
                Ok((
                    Jurisdiction::Federal,
                    r.tax_year,
                    r.filing_status.parse::<FilingStatusCode>()?,
                    TaxBracket::new(r.min_income, r.max_income, r.rate),
                ))
            })
            .collect::<Result<Vec<BracketRow>, TableLoaderError>>()?;
        insert_schedules(tables, rows)
    }

    pub fn load_state_brackets(
        tables: &mut TaxTables,
        records: &[StateBracketRecord],
    ) -> Result<usize, TableLoaderError> {
        let rows = records
            .iter()
            .map(|r| {
                Ok((
                    Jurisdiction::State(StateCode::new(&r.state)?),
                    r.tax_year,
                    r.filing_status.parse::<FilingStatusCode>()?,
                    TaxBracket::new(r.min_income, r.max_income, r.rate),
                ))
            })
            .collect::<Result<Vec<BracketRow>, TableLoaderError>>()?;
        insert_schedules(tables, rows)
    }

    pub fn load_standard_deductions(
        tables: &mut TaxTables,
        records: &[StandardDeductionRecord],
    ) -> Result<usize, TableLoaderError> {
        for record in records {
            let key = ScheduleKey::new(
                Jurisdiction::parse(&record.jurisdiction)?,
                record.tax_year,
                record.filing_status.parse::<FilingStatusCode>()?,
            );
            tables.insert_standard_deduction(key, record.amount);
        }
        Ok(records.len())
    }

    /// Rows for a class must cover years 1 through N with no gaps; order in
    /// the file does not matter. Returns the number of classes inserted.
    pub fn load_macrs_half_year(
        tables: &mut TaxTables,
        records: &[MacrsRateRecord],
    ) -> Result<usize, TableLoaderError> {
        let mut by_class: BTreeMap<RecoveryClass, Vec<(u32, Decimal)>> = BTreeMap::new();
        for record in records {
            let class: RecoveryClass = record.recovery_period.parse()?;
            by_class
                .entry(class)
                .or_default()
                .push((record.year, record.rate));
        }

        let classes = by_class.len();
        for (class, mut years) in by_class {
            years.sort_by_key(|(year, _)| *year);
            for (expected, (found, _)) in (1..).zip(&years) {
                if *found != expected {
                    return Err(TableLoaderError::MacrsGap {
                        class,
                        expected,
                        found: *found,
                    });
                }
            }
            debug!(class = %class, years = years.len(), "Loaded MACRS table");
            tables
                .depreciation_mut()
                .macrs
                .insert_half_year(class, years.into_iter().map(|(_, rate)| rate).collect());
        }

        Ok(classes)
    }

    pub fn load_bonus_rates(
        tables: &mut TaxTables,
        records: &[BonusRateRecord],
    ) {
        let bonus_rates = &mut tables.depreciation_mut().bonus_rates;
        for record in records {
            bonus_rates.insert(record.tax_year, record.rate);
        }
    }

    pub fn load_parameters(
        tables: &mut TaxTables,
        parameters: TableParameters,
    ) -> Result<(), TableLoaderError> {
        for config in parameters.years {
            tables.insert_year_config(config);
        }
        for record in parameters.state_rules {
            tables.insert_state_rules(StateCode::new(&record.state)?, record.tax_year, record.rules);
        }
        for limits in parameters.depreciation_limits {
            tables.depreciation_mut().insert_limits(limits);
        }
        for record in parameters.mid_month {
            tables
                .depreciation_mut()
                .macrs
                .insert_mid_month(record.recovery_class, record.table);
        }
        Ok(())
    }
}

type BracketRow = (Jurisdiction, i32, FilingStatusCode, TaxBracket);

fn insert_schedules(
    tables: &mut TaxTables,
    rows: Vec<BracketRow>,
) -> Result<usize, TableLoaderError> {
    let mut groups: BTreeMap<(Jurisdiction, i32, FilingStatusCode), Vec<TaxBracket>> =
        BTreeMap::new();
    for (jurisdiction, tax_year, filing_status, bracket) in rows {
        groups
            .entry((jurisdiction, tax_year, filing_status))
            .or_default()
            .push(bracket);
    }

    let inserted = groups.len();
    for ((jurisdiction, tax_year, filing_status), mut brackets) in groups {
        brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
        let schedule =
            TaxBracketSchedule::new(brackets).map_err(|source| TableLoaderError::InvalidSchedule {
                jurisdiction: jurisdiction.clone(),
                tax_year,
                filing_status,
                source,
            })?;
        tables.insert_schedule(
            ScheduleKey::new(jurisdiction, tax_year, filing_status),
            schedule,
        );
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FEDERAL_CSV: &str = "tax_year,filing_status,min_income,max_income,rate
2024,MFJ,23200,94300,0.12
2024,MFJ,0,23200,0.10
2024,MFJ,94300,,0.22
2024,single,0,11600,0.10
2024,single,11600,,0.12
";

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn parse_unbounded_max_income() {
        let records: Vec<FederalBracketRecord> =
            TableLoader::parse(FEDERAL_CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(
            records[2],
            FederalBracketRecord {
                tax_year: 2024,
                filing_status: "MFJ".to_string(),
                min_income: dec!(94300),
                max_income: None,
                rate: dec!(0.22),
            }
        );
    }

    #[test]
    fn parse_rejects_missing_column() {
        let csv = "tax_year,filing_status,min_income\n2024,MFJ,0";

        let err = TableLoader::parse::<FederalBracketRecord, _>(csv.as_bytes()).unwrap_err();

        let TableLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn parse_rejects_bad_decimal() {
        let csv = "tax_year,rate\n2024,sixty";

        let result = TableLoader::parse::<BonusRateRecord, _>(csv.as_bytes());

        assert!(matches!(result, Err(TableLoaderError::CsvParse(_))));
    }

    // =========================================================================
    // load_federal_brackets tests
    // =========================================================================

    #[test]
    fn load_federal_brackets_groups_and_sorts() {
        let records: Vec<FederalBracketRecord> =
            TableLoader::parse(FEDERAL_CSV.as_bytes()).unwrap();
        let mut tables = TaxTables::new();

        let inserted = TableLoader::load_federal_brackets(&mut tables, &records).unwrap();

        assert_eq!(inserted, 2);
        let joint = tables
            .schedule(&ScheduleKey::federal(
                2024,
                FilingStatusCode::MarriedFilingJointly,
            ))
            .unwrap();
        assert_eq!(joint.brackets().len(), 3);
        assert_eq!(joint.brackets()[0].min_income, dec!(0));
        assert_eq!(joint.top_rate(), dec!(0.22));
    }

    #[test]
    fn load_federal_brackets_rejects_unknown_status() {
        let records = vec![FederalBracketRecord {
            tax_year: 2024,
            filing_status: "widowed".to_string(),
            min_income: dec!(0),
            max_income: None,
            rate: dec!(0.10),
        }];

        let result = TableLoader::load_federal_brackets(&mut TaxTables::new(), &records);

        assert!(matches!(
            result,
            Err(TableLoaderError::UnknownFilingStatus(_))
        ));
    }

    #[test]
    fn load_federal_brackets_rejects_gap() {
        let csv = "tax_year,filing_status,min_income,max_income,rate
2024,S,0,10000,0.10
2024,S,12000,,0.12
";
        let records: Vec<FederalBracketRecord> = TableLoader::parse(csv.as_bytes()).unwrap();

        let result = TableLoader::load_federal_brackets(&mut TaxTables::new(), &records);

        match result {
            Err(TableLoaderError::InvalidSchedule {
                filing_status,
                source,
                ..
            }) => {
                assert_eq!(filing_status, FilingStatusCode::Single);
                assert!(matches!(source, ScheduleError::NotContiguous { .. }));
            }
            other => panic!("expected InvalidSchedule, got {other:?}"),
        }
    }

    // =========================================================================
    // load_macrs_half_year tests
    // =========================================================================

    #[test]
    fn load_macrs_orders_years() {
        let records = vec![
            MacrsRateRecord {
                recovery_period: "3-year".to_string(),
                year: 2,
                rate: dec!(0.4445),
            },
            MacrsRateRecord {
                recovery_period: "3-year".to_string(),
                year: 1,
                rate: dec!(0.3333),
            },
        ];
        let mut tables = TaxTables::new();

        let classes = TableLoader::load_macrs_half_year(&mut tables, &records).unwrap();

        assert_eq!(classes, 1);
        assert_eq!(
            tables
                .depreciation()
                .macrs
                .half_year(RecoveryClass::ThreeYear),
            Some(&[dec!(0.3333), dec!(0.4445)][..])
        );
    }

    #[test]
    fn load_macrs_rejects_missing_year() {
        let records = vec![
            MacrsRateRecord {
                recovery_period: "5-year".to_string(),
                year: 1,
                rate: dec!(0.20),
            },
            MacrsRateRecord {
                recovery_period: "5-year".to_string(),
                year: 3,
                rate: dec!(0.192),
            },
        ];

        let result = TableLoader::load_macrs_half_year(&mut TaxTables::new(), &records);

        match result {
            Err(TableLoaderError::MacrsGap {
                class,
                expected,
                found,
            }) => {
                assert_eq!(class, RecoveryClass::FiveYear);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected MacrsGap, got {other:?}"),
        }
    }

    #[test]
    fn load_macrs_rejects_unknown_class() {
        let records = vec![MacrsRateRecord {
            recovery_period: "4-year".to_string(),
            year: 1,
            rate: dec!(0.25),
        }];

        let result = TableLoader::load_macrs_half_year(&mut TaxTables::new(), &records);

        assert!(matches!(
            result,
            Err(TableLoaderError::UnknownRecoveryClass(_))
        ));
    }

    // =========================================================================
    // load_parameters tests
    // =========================================================================

    #[test]
    fn load_parameters_reads_state_rules() {
        let source = r#"
[[state_rules]]
state = "la"
tax_year = 2024
personal_exemption = 4500
dependent_exemption = 1000
allows_federal_itemized = true

[[depreciation_limits]]
tax_year = 2024
section_179_limit = 1220000
phase_out_threshold = 3050000
"#;
        let mut tables = TaxTables::new();

        let parameters = TableLoader::parse_parameters(source).unwrap();
        TableLoader::load_parameters(&mut tables, parameters).unwrap();

        let rules = tables
            .state_rules(&StateCode::new("LA").unwrap(), 2024)
            .unwrap();
        assert_eq!(rules.personal_exemption, dec!(4500));
        assert!(rules.allows_federal_itemized);
        assert_eq!(
            tables.depreciation_limits(2024).unwrap().section_179_limit,
            dec!(1220000)
        );
    }

    #[test]
    fn parse_parameters_reports_toml_errors() {
        let result = TableLoader::parse_parameters("[[year]\ntax_year = ");

        assert!(matches!(result, Err(TableLoaderError::TomlParse(_))));
    }
}
