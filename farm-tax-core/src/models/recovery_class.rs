use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recovery class '{0}'")]
pub struct UnknownRecoveryClass(pub String);

/// Which percentage table a class reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Convention {
    HalfYear,
    MidMonth,
}

/// MACRS property class.
///
/// Serialized as the label used on depreciation worksheets (`"7-year"`,
/// `"27.5-year"`). Any other label is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecoveryClass {
    ThreeYear,
    FiveYear,
    SevenYear,
    TenYear,
    FifteenYear,
    TwentyYear,
    ResidentialRental,
    NonresidentialReal,
}

impl RecoveryClass {
    pub const ALL: [RecoveryClass; 8] = [
        Self::ThreeYear,
        Self::FiveYear,
        Self::SevenYear,
        Self::TenYear,
        Self::FifteenYear,
        Self::TwentyYear,
        Self::ResidentialRental,
        Self::NonresidentialReal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeYear => "3-year",
            Self::FiveYear => "5-year",
            Self::SevenYear => "7-year",
            Self::TenYear => "10-year",
            Self::FifteenYear => "15-year",
            Self::TwentyYear => "20-year",
            Self::ResidentialRental => "27.5-year",
            Self::NonresidentialReal => "39-year",
        }
    }

    /// Recovery period in years.
    pub fn recovery_period(&self) -> Decimal {
        match self {
            Self::ThreeYear => dec!(3),
            Self::FiveYear => dec!(5),
            Self::SevenYear => dec!(7),
            Self::TenYear => dec!(10),
            Self::FifteenYear => dec!(15),
            Self::TwentyYear => dec!(20),
            Self::ResidentialRental => dec!(27.5),
            Self::NonresidentialReal => dec!(39),
        }
    }

    pub fn convention(&self) -> Convention {
        match self {
            Self::ResidentialRental | Self::NonresidentialReal => Convention::MidMonth,
            _ => Convention::HalfYear,
        }
    }

    /// Number of tax years a full recovery can touch: the recovery period
    /// rounded up, plus the partial year the convention spills into.
    pub fn recovery_years(&self) -> u32 {
        match self {
            Self::ThreeYear => 4,
            Self::FiveYear => 6,
            Self::SevenYear => 8,
            Self::TenYear => 11,
            Self::FifteenYear => 16,
            Self::TwentyYear => 21,
            Self::ResidentialRental => 29,
            Self::NonresidentialReal => 40,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|class| class.as_str() == s)
    }
}

impl fmt::Display for RecoveryClass {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryClass {
    type Err = UnknownRecoveryClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRecoveryClass(s.to_string()))
    }
}

impl TryFrom<String> for RecoveryClass {
    type Error = UnknownRecoveryClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecoveryClass> for String {
    fn from(class: RecoveryClass) -> Self {
        class.as_str().to_string()
    }
}
