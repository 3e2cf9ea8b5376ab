use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filing status '{0}'")]
pub struct UnknownFilingStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatusCode {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingSurvivingSpouse,
}

impl FilingStatusCode {
    pub const ALL: [FilingStatusCode; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingSurvivingSpouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
            Self::QualifyingSurvivingSpouse => "QSS",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedFilingJointly => "married_filing_jointly",
            Self::MarriedFilingSeparately => "married_filing_separately",
            Self::HeadOfHousehold => "head_of_household",
            Self::QualifyingSurvivingSpouse => "qualifying_surviving_spouse",
        }
    }

    /// Accepts either the short code (`MFJ`) or the snake-case name
    /// (`married_filing_jointly`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s) || status.name() == s)
    }
}

impl fmt::Display for FilingStatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilingStatusCode {
    type Err = UnknownFilingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownFilingStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_short_codes() {
        assert_eq!(
            FilingStatusCode::parse("MFJ"),
            Some(FilingStatusCode::MarriedFilingJointly)
        );
        assert_eq!(FilingStatusCode::parse("hoh"), Some(FilingStatusCode::HeadOfHousehold));
    }

    #[test]
    fn parse_accepts_snake_case_names() {
        assert_eq!(
            FilingStatusCode::parse("married_filing_separately"),
            Some(FilingStatusCode::MarriedFilingSeparately)
        );
    }

    #[test]
    fn from_str_rejects_unknown_status() {
        let result = "widowed".parse::<FilingStatusCode>();

        assert_eq!(result, Err(UnknownFilingStatus("widowed".to_string())));
    }

    #[test]
    fn serializes_as_snake_case_name() {
        let json = serde_json::to_string(&FilingStatusCode::QualifyingSurvivingSpouse).unwrap();

        assert_eq!(json, "\"qualifying_surviving_spouse\"");
    }
}
