use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a list of brackets cannot form a [`TaxBracketSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("bracket schedule is empty")]
    Empty,

    #[error("first bracket starts below zero at {0}")]
    NegativeLowerBound(Decimal),

    #[error("bracket {index} has rate {rate} outside [0, 1]")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} upper bound {upper} is not above its lower bound {lower}")]
    EmptyBracket {
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("bracket {index} starts at {lower} but the previous bracket ends at {previous_upper}")]
    NotContiguous {
        index: usize,
        lower: Decimal,
        previous_upper: Decimal,
    },

    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedBeforeEnd { index: usize },

    #[error("top bracket must be unbounded, but ends at {0}")]
    BoundedTop(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }
}

/// An ordered marginal-rate schedule.
///
/// Brackets are sorted ascending, each bracket starts exactly where the
/// previous one ends, and the last bracket is unbounded. These invariants are
/// checked once in [`TaxBracketSchedule::new`]; a schedule is never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct TaxBracketSchedule {
    brackets: Vec<TaxBracket>,
}

impl TaxBracketSchedule {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, ScheduleError> {
        let first = brackets.first().ok_or(ScheduleError::Empty)?;
        if first.min_income < Decimal::ZERO {
            return Err(ScheduleError::NegativeLowerBound(first.min_income));
        }

        let last_index = brackets.len() - 1;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
                return Err(ScheduleError::InvalidRate {
                    index,
                    rate: bracket.tax_rate,
                });
            }

            match bracket.max_income {
                Some(upper) if index == last_index => {
                    return Err(ScheduleError::BoundedTop(upper));
                }
                Some(upper) if upper <= bracket.min_income => {
                    return Err(ScheduleError::EmptyBracket {
                        index,
                        lower: bracket.min_income,
                        upper,
                    });
                }
                None if index != last_index => {
                    return Err(ScheduleError::UnboundedBeforeEnd { index });
                }
                _ => {}
            }

            if index > 0 {
                // Every bracket before `index` is bounded, checked above.
                let previous_upper = brackets[index - 1].max_income.unwrap_or(Decimal::MAX);
                if bracket.min_income != previous_upper {
                    return Err(ScheduleError::NotContiguous {
                        index,
                        lower: bracket.min_income,
                        previous_upper,
                    });
                }
            }
        }

        Ok(Self { brackets })
    }

    /// Builds a schedule from literal tables compiled into the crate. The
    /// built-in tables are checked against [`TaxBracketSchedule::new`] in tests.
    pub(crate) fn from_trusted(brackets: Vec<TaxBracket>) -> Self {
        Self { brackets }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn top_rate(&self) -> Decimal {
        self.brackets
            .last()
            .map(|b| b.tax_rate)
            .unwrap_or(Decimal::ZERO)
    }
}

impl TryFrom<Vec<TaxBracket>> for TaxBracketSchedule {
    type Error = ScheduleError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<TaxBracketSchedule> for Vec<TaxBracket> {
    fn from(schedule: TaxBracketSchedule) -> Self {
        schedule.brackets
    }
}
