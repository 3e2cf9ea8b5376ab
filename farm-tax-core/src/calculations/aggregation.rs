//! Per-year income and expense totals for an entity.
//!
//! A transaction belongs to the tax year of its recognition date under the
//! entity's accounting method. Capital purchases never count as expenses;
//! they are recovered through depreciation instead.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::calculations::{DeductionChoice, FarmTaxInput};
use crate::{
    AccountingMethod, Entity, FarmExpenseCategory, FarmIncomeCategory, Transaction,
    TransactionKind,
};

/// Prepaid farm supplies may not exceed this share of the other deductible
/// farm expenses.
pub const PREPAID_EXPENSE_LIMIT: Decimal = dec!(0.50);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAggregate {
    pub entity_id: i64,
    pub tax_year: i32,
    pub accounting_method: AccountingMethod,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub income_by_category: BTreeMap<FarmIncomeCategory, Decimal>,
    pub expenses_by_category: BTreeMap<FarmExpenseCategory, Decimal>,
    /// Expenses flagged as prepaid, already included in `total_expenses`.
    pub prepaid_expenses: Decimal,
    pub net: Decimal,
}

impl TransactionAggregate {
    /// Sums `entity`'s transactions recognized in `tax_year`. Transactions
    /// belonging to other entities are skipped.
    pub fn aggregate<'t>(
        entity: &Entity,
        transactions: impl IntoIterator<Item = &'t Transaction>,
        tax_year: i32,
    ) -> Self {
        let method = entity.accounting_method;
        let mut aggregate = Self {
            entity_id: entity.id,
            tax_year,
            accounting_method: method,
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            income_by_category: BTreeMap::new(),
            expenses_by_category: BTreeMap::new(),
            prepaid_expenses: Decimal::ZERO,
            net: Decimal::ZERO,
        };

        let recognized = transactions.into_iter().filter(|t| {
            t.entity_id == entity.id
                && !t.is_capital_expense
                && t.recognition_date(method).year() == tax_year
        });

        for transaction in recognized {
            let amount = round_half_up(transaction.amount);
            match transaction.kind {
                TransactionKind::Income(category) => {
                    aggregate.total_income += amount;
                    *aggregate
                        .income_by_category
                        .entry(category)
                        .or_insert(Decimal::ZERO) += amount;
                }
                TransactionKind::Expense(category) => {
                    aggregate.total_expenses += amount;
                    *aggregate
                        .expenses_by_category
                        .entry(category)
                        .or_insert(Decimal::ZERO) += amount;
                    if transaction.is_prepaid_expense {
                        aggregate.prepaid_expenses += amount;
                    }
                }
            }
        }
        aggregate.net = aggregate.total_income - aggregate.total_expenses;

        debug!(
            entity_id = entity.id,
            tax_year,
            total_income = %aggregate.total_income,
            total_expenses = %aggregate.total_expenses,
            "Aggregated transactions"
        );

        aggregate
    }

    /// Builds the federal input from these totals.
    pub fn farm_tax_input(
        &self,
        depreciation: Decimal,
        other_income: Decimal,
        deduction: DeductionChoice,
    ) -> FarmTaxInput {
        FarmTaxInput {
            total_income: self.total_income,
            total_expenses: self.total_expenses,
            depreciation,
            other_income,
            deduction,
        }
    }

    pub fn prepaid_expense_check(&self) -> PrepaidExpenseCheck {
        PrepaidExpenseCheck::new(self.prepaid_expenses, self.total_expenses)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidExpenseCheck {
    pub prepaid_expenses: Decimal,
    pub other_deductible_expenses: Decimal,
    pub max_allowed_prepaid: Decimal,
    pub exceeds_limit: bool,
    pub excess_amount: Decimal,
}

impl PrepaidExpenseCheck {
    /// `total_expenses` includes the prepaid amount.
    pub fn new(
        prepaid_expenses: Decimal,
        total_expenses: Decimal,
    ) -> Self {
        let other_deductible_expenses = total_expenses - prepaid_expenses;
        let max_allowed_prepaid = round_half_up(other_deductible_expenses * PREPAID_EXPENSE_LIMIT);
        let exceeds_limit = prepaid_expenses > max_allowed_prepaid;
        if exceeds_limit {
            warn!(
                prepaid = %prepaid_expenses,
                limit = %max_allowed_prepaid,
                "Prepaid farm expenses exceed the deductible limit"
            );
        }

        Self {
            prepaid_expenses,
            other_deductible_expenses,
            max_allowed_prepaid,
            exceeds_limit,
            excess_amount: (prepaid_expenses - max_allowed_prepaid).max(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{EntityType, StateCode};

    fn date(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn entity(method: AccountingMethod) -> Entity {
        Entity {
            id: 1,
            name: "Bayou Farms".to_string(),
            entity_type: EntityType::Farm,
            accounting_method: method,
            filing_state: StateCode::new("LA").unwrap(),
        }
    }

    fn transaction(
        transaction_date: NaiveDate,
        kind: TransactionKind,
        amount: Decimal,
    ) -> Transaction {
        Transaction {
            entity_id: 1,
            transaction_date,
            kind,
            amount,
            is_prepaid_expense: false,
            is_capital_expense: false,
            cash_date: None,
            accrual_date: None,
        }
    }

    fn grain() -> TransactionKind {
        TransactionKind::Income(FarmIncomeCategory::GrainSales)
    }

    // =========================================================================
    // aggregate tests
    // =========================================================================

    #[test]
    fn aggregate_sums_by_category() {
        let transactions = vec![
            transaction(date(2024, 3, 1), grain(), dec!(120000)),
            transaction(date(2024, 9, 1), grain(), dec!(80000)),
            transaction(
                date(2024, 4, 1),
                TransactionKind::Expense(FarmExpenseCategory::Feed),
                dec!(30000),
            ),
            transaction(
                date(2024, 5, 1),
                TransactionKind::Expense(FarmExpenseCategory::SeedsPlants),
                dec!(12500.50),
            ),
        ];

        let result =
            TransactionAggregate::aggregate(&entity(AccountingMethod::Cash), &transactions, 2024);

        assert_eq!(result.total_income, dec!(200000));
        assert_eq!(result.total_expenses, dec!(42500.50));
        assert_eq!(
            result.income_by_category[&FarmIncomeCategory::GrainSales],
            dec!(200000)
        );
        assert_eq!(
            result.expenses_by_category[&FarmExpenseCategory::SeedsPlants],
            dec!(12500.50)
        );
        assert_eq!(result.net, dec!(157499.50));
    }

    #[test]
    fn aggregate_excludes_capital_and_other_entities() {
        let mut capital = transaction(
            date(2024, 2, 1),
            TransactionKind::Expense(FarmExpenseCategory::RepairsMaintenance),
            dec!(250000),
        );
        capital.is_capital_expense = true;
        let mut other_entity = transaction(date(2024, 2, 1), grain(), dec!(5000));
        other_entity.entity_id = 2;

        let result = TransactionAggregate::aggregate(
            &entity(AccountingMethod::Cash),
            &[capital, other_entity],
            2024,
        );

        assert_eq!(result.total_income, dec!(0));
        assert_eq!(result.total_expenses, dec!(0));
        assert!(result.expenses_by_category.is_empty());
    }

    #[test]
    fn aggregate_uses_method_date() {
        let mut sale = transaction(date(2024, 12, 20), grain(), dec!(40000));
        sale.cash_date = Some(date(2025, 1, 10));
        sale.accrual_date = Some(date(2024, 12, 20));
        let transactions = [sale];

        let cash_2024 =
            TransactionAggregate::aggregate(&entity(AccountingMethod::Cash), &transactions, 2024);
        let cash_2025 =
            TransactionAggregate::aggregate(&entity(AccountingMethod::Cash), &transactions, 2025);
        let accrual_2024 = TransactionAggregate::aggregate(
            &entity(AccountingMethod::Accrual),
            &transactions,
            2024,
        );

        assert_eq!(cash_2024.total_income, dec!(0));
        assert_eq!(cash_2025.total_income, dec!(40000));
        assert_eq!(accrual_2024.total_income, dec!(40000));
    }

    #[test]
    fn aggregate_feeds_federal_input() {
        let transactions = [transaction(date(2024, 6, 1), grain(), dec!(90000))];

        let input =
            TransactionAggregate::aggregate(&entity(AccountingMethod::Hybrid), &transactions, 2024)
                .farm_tax_input(dec!(10000), dec!(0), DeductionChoice::Standard);

        assert_eq!(input.total_income, dec!(90000));
        assert_eq!(input.total_expenses, dec!(0));
        assert_eq!(input.depreciation, dec!(10000));
    }

    // =========================================================================
    // PrepaidExpenseCheck tests
    // =========================================================================

    #[test]
    fn prepaid_within_limit() {
        let check = PrepaidExpenseCheck::new(dec!(20000), dec!(80000));

        assert_eq!(check.other_deductible_expenses, dec!(60000));
        assert_eq!(check.max_allowed_prepaid, dec!(30000.00));
        assert!(!check.exceeds_limit);
        assert_eq!(check.excess_amount, dec!(0));
    }

    #[test]
    fn prepaid_over_limit_reports_excess() {
        let mut prepaid_fertilizer = transaction(
            date(2024, 12, 1),
            TransactionKind::Expense(FarmExpenseCategory::FertilizersLime),
            dec!(30000),
        );
        prepaid_fertilizer.is_prepaid_expense = true;
        let transactions = [
            prepaid_fertilizer,
            transaction(
                date(2024, 3, 1),
                TransactionKind::Expense(FarmExpenseCategory::Feed),
                dec!(40000),
            ),
        ];

        let check =
            TransactionAggregate::aggregate(&entity(AccountingMethod::Cash), &transactions, 2024)
                .prepaid_expense_check();

        assert_eq!(check.prepaid_expenses, dec!(30000));
        assert_eq!(check.max_allowed_prepaid, dec!(20000.00));
        assert!(check.exceeds_limit);
        assert_eq!(check.excess_amount, dec!(10000.00));
    }
}
