use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AccountingMethod;

/// Schedule F income lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmIncomeCategory {
    GrainSales,
    LivestockSalesPurchased,
    LivestockSalesRaised,
    CooperativeDistributions,
    AgriculturalProgramPayments,
    CccLoansReported,
    CccLoansForfeited,
    CropInsuranceProceeds,
    CustomHireIncome,
    OtherFarmIncome,
}

/// Schedule F expense lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmExpenseCategory {
    CarTruckExpenses,
    Chemicals,
    ConservationExpenses,
    CustomHire,
    Depreciation,
    EmployeeBenefitPrograms,
    Feed,
    FertilizersLime,
    FreightTrucking,
    GasolineFuelOil,
    Insurance,
    InterestMortgage,
    InterestOther,
    LaborHired,
    PensionProfitSharing,
    RentMachineryEquipment,
    RentLandAnimals,
    RepairsMaintenance,
    SeedsPlants,
    StorageWarehousing,
    Supplies,
    Taxes,
    Utilities,
    VeterinaryBreedingMedicine,
    OtherExpenses,
}

/// What a transaction records, with the category closed over its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "category", rename_all = "snake_case")]
pub enum TransactionKind {
    Income(FarmIncomeCategory),
    Expense(FarmExpenseCategory),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub entity_id: i64,
    pub transaction_date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub is_prepaid_expense: bool,
    #[serde(default)]
    pub is_capital_expense: bool,
    /// Date cash changed hands; defaults to the transaction date.
    pub cash_date: Option<NaiveDate>,
    /// Date income was earned or the expense incurred; defaults to the
    /// transaction date.
    pub accrual_date: Option<NaiveDate>,
}

impl Transaction {
    /// The date that places this transaction in a tax year under `method`.
    pub fn recognition_date(
        &self,
        method: AccountingMethod,
    ) -> NaiveDate {
        match method {
            AccountingMethod::Cash => self.cash_date.unwrap_or(self.transaction_date),
            AccountingMethod::Accrual => self.accrual_date.unwrap_or(self.transaction_date),
            AccountingMethod::Hybrid => self.transaction_date,
        }
    }
}
