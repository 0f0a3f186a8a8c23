//! The per-period ledger row and its derived fields.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Sequential identity of a [`LedgerRecord`]; also its insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of monthly income, keyed by its period label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: RecordId,
    pub period: String,
    #[serde(default)]
    pub maintenance_income: Decimal,
    #[serde(default)]
    pub dppp: Decimal,
    #[serde(default)]
    pub net_maintenance_income: Decimal,
    #[serde(default)]
    pub extraordinary_dues: Decimal,
    #[serde(default)]
    pub retroactive_ordinary_dues: Decimal,
    #[serde(default)]
    pub csau_review: Decimal,
    #[serde(default)]
    pub construction_deposits: Decimal,
    #[serde(default)]
    pub dues_interest: Decimal,
    #[serde(default)]
    pub investment_yield: Decimal,
    #[serde(default)]
    pub sanctions: Decimal,
    #[serde(default)]
    pub insurance_recovery: Decimal,
    #[serde(default)]
    pub collection_cost_recovery: Decimal,
    #[serde(default)]
    pub unidentified_deposits: Decimal,
    #[serde(default)]
    pub actual_income_vs_invoiced: Decimal,
    #[serde(default)]
    pub reconciliation_difference: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Creates an empty period with every amount at zero.
    pub fn new(id: RecordId, period: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            period: period.into(),
            maintenance_income: Decimal::ZERO,
            dppp: Decimal::ZERO,
            net_maintenance_income: Decimal::ZERO,
            extraordinary_dues: Decimal::ZERO,
            retroactive_ordinary_dues: Decimal::ZERO,
            csau_review: Decimal::ZERO,
            construction_deposits: Decimal::ZERO,
            dues_interest: Decimal::ZERO,
            investment_yield: Decimal::ZERO,
            sanctions: Decimal::ZERO,
            insurance_recovery: Decimal::ZERO,
            collection_cost_recovery: Decimal::ZERO,
            unidentified_deposits: Decimal::ZERO,
            actual_income_vs_invoiced: Decimal::ZERO,
            reconciliation_difference: Decimal::ZERO,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn amount(&self, category: Category) -> Decimal {
        match category {
            Category::MaintenanceIncome => self.maintenance_income,
            Category::Dppp => self.dppp,
            Category::NetMaintenanceIncome => self.net_maintenance_income,
            Category::ExtraordinaryDues => self.extraordinary_dues,
            Category::RetroactiveOrdinaryDues => self.retroactive_ordinary_dues,
            Category::CsauReview => self.csau_review,
            Category::ConstructionDeposits => self.construction_deposits,
            Category::DuesInterest => self.dues_interest,
            Category::InvestmentYield => self.investment_yield,
            Category::Sanctions => self.sanctions,
            Category::InsuranceRecovery => self.insurance_recovery,
            Category::CollectionCostRecovery => self.collection_cost_recovery,
            Category::UnidentifiedDeposits => self.unidentified_deposits,
            Category::ActualIncomeVsInvoiced => self.actual_income_vs_invoiced,
        }
    }

    fn amount_mut(&mut self, category: Category) -> &mut Decimal {
        match category {
            Category::MaintenanceIncome => &mut self.maintenance_income,
            Category::Dppp => &mut self.dppp,
            Category::NetMaintenanceIncome => &mut self.net_maintenance_income,
            Category::ExtraordinaryDues => &mut self.extraordinary_dues,
            Category::RetroactiveOrdinaryDues => &mut self.retroactive_ordinary_dues,
            Category::CsauReview => &mut self.csau_review,
            Category::ConstructionDeposits => &mut self.construction_deposits,
            Category::DuesInterest => &mut self.dues_interest,
            Category::InvestmentYield => &mut self.investment_yield,
            Category::Sanctions => &mut self.sanctions,
            Category::InsuranceRecovery => &mut self.insurance_recovery,
            Category::CollectionCostRecovery => &mut self.collection_cost_recovery,
            Category::UnidentifiedDeposits => &mut self.unidentified_deposits,
            Category::ActualIncomeVsInvoiced => &mut self.actual_income_vs_invoiced,
        }
    }

    /// Overwrites a category amount. Derived fields are not refreshed here.
    pub fn set_amount(&mut self, category: Category, value: Decimal) {
        *self.amount_mut(category) = value;
    }

    /// Adds `delta` to a category amount and returns the new value.
    pub fn add_amount(&mut self, category: Category, delta: Decimal) -> Decimal {
        let slot = self.amount_mut(category);
        *slot += delta;
        *slot
    }

    /// Sum of the eleven reconciled categories.
    pub fn total(&self) -> Decimal {
        Category::RECONCILED
            .iter()
            .map(|category| self.amount(*category))
            .sum()
    }

    pub fn recompute_net_maintenance(&mut self) {
        self.net_maintenance_income = self.maintenance_income - self.dppp;
    }

    pub fn recompute_reconciliation(&mut self) {
        self.reconciliation_difference = self.total() - self.actual_income_vs_invoiced;
    }

    /// True when the stored difference matches the current amounts.
    pub fn is_reconciled(&self) -> bool {
        self.reconciliation_difference == self.total() - self.actual_income_vs_invoiced
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for LedgerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.period)
    }
}
