//! The fixed income categories tracked for every period.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the fourteen amount columns carried by a [`crate::LedgerRecord`].
///
/// The string keys returned by [`Category::key`] are the only identifiers
/// accepted at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MaintenanceIncome,
    Dppp,
    NetMaintenanceIncome,
    ExtraordinaryDues,
    RetroactiveOrdinaryDues,
    CsauReview,
    ConstructionDeposits,
    DuesInterest,
    InvestmentYield,
    Sanctions,
    InsuranceRecovery,
    CollectionCostRecovery,
    UnidentifiedDeposits,
    ActualIncomeVsInvoiced,
}

impl Category {
    /// All categories in column order.
    pub const ALL: [Category; 14] = [
        Category::MaintenanceIncome,
        Category::Dppp,
        Category::NetMaintenanceIncome,
        Category::ExtraordinaryDues,
        Category::RetroactiveOrdinaryDues,
        Category::CsauReview,
        Category::ConstructionDeposits,
        Category::DuesInterest,
        Category::InvestmentYield,
        Category::Sanctions,
        Category::InsuranceRecovery,
        Category::CollectionCostRecovery,
        Category::UnidentifiedDeposits,
        Category::ActualIncomeVsInvoiced,
    ];

    /// The eleven categories summed by [`crate::LedgerRecord::total`].
    pub const RECONCILED: [Category; 11] = [
        Category::NetMaintenanceIncome,
        Category::ExtraordinaryDues,
        Category::RetroactiveOrdinaryDues,
        Category::CsauReview,
        Category::ConstructionDeposits,
        Category::DuesInterest,
        Category::InvestmentYield,
        Category::Sanctions,
        Category::InsuranceRecovery,
        Category::CollectionCostRecovery,
        Category::UnidentifiedDeposits,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::MaintenanceIncome => "ingresos_mantenimiento",
            Category::Dppp => "dppp",
            Category::NetMaintenanceIncome => "ingresos_netos_mantenimiento",
            Category::ExtraordinaryDues => "ingresos_cuota_extraordinaria",
            Category::RetroactiveOrdinaryDues => "cuota_ordinaria_retroactiva",
            Category::CsauReview => "revision_csau",
            Category::ConstructionDeposits => "depositos_garantia_obra",
            Category::DuesInterest => "ingresos_intereses_cuotas",
            Category::InvestmentYield => "ingresos_rendimiento_inversiones",
            Category::Sanctions => "sanciones",
            Category::InsuranceRecovery => "recuperacion_seguro_danios",
            Category::CollectionCostRecovery => "recuperacion_gastos_cobranza",
            Category::UnidentifiedDeposits => "depositos_no_identificados",
            Category::ActualIncomeVsInvoiced => "ingresos_reales_vs_fact",
        }
    }

    /// Human readable column heading.
    pub fn label(self) -> &'static str {
        match self {
            Category::MaintenanceIncome => "Maintenance income",
            Category::Dppp => "DPPP",
            Category::NetMaintenanceIncome => "Net maintenance income",
            Category::ExtraordinaryDues => "Extraordinary dues",
            Category::RetroactiveOrdinaryDues => "Retroactive ordinary dues",
            Category::CsauReview => "CSAU review",
            Category::ConstructionDeposits => "Construction guarantee deposits",
            Category::DuesInterest => "Interest on dues",
            Category::InvestmentYield => "Investment yield",
            Category::Sanctions => "Sanctions",
            Category::InsuranceRecovery => "Insurance/damage recovery",
            Category::CollectionCostRecovery => "Legal collection cost recovery",
            Category::UnidentifiedDeposits => "Unidentified deposits",
            Category::ActualIncomeVsInvoiced => "Actual income vs invoiced",
        }
    }

    /// Resolves a boundary identifier, ignoring surrounding whitespace and case.
    pub fn from_key(raw: &str) -> Option<Category> {
        let needle = raw.trim().to_ascii_lowercase();
        Category::ALL.into_iter().find(|cat| cat.key() == needle)
    }

    /// True for the field derived from maintenance income and DPPP.
    pub fn is_derived(self) -> bool {
        matches!(self, Category::NetMaintenanceIncome)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Returned when a string does not name one of the fixed categories.
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_key(s).ok_or_else(|| UnknownCategory(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_lookup() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
    }

    #[test]
    fn lookup_is_trimmed_and_case_insensitive() {
        assert_eq!(Category::from_key("  SANCIONES "), Some(Category::Sanctions));
        assert_eq!("Dppp".parse::<Category>(), Ok(Category::Dppp));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(Category::from_key("total").is_none());
        assert!(Category::from_key("sanctions").is_none());
        let err = "diferencia_ingresos_fac_vs_cobrados"
            .parse::<Category>()
            .unwrap_err();
        assert!(err.to_string().contains("diferencia_ingresos_fac_vs_cobrados"));
    }

    #[test]
    fn reconciled_set_excludes_gross_maintenance_dppp_and_actual() {
        assert_eq!(Category::RECONCILED.len(), 11);
        for excluded in [
            Category::MaintenanceIncome,
            Category::Dppp,
            Category::ActualIncomeVsInvoiced,
        ] {
            assert!(!Category::RECONCILED.contains(&excluded));
        }
    }
}
