//! Policy and export enums shared by services and configuration, plus the
//! text forms of every enum the CLI accepts.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{audit::MovementKind, user::Role};

/// When the derived net maintenance income is recalculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetIncomePolicy {
    /// After every mutation; the field cannot be written directly.
    #[default]
    Always,
    /// Only when an amount is added to a period.
    OnAdd,
    /// Never; the value is entered by hand.
    Manual,
}

/// How export boundaries select records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Records created between the two boundary records, inclusive.
    #[default]
    Insertion,
    /// Records whose parsed period falls between the two boundary months.
    Chronological,
}

/// Row ordering applied to exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    #[default]
    Insertion,
    Chronological,
}

/// How the trailing totals row is written to a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TotalsStyle {
    /// Pre-computed sums.
    Values,
    /// `=SUM(..)` formulas over the data rows.
    #[default]
    Formulas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error produced when parsing one of the option enums from text.
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownOption {}

macro_rules! option_text {
    ($ty:ty, $kind:literal, { $($variant:path => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let label = match self {
                    $($variant => $text,)+
                };
                f.write_str(label)
            }
        }

        impl FromStr for $ty {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($text => Ok($variant),)+
                    _ => Err(UnknownOption {
                        kind: $kind,
                        value: s.trim().to_string(),
                    }),
                }
            }
        }
    };
}

option_text!(NetIncomePolicy, "net income policy", {
    NetIncomePolicy::Always => "always",
    NetIncomePolicy::OnAdd => "on_add",
    NetIncomePolicy::Manual => "manual",
});

option_text!(RangeMode, "range mode", {
    RangeMode::Insertion => "insertion",
    RangeMode::Chronological => "chronological",
});

option_text!(RowOrder, "row order", {
    RowOrder::Insertion => "insertion",
    RowOrder::Chronological => "chronological",
});

option_text!(TotalsStyle, "totals style", {
    TotalsStyle::Values => "values",
    TotalsStyle::Formulas => "formulas",
});

option_text!(Role, "role", {
    Role::Admin => "admin",
    Role::Staff => "staff",
});

option_text!(MovementKind, "movement kind", {
    MovementKind::Add => "add",
    MovementKind::Edit => "edit",
    MovementKind::Delete => "delete",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_from_cli_text() {
        assert_eq!("on-add".parse(), Ok(NetIncomePolicy::OnAdd));
        assert_eq!("Chronological".parse(), Ok(RangeMode::Chronological));
        assert_eq!("values".parse(), Ok(TotalsStyle::Values));
        assert!("sometimes".parse::<RowOrder>().is_err());
    }

    #[test]
    fn roles_and_movement_kinds_round_trip_through_text() {
        assert_eq!("ADMIN".parse(), Ok(Role::Admin));
        assert_eq!(Role::Staff.to_string(), "staff");
        assert_eq!(" delete ".parse(), Ok(MovementKind::Delete));
        let err = "undo".parse::<MovementKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown movement kind `undo`");
    }

    #[test]
    fn options_serialize_as_snake_case() {
        let json = serde_json::to_string(&NetIncomePolicy::OnAdd).unwrap();
        assert_eq!(json, "\"on_add\"");
        assert_eq!(NetIncomePolicy::OnAdd.to_string(), "on_add");
    }
}
