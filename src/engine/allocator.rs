//! Budget-line allocator: splits a total between ND 30 (material) and ND 39 (service).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::{Error, Result};

/// Reconciliation tolerance for monetary values.
pub const MONEY_TOLERANCE: f64 = 0.01;

/// Which expenditure code the user types in; the other one is the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreeSide {
    /// ND 30 is typed, ND 39 derived
    Nd30,
    /// ND 39 is typed, ND 30 derived
    Nd39,
}

impl FreeSide {
    /// Storage code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Nd30 => "nd30",
            Self::Nd39 => "nd39",
        }
    }
}

impl fmt::Display for FreeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nd30 => "ND 30",
            Self::Nd39 => "ND 39",
        })
    }
}

impl FromStr for FreeSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "nd30" => Ok(Self::Nd30),
            "nd39" => Ok(Self::Nd39),
            other => Err(Error::Validation {
                message: format!("Natureza de despesa desconhecida: {other}"),
            }),
        }
    }
}

/// Two-way split of a total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Material de consumo (ND 33.90.30)
    pub nd30: f64,
    /// Serviços de terceiros (ND 33.90.39)
    pub nd39: f64,
    /// Record total both sides add up to
    pub total: f64,
    /// Side typed by the user; the other is derived
    pub free_side: FreeSide,
}

impl Allocation {
    /// Value of the side the user types in.
    #[must_use]
    pub const fn free_value(&self) -> f64 {
        match self.free_side {
            FreeSide::Nd30 => self.nd30,
            FreeSide::Nd39 => self.nd39,
        }
    }

    /// `|nd30 + nd39 - total| < 0.01`
    #[must_use]
    pub fn reconciles(&self) -> bool {
        ((self.nd30 + self.nd39) - self.total).abs() < MONEY_TOLERANCE
    }

    /// Checks reconciliation, turning a mismatch into a validation error.
    pub fn validate(&self) -> Result<()> {
        if self.reconciles() {
            Ok(())
        } else {
            Err(Error::NotReconciled {
                nd30: self.nd30,
                nd39: self.nd39,
                total: self.total,
            })
        }
    }
}

/// Non-blocking notice that the typed value was pulled into `[0, total]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampWarning {
    /// Side that was clamped
    pub side: FreeSide,
    /// Value as typed
    pub entered: f64,
    /// Value after clamping
    pub clamped: f64,
}

impl fmt::Display for ClampWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Valor de {} ajustado de {:.2} para {:.2} (limite: 0 a total)",
            self.side, self.entered, self.clamped
        )
    }
}

/// Result of [`allocate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationOutcome {
    /// Resulting split
    pub allocation: Allocation,
    /// Set when the typed value was out of range
    pub warning: Option<ClampWarning>,
}

impl AllocationOutcome {
    /// Shortcut for `allocation.reconciles()`.
    #[must_use]
    pub fn reconciles(&self) -> bool {
        self.allocation.reconciles()
    }
}

/// Splits `total` using `entered` as the free side.
///
/// The free side is clamped to `[0, total]` (a non-finite entry counts as 0);
/// the dependent side is `total - free`, floored at zero. A negative or
/// non-finite total is treated as zero.
#[must_use]
pub fn allocate(total: f64, side: FreeSide, entered: f64) -> AllocationOutcome {
    let total = if total.is_finite() { total.max(0.0) } else { 0.0 };
    let candidate = if entered.is_finite() { entered } else { 0.0 };
    let free = candidate.clamp(0.0, total);
    let dependent = (total - free).max(0.0);

    let warning = (free != entered).then_some(ClampWarning {
        side,
        entered,
        clamped: free,
    });

    let (nd30, nd39) = match side {
        FreeSide::Nd30 => (free, dependent),
        FreeSide::Nd39 => (dependent, free),
    };

    AllocationOutcome {
        allocation: Allocation {
            nd30,
            nd39,
            total,
            free_side: side,
        },
        warning,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_scenario_c_clamps_free_side() {
        let outcome = allocate(1000.0, FreeSide::Nd39, 1200.0);
        assert_eq!(outcome.allocation.nd39, 1000.0);
        assert_eq!(outcome.allocation.nd30, 0.0);
        assert!(outcome.reconciles());
        let warning = outcome.warning.expect("clamp warning");
        assert_eq!(warning.entered, 1200.0);
        assert_eq!(warning.clamped, 1000.0);
    }

    #[test]
    fn test_scenario_d_derives_remainder() {
        let outcome = allocate(1000.0, FreeSide::Nd30, 400.0);
        assert_eq!(outcome.allocation.nd30, 400.0);
        assert_eq!(outcome.allocation.nd39, 600.0);
        assert!(outcome.reconciles());
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn test_sides_always_sum_to_total() {
        let entries = [
            f64::NEG_INFINITY,
            -1e9,
            -0.01,
            0.0,
            0.004,
            333.33,
            999.99,
            1e12,
            f64::INFINITY,
            f64::NAN,
        ];
        for total in [0.0, 0.01, 10.0, 1234.56, 1e7] {
            for side in [FreeSide::Nd30, FreeSide::Nd39] {
                for entered in entries {
                    let allocation = allocate(total, side, entered).allocation;
                    assert!(allocation.reconciles(), "{total} {side} {entered}");
                    assert!(allocation.nd30 >= 0.0 && allocation.nd39 >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_clamped_value_is_a_fixed_point() {
        for entered in [-50.0, 0.0, 420.0, 5000.0, f64::NAN] {
            let first = allocate(1000.0, FreeSide::Nd39, entered);
            let second = allocate(1000.0, FreeSide::Nd39, first.allocation.free_value());
            assert_eq!(first.allocation, second.allocation);
            assert!(second.warning.is_none());
        }
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let allocation = Allocation {
            nd30: 100.0,
            nd39: 100.0,
            total: 250.0,
            free_side: FreeSide::Nd30,
        };
        assert!(matches!(
            allocation.validate(),
            Err(Error::NotReconciled { .. })
        ));
    }

    #[test]
    fn test_free_side_codes() {
        assert_eq!("nd39".parse::<FreeSide>().ok(), Some(FreeSide::Nd39));
        assert!("nd33".parse::<FreeSide>().is_err());
        assert_eq!(FreeSide::Nd30.to_string(), "ND 30");
    }
}
