//! Margin and fraction applier.

/// Length of one etapa cycle in days.
pub const CYCLE_DAYS: i64 = 30;

/// Days of each cycle already paid through the regular etapa.
pub const PAID_DAYS_PER_CYCLE: i64 = 22;

/// Applies a multiplicative margin: `base × (1 + factor)`.
///
/// A non-finite base yields zero; a negative or non-finite factor is treated as
/// no margin.
#[must_use]
pub fn apply_margin(base: f64, factor: f64) -> f64 {
    if !base.is_finite() {
        return 0.0;
    }
    let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
    base * (1.0 + factor)
}

/// The margin amount alone, `final - base`.
#[must_use]
pub fn margin_amount(base: f64, factor: f64) -> f64 {
    apply_margin(base, factor) - if base.is_finite() { base } else { 0.0 }
}

/// Day partition of a ration period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubPeriods {
    /// Days covered by the etapa already paid
    pub paid_days: i64,
    /// Days whose etapa has to be requested
    pub requested_days: i64,
}

/// Splits `days` into paid and requested days using whole cycles of `cycle_days`.
///
/// Every complete cycle contributes `paid_per_cycle` paid days and the rest as
/// requested days; the trailing partial cycle is paid first and only the days
/// beyond `paid_per_cycle` are requested. Non-positive input gives zero for both.
#[must_use]
pub fn split_into_subperiods(days: i64, cycle_days: i64, paid_per_cycle: i64) -> SubPeriods {
    if days <= 0 || cycle_days <= 0 {
        return SubPeriods::default();
    }
    let paid_per_cycle = paid_per_cycle.clamp(0, cycle_days);
    let cycles = days / cycle_days;
    let remainder = days % cycle_days;

    SubPeriods {
        paid_days: cycles * paid_per_cycle + remainder.min(paid_per_cycle),
        requested_days: cycles * (cycle_days - paid_per_cycle)
            + (remainder - paid_per_cycle).max(0),
    }
}

/// [`split_into_subperiods`] with the standard 30-day cycle of 22 paid days.
#[must_use]
pub fn split_etapa_days(days: i64) -> SubPeriods {
    split_into_subperiods(days, CYCLE_DAYS, PAID_DAYS_PER_CYCLE)
}
