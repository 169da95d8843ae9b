//! Snapshot-and-diff staleness tracking.
//!
//! A [`Snapshot`] captures the form values that produced the staged item. The
//! staleness flag is never stored; it is recomputed by diffing the snapshot
//! against the current form.

use super::{
    allocator::MONEY_TOLERANCE,
    input::{CostInput, Rates},
    record::FundsDetail,
};

const QUANTITY_TOLERANCE: f64 = 1e-9;

/// Form values baked into a staged item.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Calculation inputs, destination included
    pub input: CostInput,
    /// Typed value of the free allocator side after clamping
    pub free_value: f64,
    /// Suprimento de Fundos detail baked into the record
    pub funds_detail: Option<FundsDetail>,
}

/// Result of the three independent checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Staleness {
    /// Calculation inputs differ from the staged ones
    pub inputs_changed: bool,
    /// Free allocator side differs from the staged one
    pub allocation_changed: bool,
    /// Destination organization differs from the staged one
    pub destination_changed: bool,
}

impl Staleness {
    /// Any check fired.
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        self.inputs_changed || self.allocation_changed || self.destination_changed
    }
}

fn same_value(a: Option<f64>, b: Option<f64>, tolerance: f64) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() < tolerance || (a.is_nan() && b.is_nan()),
        _ => false,
    }
}

fn same_rates(a: &Rates, b: &Rates) -> bool {
    Rates::FIELDS.iter().all(|field| {
        let tolerance = if field.is_monetary() {
            MONEY_TOLERANCE
        } else {
            QUANTITY_TOLERANCE
        };
        same_value(a.get(*field), b.get(*field), tolerance)
    })
}

fn same_calculation_inputs(a: &CostInput, b: &CostInput) -> bool {
    a.category == b.category
        && a.holder == b.holder
        && a.phase == b.phase
        && a.days == b.days
        && a.quantity == b.quantity
        && a.fuel_type == b.fuel_type
        && same_rates(&a.rates, &b.rates)
}

fn same_funds_detail(a: Option<&FundsDetail>, b: Option<&FundsDetail>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.purpose.trim() == b.purpose.trim()
                && a.items.len() == b.items.len()
                && a.items.iter().zip(&b.items).all(|(x, y)| {
                    x.description.trim() == y.description.trim()
                        && same_value(Some(x.value), Some(y.value), MONEY_TOLERANCE)
                })
        }
        _ => false,
    }
}

impl Snapshot {
    /// Captures the current form values.
    #[must_use]
    pub fn capture(
        input: &CostInput,
        free_value: f64,
        funds_detail: Option<&FundsDetail>,
    ) -> Self {
        Self {
            input: input.clone(),
            free_value,
            funds_detail: funds_detail.cloned(),
        }
    }

    /// Compares the snapshot with the current form values.
    ///
    /// A changed funds detail counts as a changed input.
    #[must_use]
    pub fn diff(
        &self,
        input: &CostInput,
        free_value: f64,
        funds_detail: Option<&FundsDetail>,
    ) -> Staleness {
        Staleness {
            inputs_changed: !same_calculation_inputs(&self.input, input)
                || !same_funds_detail(self.funds_detail.as_ref(), funds_detail),
            allocation_changed: !same_value(
                Some(self.free_value),
                Some(free_value),
                MONEY_TOLERANCE,
            ),
            destination_changed: self.input.destination != input.destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        category::Category,
        input::{ActivityPhase, OrgRef, Phase, RateField},
        record::FundsItem,
    };

    fn sample() -> CostInput {
        let mut input = CostInput::new(Category::ClasseII, OrgRef::new("1º BIS", "160001"));
        input.destination = Some(OrgRef::new("8º BEC", "160002"));
        input.phase = ActivityPhase::of([Phase::Execucao]);
        input.days = 30;
        input.quantity = 5;
        input.rates = Rates::default().with(RateField::DailyRate, 10.0);
        input
    }

    #[test]
    fn test_fresh_snapshot_is_clean() {
        let input = sample();
        let snapshot = Snapshot::capture(&input, 400.0, None);
        assert!(!snapshot.diff(&input, 400.0, None).is_dirty());
    }

    #[test]
    fn test_each_check_fires_independently() {
        let input = sample();
        let snapshot = Snapshot::capture(&input, 400.0, None);

        let mut changed_days = input.clone();
        changed_days.days = 31;
        assert_eq!(
            snapshot.diff(&changed_days, 400.0, None),
            Staleness {
                inputs_changed: true,
                ..Staleness::default()
            }
        );

        assert_eq!(
            snapshot.diff(&input, 401.0, None),
            Staleness {
                allocation_changed: true,
                ..Staleness::default()
            }
        );

        let mut moved = input;
        moved.destination = Some(OrgRef::new("12º B Sup", "160003"));
        assert_eq!(
            snapshot.diff(&moved, 400.0, None),
            Staleness {
                destination_changed: true,
                ..Staleness::default()
            }
        );
    }

    #[test]
    fn test_monetary_fields_use_cent_tolerance() {
        let input = sample();
        let snapshot = Snapshot::capture(&input, 400.0, None);

        let mut nudged = input.clone();
        nudged.rates.set(RateField::DailyRate, Some(10.001));
        assert!(!snapshot.diff(&nudged, 400.004, None).is_dirty());

        nudged.rates.set(RateField::DailyRate, Some(10.05));
        assert!(snapshot.diff(&nudged, 400.0, None).inputs_changed);

        let mut hourly = input;
        hourly.rates.set(RateField::HoursPerDay, Some(8.0));
        let hourly_snapshot = Snapshot::capture(&hourly, 0.0, None);
        hourly.rates.set(RateField::HoursPerDay, Some(8.001));
        assert!(hourly_snapshot.diff(&hourly, 0.0, None).inputs_changed);
    }

    #[test]
    fn test_reverting_a_field_clears_the_flag() {
        let mut input = sample();
        let snapshot = Snapshot::capture(&input, 0.0, None);
        input.quantity = 6;
        assert!(snapshot.diff(&input, 0.0, None).is_dirty());
        input.quantity = 5;
        assert!(!snapshot.diff(&input, 0.0, None).is_dirty());
    }

    #[test]
    fn test_funds_detail_change_marks_inputs_changed() {
        let input = sample();
        let detail = FundsDetail {
            purpose: "Aquisição de material de expediente".to_string(),
            items: vec![FundsItem {
                description: "Papel A4".to_string(),
                value: 300.0,
            }],
        };
        let snapshot = Snapshot::capture(&input, 0.0, Some(&detail));
        assert!(!snapshot.diff(&input, 0.0, Some(&detail)).is_dirty());

        let mut edited = detail.clone();
        edited.purpose = "Nova finalidade".to_string();
        assert!(snapshot.diff(&input, 0.0, Some(&edited)).inputs_changed);

        let mut repriced = detail;
        repriced.items[0].value = 350.0;
        assert!(snapshot.diff(&input, 0.0, Some(&repriced)).inputs_changed);

        assert!(snapshot.diff(&input, 0.0, None).inputs_changed);
    }
}
