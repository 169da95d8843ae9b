//! Cost calculation and allocation engine.
//!
//! Pure, synchronous logic shared by every category form: the unit-rate
//! calculator, the margin/fraction applier, the ND 30 / ND 39 allocator,
//! staleness tracking and the editing lifecycle. Nothing in here touches the
//! database.

/// ND 30 / ND 39 budget-line allocator
pub mod allocator;
/// Unit-rate calculator and the composed derivation
pub mod calculator;
/// Category enum and per-category configuration table
pub mod category;
/// Raw form inputs
pub mod input;
/// Margins and ration day partition
pub mod margin;
/// "Memória de cálculo" synthesis and number formatting
pub mod narrative;
/// Consolidated record handed to persistence
pub mod record;
/// Editing lifecycle of a category form
pub mod session;
/// Snapshot-and-diff staleness checks
pub mod staleness;

pub use allocator::{Allocation, AllocationOutcome, ClampWarning, FreeSide, allocate};
pub use calculator::{Calculation, DerivedCalculation, derive};
pub use category::{Category, CategoryConfig, Formula};
pub use input::{ActivityPhase, CostInput, FuelType, OrgRef, Phase, RateField, Rates};
pub use record::{ConsolidatedRecord, FundsDetail, FundsItem};
pub use session::{CommitRequest, EditSession, EditState};
