//! Editing lifecycle of one category form.
//!
//! `Empty → BaseReady → SolicitationReady → Staged → Committed`, with `edit`
//! returning a committed item to `Staged` while keeping its persisted id so the
//! next commit is an update. The state is derived from the session contents on
//! every call, never stored.

use std::fmt;

use tracing::warn;

use super::{
    allocator::{AllocationOutcome, ClampWarning, allocate},
    calculator::{Calculation, DerivedCalculation, derive},
    category::CategoryConfig,
    input::{CostInput, OrgRef},
    record::{ConsolidatedRecord, FundsDetail},
    staleness::{Snapshot, Staleness},
};
use crate::errors::{Error, Result};

/// Editing state of a category form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No destination organization or phase chosen
    Empty,
    /// Destination and phase chosen
    BaseReady,
    /// Quantities valid and the total is positive
    SolicitationReady,
    /// Item staged and still matching the form
    Staged,
    /// Staged item persisted
    Committed,
}

impl EditState {
    /// Lower-case description used in messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Empty => "no organization or phase is selected",
            Self::BaseReady => "the quantities are incomplete",
            Self::SolicitationReady => "the item is not staged",
            Self::Staged => "the item is staged",
            Self::Committed => "the item is already saved",
        }
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Calculation frozen at stage time together with the form values behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedItem {
    /// Form values the record was computed from
    pub snapshot: Snapshot,
    /// Record handed to persistence on commit
    pub record: ConsolidatedRecord,
}

/// What the orchestration layer has to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    /// Persisted id when the commit is an update
    pub id: Option<i64>,
    /// Staged record to persist
    pub record: ConsolidatedRecord,
}

/// Form state of one category, owned by the active form.
#[derive(Debug, Clone)]
pub struct EditSession {
    config: CategoryConfig,
    input: CostInput,
    free_value: f64,
    memoria_override: Option<String>,
    funds_detail: Option<FundsDetail>,
    staged: Option<StagedItem>,
    record_id: Option<i64>,
    committed: bool,
}

impl EditSession {
    /// Blank session for the category of `input`.
    #[must_use]
    pub const fn new(config: CategoryConfig, input: CostInput) -> Self {
        Self {
            config,
            input,
            free_value: 0.0,
            memoria_override: None,
            funds_detail: None,
            staged: None,
            record_id: None,
            committed: false,
        }
    }

    /// Session holding a persisted record, in the `Committed` state.
    #[must_use]
    pub fn from_record(config: CategoryConfig, id: i64, record: ConsolidatedRecord) -> Self {
        let free_value = record.allocation.free_value();
        let snapshot = Snapshot::capture(&record.input, free_value, record.funds_detail.as_ref());
        Self {
            config,
            input: record.input.clone(),
            free_value,
            memoria_override: record.memoria_override.clone(),
            funds_detail: record.funds_detail.clone(),
            staged: Some(StagedItem { snapshot, record }),
            record_id: Some(id),
            committed: true,
        }
    }

    /// Category rules the session computes with.
    #[must_use]
    pub const fn config(&self) -> &CategoryConfig {
        &self.config
    }

    /// Current form fields.
    #[must_use]
    pub const fn input(&self) -> &CostInput {
        &self.input
    }

    /// Mutable form fields; staleness is recomputed on the next query.
    pub const fn input_mut(&mut self) -> &mut CostInput {
        &mut self.input
    }

    /// Selects the destination organization.
    pub fn set_destination(&mut self, destination: OrgRef) {
        self.input.destination = Some(destination);
    }

    /// Typed value of the free allocator side.
    #[must_use]
    pub const fn free_value(&self) -> f64 {
        self.free_value
    }

    /// Types a value into the free allocator side.
    pub const fn set_free_value(&mut self, value: f64) {
        self.free_value = value;
    }

    /// Replaces the Suprimento de Fundos detail; a change after staging dirties the item.
    pub fn set_funds_detail(&mut self, detail: Option<FundsDetail>) {
        self.funds_detail = detail;
    }

    /// Persisted id, once the item was committed or loaded.
    #[must_use]
    pub const fn record_id(&self) -> Option<i64> {
        self.record_id
    }

    /// Item frozen by the last `stage`.
    #[must_use]
    pub const fn staged(&self) -> Option<&StagedItem> {
        self.staged.as_ref()
    }

    /// Live calculation preview for the current form.
    #[must_use]
    pub fn preview(&self) -> Calculation {
        derive(&self.config, &self.input)
    }

    /// Live allocation preview for the current form.
    #[must_use]
    pub fn allocation_preview(&self) -> AllocationOutcome {
        allocate(
            self.preview().total_value(),
            self.config.free_side,
            self.free_value,
        )
    }

    /// Result of the three staleness checks, `None` when nothing is staged.
    #[must_use]
    pub fn staleness(&self) -> Option<Staleness> {
        self.staged
            .as_ref()
            .map(|staged| {
                staged
                    .snapshot
                    .diff(&self.input, self.free_value, self.funds_detail.as_ref())
            })
    }

    /// The form differs from the staged item.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.staleness().is_some_and(Staleness::is_dirty)
    }

    fn base_ready(&self) -> bool {
        self.input.has_destination() && !self.input.phase.is_empty()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EditState {
        if self.staged.is_some() && !self.is_dirty() {
            return if self.committed {
                EditState::Committed
            } else {
                EditState::Staged
            };
        }
        if !self.base_ready() {
            return EditState::Empty;
        }
        if self.preview().total_value() > 0.0 {
            EditState::SolicitationReady
        } else {
            EditState::BaseReady
        }
    }

    /// Stages the current form ("save item to category").
    ///
    /// An out-of-range free side is clamped and written back to the form so the
    /// staged item matches it; the clamp is reported as a warning, not an error.
    /// A committed item has to be re-opened with [`Self::edit`] first.
    pub fn stage(&mut self) -> Result<Option<ClampWarning>> {
        if self.committed {
            warn!(action = "stage", "Rejected editing transition on a saved item");
            return Err(Error::InvalidTransition {
                action: "stage",
                state: EditState::Committed.describe(),
            });
        }
        if !self.input.has_destination() {
            return Err(Error::Validation {
                message: "Selecione a OM de destino".to_string(),
            });
        }
        if self.input.phase.is_empty() {
            return Err(Error::Validation {
                message: "Informe a fase da atividade".to_string(),
            });
        }

        let derived: DerivedCalculation = match self.preview() {
            Calculation::Ready(derived) => derived,
            insufficient @ Calculation::Insufficient(_) => {
                return Err(Error::Validation {
                    message: insufficient
                        .insufficient_message()
                        .unwrap_or_else(|| "Dados insuficientes".to_string()),
                });
            }
        };
        if derived.total_value <= 0.0 {
            return Err(Error::Validation {
                message: "O valor total calculado é zero".to_string(),
            });
        }

        let outcome = allocate(derived.total_value, self.config.free_side, self.free_value);
        outcome.allocation.validate()?;
        if let Some(warning) = outcome.warning {
            warn!(category = %self.input.category.code(), "{warning}");
        }
        self.free_value = outcome.allocation.free_value();

        let record = ConsolidatedRecord {
            input: self.input.clone(),
            derived,
            allocation: outcome.allocation,
            memoria_override: self.memoria_override.clone(),
            funds_detail: self.funds_detail.clone(),
        };
        self.staged = Some(StagedItem {
            snapshot: Snapshot::capture(&self.input, self.free_value, self.funds_detail.as_ref()),
            record,
        });
        self.committed = false;
        Ok(outcome.warning)
    }

    fn reject(&self, action: &'static str) -> Error {
        let state = self.state();
        warn!(action, state = %state, "Rejected editing transition");
        Error::InvalidTransition {
            action,
            state: state.describe(),
        }
    }

    /// Validates the final save and returns what to persist.
    pub fn commit_request(&self) -> Result<CommitRequest> {
        let Some(staged) = self.staged.as_ref() else {
            return Err(self.reject("save"));
        };
        if self.is_dirty() {
            return Err(Error::Stale);
        }
        if self.committed {
            return Err(self.reject("save"));
        }
        staged.record.allocation.validate()?;
        Ok(CommitRequest {
            id: self.record_id,
            record: staged.record.clone(),
        })
    }

    /// Records a successful persistence call.
    pub const fn mark_committed(&mut self, id: i64) {
        self.record_id = Some(id);
        self.committed = true;
    }

    /// Re-opens a committed item for editing, keeping its persisted id.
    ///
    /// Form fields may already have been changed; the next `stage` picks them up.
    pub fn edit(&mut self) -> Result<()> {
        if !self.committed {
            return Err(self.reject("edit"));
        }
        self.committed = false;
        Ok(())
    }

    /// Sets or clears the narrative override; blank text clears it.
    ///
    /// The override does not affect any number, so it never makes the item stale.
    pub fn set_memoria_override(&mut self, text: Option<String>) {
        let text = text.filter(|t| !t.trim().is_empty());
        if let Some(staged) = self.staged.as_mut() {
            staged.record.memoria_override.clone_from(&text);
        }
        self.memoria_override = text;
    }

    /// Narrative the form currently shows.
    #[must_use]
    pub fn memoria(&self) -> Option<String> {
        self.staged.as_ref().map(|s| s.record.memoria())
    }

    /// Back to `Empty`, keeping category, configuration and holder.
    pub fn reset(&mut self) {
        let input = CostInput::new(self.input.category, self.input.holder.clone());
        *self = Self::new(self.config, input);
    }
}
