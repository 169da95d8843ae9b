//! Consolidated record: the unit handed to persistence.

use serde::{Deserialize, Serialize};

use super::{
    allocator::Allocation, calculator::DerivedCalculation, input::CostInput, narrative,
};

/// One line of a Suprimento de Fundos detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsItem {
    /// What is being bought
    pub description: String,
    /// Estimated value in reais
    pub value: f64,
}

/// Structured detail for Suprimento de Fundos records.
///
/// Kept apart from the narrative override so that the free-text field only
/// ever holds narrative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FundsDetail {
    /// Finalidade do suprimento
    pub purpose: String,
    /// Itemized expenses
    #[serde(default)]
    pub items: Vec<FundsItem>,
}

impl FundsDetail {
    /// Sum of item values.
    #[must_use]
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.value).sum()
    }
}

/// Inputs, derived totals and allocation of one staged or persisted item.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRecord {
    /// Form values that produced the record
    pub input: CostInput,
    /// Calculation at stage time
    pub derived: DerivedCalculation,
    /// ND 30 / ND 39 split
    pub allocation: Allocation,
    /// Human-edited narrative shown instead of the synthesized one
    pub memoria_override: Option<String>,
    /// Structured Suprimento de Fundos detail
    pub funds_detail: Option<FundsDetail>,
}

impl ConsolidatedRecord {
    /// Narrative generated from the numbers, never affected by the override.
    #[must_use]
    pub fn synthesized_memoria(&self) -> String {
        narrative::synthesize(
            &self.input,
            &self.derived,
            &self.allocation,
            self.funds_detail.as_ref(),
        )
    }

    /// Narrative to display or print: the override when set, else the synthesized text.
    #[must_use]
    pub fn memoria(&self) -> String {
        narrative::resolve(self.memoria_override.as_deref(), || self.synthesized_memoria())
    }
}
