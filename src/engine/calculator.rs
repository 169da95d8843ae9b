//! Unit-rate calculator.
//!
//! Turns a [`CostInput`] into a base quantity with the category's formula, then
//! runs the margin applier over it. Nothing here fails: missing or malformed
//! input produces [`Calculation::Insufficient`], which counts as zero.

use serde::{Deserialize, Serialize};

use super::{
    category::{Category, CategoryConfig, Formula},
    input::{CostInput, RateField},
    margin::{apply_margin, margin_amount, split_etapa_days},
};

/// Upper bound for refeições intermediárias per day.
pub const MAX_REFEICOES_INTERMEDIARIAS: f64 = 3.0;

/// Unit of the base and final quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Fuel liters
    Liters,
    /// Brazilian reais
    Reais,
}

/// Named component of a derived calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubtotalKind {
    /// Complemento de etapa, QS
    ComplementoQs,
    /// Etapa a solicitar, QS
    EtapaQs,
    /// Complemento de etapa, QR
    ComplementoQr,
    /// Etapa a solicitar, QR
    EtapaQr,
    /// Pre-margin amount
    Base,
    /// Margin amount
    Margin,
}

impl SubtotalKind {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ComplementoQs => "Complemento de etapa (QS)",
            Self::EtapaQs => "Etapa a solicitar (QS)",
            Self::ComplementoQr => "Complemento de etapa (QR)",
            Self::EtapaQr => "Etapa a solicitar (QR)",
            Self::Base => "Base",
            Self::Margin => "Margem",
        }
    }
}

/// One named component value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subtotal {
    /// Component name
    pub kind: SubtotalKind,
    /// Component value in reais
    pub value: f64,
}

/// Pure output of calculator and margin applier. Recomputed on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCalculation {
    /// Category the calculation belongs to
    pub category: Category,
    /// Unit of the quantities
    pub unit: Unit,
    /// Quantity before the margin
    pub base_quantity: f64,
    /// Margin factor that was applied
    pub margin: f64,
    /// Quantity after the margin
    pub final_quantity: f64,
    /// Named components shown in the narrative
    pub subtotals: Vec<Subtotal>,
    /// Monetary total, the amount the allocator splits
    pub total_value: f64,
}

impl DerivedCalculation {
    /// Value of a named component, if this calculation has it.
    #[must_use]
    pub fn subtotal(&self, kind: SubtotalKind) -> Option<f64> {
        self.subtotals
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.value)
    }
}

/// Input that prevented a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    /// Efetivo / quantity not positive
    Quantity,
    /// Day count not positive
    Days,
    /// Required rate missing or not positive
    Rate(RateField),
}

impl MissingInput {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Quantity => "quantidade/efetivo",
            Self::Days => "número de dias",
            Self::Rate(field) => field.label(),
        }
    }
}

/// Calculator result: a derived calculation or the "insufficient data" marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Calculation {
    /// All required inputs present
    Ready(DerivedCalculation),
    /// Nothing to calculate yet
    Insufficient(Vec<MissingInput>),
}

impl Calculation {
    /// Monetary total, zero when data is insufficient.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        match self {
            Self::Ready(derived) => derived.total_value,
            Self::Insufficient(_) => 0.0,
        }
    }

    /// The derived calculation, if ready.
    #[must_use]
    pub const fn derived(&self) -> Option<&DerivedCalculation> {
        match self {
            Self::Ready(derived) => Some(derived),
            Self::Insufficient(_) => None,
        }
    }

    /// User-facing explanation for the insufficient case.
    #[must_use]
    pub fn insufficient_message(&self) -> Option<String> {
        match self {
            Self::Ready(_) => None,
            Self::Insufficient(missing) => Some(format!(
                "Dados insuficientes: informe {}",
                missing
                    .iter()
                    .map(|m| m.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Base quantity before margin.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseQuantity {
    /// Unit of `value`
    pub unit: Unit,
    /// Quantity before the margin
    pub value: f64,
    /// Formula-specific components (only rations have any)
    pub subtotals: Vec<Subtotal>,
}

fn missing_inputs(config: &CategoryConfig, input: &CostInput) -> Vec<MissingInput> {
    let mut missing = Vec::new();
    if input.quantity <= 0 {
        missing.push(MissingInput::Quantity);
    }
    if input.days <= 0 {
        missing.push(MissingInput::Days);
    }
    missing.extend(
        config
            .fields
            .iter()
            .filter(|field| input.rates.positive(**field).is_none())
            .map(|field| MissingInput::Rate(*field)),
    );
    missing
}

/// Computes the base quantity for a category.
///
/// # Errors
/// Returns the missing inputs when quantity, days or a required rate is not
/// positive and finite.
#[allow(clippy::cast_precision_loss)]
pub fn compute(
    config: &CategoryConfig,
    input: &CostInput,
) -> std::result::Result<BaseQuantity, Vec<MissingInput>> {
    let missing = missing_inputs(config, input);
    if !missing.is_empty() {
        return Err(missing);
    }

    let quantity = input.quantity as f64;
    let days = input.days as f64;
    let rate = |field| input.rates.positive(field).unwrap_or(0.0);

    let base = match config.formula {
        Formula::HourlyConsumption => BaseQuantity {
            unit: Unit::Liters,
            value: quantity
                * rate(RateField::ConsumptionPerHour)
                * rate(RateField::HoursPerDay)
                * days,
            subtotals: Vec::new(),
        },
        Formula::DistanceConsumption => BaseQuantity {
            unit: Unit::Liters,
            value: quantity * rate(RateField::KmPerDay) * days / rate(RateField::KmPerLiter),
            subtotals: Vec::new(),
        },
        Formula::Flat => BaseQuantity {
            unit: Unit::Reais,
            value: quantity * rate(RateField::DailyRate) * days,
            subtotals: Vec::new(),
        },
        Formula::Ration => ration(input, quantity, days),
    };

    if base.value.is_finite() {
        Ok(base)
    } else {
        Err(vec![MissingInput::Quantity])
    }
}

#[allow(clippy::cast_precision_loss)]
fn ration(input: &CostInput, efetivo: f64, days: f64) -> BaseQuantity {
    let refeicoes = input
        .rates
        .positive(RateField::RefeicoesIntermediarias)
        .unwrap_or(0.0)
        .floor()
        .min(MAX_REFEICOES_INTERMEDIARIAS);
    let requested_days = split_etapa_days(input.days).requested_days as f64;

    let complemento = |valor: f64| efetivo * refeicoes * (valor / 3.0) * days;
    let etapa = |valor: f64| efetivo * valor * requested_days;

    let valor_qs = input.rates.positive(RateField::ValorQs).unwrap_or(0.0);
    let valor_qr = input.rates.positive(RateField::ValorQr).unwrap_or(0.0);

    let subtotals = vec![
        Subtotal {
            kind: SubtotalKind::ComplementoQs,
            value: complemento(valor_qs),
        },
        Subtotal {
            kind: SubtotalKind::EtapaQs,
            value: etapa(valor_qs),
        },
        Subtotal {
            kind: SubtotalKind::ComplementoQr,
            value: complemento(valor_qr),
        },
        Subtotal {
            kind: SubtotalKind::EtapaQr,
            value: etapa(valor_qr),
        },
    ];

    BaseQuantity {
        unit: Unit::Reais,
        value: subtotals.iter().map(|s| s.value).sum(),
        subtotals,
    }
}

/// Runs calculator and margin applier for one input.
#[must_use]
pub fn derive(config: &CategoryConfig, input: &CostInput) -> Calculation {
    let base = match compute(config, input) {
        Ok(base) => base,
        Err(missing) => return Calculation::Insufficient(missing),
    };

    let final_quantity = apply_margin(base.value, config.margin);
    let mut subtotals = base.subtotals;
    if config.margin > 0.0 {
        subtotals.push(Subtotal {
            kind: SubtotalKind::Base,
            value: base.value,
        });
        subtotals.push(Subtotal {
            kind: SubtotalKind::Margin,
            value: margin_amount(base.value, config.margin),
        });
    }

    let total_value = match base.unit {
        Unit::Reais => final_quantity,
        Unit::Liters => input
            .rates
            .positive(RateField::UnitPrice)
            .map_or(0.0, |price| final_quantity * price),
    };

    Calculation::Ready(DerivedCalculation {
        category: input.category,
        unit: base.unit,
        base_quantity: base.value,
        margin: if config.margin.is_finite() {
            config.margin.max(0.0)
        } else {
            0.0
        },
        final_quantity,
        subtotals,
        total_value,
    })
}
