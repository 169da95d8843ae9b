//! "Memória de cálculo" synthesis.
//!
//! Fixed Portuguese templates, one per formula, built from the derived
//! calculation. An override narrative replaces the text for display only.

use super::{
    allocator::Allocation,
    calculator::{DerivedCalculation, SubtotalKind, Unit},
    category::{Category, Formula},
    input::{CostInput, RateField},
    margin::split_etapa_days,
    record::FundsDetail,
};

/// Formats a number with `.` thousands and `,` decimals, e.g. `1.650,00`.
#[must_use]
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// Formats reais, e.g. `R$ 1.650,00`.
#[must_use]
pub fn format_brl(value: f64) -> String {
    format!("R$ {}", format_decimal(value, 2))
}

/// Formats a margin factor as a percentage, e.g. `0.15` → `15%`.
#[must_use]
pub fn format_percent(factor: f64) -> String {
    let pct = factor * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}%", format_decimal(pct, 0))
    } else {
        format!("{}%", format_decimal(pct, 2))
    }
}

fn format_quantity(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Liters => format!("{} L", format_decimal(value, 2)),
        Unit::Reais => format_brl(value),
    }
}

fn rate(input: &CostInput, field: RateField) -> f64 {
    input.rates.get(field).unwrap_or(0.0)
}

/// Picks the narrative to show: a non-blank override wins, else `synthesized()`.
pub fn resolve(memoria_override: Option<&str>, synthesized: impl FnOnce() -> String) -> String {
    memoria_override
        .filter(|text| !text.trim().is_empty())
        .map_or_else(synthesized, str::to_string)
}

/// Builds the automatic narrative for one item.
#[must_use]
pub fn synthesize(
    input: &CostInput,
    derived: &DerivedCalculation,
    allocation: &Allocation,
    funds_detail: Option<&FundsDetail>,
) -> String {
    let category = input.category;
    let destination = input
        .destination
        .as_ref()
        .map_or_else(|| input.holder.to_string(), ToString::to_string);

    let mut lines = vec![format!(
        "{} - em proveito de {}, fase: {}, durante {} dia(s).",
        category.label(),
        destination,
        input.phase.label(),
        input.days
    )];

    match category.default_config().formula {
        Formula::Ration => {
            let split = split_etapa_days(input.days);
            lines.push(format!(
                "Efetivo de {} militares, {} refeição(ões) intermediária(s), {} dia(s) de etapa paga e {} dia(s) de etapa a solicitar.",
                input.quantity,
                format_decimal(rate(input, RateField::RefeicoesIntermediarias), 0),
                split.paid_days,
                split.requested_days
            ));
            for (kind, valor) in [
                (SubtotalKind::ComplementoQs, RateField::ValorQs),
                (SubtotalKind::EtapaQs, RateField::ValorQs),
                (SubtotalKind::ComplementoQr, RateField::ValorQr),
                (SubtotalKind::EtapaQr, RateField::ValorQr),
            ] {
                lines.push(format!(
                    "{} (etapa de {}): {}",
                    kind.label(),
                    format_brl(rate(input, valor)),
                    format_brl(derived.subtotal(kind).unwrap_or(0.0))
                ));
            }
        }
        Formula::HourlyConsumption => {
            lines.push(format!(
                "{} equipamento(s) x {} L/h x {} h/dia x {} dia(s) = {}.",
                input.quantity,
                format_decimal(rate(input, RateField::ConsumptionPerHour), 2),
                format_decimal(rate(input, RateField::HoursPerDay), 1),
                input.days,
                format_quantity(derived.base_quantity, derived.unit)
            ));
        }
        Formula::DistanceConsumption => {
            lines.push(format!(
                "({} viatura(s) x {} km/dia x {} dia(s)) / {} km/L = {}.",
                input.quantity,
                format_decimal(rate(input, RateField::KmPerDay), 1),
                input.days,
                format_decimal(rate(input, RateField::KmPerLiter), 2),
                format_quantity(derived.base_quantity, derived.unit)
            ));
        }
        Formula::Flat => {
            lines.push(format!(
                "{} x {}/dia x {} dia(s) = {}.",
                input.quantity,
                format_brl(rate(input, RateField::DailyRate)),
                input.days,
                format_brl(derived.base_quantity)
            ));
        }
    }

    if derived.margin > 0.0 {
        lines.push(format!(
            "Margem de {}: {} => {}.",
            format_percent(derived.margin),
            format_quantity(derived.subtotal(SubtotalKind::Margin).unwrap_or(0.0), derived.unit),
            format_quantity(derived.final_quantity, derived.unit)
        ));
    }

    if derived.unit == Unit::Liters {
        let fuel = input.fuel_type.map_or("Combustível", |f| f.label());
        lines.push(format!(
            "{}: {} x {}/L = {}.",
            fuel,
            format_quantity(derived.final_quantity, derived.unit),
            format_brl(rate(input, RateField::UnitPrice)),
            format_brl(derived.total_value)
        ));
    }

    if let Some(detail) = funds_detail.filter(|_| category == Category::SuprimentoFundos) {
        lines.push(format!("Finalidade: {}.", detail.purpose.trim()));
        for item in &detail.items {
            lines.push(format!("- {}: {}", item.description.trim(), format_brl(item.value)));
        }
        if !detail.items.is_empty() {
            lines.push(format!("Soma dos itens: {}.", format_brl(detail.items_total())));
        }
    }

    lines.push(format!(
        "Total: {} (ND 30: {}; ND 39: {}).",
        format_brl(derived.total_value),
        format_brl(allocation.nd30),
        format_brl(allocation.nd39)
    ));
    lines.join("\n")
}
