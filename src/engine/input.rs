//! Raw per-category entry: organizations, phase, day count, quantity and rates.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

use super::category::Category;
use crate::errors::{Error, Result};

/// Organization reference: OM (military unit) name plus its UG (budget unit code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrgRef {
    /// Organização Militar
    pub om: String,
    /// Unidade Gestora
    pub ug: String,
}

impl OrgRef {
    /// Builds a reference, trimming both halves.
    pub fn new(om: impl Into<String>, ug: impl Into<String>) -> Self {
        Self {
            om: om.into().trim().to_string(),
            ug: ug.into().trim().to_string(),
        }
    }

    /// Both halves are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.om.trim().is_empty() && !self.ug.trim().is_empty()
    }
}

impl fmt::Display for OrgRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (UG {})", self.om, self.ug)
    }
}

/// Fixed activity phases offered by the forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Reconhecimento
    Reconhecimento,
    /// Mobilização
    Mobilizacao,
    /// Execução
    Execucao,
    /// Desmobilização
    Desmobilizacao,
}

impl Phase {
    /// Every phase in display order
    pub const ALL: [Self; 4] = [
        Self::Reconhecimento,
        Self::Mobilizacao,
        Self::Execucao,
        Self::Desmobilizacao,
    ];

    /// Storage code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Reconhecimento => "reconhecimento",
            Self::Mobilizacao => "mobilizacao",
            Self::Execucao => "execucao",
            Self::Desmobilizacao => "desmobilizacao",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reconhecimento => "Reconhecimento",
            Self::Mobilizacao => "Mobilização",
            Self::Execucao => "Execução",
            Self::Desmobilizacao => "Desmobilização",
        }
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == s.trim())
            .ok_or_else(|| Error::Validation {
                message: format!("Fase desconhecida: {s}"),
            })
    }
}

/// Activity phase label composed from the fixed set plus optional custom text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityPhase {
    /// Selected fixed phases
    pub phases: BTreeSet<Phase>,
    /// Free text appended after the fixed phases
    pub custom: Option<String>,
}

impl ActivityPhase {
    /// Phase made of the given fixed phases only.
    pub fn of(phases: impl IntoIterator<Item = Phase>) -> Self {
        Self {
            phases: phases.into_iter().collect(),
            custom: None,
        }
    }

    /// Adds custom text; blank text is ignored.
    #[must_use]
    pub fn with_custom(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.custom = (!text.trim().is_empty()).then(|| text.trim().to_string());
        self
    }

    /// Nothing selected and no custom text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty() && self.custom.as_deref().is_none_or(|c| c.trim().is_empty())
    }

    /// Display label, e.g. `"Mobilização, Execução, Apoio à Defesa Civil"`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts: Vec<&str> = self.phases.iter().map(|p| p.label()).collect();
        if let Some(custom) = self.custom.as_deref().filter(|c| !c.trim().is_empty()) {
            parts.push(custom.trim());
        }
        parts.join(", ")
    }

    /// Comma-separated storage codes of the fixed phases.
    #[must_use]
    pub fn codes(&self) -> String {
        self.phases
            .iter()
            .map(|p| p.code())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Rebuilds a phase from its storage codes and custom text.
    pub fn from_codes(codes: &str, custom: Option<String>) -> Result<Self> {
        let phases = codes
            .split(',')
            .filter(|c| !c.trim().is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<Phase>>>()?;
        Ok(Self {
            phases,
            custom: custom.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Fuel kinds priced by the price-lookup collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    /// Óleo diesel
    Diesel,
    /// Gasolina
    Gasolina,
}

impl FuelType {
    /// Storage code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Diesel => "diesel",
            Self::Gasolina => "gasolina",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Diesel => "Óleo Diesel",
            Self::Gasolina => "Gasolina",
        }
    }
}

impl FromStr for FuelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "diesel" => Ok(Self::Diesel),
            "gasolina" => Ok(Self::Gasolina),
            other => Err(Error::Validation {
                message: format!("Combustível desconhecido: {other}"),
            }),
        }
    }
}

/// Named numeric rate a category may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    /// Price per unit (R$/L for fuel)
    UnitPrice,
    /// Liters consumed per hour of operation
    ConsumptionPerHour,
    /// Hours of operation per day
    HoursPerDay,
    /// Kilometers driven per day
    KmPerDay,
    /// Kilometers per liter
    KmPerLiter,
    /// Price per item per day
    DailyRate,
    /// Valor da etapa QS
    ValorQs,
    /// Valor da etapa QR
    ValorQr,
    /// Refeições intermediárias per day
    RefeicoesIntermediarias,
}

impl RateField {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnitPrice => "preço unitário",
            Self::ConsumptionPerHour => "consumo por hora",
            Self::HoursPerDay => "horas por dia",
            Self::KmPerDay => "km por dia",
            Self::KmPerLiter => "km por litro",
            Self::DailyRate => "valor diário",
            Self::ValorQs => "valor da etapa QS",
            Self::ValorQr => "valor da etapa QR",
            Self::RefeicoesIntermediarias => "refeições intermediárias",
        }
    }

    /// Money-valued field, compared with the monetary tolerance.
    #[must_use]
    pub const fn is_monetary(self) -> bool {
        matches!(
            self,
            Self::UnitPrice | Self::DailyRate | Self::ValorQs | Self::ValorQr
        )
    }
}

/// Bag of optional category-specific rates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rates {
    /// Fuel price per liter
    pub unit_price: Option<f64>,
    /// Liters per hour of a generator, boat or machine
    pub consumption_per_hour: Option<f64>,
    /// Operating hours per day
    pub hours_per_day: Option<f64>,
    /// Kilometers per vehicle per day
    pub km_per_day: Option<f64>,
    /// Vehicle consumption in km/L
    pub km_per_liter: Option<f64>,
    /// Reais per item (or person) per day
    pub daily_rate: Option<f64>,
    /// Etapa value, QS
    pub valor_qs: Option<f64>,
    /// Etapa value, QR
    pub valor_qr: Option<f64>,
    /// Intermediate meals per day (capped at 3)
    pub refeicoes_intermediarias: Option<f64>,
}

impl Rates {
    /// Every field, in storage order
    pub const FIELDS: [RateField; 9] = [
        RateField::UnitPrice,
        RateField::ConsumptionPerHour,
        RateField::HoursPerDay,
        RateField::KmPerDay,
        RateField::KmPerLiter,
        RateField::DailyRate,
        RateField::ValorQs,
        RateField::ValorQr,
        RateField::RefeicoesIntermediarias,
    ];

    /// Reads one field.
    #[must_use]
    pub const fn get(&self, field: RateField) -> Option<f64> {
        match field {
            RateField::UnitPrice => self.unit_price,
            RateField::ConsumptionPerHour => self.consumption_per_hour,
            RateField::HoursPerDay => self.hours_per_day,
            RateField::KmPerDay => self.km_per_day,
            RateField::KmPerLiter => self.km_per_liter,
            RateField::DailyRate => self.daily_rate,
            RateField::ValorQs => self.valor_qs,
            RateField::ValorQr => self.valor_qr,
            RateField::RefeicoesIntermediarias => self.refeicoes_intermediarias,
        }
    }

    /// Writes one field.
    pub const fn set(&mut self, field: RateField, value: Option<f64>) {
        let slot = match field {
            RateField::UnitPrice => &mut self.unit_price,
            RateField::ConsumptionPerHour => &mut self.consumption_per_hour,
            RateField::HoursPerDay => &mut self.hours_per_day,
            RateField::KmPerDay => &mut self.km_per_day,
            RateField::KmPerLiter => &mut self.km_per_liter,
            RateField::DailyRate => &mut self.daily_rate,
            RateField::ValorQs => &mut self.valor_qs,
            RateField::ValorQr => &mut self.valor_qr,
            RateField::RefeicoesIntermediarias => &mut self.refeicoes_intermediarias,
        };
        *slot = value;
    }

    /// Builder-style [`Rates::set`].
    #[must_use]
    pub const fn with(mut self, field: RateField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Positive, finite value of a field, if any.
    #[must_use]
    pub fn positive(&self, field: RateField) -> Option<f64> {
        self.get(field).filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// Per-category raw entry, as typed into a form.
///
/// `days` and `quantity` are signed so that malformed input can be represented;
/// the calculator treats anything non-positive as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostInput {
    /// Category of the form
    pub category: Category,
    /// OM detentora
    pub holder: OrgRef,
    /// OM de destino, `None` until the user picks one
    pub destination: Option<OrgRef>,
    /// Activity phase(s)
    pub phase: ActivityPhase,
    /// Number of days
    pub days: i64,
    /// Headcount (efetivo) or number of items
    pub quantity: i64,
    /// Category-specific rates
    pub rates: Rates,
    /// Fuel type for fuel categories
    pub fuel_type: Option<FuelType>,
}

impl CostInput {
    /// Blank entry for a category held by `holder`.
    #[must_use]
    pub fn new(category: Category, holder: OrgRef) -> Self {
        Self {
            category,
            holder,
            destination: None,
            phase: ActivityPhase::default(),
            days: 0,
            quantity: 0,
            rates: Rates::default(),
            fuel_type: None,
        }
    }

    /// Destination organization is chosen and complete.
    #[must_use]
    pub fn has_destination(&self) -> bool {
        self.destination.as_ref().is_some_and(OrgRef::is_complete)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_phase_label_combines_fixed_and_custom() {
        let phase = ActivityPhase::of([Phase::Execucao, Phase::Mobilizacao])
            .with_custom("  Apoio à Defesa Civil ");
        assert_eq!(phase.label(), "Mobilização, Execução, Apoio à Defesa Civil");
        assert_eq!(phase.codes(), "mobilizacao,execucao");
    }

    #[test]
    fn test_phase_from_codes() {
        let phase = ActivityPhase::from_codes("execucao,reconhecimento", None).unwrap();
        assert_eq!(
            phase,
            ActivityPhase::of([Phase::Reconhecimento, Phase::Execucao])
        );
        assert!(ActivityPhase::from_codes("", None).unwrap().is_empty());
        assert!(ActivityPhase::from_codes("invasao", None).is_err());
    }

    #[test]
    fn test_blank_custom_phase_is_empty() {
        let phase = ActivityPhase::default().with_custom("   ");
        assert!(phase.is_empty());
        assert!(!ActivityPhase::default().with_custom("Ajuda humanitária").is_empty());
    }

    #[test]
    fn test_rates_positive_rejects_bad_values() {
        let rates = Rates::default()
            .with(RateField::DailyRate, -3.0)
            .with(RateField::UnitPrice, f64::NAN)
            .with(RateField::HoursPerDay, 8.0);
        assert_eq!(rates.positive(RateField::DailyRate), None);
        assert_eq!(rates.positive(RateField::UnitPrice), None);
        assert_eq!(rates.positive(RateField::HoursPerDay), Some(8.0));
        assert_eq!(rates.positive(RateField::KmPerDay), None);
    }

    #[test]
    fn test_org_ref_completeness() {
        assert!(OrgRef::new("1º BIS", "160001").is_complete());
        assert!(!OrgRef::new("1º BIS", " ").is_complete());
        assert_eq!(OrgRef::new(" 1º BIS ", "160001").to_string(), "1º BIS (UG 160001)");
    }
}
