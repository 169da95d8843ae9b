//! Logistics categories and the dispatch table that parameterizes the engine.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{allocator::FreeSide, input::RateField};
use crate::errors::{Error, Result};

/// One logistics class (or sub-class) with its own form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Subsistência (rations)
    #[serde(rename = "classe_i")]
    ClasseI,
    /// Material de intendência
    #[serde(rename = "classe_ii")]
    ClasseII,
    /// Combustível para geradores
    #[serde(rename = "classe_iii_gerador")]
    ClasseIIIGerador,
    /// Combustível para embarcações
    #[serde(rename = "classe_iii_embarcacao")]
    ClasseIIIEmbarcacao,
    /// Combustível para equipamentos de engenharia
    #[serde(rename = "classe_iii_engenharia")]
    ClasseIIIEngenharia,
    /// Combustível para viaturas
    #[serde(rename = "classe_iii_viatura")]
    ClasseIIIViatura,
    /// Armamento
    #[serde(rename = "classe_v")]
    ClasseV,
    /// Material de engenharia
    #[serde(rename = "classe_vi")]
    ClasseVI,
    /// Comunicações e informática
    #[serde(rename = "classe_vii")]
    ClasseVII,
    /// Saúde
    #[serde(rename = "classe_viii")]
    ClasseVIII,
    /// Motomecanização
    #[serde(rename = "classe_ix")]
    ClasseIX,
    /// Diárias / hospedagem
    #[serde(rename = "diaria")]
    Diaria,
    /// Serviços de terceiros
    #[serde(rename = "servico")]
    Servico,
    /// Suprimento de fundos
    #[serde(rename = "suprimento_fundos")]
    SuprimentoFundos,
}

/// How a category turns its inputs into a base quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Formula {
    /// Cycle-partitioned etapa arithmetic for QS and QR
    Ration,
    /// `quantity × consumptionPerHour × hoursPerDay × days` liters
    HourlyConsumption,
    /// `(quantity × kmPerDay × days) / kmPerLiter` liters
    DistanceConsumption,
    /// `quantity × dailyRate × days` reais
    Flat,
}

impl Formula {
    /// Output is fuel liters priced afterwards.
    #[must_use]
    pub const fn is_fuel(self) -> bool {
        matches!(self, Self::HourlyConsumption | Self::DistanceConsumption)
    }
}

/// Per-category configuration record the generic engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryConfig {
    /// Calculation rule
    pub formula: Formula,
    /// Multiplicative margin, applied as `base × (1 + margin)`
    pub margin: f64,
    /// Allocator side the user types in
    pub free_side: FreeSide,
    /// Rates that must be positive for a non-zero calculation
    pub fields: &'static [RateField],
}

const RATION_FIELDS: &[RateField] = &[
    RateField::ValorQs,
    RateField::ValorQr,
    RateField::RefeicoesIntermediarias,
];
const HOURLY_FIELDS: &[RateField] = &[RateField::ConsumptionPerHour, RateField::HoursPerDay];
const DISTANCE_FIELDS: &[RateField] = &[RateField::KmPerDay, RateField::KmPerLiter];
const FLAT_FIELDS: &[RateField] = &[RateField::DailyRate];

const FUEL_MARGIN: f64 = 0.30;
const UPKEEP_MARGIN: f64 = 0.10;

impl Category {
    /// Every category in form order
    pub const ALL: [Self; 14] = [
        Self::ClasseI,
        Self::ClasseII,
        Self::ClasseIIIGerador,
        Self::ClasseIIIEmbarcacao,
        Self::ClasseIIIEngenharia,
        Self::ClasseIIIViatura,
        Self::ClasseV,
        Self::ClasseVI,
        Self::ClasseVII,
        Self::ClasseVIII,
        Self::ClasseIX,
        Self::Diaria,
        Self::Servico,
        Self::SuprimentoFundos,
    ];

    /// Storage code, identical to the serde name.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ClasseI => "classe_i",
            Self::ClasseII => "classe_ii",
            Self::ClasseIIIGerador => "classe_iii_gerador",
            Self::ClasseIIIEmbarcacao => "classe_iii_embarcacao",
            Self::ClasseIIIEngenharia => "classe_iii_engenharia",
            Self::ClasseIIIViatura => "classe_iii_viatura",
            Self::ClasseV => "classe_v",
            Self::ClasseVI => "classe_vi",
            Self::ClasseVII => "classe_vii",
            Self::ClasseVIII => "classe_viii",
            Self::ClasseIX => "classe_ix",
            Self::Diaria => "diaria",
            Self::Servico => "servico",
            Self::SuprimentoFundos => "suprimento_fundos",
        }
    }

    /// Title used in narratives and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ClasseI => "Classe I - Subsistência",
            Self::ClasseII => "Classe II - Material de Intendência",
            Self::ClasseIIIGerador => "Classe III - Geradores",
            Self::ClasseIIIEmbarcacao => "Classe III - Embarcações",
            Self::ClasseIIIEngenharia => "Classe III - Equipamentos de Engenharia",
            Self::ClasseIIIViatura => "Classe III - Viaturas",
            Self::ClasseV => "Classe V - Armamento",
            Self::ClasseVI => "Classe VI - Material de Engenharia",
            Self::ClasseVII => "Classe VII - Comunicações e Informática",
            Self::ClasseVIII => "Classe VIII - Saúde",
            Self::ClasseIX => "Classe IX - Motomecanização",
            Self::Diaria => "Diárias",
            Self::Servico => "Serviços de Terceiros",
            Self::SuprimentoFundos => "Suprimento de Fundos",
        }
    }

    /// Built-in configuration; margins and free sides can be overridden in `config.toml`.
    #[must_use]
    pub const fn default_config(self) -> CategoryConfig {
        match self {
            Self::ClasseI => CategoryConfig {
                formula: Formula::Ration,
                margin: 0.0,
                free_side: FreeSide::Nd30,
                fields: RATION_FIELDS,
            },
            Self::ClasseII => CategoryConfig {
                formula: Formula::Flat,
                margin: UPKEEP_MARGIN,
                free_side: FreeSide::Nd30,
                fields: FLAT_FIELDS,
            },
            Self::ClasseIIIGerador | Self::ClasseIIIEmbarcacao | Self::ClasseIIIEngenharia => {
                CategoryConfig {
                    formula: Formula::HourlyConsumption,
                    margin: FUEL_MARGIN,
                    free_side: FreeSide::Nd30,
                    fields: HOURLY_FIELDS,
                }
            }
            Self::ClasseIIIViatura => CategoryConfig {
                formula: Formula::DistanceConsumption,
                margin: FUEL_MARGIN,
                free_side: FreeSide::Nd30,
                fields: DISTANCE_FIELDS,
            },
            Self::ClasseV | Self::ClasseVI | Self::ClasseVII | Self::ClasseVIII | Self::ClasseIX => {
                CategoryConfig {
                    formula: Formula::Flat,
                    margin: UPKEEP_MARGIN,
                    free_side: FreeSide::Nd39,
                    fields: FLAT_FIELDS,
                }
            }
            Self::Diaria | Self::Servico => CategoryConfig {
                formula: Formula::Flat,
                margin: 0.0,
                free_side: FreeSide::Nd39,
                fields: FLAT_FIELDS,
            },
            Self::SuprimentoFundos => CategoryConfig {
                formula: Formula::Flat,
                margin: 0.0,
                free_side: FreeSide::Nd30,
                fields: FLAT_FIELDS,
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == s.trim())
            .ok_or_else(|| Error::Validation {
                message: format!("Categoria desconhecida: {s}"),
            })
    }
}
