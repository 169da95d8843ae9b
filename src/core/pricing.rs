//! Fuel price lookup.
//!
//! The price service is an external collaborator behind [`PriceLookup`]. The
//! orchestration here validates the query, calls the collaborator once (no
//! retry) and writes the price into the fuel form. A failure leaves the form
//! untouched and is logged before reaching the caller.

use std::future::Future;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    config::engine::EngineConfig,
    engine::{EditSession, FuelType, RateField},
    errors::{Error, Result},
};

/// Geographic scope of a price query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceScope {
    /// National average
    National,
    /// State average
    State,
    /// Municipality average
    Municipality,
}

impl PriceScope {
    /// Storage code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::National => "national",
            Self::State => "state",
            Self::Municipality => "municipality",
        }
    }
}

/// What to ask the price service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    /// Geographic level of the lookup
    pub scope: PriceScope,
    /// State code or municipality name; `Brasil` for national
    pub locality: String,
    /// First day of the survey window
    pub start: NaiveDate,
    /// Last day of the survey window
    pub end: NaiveDate,
}

impl PriceQuery {
    /// Rejects blank localities and inverted date ranges.
    pub fn validate(&self) -> Result<()> {
        if self.locality.trim().is_empty() {
            return Err(Error::Validation {
                message: "Informe a localidade da consulta de preços".to_string(),
            });
        }
        if self.start > self.end {
            return Err(Error::Validation {
                message: "A data inicial deve ser anterior à data final".to_string(),
            });
        }
        Ok(())
    }
}

/// Current unit prices in R$/L.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelPrices {
    /// Óleo diesel price
    pub diesel: f64,
    /// Gasolina price
    pub gasolina: f64,
}

impl FuelPrices {
    /// Price of one fuel.
    #[must_use]
    pub const fn price(&self, fuel: FuelType) -> f64 {
        match fuel {
            FuelType::Diesel => self.diesel,
            FuelType::Gasolina => self.gasolina,
        }
    }
}

/// External fuel price service.
pub trait PriceLookup {
    /// Fetches current prices for the query.
    fn lookup(&self, query: &PriceQuery) -> impl Future<Output = Result<FuelPrices>> + Send;
}

/// Price table read from `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPrices {
    entries: Vec<(PriceScope, String, FuelPrices)>,
}

impl ConfiguredPrices {
    /// Builds the table from the configured entries.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            entries: config
                .fuel_prices
                .iter()
                .map(|p| {
                    (
                        p.scope,
                        p.locality.trim().to_string(),
                        FuelPrices {
                            diesel: p.diesel,
                            gasolina: p.gasolina,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl PriceLookup for ConfiguredPrices {
    // The table has no notion of dates; any range returns the configured price.
    async fn lookup(&self, query: &PriceQuery) -> Result<FuelPrices> {
        self.entries
            .iter()
            .find(|(scope, locality, _)| {
                *scope == query.scope && locality.eq_ignore_ascii_case(query.locality.trim())
            })
            .map(|(_, _, prices)| *prices)
            .ok_or_else(|| Error::PriceLookup {
                message: format!(
                    "no {} price configured for {}",
                    query.scope.code(),
                    query.locality
                ),
            })
    }
}

/// Looks up the price of the session's fuel and writes it as the unit price.
///
/// Returns the applied price. Only fuel categories with a chosen fuel type
/// accept a price.
pub async fn apply_fuel_price<P: PriceLookup>(
    lookup: &P,
    query: &PriceQuery,
    session: &mut EditSession,
) -> Result<f64> {
    if !session.config().formula.is_fuel() {
        return Err(Error::Validation {
            message: "Categoria não utiliza preço de combustível".to_string(),
        });
    }
    let Some(fuel) = session.input().fuel_type else {
        return Err(Error::Validation {
            message: "Selecione o tipo de combustível".to_string(),
        });
    };
    query.validate()?;

    let prices = lookup
        .lookup(query)
        .await
        .inspect_err(|e| error!("Fuel price lookup for {} failed: {}", query.locality, e))?;

    let price = prices.price(fuel);
    if !price.is_finite() || price <= 0.0 {
        error!("Price service returned {price} for {}", fuel.code());
        return Err(Error::PriceLookup {
            message: format!("invalid {} price {price}", fuel.code()),
        });
    }

    session
        .input_mut()
        .rates
        .set(RateField::UnitPrice, Some(price));
    info!(
        fuel = fuel.code(),
        locality = %query.locality,
        price,
        "Applied fuel price"
    );
    Ok(price)
}
