//! Cost record entity - One consolidated calculation of a category form.
//!
//! Flat row: organization identifiers, raw inputs, derived totals, the
//! ND 30 / ND 39 allocation, the optional narrative override and, for
//! Suprimento de Fundos, the structured detail as JSON text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cost record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cost_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the plan this record belongs to
    pub plan_id: i64,
    /// Category code (e.g., `"classe_iii_gerador"`)
    pub category: String,
    /// OM detentora
    pub holder_om: String,
    /// UG of the OM detentora
    pub holder_ug: String,
    /// OM de destino
    pub destination_om: String,
    /// UG of the OM de destino
    pub destination_ug: String,
    /// Comma-separated fixed phase codes
    pub phase_codes: String,
    /// Custom phase text
    pub phase_custom: Option<String>,
    /// Number of days
    pub days: i64,
    /// Efetivo or number of items
    pub quantity: i64,
    /// `"diesel"` or `"gasolina"` for fuel categories
    pub fuel_type: Option<String>,
    /// Fuel price per liter
    pub unit_price: Option<f64>,
    /// Liters per hour
    pub consumption_per_hour: Option<f64>,
    /// Operating hours per day
    pub hours_per_day: Option<f64>,
    /// Kilometers per day
    pub km_per_day: Option<f64>,
    /// Consumption in km/L
    pub km_per_liter: Option<f64>,
    /// Reais per item per day
    pub daily_rate: Option<f64>,
    /// Etapa value, QS
    pub valor_qs: Option<f64>,
    /// Etapa value, QR
    pub valor_qr: Option<f64>,
    /// Intermediate meals per day
    pub refeicoes_intermediarias: Option<f64>,
    /// Margin factor applied when the record was staged
    pub margin: f64,
    /// Quantity before the margin (liters or reais)
    pub base_quantity: f64,
    /// Quantity after the margin
    pub final_quantity: f64,
    /// Monetary total split between ND 30 and ND 39
    pub total_value: f64,
    /// `"nd30"` or `"nd39"`
    pub free_side: String,
    /// ND 30 share
    pub nd30: f64,
    /// ND 39 share
    pub nd39: f64,
    /// Human-edited narrative; `None` shows the synthesized one
    pub memoria_override: Option<String>,
    /// Suprimento de Fundos detail as JSON
    pub funds_detail: Option<String>,
    /// When the record was first saved
    pub created_at: DateTime,
    /// When the record was last saved
    pub updated_at: DateTime,
}

/// Defines relationships between `CostRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one plan
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id"
    )]
    Plan,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
