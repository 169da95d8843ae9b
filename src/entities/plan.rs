//! Plan entity - The parent "Plano de Trabalho" document.
//!
//! Every cost record belongs to exactly one plan. The plan carries the
//! operation it budgets for and the organization that owns it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Document number (e.g., "PTrab 12/2026")
    pub number: String,
    /// Name of the operation being budgeted
    pub operation: String,
    /// Owning OM
    pub om: String,
    /// UG of the owning OM
    pub ug: String,
    /// When the plan was created
    pub created_at: DateTime,
    /// When the plan was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Plan and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One plan has many cost records
    #[sea_orm(has_many = "super::cost_record::Entity")]
    CostRecords,
}

impl Related<super::cost_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
