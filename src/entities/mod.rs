//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cost_record;
pub mod plan;

// Re-export specific types to avoid conflicts
pub use cost_record::{
    Column as CostRecordColumn, Entity as CostRecord, Model as CostRecordModel,
};
pub use plan::{Column as PlanColumn, Entity as Plan, Model as PlanModel};
