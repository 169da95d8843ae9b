//! Shared test utilities.
//!
//! Common helpers for setting up test databases and building plans, staged
//! sessions and records with sensible defaults.

use crate::{
    core::{plan, record},
    engine::{
        ActivityPhase, Category, ConsolidatedRecord, CostInput, EditSession, OrgRef, Phase,
        RateField, Rates,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Holder organization used by every test record: 1º BIS, UG 160001.
#[must_use]
pub fn test_holder() -> OrgRef {
    OrgRef::new("1º BIS", "160001")
}

/// Destination organization used by every test record: 8º BEC, UG 160002.
#[must_use]
pub fn test_destination() -> OrgRef {
    OrgRef::new("8º BEC", "160002")
}

/// Creates a plan for "Operação Ágata" owned by [`test_holder`].
pub async fn create_test_plan(db: &DatabaseConnection, number: &str) -> Result<entities::plan::Model> {
    plan::create_plan(db, number, "Operação Ágata", &test_holder()).await
}

/// Sets up a database with one plan numbered "PTrab 1/2026".
pub async fn setup_with_plan() -> Result<(DatabaseConnection, entities::plan::Model)> {
    let db = setup_test_db().await?;
    let plan = create_test_plan(&db, "PTrab 1/2026").await?;
    Ok((db, plan))
}

/// Classe II session staged with 5 items × R$ 10,00/dia × 30 dias, 10% margin
/// and R$ 650,00 typed into ND 30.
///
/// # Defaults
/// * total: R$ 1.650,00
/// * ND 30: R$ 650,00, ND 39: R$ 1.000,00
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn staged_test_session() -> EditSession {
    let mut input = CostInput::new(Category::ClasseII, test_holder());
    input.destination = Some(test_destination());
    input.phase = ActivityPhase::of([Phase::Execucao]);
    input.quantity = 5;
    input.days = 30;
    input.rates = Rates::default().with(RateField::DailyRate, 10.0);

    let mut session = EditSession::new(Category::ClasseII.default_config(), input);
    session.set_free_value(650.0);
    session.stage().unwrap();
    session
}

/// The consolidated record of [`staged_test_session`].
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_record() -> ConsolidatedRecord {
    staged_test_session().staged().unwrap().record.clone()
}

/// Inserts [`test_record`] under `plan_id`.
pub async fn insert_test_record(
    db: &DatabaseConnection,
    plan_id: i64,
) -> Result<entities::cost_record::Model> {
    record::insert_record(db, plan_id, &test_record()).await
}
