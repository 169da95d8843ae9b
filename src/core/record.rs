//! Cost record business logic - The persistence side of the category forms.
//!
//! Converts consolidated records to flat rows and back, and provides insert,
//! update-by-id, delete-by-id and the per-plan select. `commit_session` is the
//! orchestration boundary of the final save: collaborator failures are logged
//! here and the session stays in its pre-commit state so the user can retry.

use crate::{
    config::engine::EngineConfig,
    engine::{
        ActivityPhase, Calculation, Category, ConsolidatedRecord, CostInput, EditSession,
        FreeSide, FuelType, FundsDetail, OrgRef, Rates, allocator::Allocation, allocator::MONEY_TOLERANCE,
        derive,
    },
    entities::{CostRecord, Plan, cost_record},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{error, info, warn};

fn validate_for_persistence(record: &ConsolidatedRecord) -> Result<()> {
    if record.derived.total_value <= 0.0 || !record.derived.total_value.is_finite() {
        return Err(Error::Validation {
            message: "O valor total calculado é zero".to_string(),
        });
    }
    if !record.input.has_destination() {
        return Err(Error::Validation {
            message: "Selecione a OM de destino".to_string(),
        });
    }
    record.allocation.validate()
}

fn fill_active_model(
    model: &mut cost_record::ActiveModel,
    record: &ConsolidatedRecord,
    now: DateTime,
) -> Result<()> {
    let input = &record.input;
    let destination = input.destination.clone().unwrap_or_default();
    let funds_detail = record
        .funds_detail
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    model.category = Set(input.category.code().to_string());
    model.holder_om = Set(input.holder.om.clone());
    model.holder_ug = Set(input.holder.ug.clone());
    model.destination_om = Set(destination.om);
    model.destination_ug = Set(destination.ug);
    model.phase_codes = Set(input.phase.codes());
    model.phase_custom = Set(input.phase.custom.clone());
    model.days = Set(input.days);
    model.quantity = Set(input.quantity);
    model.fuel_type = Set(input.fuel_type.map(|f| f.code().to_string()));
    model.unit_price = Set(input.rates.unit_price);
    model.consumption_per_hour = Set(input.rates.consumption_per_hour);
    model.hours_per_day = Set(input.rates.hours_per_day);
    model.km_per_day = Set(input.rates.km_per_day);
    model.km_per_liter = Set(input.rates.km_per_liter);
    model.daily_rate = Set(input.rates.daily_rate);
    model.valor_qs = Set(input.rates.valor_qs);
    model.valor_qr = Set(input.rates.valor_qr);
    model.refeicoes_intermediarias = Set(input.rates.refeicoes_intermediarias);
    model.margin = Set(record.derived.margin);
    model.base_quantity = Set(record.derived.base_quantity);
    model.final_quantity = Set(record.derived.final_quantity);
    model.total_value = Set(record.derived.total_value);
    model.free_side = Set(record.allocation.free_side.code().to_string());
    model.nd30 = Set(record.allocation.nd30);
    model.nd39 = Set(record.allocation.nd39);
    model.memoria_override = Set(record
        .memoria_override
        .clone()
        .filter(|t| !t.trim().is_empty()));
    model.funds_detail = Set(funds_detail);
    model.updated_at = Set(now);
    Ok(())
}

/// Rebuilds the consolidated record of a stored row.
///
/// Subtotals are re-derived from the stored inputs and margin; the stored
/// allocation is kept as persisted.
pub fn record_from_model(model: &cost_record::Model) -> Result<ConsolidatedRecord> {
    let category: Category = model.category.parse()?;
    let input = CostInput {
        category,
        holder: OrgRef::new(model.holder_om.as_str(), model.holder_ug.as_str()),
        destination: Some(OrgRef::new(
            model.destination_om.as_str(),
            model.destination_ug.as_str(),
        )),
        phase: ActivityPhase::from_codes(&model.phase_codes, model.phase_custom.clone())?,
        days: model.days,
        quantity: model.quantity,
        rates: Rates {
            unit_price: model.unit_price,
            consumption_per_hour: model.consumption_per_hour,
            hours_per_day: model.hours_per_day,
            km_per_day: model.km_per_day,
            km_per_liter: model.km_per_liter,
            daily_rate: model.daily_rate,
            valor_qs: model.valor_qs,
            valor_qr: model.valor_qr,
            refeicoes_intermediarias: model.refeicoes_intermediarias,
        },
        fuel_type: model
            .fuel_type
            .as_deref()
            .map(str::parse::<FuelType>)
            .transpose()?,
    };

    let mut config = category.default_config();
    config.margin = model.margin;
    let derived = match derive(&config, &input) {
        Calculation::Ready(derived) => derived,
        Calculation::Insufficient(_) => {
            return Err(Error::Validation {
                message: format!("Registro {} com dados insuficientes", model.id),
            });
        }
    };
    if (derived.total_value - model.total_value).abs() >= MONEY_TOLERANCE {
        warn!(
            record_id = model.id,
            stored = model.total_value,
            derived = derived.total_value,
            "Stored total differs from re-derived total"
        );
    }

    let free_side: FreeSide = model.free_side.parse()?;
    let funds_detail: Option<FundsDetail> = model
        .funds_detail
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;

    Ok(ConsolidatedRecord {
        input,
        derived,
        allocation: Allocation {
            nd30: model.nd30,
            nd39: model.nd39,
            total: model.total_value,
            free_side,
        },
        memoria_override: model.memoria_override.clone(),
        funds_detail,
    })
}

/// Inserts a record under `plan_id`, returning the stored row with its generated id.
pub async fn insert_record(
    db: &DatabaseConnection,
    plan_id: i64,
    record: &ConsolidatedRecord,
) -> Result<cost_record::Model> {
    validate_for_persistence(record)?;
    Plan::find_by_id(plan_id)
        .one(db)
        .await?
        .ok_or(Error::PlanNotFound { id: plan_id })?;

    let now = chrono::Utc::now().naive_utc();
    let mut model = cost_record::ActiveModel {
        plan_id: Set(plan_id),
        created_at: Set(now),
        ..Default::default()
    };
    fill_active_model(&mut model, record, now)?;

    model.insert(db).await.map_err(Into::into)
}

/// Replaces every field of an existing record (re-staging, never a partial update).
///
/// The record must belong to `plan_id`; a record of another plan is reported
/// as not found.
pub async fn update_record(
    db: &DatabaseConnection,
    plan_id: i64,
    record_id: i64,
    record: &ConsolidatedRecord,
) -> Result<cost_record::Model> {
    validate_for_persistence(record)?;
    let existing = CostRecord::find_by_id(record_id)
        .filter(cost_record::Column::PlanId.eq(plan_id))
        .one(db)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })?;

    let mut model: cost_record::ActiveModel = existing.into();
    fill_active_model(&mut model, record, chrono::Utc::now().naive_utc())?;
    model.update(db).await.map_err(Into::into)
}

/// Deletes one record by id.
pub async fn delete_record(db: &DatabaseConnection, record_id: i64) -> Result<()> {
    let result = CostRecord::delete_by_id(record_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::RecordNotFound { id: record_id });
    }
    info!(record_id, "Deleted cost record");
    Ok(())
}

/// Finds a record by its unique ID.
pub async fn get_record_by_id(
    db: &DatabaseConnection,
    record_id: i64,
) -> Result<Option<cost_record::Model>> {
    CostRecord::find_by_id(record_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all records of a plan, ordered by destination organization (OM, then UG), then category.
pub async fn get_records_for_plan(
    db: &DatabaseConnection,
    plan_id: i64,
) -> Result<Vec<cost_record::Model>> {
    CostRecord::find()
        .filter(cost_record::Column::PlanId.eq(plan_id))
        .order_by_asc(cost_record::Column::DestinationOm)
        .order_by_asc(cost_record::Column::DestinationUg)
        .order_by_asc(cost_record::Column::Category)
        .order_by_asc(cost_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Final save of a staged session: inserts, or updates when the session carries an id.
///
/// On failure nothing in the session changes; collaborator errors are logged
/// here and keep their original detail for [`Error::user_message`] to hide.
pub async fn commit_session(
    db: &DatabaseConnection,
    plan_id: i64,
    session: &mut EditSession,
) -> Result<cost_record::Model> {
    let request = session.commit_request()?;

    let result = match request.id {
        Some(id) => update_record(db, plan_id, id, &request.record).await,
        None => insert_record(db, plan_id, &request.record).await,
    };

    match result {
        Ok(model) => {
            session.mark_committed(model.id);
            info!(
                record_id = model.id,
                plan_id,
                category = %model.category,
                total = model.total_value,
                updated = request.id.is_some(),
                "Committed cost record"
            );
            Ok(model)
        }
        Err(e) => {
            if e.is_validation() {
                warn!(plan_id, "Commit rejected: {}", e);
            } else {
                error!(plan_id, "Failed to commit cost record: {}", e);
            }
            Err(e)
        }
    }
}

/// Sets the narrative override of a stored record; blank text clears it.
pub async fn set_memoria_override(
    db: &DatabaseConnection,
    record_id: i64,
    text: Option<String>,
) -> Result<cost_record::Model> {
    let existing = CostRecord::find_by_id(record_id)
        .one(db)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })?;

    let mut model: cost_record::ActiveModel = existing.into();
    model.memoria_override = Set(text.filter(|t| !t.trim().is_empty()));
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(db).await.map_err(Into::into)
}

/// Drops the override so the synthesized narrative is shown again.
pub async fn restore_memoria(
    db: &DatabaseConnection,
    record_id: i64,
) -> Result<cost_record::Model> {
    set_memoria_override(db, record_id, None).await
}

/// Loads a stored record into a `Committed` session for edit-in-place.
pub async fn load_session(
    db: &DatabaseConnection,
    config: &EngineConfig,
    record_id: i64,
) -> Result<EditSession> {
    let model = get_record_by_id(db, record_id)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })?;
    let record = record_from_model(&model)?;

    let mut category_config = config.category_config(record.input.category);
    // keep the margin the record was saved with
    category_config.margin = record.derived.margin;
    category_config.free_side = record.allocation.free_side;
    Ok(EditSession::from_record(category_config, model.id, record))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        engine::{EditState, FundsItem, RateField, calculator::SubtotalKind},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_insert_and_read_back() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let record = test_record();

        let stored = insert_record(&db, plan.id, &record).await?;
        assert_eq!(stored.plan_id, plan.id);
        assert_eq!(stored.category, "classe_ii");
        assert_eq!(stored.total_value, record.derived.total_value);
        assert!((stored.nd30 + stored.nd39 - stored.total_value).abs() < MONEY_TOLERANCE);

        let rebuilt = record_from_model(&stored)?;
        assert_eq!(rebuilt.input, record.input);
        assert_eq!(rebuilt.allocation, record.allocation);
        assert_eq!(
            rebuilt.derived.subtotal(SubtotalKind::Margin),
            record.derived.subtotal(SubtotalKind::Margin)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_rejects_zero_total_and_missing_plan() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let mut record = test_record();
        record.derived.total_value = 0.0;
        assert!(matches!(
            insert_record(&db, plan.id, &record).await,
            Err(Error::Validation { .. })
        ));

        assert!(matches!(
            insert_record(&db, 999, &test_record()).await,
            Err(Error::PlanNotFound { id: 999 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_rejects_unreconciled_allocation() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let mut record = test_record();
        record.allocation.nd39 += 10.0;
        assert!(matches!(
            insert_record(&db, plan.id, &record).await,
            Err(Error::NotReconciled { .. })
        ));
        assert!(get_records_for_plan(&db, plan.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_then_edit_updates_same_row() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let mut session = staged_test_session();

        let first = commit_session(&db, plan.id, &mut session).await?;
        assert_eq!(session.state(), EditState::Committed);
        assert_eq!(session.record_id(), Some(first.id));

        session.edit()?;
        session.input_mut().days = 20;
        session.stage()?;
        let second = commit_session(&db, plan.id, &mut session).await?;

        assert_eq!(second.id, first.id);
        assert_eq!(second.days, 20);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(get_records_for_plan(&db, plan.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_session_staged() -> Result<()> {
        let db = setup_test_db().await?;
        let mut session = staged_test_session();

        let result = commit_session(&db, 12345, &mut session).await;
        assert!(matches!(result, Err(Error::PlanNotFound { .. })));
        assert_eq!(session.state(), EditState::Staged);
        assert_eq!(session.record_id(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_dirty_session_is_rejected() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let mut session = staged_test_session();
        session.input_mut().quantity += 1;

        let result = commit_session(&db, plan.id, &mut session).await;
        assert!(matches!(result, Err(Error::Stale)));
        assert!(get_records_for_plan(&db, plan.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_record() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let stored = insert_test_record(&db, plan.id).await?;

        delete_record(&db, stored.id).await?;
        assert!(get_record_by_id(&db, stored.id).await?.is_none());
        assert!(matches!(
            delete_record(&db, stored.id).await,
            Err(Error::RecordNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_records_are_ordered_by_destination_then_category() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;

        let mut zulu = test_record();
        zulu.input.destination = Some(OrgRef::new("Z Cia", "160099"));
        let mut alpha_diaria = test_record();
        alpha_diaria.input.category = Category::Diaria;
        let alpha_classe_ii = test_record();

        insert_record(&db, plan.id, &zulu).await?;
        insert_record(&db, plan.id, &alpha_diaria).await?;
        insert_record(&db, plan.id, &alpha_classe_ii).await?;

        let records = get_records_for_plan(&db, plan.id).await?;
        let order: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.destination_om.as_str(), r.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("8º BEC", "classe_ii"),
                ("8º BEC", "diaria"),
                ("Z Cia", "classe_ii"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_memoria_override_and_restore() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let stored = insert_test_record(&db, plan.id).await?;
        let synthesized = record_from_model(&stored)?.memoria();

        let edited = set_memoria_override(&db, stored.id, Some("Texto ajustado".to_string())).await?;
        assert_eq!(record_from_model(&edited)?.memoria(), "Texto ajustado");
        assert_eq!(edited.total_value, stored.total_value);

        let restored = restore_memoria(&db, stored.id).await?;
        assert_eq!(restored.memoria_override, None);
        assert_eq!(record_from_model(&restored)?.memoria(), synthesized);

        let blank = set_memoria_override(&db, stored.id, Some("  ".to_string())).await?;
        assert_eq!(blank.memoria_override, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_funds_detail_is_a_separate_field() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let mut record = test_record();
        record.input.category = Category::SuprimentoFundos;
        record.funds_detail = Some(FundsDetail {
            purpose: "Despesas de pronto pagamento".to_string(),
            items: vec![FundsItem {
                description: "Combustível para gerador portátil".to_string(),
                value: 300.0,
            }],
        });
        record.memoria_override = None;

        let stored = insert_record(&db, plan.id, &record).await?;
        assert!(stored.memoria_override.is_none());
        let rebuilt = record_from_model(&stored)?;
        assert_eq!(rebuilt.funds_detail, record.funds_detail);
        assert!(rebuilt.memoria().contains("Despesas de pronto pagamento"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_session_for_edit_in_place() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let stored = insert_test_record(&db, plan.id).await?;

        let mut session = load_session(&db, &EngineConfig::default(), stored.id).await?;
        assert_eq!(session.state(), EditState::Committed);
        assert_eq!(session.record_id(), Some(stored.id));

        session.edit()?;
        session
            .input_mut()
            .rates
            .set(RateField::DailyRate, Some(20.0));
        session.stage()?;
        let updated = commit_session(&db, plan.id, &mut session).await?;
        assert_eq!(updated.id, stored.id);
        assert!(updated.total_value > stored.total_value);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_record() -> Result<()> {
        let db = setup_test_db().await?;
        let result = load_session(&db, &EngineConfig::default(), 77).await;
        assert!(matches!(result, Err(Error::RecordNotFound { id: 77 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_to_another_plan_does_not_touch_the_record() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let other_plan = create_test_plan(&db, "PTrab 2/2026").await?;
        let stored = insert_test_record(&db, plan.id).await?;

        let mut session = load_session(&db, &EngineConfig::default(), stored.id).await?;
        session.edit()?;
        session.input_mut().quantity += 1;
        session.stage()?;

        let result = commit_session(&db, other_plan.id, &mut session).await;
        assert!(matches!(result, Err(Error::RecordNotFound { id }) if id == stored.id));
        assert_eq!(session.state(), EditState::Staged);

        let unchanged = get_record_by_id(&db, stored.id).await?.unwrap();
        assert_eq!(unchanged.plan_id, plan.id);
        assert_eq!(unchanged.quantity, stored.quantity);
        assert!(get_records_for_plan(&db, other_plan.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_records_sharing_an_om_name_are_ordered_by_ug() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;

        let mut second_ug_classe_ii = test_record();
        second_ug_classe_ii.input.destination = Some(OrgRef::new("8º BEC", "160009"));
        let mut first_ug_diaria = test_record();
        first_ug_diaria.input.category = Category::Diaria;

        insert_record(&db, plan.id, &second_ug_classe_ii).await?;
        insert_record(&db, plan.id, &first_ug_diaria).await?;
        insert_record(&db, plan.id, &test_record()).await?;

        let records = get_records_for_plan(&db, plan.id).await?;
        let order: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.destination_ug.as_str(), r.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("160002", "classe_ii"),
                ("160002", "diaria"),
                ("160009", "classe_ii"),
            ]
        );
        Ok(())
    }
}
