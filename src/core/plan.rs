//! Plan business logic - CRUD for the parent "Plano de Trabalho" documents.

use crate::{
    engine::OrgRef,
    entities::{CostRecord, Plan, cost_record, plan},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Creates a new plan owned by `owner`.
///
/// The number and operation name are trimmed and must not be empty; the owner
/// must have both OM and UG.
pub async fn create_plan(
    db: &DatabaseConnection,
    number: &str,
    operation: &str,
    owner: &OrgRef,
) -> Result<plan::Model> {
    if number.trim().is_empty() {
        return Err(Error::Validation {
            message: "Informe o número do Plano de Trabalho".to_string(),
        });
    }
    if operation.trim().is_empty() {
        return Err(Error::Validation {
            message: "Informe o nome da operação".to_string(),
        });
    }
    if !owner.is_complete() {
        return Err(Error::Validation {
            message: "Informe a OM e a UG responsáveis".to_string(),
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let plan = plan::ActiveModel {
        number: Set(number.trim().to_string()),
        operation: Set(operation.trim().to_string()),
        om: Set(owner.om.clone()),
        ug: Set(owner.ug.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = plan.insert(db).await?;
    info!(plan_id = result.id, number = %result.number, "Created plan");
    Ok(result)
}

/// Finds a plan by its unique ID.
pub async fn get_plan_by_id(db: &DatabaseConnection, plan_id: i64) -> Result<Option<plan::Model>> {
    Plan::find_by_id(plan_id).one(db).await.map_err(Into::into)
}

/// Retrieves all plans ordered by number.
pub async fn get_all_plans(db: &DatabaseConnection) -> Result<Vec<plan::Model>> {
    Plan::find()
        .order_by_asc(plan::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a plan together with all of its cost records.
pub async fn delete_plan(db: &DatabaseConnection, plan_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    Plan::find_by_id(plan_id)
        .one(&txn)
        .await?
        .ok_or(Error::PlanNotFound { id: plan_id })?;

    let removed = CostRecord::delete_many()
        .filter(cost_record::Column::PlanId.eq(plan_id))
        .exec(&txn)
        .await?;
    Plan::delete_by_id(plan_id).exec(&txn).await?;

    txn.commit().await?;
    info!(plan_id, records = removed.rows_affected, "Deleted plan");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_plan_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = test_holder();

        let result = create_plan(&db, "  ", "Operação Ágata", &owner).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_plan(&db, "PTrab 1/2026", "", &owner).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_plan(&db, "PTrab 1/2026", "Operação Ágata", &OrgRef::new("1º BIS", "")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_plans() -> Result<()> {
        let db = setup_test_db().await?;
        let second = create_test_plan(&db, "PTrab 2/2026").await?;
        let first = create_test_plan(&db, "PTrab 1/2026").await?;

        assert_eq!(first.om, "1º BIS");
        let plans = get_all_plans(&db).await?;
        assert_eq!(plans, vec![first.clone(), second]);

        let found = get_plan_by_id(&db, first.id).await?;
        assert_eq!(found.unwrap().number, "PTrab 1/2026");
        assert!(get_plan_by_id(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_plan_removes_records() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let other = create_test_plan(&db, "PTrab 9/2026").await?;
        insert_test_record(&db, plan.id).await?;
        insert_test_record(&db, other.id).await?;

        delete_plan(&db, plan.id).await?;

        assert!(get_plan_by_id(&db, plan.id).await?.is_none());
        let remaining = CostRecord::find().all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].plan_id, other.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_plan(&db, 404).await;
        assert!(matches!(result, Err(Error::PlanNotFound { id: 404 })));
        Ok(())
    }
}
