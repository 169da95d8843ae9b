//! Plan report generation.
//!
//! Consolidates the records of a plan by destination organization, with
//! ND 30 / ND 39 subtotals and the narrative each record displays. The
//! structured report is rendered to plain text for printing and export.

use crate::{
    core::{plan::get_plan_by_id, record::get_records_for_plan, record::record_from_model},
    engine::{ConsolidatedRecord, OrgRef, narrative::format_brl},
    entities::plan,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;

/// One record as printed.
#[derive(Debug, Clone)]
pub struct ReportLine {
    /// Persisted id
    pub record_id: i64,
    /// Record rebuilt from the stored row
    pub record: ConsolidatedRecord,
    /// Narrative shown for the record (override or synthesized)
    pub memoria: String,
}

/// Records of one destination organization.
#[derive(Debug, Clone)]
pub struct OrganizationGroup {
    /// Destination organization of every line
    pub destination: OrgRef,
    /// Records in category order
    pub lines: Vec<ReportLine>,
    /// Sum of ND 30
    pub nd30: f64,
    /// Sum of ND 39
    pub nd39: f64,
    /// Sum of record totals
    pub total: f64,
}

/// Whole-plan report.
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Plan header
    pub plan: plan::Model,
    /// One group per destination organization
    pub groups: Vec<OrganizationGroup>,
    /// Plan-wide ND 30
    pub nd30: f64,
    /// Plan-wide ND 39
    pub nd39: f64,
    /// Plan-wide total
    pub total: f64,
}

/// Generates the consolidated report of a plan.
///
/// Groups follow the persisted order (destination organization, then
/// category), so each organization appears once.
pub async fn generate_plan_report(db: &DatabaseConnection, plan_id: i64) -> Result<PlanReport> {
    let plan = get_plan_by_id(db, plan_id)
        .await?
        .ok_or(Error::PlanNotFound { id: plan_id })?;
    let models = get_records_for_plan(db, plan_id).await?;

    let mut groups: Vec<OrganizationGroup> = Vec::new();
    for model in &models {
        let record = record_from_model(model)?;
        let destination = record.input.destination.clone().unwrap_or_default();
        let line = ReportLine {
            record_id: model.id,
            memoria: record.memoria(),
            record,
        };

        if let Some(group) = groups
            .last_mut()
            .filter(|g| g.destination == destination)
        {
            group.lines.push(line);
        } else {
            groups.push(OrganizationGroup {
                destination,
                lines: vec![line],
                nd30: 0.0,
                nd39: 0.0,
                total: 0.0,
            });
        }
    }

    for group in &mut groups {
        group.nd30 = group.lines.iter().map(|l| l.record.allocation.nd30).sum();
        group.nd39 = group.lines.iter().map(|l| l.record.allocation.nd39).sum();
        group.total = group.lines.iter().map(|l| l.record.allocation.total).sum();
    }

    Ok(PlanReport {
        plan,
        nd30: groups.iter().map(|g| g.nd30).sum(),
        nd39: groups.iter().map(|g| g.nd39).sum(),
        total: groups.iter().map(|g| g.total).sum(),
        groups,
    })
}

/// Share of `part` in `total` as a percentage, 0 when the total is zero.
#[must_use]
pub fn calculate_share(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (part / total) * 100.0
}

/// Renders the report as plain text.
#[must_use]
pub fn format_plan_report(report: &PlanReport) -> String {
    let mut lines = vec![
        format!(
            "PLANO DE TRABALHO {} - {}",
            report.plan.number, report.plan.operation
        ),
        format!("OM responsável: {} (UG {})", report.plan.om, report.plan.ug),
    ];

    if report.groups.is_empty() {
        lines.push(String::new());
        lines.push("Nenhum item cadastrado.".to_string());
        return lines.join("\n") + "\n";
    }

    for group in &report.groups {
        lines.push(String::new());
        lines.push(format!(
            "== {} - {:.1}% do total ==",
            group.destination,
            calculate_share(group.total, report.total)
        ));
        for line in &group.lines {
            lines.push(String::new());
            lines.push(format!(
                "[{}] {} | Fase: {} | Total {} (ND 30 {}; ND 39 {})",
                line.record_id,
                line.record.input.category.label(),
                line.record.input.phase.label(),
                format_brl(line.record.allocation.total),
                format_brl(line.record.allocation.nd30),
                format_brl(line.record.allocation.nd39)
            ));
            for memo_line in line.memoria.lines() {
                lines.push(format!("    {memo_line}"));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "Subtotal {}: ND 30 {} | ND 39 {} | Total {}",
            group.destination.om,
            format_brl(group.nd30),
            format_brl(group.nd39),
            format_brl(group.total)
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "TOTAL GERAL: ND 30 {} | ND 39 {} | Total {}",
        format_brl(report.nd30),
        format_brl(report.nd39),
        format_brl(report.total)
    ));
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::record::insert_record, engine::Category, test_utils::*};

    #[test]
    fn test_calculate_share() {
        assert_eq!(calculate_share(50.0, 200.0), 25.0);
        assert_eq!(calculate_share(50.0, 0.0), 0.0);
    }

    #[tokio::test]
    async fn test_report_groups_by_destination() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;

        let first = test_record();
        let mut second = test_record();
        second.input.category = Category::Diaria;
        let mut other_org = test_record();
        other_org.input.destination = Some(OrgRef::new("Z Cia", "160099"));
        other_org.memoria_override = Some("Memória revisada pelo S4".to_string());

        insert_record(&db, plan.id, &first).await?;
        insert_record(&db, plan.id, &second).await?;
        insert_record(&db, plan.id, &other_org).await?;

        let report = generate_plan_report(&db, plan.id).await?;
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].destination.om, "8º BEC");
        assert_eq!(report.groups[0].lines.len(), 2);
        assert_eq!(report.groups[1].lines[0].memoria, "Memória revisada pelo S4");

        let expected_total = first.allocation.total * 3.0;
        assert!((report.total - expected_total).abs() < 0.01);
        assert!((report.nd30 + report.nd39 - report.total).abs() < 0.01);

        let text = format_plan_report(&report);
        assert!(text.starts_with("PLANO DE TRABALHO PTrab 1/2026 - Operação Ágata"));
        assert!(text.contains("Subtotal 8º BEC"));
        assert!(text.contains("    Memória revisada pelo S4"));
        assert!(text.contains("TOTAL GERAL"));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_for_empty_plan() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;
        let report = generate_plan_report(&db, plan.id).await?;
        assert!(report.groups.is_empty());
        assert_eq!(report.total, 0.0);
        assert!(format_plan_report(&report).contains("Nenhum item cadastrado."));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_for_missing_plan() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            generate_plan_report(&db, 5).await,
            Err(Error::PlanNotFound { id: 5 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_same_om_name_with_two_ugs_forms_two_groups() -> Result<()> {
        let (db, plan) = setup_with_plan().await?;

        let mut other_ug = test_record();
        other_ug.input.destination = Some(OrgRef::new("8º BEC", "160009"));
        let mut other_ug_diaria = other_ug.clone();
        other_ug_diaria.input.category = Category::Diaria;
        let mut diaria = test_record();
        diaria.input.category = Category::Diaria;

        insert_record(&db, plan.id, &other_ug).await?;
        insert_record(&db, plan.id, &diaria).await?;
        insert_record(&db, plan.id, &other_ug_diaria).await?;
        insert_record(&db, plan.id, &test_record()).await?;

        let report = generate_plan_report(&db, plan.id).await?;
        let groups: Vec<(&str, usize)> = report
            .groups
            .iter()
            .map(|g| (g.destination.ug.as_str(), g.lines.len()))
            .collect();
        assert_eq!(groups, vec![("160002", 2), ("160009", 2)]);
        Ok(())
    }
}
