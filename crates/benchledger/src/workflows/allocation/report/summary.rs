use std::collections::HashMap;

use chrono::NaiveDate;

use super::super::domain::{Allocation, Employee, EmployeeId, Project};
use super::super::financials::{monthly_hours, FinancialBreakdown};
use super::views::{
    AllocationReportView, ProjectRoiEntry, ReportKind, ReportPeriod, ReportSummaryView,
    ResourceRow, ScheduleStatus, UtilizationBand,
};

/// Everything needed to render one allocation as a report row.
#[derive(Debug, Clone)]
pub(crate) struct ReportInput {
    pub(crate) allocation: Allocation,
    pub(crate) breakdown: FinancialBreakdown,
    pub(crate) employee: Employee,
    pub(crate) project: Project,
}

pub(crate) fn build_allocation_report(
    kind: ReportKind,
    period: ReportPeriod,
    today: NaiveDate,
    total_hours_in_period: u32,
    inputs: Vec<ReportInput>,
) -> AllocationReportView {
    // Utilization is judged per employee, over every allocation in scope.
    let mut committed_by_employee: HashMap<EmployeeId, u32> = HashMap::new();
    for input in &inputs {
        *committed_by_employee
            .entry(input.allocation.employee_id)
            .or_default() += u32::from(input.allocation.effective_internal_percent().value());
    }

    let mut resources = Vec::new();
    for input in inputs {
        if kind == ReportKind::Requisition && input.allocation.is_trainee {
            continue;
        }

        let allocation_pct = input.allocation.effective_allocation_percent();
        let billable_pct = input.allocation.effective_billable_percent();
        let committed = committed_by_employee
            .get(&input.allocation.employee_id)
            .copied()
            .unwrap_or_default();
        let utilization = UtilizationBand::for_total(committed);
        let schedule = ScheduleStatus::for_end_date(input.allocation.end_date, today);
        let posture = input.allocation.billing_posture();

        let internal_allocation_percentage = match kind {
            ReportKind::Internal => {
                Some(input.allocation.effective_internal_percent().value())
            }
            ReportKind::Requisition => None,
        };

        let monthly_amount =
            input.breakdown.billing_rate * f64::from(input.breakdown.billed_hours);

        resources.push(ResourceRow {
            allocation_id: input.allocation.id,
            employee_id: input.allocation.employee_id,
            employee_name: input.employee.full_name(),
            role_level: input.employee.role_level,
            role_label: input.employee.role_level.label(),
            project_id: input.project.id,
            project_name: input.project.project_name.clone(),
            client_name: input.project.client_name.clone(),
            start_date: input.allocation.start_date,
            end_date: input.allocation.end_date,
            ongoing: input.allocation.end_date.is_none(),
            allocation_percentage: allocation_pct.value(),
            billable_percentage: billable_pct.value(),
            internal_allocation_percentage,
            monthly_hours: monthly_hours(total_hours_in_period, allocation_pct),
            billed_hours: input.breakdown.billed_hours,
            utilized_hours: input.breakdown.cost_hours,
            hourly_rate: input.breakdown.billing_rate,
            cost_rate: input.breakdown.cost_rate,
            monthly_amount,
            estimated_revenue: input.breakdown.estimated_revenue,
            estimated_cost: input.breakdown.estimated_cost,
            gross_margin_percentage: input.breakdown.gross_margin_percentage,
            rate_source: input.breakdown.rate_source,
            utilization,
            utilization_label: utilization.label(),
            schedule,
            schedule_label: schedule.label(),
            billing_posture: posture,
            billing_posture_label: posture.label(),
            is_trainee: input.allocation.is_trainee,
        });
    }

    let summary = summarize(&resources);

    AllocationReportView {
        kind,
        kind_label: kind.label(),
        report_date: today,
        period,
        resources,
        summary,
    }
}

fn summarize(rows: &[ResourceRow]) -> ReportSummaryView {
    let total_resources = rows.len();
    let total_monthly_hours: f64 = rows.iter().map(|row| row.monthly_hours).sum();
    let total_billed_hours: u32 = rows.iter().map(|row| row.billed_hours).sum();
    let total_monthly_amount: f64 = rows.iter().map(|row| row.monthly_amount).sum();
    let total_estimated_revenue: f64 = rows.iter().map(|row| row.estimated_revenue).sum();
    let total_estimated_cost: f64 = rows.iter().map(|row| row.estimated_cost).sum();

    let (average_allocation_percentage, average_billable_percentage) = if total_resources > 0 {
        let allocation_sum: u32 = rows
            .iter()
            .map(|row| u32::from(row.allocation_percentage))
            .sum();
        let billable_sum: u32 = rows
            .iter()
            .map(|row| u32::from(row.billable_percentage))
            .sum();
        (
            f64::from(allocation_sum) / total_resources as f64,
            f64::from(billable_sum) / total_resources as f64,
        )
    } else {
        (0.0, 0.0)
    };

    ReportSummaryView {
        total_resources,
        total_monthly_hours,
        total_billed_hours,
        total_monthly_amount,
        total_estimated_revenue,
        total_estimated_cost,
        average_allocation_percentage,
        average_billable_percentage,
    }
}

/// Roll allocation financials up to their projects, flagging projects whose
/// return falls below the threshold. Entries come back lowest ROI first.
pub(crate) fn build_project_roi(
    grouped: Vec<(Project, Vec<FinancialBreakdown>)>,
    threshold: f64,
) -> Vec<ProjectRoiEntry> {
    let mut entries: Vec<ProjectRoiEntry> = grouped
        .into_iter()
        .map(|(project, breakdowns)| {
            let revenue: f64 = breakdowns
                .iter()
                .map(|breakdown| breakdown.estimated_revenue)
                .sum();
            let cost: f64 = breakdowns
                .iter()
                .map(|breakdown| breakdown.estimated_cost)
                .sum();
            let profit = revenue - cost;
            let roi_percentage = if cost > 0.0 { profit / cost * 100.0 } else { 0.0 };

            ProjectRoiEntry {
                project_id: project.id,
                project_name: project.project_name,
                client_name: project.client_name,
                revenue,
                cost,
                profit,
                roi_percentage,
                below_threshold: roi_percentage < threshold,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.roi_percentage
            .partial_cmp(&b.roi_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}
