use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{
    AllocationId, BillingPosture, EmployeeId, ProjectId, RoleLevel,
};
use super::super::rates::RateSource;

/// Audience of an allocation report. Requisition reports are client-facing:
/// trainee rows are excluded and internal percentages withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Internal,
    Requisition,
}

impl ReportKind {
    pub const fn label(self) -> &'static str {
        match self {
            ReportKind::Internal => "internal",
            ReportKind::Requisition => "requisition",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseReportKindError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Self::Internal),
            "requisition" => Ok(Self::Requisition),
            _ => Err(ParseReportKindError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized report kind '{0}'")]
pub struct ParseReportKindError(pub String);

/// Date window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// How heavily an employee's capacity is committed across the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBand {
    UnderUtilized,
    Optimal,
    OverAllocated,
}

impl UtilizationBand {
    pub const fn label(self) -> &'static str {
        match self {
            UtilizationBand::UnderUtilized => "Under-utilized",
            UtilizationBand::Optimal => "Optimal",
            UtilizationBand::OverAllocated => "Over-allocated",
        }
    }

    /// Band for a total committed percentage; totals above 100 only occur on
    /// legacy or warn-only-admitted data.
    pub fn for_total(total_percent: u32) -> Self {
        if total_percent < 80 {
            Self::UnderUtilized
        } else if total_percent <= 100 {
            Self::Optimal
        } else {
            Self::OverAllocated
        }
    }
}

/// Delivery posture inferred from the allocation's end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Delayed,
    OnTrack,
    Ahead,
}

impl ScheduleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScheduleStatus::Delayed => "Delayed",
            ScheduleStatus::OnTrack => "On-Track",
            ScheduleStatus::Ahead => "Ahead",
        }
    }

    pub fn for_end_date(end_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match end_date {
            Some(end) if end < today => Self::Delayed,
            Some(end) if end <= today + chrono::Duration::days(7) => Self::OnTrack,
            _ => Self::Ahead,
        }
    }
}

/// One resource line in an allocation report.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRow {
    pub allocation_id: AllocationId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub role_level: RoleLevel,
    pub role_label: &'static str,
    pub project_id: ProjectId,
    pub project_name: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub ongoing: bool,
    pub allocation_percentage: u8,
    pub billable_percentage: u8,
    /// Withheld on requisition reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_allocation_percentage: Option<u8>,
    pub monthly_hours: f64,
    pub billed_hours: u32,
    pub utilized_hours: u32,
    pub hourly_rate: f64,
    pub cost_rate: f64,
    pub monthly_amount: f64,
    pub estimated_revenue: f64,
    pub estimated_cost: f64,
    pub gross_margin_percentage: f64,
    pub rate_source: RateSource,
    pub utilization: UtilizationBand,
    pub utilization_label: &'static str,
    pub schedule: ScheduleStatus,
    pub schedule_label: &'static str,
    pub billing_posture: BillingPosture,
    pub billing_posture_label: &'static str,
    pub is_trainee: bool,
}

/// Aggregates over every row in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummaryView {
    pub total_resources: usize,
    pub total_monthly_hours: f64,
    pub total_billed_hours: u32,
    pub total_monthly_amount: f64,
    pub total_estimated_revenue: f64,
    pub total_estimated_cost: f64,
    pub average_allocation_percentage: f64,
    pub average_billable_percentage: f64,
}

/// Full allocation report payload.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReportView {
    pub kind: ReportKind,
    pub kind_label: &'static str,
    pub report_date: NaiveDate,
    pub period: ReportPeriod,
    pub resources: Vec<ResourceRow>,
    pub summary: ReportSummaryView,
}

/// Revenue/cost rollup for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRoiEntry {
    pub project_id: ProjectId,
    pub project_name: String,
    pub client_name: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub roi_percentage: f64,
    pub below_threshold: bool,
}
