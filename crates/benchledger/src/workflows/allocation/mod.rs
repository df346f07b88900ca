//! The allocation ledger: capacity-budget validation, trainee invariants,
//! status derivation, rate resolution, and financial reconciliation for
//! employee-to-project commitments.

pub(crate) mod capacity;
pub mod domain;
pub(crate) mod financials;
pub(crate) mod rates;
pub mod report;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;
pub(crate) mod status;
pub(crate) mod trainee;

#[cfg(test)]
mod tests;

pub use capacity::{CandidateWindow, CapacityDecision, CapacityValidator};
pub use domain::{
    Allocation, AllocationDraft, AllocationId, BillingPosture, DomainId, Employee, EmployeeId,
    EmployeeStatus, ParseRateTypeError, ParseRoleError, ParseStatusError, Percent,
    PercentOutOfRange, Project, ProjectId, ProjectStatus, RateCard, RateCardId, RateType,
    RoleLevel,
};
pub use financials::{
    monthly_hours, AllocationFinancial, FinancialBreakdown, FinancialReconciler,
    MONTHLY_WORKING_HOURS,
};
pub use rates::{resolve_rate, RateSource, ResolvedRate};
pub use report::views::{
    AllocationReportView, ProjectRoiEntry, ReportKind, ReportPeriod, ReportSummaryView,
    ResourceRow, ScheduleStatus, UtilizationBand,
};
pub use repository::{
    AllocationRecord, AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource,
    RepositoryError,
};
pub use roster::{import_roster, parse_roster, RosterImportError, RosterSummary};
pub use router::allocation_router;
pub use service::{
    AllocationRejection, AllocationService, AllocationServiceError, CapacityPolicy,
    EmployeeStatusView, TraineeViolations,
};
pub use status::{current_allocation, derive_status, sync_status};
pub use trainee::{TraineeRules, TraineeViolation};
