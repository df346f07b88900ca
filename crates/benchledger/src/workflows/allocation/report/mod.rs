mod summary;
pub mod views;

use chrono::NaiveDate;

use super::domain::ProjectStatus;
use super::repository::{
    AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource,
};
use super::service::{AllocationService, AllocationServiceError};
use summary::{build_allocation_report, build_project_roi, ReportInput};
use views::{AllocationReportView, ProjectRoiEntry, ReportKind, ReportPeriod};

impl<R, D, C, P> AllocationService<R, D, C, P>
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    /// Build an allocation report over every allocation whose date range
    /// touches the period. Financials are recomputed from current rates and
    /// costs; stored snapshots are not trusted for reporting.
    pub fn allocation_report(
        &self,
        kind: ReportKind,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> Result<AllocationReportView, AllocationServiceError> {
        let mut inputs = Vec::new();

        for record in self.repository().all()? {
            let allocation = record.allocation;
            if !allocation.overlaps(period.start_date, Some(period.end_date)) {
                continue;
            }

            let Some(employee) = self.directory().fetch(&allocation.employee_id)? else {
                continue;
            };
            let Some(project) = self.projects().fetch(&allocation.project_id)? else {
                continue;
            };

            let rate = self.resolve_rate_for(&allocation, &project, today)?;
            let breakdown = self
                .reconciler()
                .reconcile(&allocation, employee.ctc_monthly, &rate);

            inputs.push(ReportInput {
                allocation,
                breakdown,
                employee,
                project,
            });
        }

        Ok(build_allocation_report(
            kind,
            period,
            today,
            self.reconciler().total_hours_in_period(),
            inputs,
        ))
    }

    /// Revenue/cost/ROI rollup across active projects, lowest ROI first.
    pub fn project_roi(
        &self,
        threshold: f64,
        today: NaiveDate,
    ) -> Result<Vec<ProjectRoiEntry>, AllocationServiceError> {
        let mut grouped = Vec::new();

        for project in self.projects().all()? {
            if project.status != ProjectStatus::Active {
                continue;
            }

            let mut breakdowns = Vec::new();
            for record in self.repository().for_project(&project.id)? {
                let allocation = record.allocation;
                let Some(employee) = self.directory().fetch(&allocation.employee_id)? else {
                    continue;
                };
                let rate = self.resolve_rate_for(&allocation, &project, today)?;
                breakdowns.push(self.reconciler().reconcile(
                    &allocation,
                    employee.ctc_monthly,
                    &rate,
                ));
            }

            grouped.push((project, breakdowns));
        }

        Ok(build_project_roi(grouped, threshold))
    }
}
