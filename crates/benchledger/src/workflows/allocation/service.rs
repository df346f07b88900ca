use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::capacity::{CandidateWindow, CapacityDecision, CapacityValidator};
use super::domain::{
    Allocation, AllocationDraft, AllocationId, Employee, EmployeeId, EmployeeStatus,
    PercentOutOfRange, Project, ProjectId,
};
use super::financials::{AllocationFinancial, FinancialReconciler};
use super::rates::{resolve_rate, ResolvedRate};
use super::repository::{
    AllocationRecord, AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource,
    RepositoryError,
};
use super::status::{derive_status, sync_status};
use super::trainee::{TraineeRules, TraineeViolation};

static ALLOCATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_allocation_id() -> AllocationId {
    AllocationId(ALLOCATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// How the capacity verdict is applied on a write. Interactive writes reject
/// over-commitments; batch/seed loads may record them with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    Enforce,
    WarnOnly,
}

/// Serializes mutations of one employee's committed-capacity budget. The
/// overlap check and the insert must observe the same ledger state, so both
/// run under this lock.
#[derive(Default)]
struct EmployeeLocks {
    locks: Mutex<HashMap<EmployeeId, Arc<Mutex<()>>>>,
}

impl EmployeeLocks {
    fn for_employee(&self, id: EmployeeId) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock().expect("lock registry mutex poisoned");
        guard.entry(id).or_default().clone()
    }
}

/// Service composing the capacity validator, trainee rules, status engine,
/// and financial reconciler over the storage traits.
pub struct AllocationService<R, D, C, P> {
    repository: Arc<R>,
    directory: Arc<D>,
    rate_cards: Arc<C>,
    projects: Arc<P>,
    capacity: CapacityValidator,
    trainee: TraineeRules,
    reconciler: FinancialReconciler,
    locks: EmployeeLocks,
}

impl<R, D, C, P> AllocationService<R, D, C, P>
where
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        rate_cards: Arc<C>,
        projects: Arc<P>,
        reconciler: FinancialReconciler,
        trainee: TraineeRules,
    ) -> Self {
        Self {
            repository,
            directory,
            rate_cards,
            projects,
            capacity: CapacityValidator::default(),
            trainee,
            reconciler,
            locks: EmployeeLocks::default(),
        }
    }

    pub fn reconciler(&self) -> &FinancialReconciler {
        &self.reconciler
    }

    /// Create an allocation, enforcing the capacity budget.
    pub fn create(
        &self,
        draft: AllocationDraft,
        today: NaiveDate,
    ) -> Result<AllocationRecord, AllocationServiceError> {
        self.create_with_policy(draft, today, CapacityPolicy::Enforce)
    }

    /// Create an allocation under an explicit capacity policy. Percentage
    /// and trainee invariants always gate the write; only the capacity
    /// verdict is subject to the policy.
    pub fn create_with_policy(
        &self,
        draft: AllocationDraft,
        today: NaiveDate,
        policy: CapacityPolicy,
    ) -> Result<AllocationRecord, AllocationServiceError> {
        let employee = self.require_employee(&draft.employee_id)?;
        let project = self.require_project(&draft.project_id)?;

        let allocation = self.allocation_from_draft(&draft, next_allocation_id())?;

        let lock = self.locks.for_employee(allocation.employee_id);
        let _guard = lock.lock().expect("employee lock poisoned");

        self.run_write_gates(&allocation, None, policy)?;

        let rate = self.resolve_rate_for(&allocation, &project, today)?;
        let financial = self
            .reconciler
            .snapshot(&allocation, employee.ctc_monthly, &rate);

        let record = self.repository.insert(AllocationRecord {
            allocation,
            financial: Some(financial),
        })?;

        info!(
            employee = %record.allocation.employee_id,
            project = %record.allocation.project_id,
            allocation = %record.allocation.id,
            "allocation persisted"
        );

        self.resync_status_locked(&record.allocation.employee_id, today)?;
        Ok(record)
    }

    /// Re-staff or reschedule an existing allocation in place.
    pub fn update(
        &self,
        id: AllocationId,
        draft: AllocationDraft,
        today: NaiveDate,
    ) -> Result<AllocationRecord, AllocationServiceError> {
        let existing = self
            .repository
            .fetch(&id)?
            .ok_or(AllocationServiceError::UnknownAllocation(id))?;

        if existing.allocation.employee_id != draft.employee_id {
            return Err(AllocationServiceError::EmployeeMismatch {
                allocation: id,
                employee: draft.employee_id,
            });
        }

        let employee = self.require_employee(&draft.employee_id)?;
        let project = self.require_project(&draft.project_id)?;

        let allocation = self.allocation_from_draft(&draft, id)?;

        let lock = self.locks.for_employee(allocation.employee_id);
        let _guard = lock.lock().expect("employee lock poisoned");

        self.run_write_gates(&allocation, Some(id), CapacityPolicy::Enforce)?;

        let rate = self.resolve_rate_for(&allocation, &project, today)?;
        let financial = self
            .reconciler
            .snapshot(&allocation, employee.ctc_monthly, &rate);

        let record = AllocationRecord {
            allocation,
            financial: Some(financial),
        };
        self.repository.update(record.clone())?;

        info!(allocation = %id, "allocation updated");

        self.resync_status_locked(&record.allocation.employee_id, today)?;
        Ok(record)
    }

    /// Remove an allocation (cascading to its financial snapshot) and
    /// re-derive the employee's status.
    pub fn remove(
        &self,
        id: AllocationId,
        today: NaiveDate,
    ) -> Result<(), AllocationServiceError> {
        let removed = match self.repository.remove(&id) {
            Ok(record) => record,
            Err(RepositoryError::NotFound) => {
                return Err(AllocationServiceError::UnknownAllocation(id))
            }
            Err(other) => return Err(other.into()),
        };

        info!(allocation = %id, employee = %removed.allocation.employee_id, "allocation removed");

        self.resync_status_locked(&removed.allocation.employee_id, today)?;
        Ok(())
    }

    pub fn fetch(
        &self,
        id: AllocationId,
    ) -> Result<AllocationRecord, AllocationServiceError> {
        self.repository
            .fetch(&id)?
            .ok_or(AllocationServiceError::UnknownAllocation(id))
    }

    /// Recompute the financial snapshot for an allocation, persisting the
    /// fresh figures. Used when the employee's cost or rate data changed
    /// outside an allocation write.
    pub fn refresh_financials(
        &self,
        id: AllocationId,
        today: NaiveDate,
    ) -> Result<AllocationFinancial, AllocationServiceError> {
        let record = self.fetch(id)?;
        let employee = self.require_employee(&record.allocation.employee_id)?;
        let project = self.require_project(&record.allocation.project_id)?;

        let rate = self.resolve_rate_for(&record.allocation, &project, today)?;
        let financial = self
            .reconciler
            .snapshot(&record.allocation, employee.ctc_monthly, &rate);

        self.repository.update(AllocationRecord {
            allocation: record.allocation,
            financial: Some(financial.clone()),
        })?;

        Ok(financial)
    }

    /// Stored and derived status for one employee.
    pub fn employee_status(
        &self,
        id: EmployeeId,
        today: NaiveDate,
    ) -> Result<EmployeeStatusView, AllocationServiceError> {
        let employee = self.require_employee(&id)?;
        let allocations = self.allocations_for(&id)?;
        let derived = derive_status(employee.status, &allocations, today);
        Ok(EmployeeStatusView {
            employee_id: id,
            stored: employee.status,
            derived,
            derived_label: derived.label(),
        })
    }

    /// Align the stored status flag with derived state. Returns whether the
    /// flag changed; repeated calls without data changes return `false`.
    pub fn sync_employee_status(
        &self,
        id: EmployeeId,
        today: NaiveDate,
    ) -> Result<bool, AllocationServiceError> {
        let mut employee = self.require_employee(&id)?;
        let allocations = self.allocations_for(&id)?;
        let changed = sync_status(&mut employee, &allocations, today);
        if changed {
            self.directory.update_status(&id, employee.status)?;
            info!(employee = %id, status = employee.status.label(), "employee status synced");
        }
        Ok(changed)
    }

    /// HR action: pin the employee to NOTICE_PERIOD, suppressing derivation
    /// until the flag is cleared.
    pub fn declare_notice_period(
        &self,
        id: EmployeeId,
    ) -> Result<(), AllocationServiceError> {
        self.require_employee(&id)?;
        self.directory
            .update_status(&id, EmployeeStatus::NoticePeriod)?;
        info!(employee = %id, "notice period declared");
        Ok(())
    }

    /// Clear a notice-period flag and fall back to derived state.
    pub fn clear_notice_period(
        &self,
        id: EmployeeId,
        today: NaiveDate,
    ) -> Result<EmployeeStatus, AllocationServiceError> {
        let employee = self.require_employee(&id)?;
        let allocations = self.allocations_for(&id)?;
        let derived = derive_status(EmployeeStatus::Bench, &allocations, today);
        if employee.status != derived {
            self.directory.update_status(&id, derived)?;
        }
        info!(employee = %id, status = derived.label(), "notice period cleared");
        Ok(derived)
    }

    pub(crate) fn allocations_for(
        &self,
        id: &EmployeeId,
    ) -> Result<Vec<Allocation>, AllocationServiceError> {
        Ok(self
            .repository
            .for_employee(id)?
            .into_iter()
            .map(|record| record.allocation)
            .collect())
    }

    pub(crate) fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub(crate) fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub(crate) fn projects(&self) -> &Arc<P> {
        &self.projects
    }

    pub(crate) fn resolve_rate_for(
        &self,
        allocation: &Allocation,
        project: &Project,
        today: NaiveDate,
    ) -> Result<ResolvedRate, AllocationServiceError> {
        let cards = self
            .rate_cards
            .cards_for_employee(&allocation.employee_id)?;
        let resolved = resolve_rate(
            &cards,
            project.industry_domain,
            today,
            allocation.billing_rate,
        );
        if resolved.source.is_missing() {
            debug!(
                employee = %allocation.employee_id,
                project = %project.id,
                "no applicable rate; financials degrade to zero revenue"
            );
        }
        Ok(resolved)
    }

    fn allocation_from_draft(
        &self,
        draft: &AllocationDraft,
        id: AllocationId,
    ) -> Result<Allocation, AllocationServiceError> {
        let percentages = draft
            .resolve_percentages()
            .map_err(AllocationRejection::Percentage)?;

        Ok(Allocation {
            id,
            employee_id: draft.employee_id,
            project_id: draft.project_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            allocation_percentage: Some(percentages.allocation),
            internal_allocation_percentage: Some(percentages.internal),
            billable_percentage: Some(percentages.billable),
            billing_rate: draft.billing_rate,
            is_trainee: draft.is_trainee,
            mentoring_primary_emp_id: draft.mentoring_primary_emp_id,
            rate_card_id: None,
            utilization: None,
        })
    }

    /// Trainee and capacity gates, run under the employee lock so the
    /// verdict and the subsequent write observe the same ledger state.
    fn run_write_gates(
        &self,
        allocation: &Allocation,
        exclude: Option<AllocationId>,
        policy: CapacityPolicy,
    ) -> Result<(), AllocationServiceError> {
        if allocation.is_trainee {
            let mentor_allocations = match allocation.mentoring_primary_emp_id {
                Some(mentor) if mentor != allocation.employee_id => {
                    self.allocations_for(&mentor)?
                }
                _ => Vec::new(),
            };
            let violations = self.trainee.check(allocation, &mentor_allocations);
            if !violations.is_empty() {
                return Err(AllocationRejection::Trainee(TraineeViolations(violations)).into());
            }
        }

        let existing = self.allocations_for(&allocation.employee_id)?;
        let decision = self.capacity.check(
            &existing,
            &CandidateWindow {
                employee_id: allocation.employee_id,
                internal_percent: allocation.effective_internal_percent(),
                start_date: allocation.start_date,
                end_date: allocation.end_date,
                exclude,
            },
        );

        if !decision.is_valid {
            match policy {
                CapacityPolicy::Enforce => {
                    return Err(AllocationRejection::OverAllocation(decision).into());
                }
                CapacityPolicy::WarnOnly => {
                    tracing::warn!(
                        employee = %allocation.employee_id,
                        current_total = decision.current_total,
                        would_be_total = decision.would_be_total,
                        "capacity ceiling exceeded; admitting under warn-only policy"
                    );
                }
            }
        }

        Ok(())
    }

    fn resync_status_locked(
        &self,
        id: &EmployeeId,
        today: NaiveDate,
    ) -> Result<(), AllocationServiceError> {
        self.sync_employee_status(*id, today)?;
        Ok(())
    }

    fn require_employee(&self, id: &EmployeeId) -> Result<Employee, AllocationServiceError> {
        let employee = self
            .directory
            .fetch(id)?
            .ok_or(AllocationServiceError::UnknownEmployee(*id))?;
        if !employee.active {
            return Err(AllocationServiceError::InactiveEmployee(*id));
        }
        Ok(employee)
    }

    fn require_project(&self, id: &ProjectId) -> Result<Project, AllocationServiceError> {
        self.projects
            .fetch(id)?
            .ok_or(AllocationServiceError::UnknownProject(*id))
    }
}

/// Stored vs derived availability for one employee.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeStatusView {
    pub employee_id: EmployeeId,
    pub stored: EmployeeStatus,
    pub derived: EmployeeStatus,
    pub derived_label: &'static str,
}

/// Collected trainee violations for one rejected write.
#[derive(Debug, Clone, PartialEq)]
pub struct TraineeViolations(pub Vec<TraineeViolation>);

impl std::fmt::Display for TraineeViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|violation| violation.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// A write rejected before persistence, with enough structure for callers to
/// render a precise error.
#[derive(Debug, thiserror::Error)]
pub enum AllocationRejection {
    #[error(transparent)]
    Percentage(#[from] PercentOutOfRange),
    #[error("{}", .0.error_message.as_deref().unwrap_or("over-allocated"))]
    OverAllocation(CapacityDecision),
    #[error("trainee invariants violated: {0}")]
    Trainee(TraineeViolations),
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Rejected(#[from] AllocationRejection),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("employee {0} not found")]
    UnknownEmployee(EmployeeId),
    #[error("employee {0} is no longer active")]
    InactiveEmployee(EmployeeId),
    #[error("project {0} not found")]
    UnknownProject(ProjectId),
    #[error("allocation {0} not found")]
    UnknownAllocation(AllocationId),
    #[error("allocation {allocation} belongs to a different employee than {employee}")]
    EmployeeMismatch {
        allocation: AllocationId,
        employee: EmployeeId,
    },
}
