use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use benchledger::workflows::allocation::{
    AllocationDraft, AllocationId, AllocationRecord, AllocationRejection,
    AllocationRepository, AllocationService, AllocationServiceError, Employee, EmployeeDirectory,
    EmployeeId, EmployeeStatus, FinancialReconciler, Percent, Project, ProjectCatalog, ProjectId,
    ProjectStatus, RateCard, RateCardSource, ReportKind, ReportPeriod, RepositoryError, RoleLevel,
    TraineeRules,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[derive(Default)]
struct Ledger {
    records: Mutex<HashMap<AllocationId, AllocationRecord>>,
}

impl AllocationRepository for Ledger {
    fn insert(&self, record: AllocationRecord) -> Result<AllocationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        if guard.contains_key(&record.allocation.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.allocation.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: AllocationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        guard.insert(record.allocation.id, record);
        Ok(())
    }

    fn remove(&self, id: &AllocationId) -> Result<AllocationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        guard.remove(id).ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &AllocationId) -> Result<Option<AllocationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_employee(
        &self,
        employee: &EmployeeId,
    ) -> Result<Vec<AllocationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.allocation.employee_id == *employee)
            .cloned()
            .collect())
    }

    fn for_project(&self, project: &ProjectId) -> Result<Vec<AllocationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.allocation.project_id == *project)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<AllocationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
struct Directory {
    employees: Mutex<HashMap<EmployeeId, Employee>>,
}

impl Directory {
    fn put(&self, employee: Employee) {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .insert(employee.id, employee);
    }

    fn status_of(&self, id: &EmployeeId) -> Option<EmployeeStatus> {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .map(|employee| employee.status)
    }
}

impl EmployeeDirectory for Directory {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let guard = self.employees.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &EmployeeId,
        status: EmployeeStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.employees.lock().expect("directory mutex poisoned");
        match guard.get_mut(id) {
            Some(employee) => {
                employee.status = status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn all(&self) -> Result<Vec<Employee>, RepositoryError> {
        let guard = self.employees.lock().expect("directory mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
struct RateBook {
    cards: Mutex<Vec<RateCard>>,
}

impl RateCardSource for RateBook {
    fn cards_for_employee(&self, id: &EmployeeId) -> Result<Vec<RateCard>, RepositoryError> {
        let guard = self.cards.lock().expect("rate book mutex poisoned");
        Ok(guard
            .iter()
            .filter(|card| card.employee_id == *id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct Catalog {
    projects: Mutex<HashMap<ProjectId, Project>>,
}

impl Catalog {
    fn put(&self, project: Project) {
        self.projects
            .lock()
            .expect("catalog mutex poisoned")
            .insert(project.id, project);
    }
}

impl ProjectCatalog for Catalog {
    fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("catalog mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

fn employee(id: u64, ctc_monthly: f64) -> Employee {
    Employee {
        id: EmployeeId(id),
        first_name: "Devi".to_string(),
        last_name: format!("Rao{id}"),
        email: format!("devi{id}@example.com"),
        role_level: RoleLevel::Sr,
        ctc_monthly,
        currency: "USD".to_string(),
        status: EmployeeStatus::Bench,
        joined_date: Some(date(2023, 5, 2)),
        active: true,
    }
}

fn project(id: u64) -> Project {
    Project {
        id: ProjectId(id),
        client_name: "Northwind".to_string(),
        project_name: format!("Modernization {id}"),
        status: ProjectStatus::Active,
        industry_domain: None,
    }
}

fn draft(employee: u64, project: u64, start: NaiveDate, end: Option<NaiveDate>, internal: u8) -> AllocationDraft {
    AllocationDraft {
        employee_id: EmployeeId(employee),
        project_id: ProjectId(project),
        start_date: start,
        end_date: end,
        allocation_percentage: Some(internal),
        internal_allocation_percentage: Some(internal),
        billable_percentage: Some(100),
        billing_rate: Some(100.0),
        is_trainee: false,
        mentoring_primary_emp_id: None,
    }
}

fn build_service() -> (
    Arc<AllocationService<Ledger, Directory, RateBook, Catalog>>,
    Arc<Directory>,
) {
    let ledger = Arc::new(Ledger::default());
    let directory = Arc::new(Directory::default());
    let rates = Arc::new(RateBook::default());
    let catalog = Arc::new(Catalog::default());

    let service = Arc::new(AllocationService::new(
        ledger,
        directory.clone(),
        rates,
        catalog.clone(),
        FinancialReconciler::default(),
        TraineeRules::default(),
    ));

    directory.put(employee(1, 16_000.0));
    directory.put(employee(2, 20_000.0));
    catalog.put(project(10));
    catalog.put(project(11));

    (service, directory)
}

#[test]
fn capacity_invariant_holds_across_a_staffing_session() {
    let (service, _) = build_service();
    let today = date(2026, 2, 1);

    service
        .create(draft(1, 10, date(2026, 1, 1), Some(date(2026, 3, 31)), 60), today)
        .expect("first engagement accepted");
    service
        .create(draft(1, 11, date(2026, 1, 1), Some(date(2026, 3, 31)), 40), today)
        .expect("exactly 100 accepted");

    let error = service
        .create(draft(1, 10, date(2026, 2, 1), Some(date(2026, 2, 28)), 1), today)
        .expect_err("101 rejected");
    match error {
        AllocationServiceError::Rejected(AllocationRejection::OverAllocation(decision)) => {
            assert_eq!(decision.current_total, 100);
            assert_eq!(decision.would_be_total, 101);
        }
        other => panic!("expected over-allocation rejection, got {other:?}"),
    }

    // The ledger never holds more than 100% for any instant.
    let report = service
        .allocation_report(
            ReportKind::Internal,
            ReportPeriod {
                start_date: date(2026, 1, 1),
                end_date: date(2026, 3, 31),
            },
            today,
        )
        .expect("report builds");
    let committed: u32 = report
        .resources
        .iter()
        .filter_map(|row| row.internal_allocation_percentage)
        .map(u32::from)
        .sum();
    assert_eq!(committed, 100);
}

#[test]
fn status_follows_the_ledger_through_the_lifecycle() {
    let (service, directory) = build_service();
    let today = date(2026, 2, 1);

    assert_eq!(directory.status_of(&EmployeeId(1)), Some(EmployeeStatus::Bench));

    let record = service
        .create(draft(1, 10, date(2026, 1, 1), Some(date(2026, 6, 30)), 80), today)
        .expect("engagement accepted");
    assert_eq!(
        directory.status_of(&EmployeeId(1)),
        Some(EmployeeStatus::Allocated)
    );

    service.remove(record.allocation.id, today).expect("rolled off");
    assert_eq!(directory.status_of(&EmployeeId(1)), Some(EmployeeStatus::Bench));
}

#[test]
fn notice_period_outranks_the_ledger() {
    let (service, directory) = build_service();
    let today = date(2026, 2, 1);

    let record = service
        .create(draft(2, 10, date(2026, 1, 1), Some(date(2026, 3, 31)), 100), today)
        .expect("engagement accepted");

    service
        .declare_notice_period(EmployeeId(2))
        .expect("notice declared");

    service.remove(record.allocation.id, today).expect("rolled off");
    assert_eq!(
        directory.status_of(&EmployeeId(2)),
        Some(EmployeeStatus::NoticePeriod)
    );

    let derived = service
        .clear_notice_period(EmployeeId(2), today)
        .expect("notice cleared");
    assert_eq!(derived, EmployeeStatus::Bench);
}

#[test]
fn financial_snapshots_round_trip_through_the_public_surface() {
    let (service, _) = build_service();
    let today = date(2026, 2, 1);

    let record = service
        .create(draft(1, 10, date(2026, 1, 1), None, 50), today)
        .expect("engagement accepted");

    let financial = record.financial.expect("snapshot attached");
    assert_eq!(financial.billed_hours, 80);
    assert_eq!(financial.utilized_hours, 80);
    assert_eq!(financial.estimated_revenue, 8_000.0);
    assert_eq!(financial.cost_rate, 100.0);

    let report = service
        .allocation_report(
            ReportKind::Internal,
            ReportPeriod {
                start_date: date(2026, 1, 1),
                end_date: date(2026, 3, 31),
            },
            today,
        )
        .expect("report builds");
    assert_eq!(report.summary.total_billed_hours, 80);
    assert_eq!(
        report.resources[0].internal_allocation_percentage,
        Some(Percent::new(50).expect("valid").value())
    );
}
