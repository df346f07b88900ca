use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::allocation::domain::{
    Allocation, AllocationDraft, AllocationId, DomainId, Employee, EmployeeId, EmployeeStatus,
    Percent, Project, ProjectId, ProjectStatus, RateCard, RateCardId, RateType, RoleLevel,
};
use crate::workflows::allocation::financials::FinancialReconciler;
use crate::workflows::allocation::repository::{
    AllocationRecord, AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource,
    RepositoryError,
};
use crate::workflows::allocation::service::AllocationService;
use crate::workflows::allocation::trainee::TraineeRules;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn pct(value: u8) -> Percent {
    Percent::new(value).expect("percentage in range")
}

pub(super) fn employee(id: u64, ctc_monthly: f64) -> Employee {
    Employee {
        id: EmployeeId(id),
        first_name: format!("First{id}"),
        last_name: format!("Last{id}"),
        email: format!("employee{id}@example.com"),
        role_level: RoleLevel::Mid,
        ctc_monthly,
        currency: "USD".to_string(),
        status: EmployeeStatus::Bench,
        joined_date: Some(date(2024, 1, 15)),
        active: true,
    }
}

pub(super) fn project(id: u64) -> Project {
    Project {
        id: ProjectId(id),
        client_name: format!("Client {id}"),
        project_name: format!("Project {id}"),
        status: ProjectStatus::Active,
        industry_domain: None,
    }
}

pub(super) fn project_in_domain(id: u64, domain: u64) -> Project {
    Project {
        industry_domain: Some(DomainId(domain)),
        ..project(id)
    }
}

pub(super) fn allocation(
    id: u64,
    employee: u64,
    project: u64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    internal: u8,
) -> Allocation {
    Allocation {
        id: AllocationId(id),
        employee_id: EmployeeId(employee),
        project_id: ProjectId(project),
        start_date: start,
        end_date: end,
        allocation_percentage: Some(pct(internal)),
        internal_allocation_percentage: Some(pct(internal)),
        billable_percentage: Some(pct(100)),
        billing_rate: None,
        is_trainee: false,
        mentoring_primary_emp_id: None,
        rate_card_id: None,
        utilization: None,
    }
}

pub(super) fn trainee_allocation(
    id: u64,
    employee: u64,
    project: u64,
    mentor: u64,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Allocation {
    Allocation {
        id: AllocationId(id),
        employee_id: EmployeeId(employee),
        project_id: ProjectId(project),
        start_date: start,
        end_date: end,
        allocation_percentage: Some(Percent::ZERO),
        internal_allocation_percentage: Some(Percent::ZERO),
        billable_percentage: Some(Percent::ZERO),
        billing_rate: None,
        is_trainee: true,
        mentoring_primary_emp_id: Some(EmployeeId(mentor)),
        rate_card_id: None,
        utilization: None,
    }
}

pub(super) fn draft(
    employee: u64,
    project: u64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    internal: u8,
) -> AllocationDraft {
    AllocationDraft {
        employee_id: EmployeeId(employee),
        project_id: ProjectId(project),
        start_date: start,
        end_date: end,
        allocation_percentage: Some(internal),
        internal_allocation_percentage: Some(internal),
        billable_percentage: Some(100),
        billing_rate: None,
        is_trainee: false,
        mentoring_primary_emp_id: None,
    }
}

pub(super) fn trainee_draft(
    employee: u64,
    project: u64,
    mentor: Option<u64>,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> AllocationDraft {
    AllocationDraft {
        employee_id: EmployeeId(employee),
        project_id: ProjectId(project),
        start_date: start,
        end_date: end,
        allocation_percentage: Some(0),
        internal_allocation_percentage: Some(0),
        billable_percentage: Some(0),
        billing_rate: None,
        is_trainee: true,
        mentoring_primary_emp_id: mentor.map(EmployeeId),
    }
}

pub(super) fn base_card(id: u64, employee: u64, hourly_rate: f64, effective: NaiveDate) -> RateCard {
    RateCard {
        id: RateCardId(id),
        employee_id: EmployeeId(employee),
        domain_id: None,
        hourly_rate,
        currency: "USD".to_string(),
        effective_date: effective,
        expiry_date: None,
        rate_type: RateType::Base,
        is_active: true,
    }
}

pub(super) fn domain_card(
    id: u64,
    employee: u64,
    domain: u64,
    hourly_rate: f64,
    effective: NaiveDate,
) -> RateCard {
    RateCard {
        id: RateCardId(id),
        employee_id: EmployeeId(employee),
        domain_id: Some(DomainId(domain)),
        hourly_rate,
        currency: "USD".to_string(),
        effective_date: effective,
        expiry_date: None,
        rate_type: RateType::DomainSpecific,
        is_active: true,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    records: Arc<Mutex<HashMap<AllocationId, AllocationRecord>>>,
}

impl AllocationRepository for MemoryLedger {
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
        if guard.contains_key(&record.allocation.id) {
            guard.insert(record.allocation.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    employees: Arc<Mutex<HashMap<EmployeeId, Employee>>>,
}

impl MemoryDirectory {
    pub(super) fn put(&self, employee: Employee) {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .insert(employee.id, employee);
    }

    pub(super) fn status_of(&self, id: &EmployeeId) -> Option<EmployeeStatus> {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .map(|employee| employee.status)
    }
}

impl EmployeeDirectory for MemoryDirectory {
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

#[derive(Default, Clone)]
pub(super) struct MemoryRateCards {
    cards: Arc<Mutex<Vec<RateCard>>>,
}

impl MemoryRateCards {
    pub(super) fn put(&self, card: RateCard) {
        self.cards.lock().expect("rate card mutex poisoned").push(card);
    }
}

impl RateCardSource for MemoryRateCards {
    fn cards_for_employee(&self, id: &EmployeeId) -> Result<Vec<RateCard>, RepositoryError> {
        let guard = self.cards.lock().expect("rate card mutex poisoned");
        Ok(guard
            .iter()
            .filter(|card| card.employee_id == *id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProjects {
    projects: Arc<Mutex<HashMap<ProjectId, Project>>>,
}

impl MemoryProjects {
    pub(super) fn put(&self, project: Project) {
        self.projects
            .lock()
            .expect("project mutex poisoned")
            .insert(project.id, project);
    }
}

impl ProjectCatalog for MemoryProjects {
    fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("project mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("project mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) type MemoryService =
    AllocationService<MemoryLedger, MemoryDirectory, MemoryRateCards, MemoryProjects>;

pub(super) struct World {
    pub(super) service: Arc<MemoryService>,
    pub(super) ledger: Arc<MemoryLedger>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) rate_cards: Arc<MemoryRateCards>,
    pub(super) projects: Arc<MemoryProjects>,
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn build_world() -> World {
    let ledger = Arc::new(MemoryLedger::default());
    let directory = Arc::new(MemoryDirectory::default());
    let rate_cards = Arc::new(MemoryRateCards::default());
    let projects = Arc::new(MemoryProjects::default());

    let service = Arc::new(AllocationService::new(
        ledger.clone(),
        directory.clone(),
        rate_cards.clone(),
        projects.clone(),
        FinancialReconciler::default(),
        TraineeRules::default(),
    ));

    World {
        service,
        ledger,
        directory,
        rate_cards,
        projects,
    }
}
