use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use benchledger::config::LedgerConfig;
use benchledger::workflows::allocation::{
    AllocationId, AllocationRecord, AllocationRepository, AllocationService, Employee,
    EmployeeDirectory, EmployeeId, EmployeeStatus, FinancialReconciler, Project, ProjectCatalog,
    ProjectId, RateCard, RateCardSource, RepositoryError, TraineeRules,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAllocationLedger {
    records: Arc<Mutex<HashMap<AllocationId, AllocationRecord>>>,
}

impl AllocationRepository for InMemoryAllocationLedger {
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
pub(crate) struct InMemoryEmployeeDirectory {
    employees: Arc<Mutex<HashMap<EmployeeId, Employee>>>,
}

impl InMemoryEmployeeDirectory {
    pub(crate) fn put(&self, employee: Employee) {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .insert(employee.id, employee);
    }

    pub(crate) fn status_of(&self, id: &EmployeeId) -> Option<EmployeeStatus> {
        self.employees
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .map(|employee| employee.status)
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
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
pub(crate) struct InMemoryRateCardBook {
    cards: Arc<Mutex<Vec<RateCard>>>,
}

impl InMemoryRateCardBook {
    pub(crate) fn put(&self, card: RateCard) {
        self.cards
            .lock()
            .expect("rate card mutex poisoned")
            .push(card);
    }
}

impl RateCardSource for InMemoryRateCardBook {
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
pub(crate) struct InMemoryProjectCatalog {
    projects: Arc<Mutex<HashMap<ProjectId, Project>>>,
}

impl InMemoryProjectCatalog {
    pub(crate) fn put(&self, project: Project) {
        self.projects
            .lock()
            .expect("project mutex poisoned")
            .insert(project.id, project);
    }
}

impl ProjectCatalog for InMemoryProjectCatalog {
    fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("project mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self.projects.lock().expect("project mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(crate) type ApiAllocationService = AllocationService<
    InMemoryAllocationLedger,
    InMemoryEmployeeDirectory,
    InMemoryRateCardBook,
    InMemoryProjectCatalog,
>;

pub(crate) struct LedgerWorld {
    pub(crate) service: Arc<ApiAllocationService>,
    pub(crate) directory: Arc<InMemoryEmployeeDirectory>,
    pub(crate) rate_cards: Arc<InMemoryRateCardBook>,
    pub(crate) projects: Arc<InMemoryProjectCatalog>,
}

pub(crate) fn build_world(config: &LedgerConfig) -> LedgerWorld {
    let ledger = Arc::new(InMemoryAllocationLedger::default());
    let directory = Arc::new(InMemoryEmployeeDirectory::default());
    let rate_cards = Arc::new(InMemoryRateCardBook::default());
    let projects = Arc::new(InMemoryProjectCatalog::default());

    let service = Arc::new(AllocationService::new(
        ledger,
        directory.clone(),
        rate_cards.clone(),
        projects.clone(),
        FinancialReconciler::new(config.total_hours_in_period),
        TraineeRules::new(config.enforce_mentor_coverage),
    ));

    LedgerWorld {
        service,
        directory,
        rate_cards,
        projects,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
