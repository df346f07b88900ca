use serde::{Deserialize, Serialize};

use super::domain::{
    Allocation, AllocationId, Employee, EmployeeId, EmployeeStatus, Project, ProjectId, RateCard,
};
use super::financials::AllocationFinancial;

/// Repository record pairing an allocation with its recomputable financial
/// snapshot. The snapshot's lifetime is bounded by the allocation's: removal
/// of the record removes both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub allocation: Allocation,
    pub financial: Option<AllocationFinancial>,
}

/// Storage abstraction for allocations so the service module can be
/// exercised in isolation.
pub trait AllocationRepository: Send + Sync {
    fn insert(&self, record: AllocationRecord) -> Result<AllocationRecord, RepositoryError>;
    fn update(&self, record: AllocationRecord) -> Result<(), RepositoryError>;
    /// Remove an allocation, cascading to its financial snapshot.
    fn remove(&self, id: &AllocationId) -> Result<AllocationRecord, RepositoryError>;
    fn fetch(&self, id: &AllocationId) -> Result<Option<AllocationRecord>, RepositoryError>;
    fn for_employee(&self, employee: &EmployeeId) -> Result<Vec<AllocationRecord>, RepositoryError>;
    fn for_project(&self, project: &ProjectId) -> Result<Vec<AllocationRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<AllocationRecord>, RepositoryError>;
}

/// Lookup surface for employee master data.
pub trait EmployeeDirectory: Send + Sync {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    fn update_status(
        &self,
        id: &EmployeeId,
        status: EmployeeStatus,
    ) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<Employee>, RepositoryError>;
}

/// Lookup surface for rate cards.
pub trait RateCardSource: Send + Sync {
    fn cards_for_employee(&self, id: &EmployeeId) -> Result<Vec<RateCard>, RepositoryError>;
}

/// Lookup surface for project master data.
pub trait ProjectCatalog: Send + Sync {
    fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;
    fn all(&self) -> Result<Vec<Project>, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
