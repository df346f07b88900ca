use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use super::domain::{AllocationDraft, EmployeeId, ProjectId};
use super::repository::{
    AllocationRepository, EmployeeDirectory, ProjectCatalog, RateCardSource, RepositoryError,
};
use super::service::{AllocationService, AllocationServiceError, CapacityPolicy};

/// Error raised while ingesting a roster CSV.
#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("storage unavailable during roster import: {0}")]
    Storage(String),
}

/// Outcome of a batch roster load.
#[derive(Debug, Default)]
pub struct RosterSummary {
    pub imported: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    employee_id: u64,
    project_id: u64,
    start_date: NaiveDate,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    allocation_percentage: Option<u8>,
    #[serde(default)]
    internal_allocation_percentage: Option<u8>,
    #[serde(default)]
    billable_percentage: Option<u8>,
    #[serde(default)]
    billing_rate: Option<f64>,
    #[serde(default)]
    is_trainee: Option<bool>,
    #[serde(default)]
    mentor_employee_id: Option<u64>,
}

impl RosterRow {
    fn into_draft(self) -> AllocationDraft {
        AllocationDraft {
            employee_id: EmployeeId(self.employee_id),
            project_id: ProjectId(self.project_id),
            start_date: self.start_date,
            end_date: self.end_date,
            allocation_percentage: self.allocation_percentage,
            internal_allocation_percentage: self.internal_allocation_percentage,
            billable_percentage: self.billable_percentage,
            billing_rate: self.billing_rate,
            is_trainee: self.is_trainee.unwrap_or(false),
            mentoring_primary_emp_id: self.mentor_employee_id.map(EmployeeId),
        }
    }
}

/// Parse a roster CSV into allocation drafts without touching storage.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<AllocationDraft>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut drafts = Vec::new();
    for record in csv_reader.deserialize::<RosterRow>() {
        drafts.push(record?.into_draft());
    }
    Ok(drafts)
}

/// Load a roster CSV through the allocation service.
///
/// Batch semantics: an over-capacity row is admitted with a warning instead
/// of rejecting the whole load, while structural violations (percentages out
/// of range, broken trainee invariants, unknown references) skip the row.
/// Storage outages abort the import.
pub fn import_roster<Src, R, D, C, P>(
    service: &AllocationService<R, D, C, P>,
    reader: Src,
    today: NaiveDate,
) -> Result<RosterSummary, RosterImportError>
where
    Src: Read,
    R: AllocationRepository + 'static,
    D: EmployeeDirectory + 'static,
    C: RateCardSource + 'static,
    P: ProjectCatalog + 'static,
{
    let drafts = parse_roster(reader)?;
    let mut summary = RosterSummary::default();

    for draft in drafts {
        let employee = draft.employee_id;
        match service.create_with_policy(draft, today, CapacityPolicy::WarnOnly) {
            Ok(_) => summary.imported += 1,
            Err(AllocationServiceError::Repository(RepositoryError::Unavailable(detail))) => {
                return Err(RosterImportError::Storage(detail));
            }
            Err(error) => {
                let message = format!("skipped roster row for {employee}: {error}");
                warn!("{message}");
                summary.warnings.push(message);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
