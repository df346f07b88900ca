use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Allocation, AllocationId, EmployeeId, Percent};

/// The window and capacity a write request is asking to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWindow {
    pub employee_id: EmployeeId,
    pub internal_percent: Percent,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Allocation to ignore while summing, for in-place updates.
    pub exclude: Option<AllocationId>,
}

/// Verdict of the overlap-aware capacity check. Doubles as the wire payload
/// rendered to callers on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityDecision {
    pub is_valid: bool,
    /// Committed internal capacity across overlapping allocations, before
    /// the candidate.
    pub current_total: u32,
    /// Total the ledger would hold if the candidate were admitted.
    pub would_be_total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CapacityDecision {
    fn admissible(current_total: u32, would_be_total: u32) -> Self {
        Self {
            is_valid: true,
            current_total,
            would_be_total,
            error_message: None,
        }
    }

    fn over_allocated(current_total: u32, would_be_total: u32, ceiling: u32) -> Self {
        Self {
            is_valid: false,
            current_total,
            would_be_total,
            error_message: Some(format!(
                "total internal allocation would be {would_be_total}%; maximum allowed is \
                 {ceiling}% and overlapping allocations already total {current_total}%"
            )),
        }
    }
}

/// Guards the per-employee capacity budget: the sum of internal allocation
/// percentages across concurrently active allocations must never exceed the
/// ceiling. Pure; persistence and error policy stay with the caller.
#[derive(Debug, Clone, Copy)]
pub struct CapacityValidator {
    ceiling: u32,
}

impl CapacityValidator {
    pub const DEFAULT_CEILING: u32 = 100;

    pub fn new(ceiling: u32) -> Self {
        Self { ceiling }
    }

    pub fn check(&self, existing: &[Allocation], candidate: &CandidateWindow) -> CapacityDecision {
        let current_total: u32 = existing
            .iter()
            .filter(|allocation| allocation.employee_id == candidate.employee_id)
            .filter(|allocation| candidate.exclude != Some(allocation.id))
            .filter(|allocation| allocation.overlaps(candidate.start_date, candidate.end_date))
            .map(|allocation| u32::from(allocation.effective_internal_percent().value()))
            .sum();

        // A zero-percent candidate records presence without consuming
        // capacity and is always admissible.
        if candidate.internal_percent.is_zero() {
            return CapacityDecision::admissible(current_total, current_total);
        }

        let would_be_total = current_total + u32::from(candidate.internal_percent.value());
        if would_be_total > self.ceiling {
            CapacityDecision::over_allocated(current_total, would_be_total, self.ceiling)
        } else {
            CapacityDecision::admissible(current_total, would_be_total)
        }
    }
}

impl Default for CapacityValidator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CEILING)
    }
}
