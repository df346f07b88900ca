use super::domain::{Allocation, EmployeeId, ProjectId};

/// Structural invariants broken by a trainee/shadow allocation. Collected in
/// full rather than short-circuited so a caller can report every problem at
/// once.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraineeViolation {
    #[error("trainee allocations must not be billable (billable percentage {found}%)")]
    Billable { found: u8 },
    #[error("trainee allocations must not carry a billing rate (found {rate})")]
    BillingRate { rate: f64 },
    #[error("trainee allocations must reference a mentoring primary employee")]
    MissingMentor,
    #[error("trainee {employee} cannot mentor themselves")]
    SelfMentor { employee: EmployeeId },
    #[error(
        "mentor {mentor} holds no overlapping non-trainee allocation on project {project}"
    )]
    MentorNotStaffed {
        mentor: EmployeeId,
        project: ProjectId,
    },
}

/// Write-time gate for shadow allocations: never billable, always anchored
/// to a mentor who is really staffed on the same project.
#[derive(Debug, Clone, Copy)]
pub struct TraineeRules {
    enforce_mentor_coverage: bool,
}

impl TraineeRules {
    pub fn new(enforce_mentor_coverage: bool) -> Self {
        Self {
            enforce_mentor_coverage,
        }
    }

    /// Check a candidate allocation. `mentor_allocations` holds the current
    /// allocations of the referenced mentor, if any; callers fetch them in
    /// the same transaction as the write.
    pub fn check(
        &self,
        allocation: &Allocation,
        mentor_allocations: &[Allocation],
    ) -> Vec<TraineeViolation> {
        if !allocation.is_trainee {
            // A mentor reference on a regular allocation carries no
            // obligations.
            return Vec::new();
        }

        let mut violations = Vec::new();

        let billable = allocation.effective_billable_percent();
        if !billable.is_zero() {
            violations.push(TraineeViolation::Billable {
                found: billable.value(),
            });
        }

        if let Some(rate) = allocation.billing_rate {
            if rate > 0.0 {
                violations.push(TraineeViolation::BillingRate { rate });
            }
        }

        match allocation.mentoring_primary_emp_id {
            None => violations.push(TraineeViolation::MissingMentor),
            Some(mentor) if mentor == allocation.employee_id => {
                violations.push(TraineeViolation::SelfMentor {
                    employee: allocation.employee_id,
                });
            }
            Some(mentor) => {
                if self.enforce_mentor_coverage {
                    let covered = mentor_allocations.iter().any(|candidate| {
                        candidate.employee_id == mentor
                            && !candidate.is_trainee
                            && candidate.project_id == allocation.project_id
                            && candidate.overlaps(allocation.start_date, allocation.end_date)
                    });
                    if !covered {
                        violations.push(TraineeViolation::MentorNotStaffed {
                            mentor,
                            project: allocation.project_id,
                        });
                    }
                }
            }
        }

        violations
    }
}

impl Default for TraineeRules {
    fn default() -> Self {
        Self::new(true)
    }
}
