use chrono::NaiveDate;

use super::domain::{Allocation, Employee, EmployeeStatus, Percent};

/// Recompute an employee's availability from their allocations.
///
/// NOTICE_PERIOD is sticky: an explicit HR signal outranks computed state, so
/// derivation short-circuits until the flag is cleared. Otherwise the state
/// is ALLOCATED when any allocation active today consumes real capacity, and
/// BENCH when none does. Trainee rows that declare no capacity are shadows
/// and do not count.
pub fn derive_status(
    stored: EmployeeStatus,
    allocations: &[Allocation],
    today: NaiveDate,
) -> EmployeeStatus {
    if stored == EmployeeStatus::NoticePeriod {
        return EmployeeStatus::NoticePeriod;
    }

    let has_real_active = allocations.iter().any(|allocation| {
        if !allocation.active_on(today) {
            return false;
        }
        if allocation.is_trainee {
            // A trainee with declared capacity is genuinely working; a pure
            // shadow is not.
            return !allocation
                .declared_internal_percent()
                .unwrap_or(Percent::ZERO)
                .is_zero();
        }
        true
    });

    if has_real_active {
        EmployeeStatus::Allocated
    } else {
        EmployeeStatus::Bench
    }
}

/// Align the stored status flag with the derived value, writing only when
/// they differ. Returns whether a change occurred; calling again without an
/// intervening data change is a no-op.
pub fn sync_status(employee: &mut Employee, allocations: &[Allocation], today: NaiveDate) -> bool {
    let derived = derive_status(employee.status, allocations, today);
    if employee.status != derived {
        employee.status = derived;
        true
    } else {
        false
    }
}

/// The allocation best describing what the employee is doing today:
/// most recently started active allocation, preferring real staffing over
/// shadow entries.
pub fn current_allocation<'a>(
    allocations: &'a [Allocation],
    today: NaiveDate,
) -> Option<&'a Allocation> {
    let mut active: Vec<&Allocation> = allocations
        .iter()
        .filter(|allocation| allocation.active_on(today))
        .collect();
    active.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    active
        .iter()
        .find(|allocation| !allocation.is_trainee)
        .or_else(|| active.first())
        .copied()
}
