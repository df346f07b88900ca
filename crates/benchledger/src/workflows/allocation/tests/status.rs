use super::common::*;
use crate::workflows::allocation::domain::{EmployeeStatus, Percent};
use crate::workflows::allocation::status::{current_allocation, derive_status, sync_status};

#[test]
fn no_allocations_derives_bench() {
    let derived = derive_status(EmployeeStatus::Bench, &[], date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Bench);
}

#[test]
fn active_allocation_derives_allocated() {
    let allocations = vec![allocation(
        1,
        7,
        1,
        date(2026, 1, 1),
        Some(date(2026, 6, 30)),
        60,
    )];
    let derived = derive_status(EmployeeStatus::Bench, &allocations, date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Allocated);
}

#[test]
fn ended_allocations_derive_bench() {
    let allocations = vec![allocation(
        1,
        7,
        1,
        date(2025, 1, 1),
        Some(date(2025, 12, 31)),
        100,
    )];
    let derived = derive_status(EmployeeStatus::Allocated, &allocations, date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Bench);
}

#[test]
fn future_allocations_do_not_count_yet() {
    let allocations = vec![allocation(1, 7, 1, date(2026, 6, 1), None, 100)];
    let derived = derive_status(EmployeeStatus::Bench, &allocations, date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Bench);
}

#[test]
fn notice_period_is_sticky_even_after_allocations_end() {
    let derived = derive_status(EmployeeStatus::NoticePeriod, &[], date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::NoticePeriod);

    let allocations = vec![allocation(1, 7, 1, date(2026, 1, 1), None, 100)];
    let derived = derive_status(EmployeeStatus::NoticePeriod, &allocations, date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::NoticePeriod);
}

#[test]
fn pure_trainee_shadow_does_not_count_as_allocated() {
    let allocations = vec![trainee_allocation(1, 7, 1, 9, date(2026, 1, 1), None)];
    let derived = derive_status(EmployeeStatus::Bench, &allocations, date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Bench);
}

#[test]
fn trainee_with_real_capacity_counts_as_allocated() {
    let mut shadow = trainee_allocation(1, 7, 1, 9, date(2026, 1, 1), None);
    shadow.internal_allocation_percentage = Some(Percent::new(20).expect("valid"));

    let derived = derive_status(EmployeeStatus::Bench, &[shadow], date(2026, 2, 1));
    assert_eq!(derived, EmployeeStatus::Allocated);
}

#[test]
fn sync_reports_a_change_at_most_once() {
    let mut employee = employee(7, 9600.0);
    let allocations = vec![allocation(1, 7, 1, date(2026, 1, 1), None, 60)];
    let today = date(2026, 2, 1);

    assert!(sync_status(&mut employee, &allocations, today));
    assert_eq!(employee.status, EmployeeStatus::Allocated);

    // No intervening data change: second call is a no-op.
    assert!(!sync_status(&mut employee, &allocations, today));
    assert_eq!(employee.status, EmployeeStatus::Allocated);
}

#[test]
fn current_allocation_prefers_real_staffing_over_shadows() {
    let shadow = trainee_allocation(1, 7, 1, 9, date(2026, 1, 20), None);
    let real = allocation(2, 7, 2, date(2026, 1, 5), None, 40);

    let allocations = vec![shadow.clone(), real.clone()];
    let current = current_allocation(&allocations, date(2026, 2, 1)).expect("one is active");
    assert_eq!(current.id, real.id);

    // With only the shadow left, it is still reported as current.
    let only_shadow = vec![shadow.clone()];
    let current = current_allocation(&only_shadow, date(2026, 2, 1)).expect("shadow is active");
    assert_eq!(current.id, shadow.id);
}

#[test]
fn current_allocation_picks_the_most_recent_start() {
    let older = allocation(1, 7, 1, date(2025, 10, 1), None, 40);
    let newer = allocation(2, 7, 2, date(2026, 1, 15), None, 40);

    let allocations = vec![older, newer.clone()];
    let current = current_allocation(&allocations, date(2026, 2, 1)).expect("both active");
    assert_eq!(current.id, newer.id);
}
