use crate::infra::{build_world, parse_date, LedgerWorld};
use benchledger::config::LedgerConfig;
use benchledger::error::AppError;
use benchledger::workflows::allocation::{
    import_roster, AllocationDraft, AllocationRejection, AllocationServiceError, DomainId,
    Employee, EmployeeId, EmployeeStatus, Project, ProjectId, ProjectStatus, RateCard, RateCardId,
    RateType, ReportKind, ReportPeriod, RoleLevel,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the walkthrough (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Roster CSV to load before reporting
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Report kind: internal or requisition
    #[arg(long, default_value = "internal")]
    pub(crate) kind: String,
    /// Report period start (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Report period end (defaults to start + 30 days)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn seed_world(world: &LedgerWorld) {
    let employees = [
        (1, "Asha", "Iyer", RoleLevel::Sr, 19_200.0),
        (2, "Marco", "Silva", RoleLevel::Mid, 12_800.0),
        (3, "Lena", "Koch", RoleLevel::Lead, 24_000.0),
        (4, "Ravi", "Patel", RoleLevel::Jr, 6_400.0),
    ];
    for (id, first, last, role, ctc) in employees {
        world.directory.put(Employee {
            id: EmployeeId(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            role_level: role,
            ctc_monthly: ctc,
            currency: "USD".to_string(),
            status: EmployeeStatus::Bench,
            joined_date: None,
            active: true,
        });
    }

    world.projects.put(Project {
        id: ProjectId(10),
        client_name: "Northwind".to_string(),
        project_name: "Atlas Replatform".to_string(),
        status: ProjectStatus::Active,
        industry_domain: Some(DomainId(5)),
    });
    world.projects.put(Project {
        id: ProjectId(11),
        client_name: "Acme Logistics".to_string(),
        project_name: "Ledger Cleanup".to_string(),
        status: ProjectStatus::Active,
        industry_domain: None,
    });

    let cards = [
        (1, 1, None, 120.0, RateType::Base),
        (2, 1, Some(5), 155.0, RateType::DomainSpecific),
        (3, 3, None, 170.0, RateType::Base),
    ];
    for (id, employee, domain, rate, rate_type) in cards {
        world.rate_cards.put(RateCard {
            id: RateCardId(id),
            employee_id: EmployeeId(employee),
            domain_id: domain.map(DomainId),
            hourly_rate: rate,
            currency: "USD".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            expiry_date: None,
            rate_type,
            is_active: true,
        });
    }
}

fn draft(
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

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        roster,
        kind,
        start_date,
        end_date,
        today,
    } = args;

    let kind = ReportKind::parse(&kind).map_err(|err| {
        AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
    })?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let start_date = start_date.unwrap_or(today);
    let end_date = end_date.unwrap_or(start_date + chrono::Duration::days(30));

    let world = build_world(&LedgerConfig::default());
    seed_world(&world);

    let file = std::fs::File::open(&roster)?;
    let summary = import_roster(world.service.as_ref(), file, today).map_err(|err| {
        AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    println!(
        "Loaded roster {}: {} imported, {} skipped",
        roster.display(),
        summary.imported,
        summary.skipped
    );
    for warning in &summary.warnings {
        println!("  warning: {warning}");
    }

    let report = world.service.allocation_report(
        kind,
        ReportPeriod {
            start_date,
            end_date,
        },
        today,
    )?;

    print_report(&report);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let quarter_end = today + chrono::Duration::days(90);

    let world = build_world(&LedgerConfig::default());
    seed_world(&world);

    println!("Staffing allocation ledger demo (as of {today})\n");

    println!("1. Staffing Asha at 60% on Atlas Replatform");
    world
        .service
        .create(draft(1, 10, today, Some(quarter_end), 60), today)?;
    print_status(&world, 1);

    println!("\n2. Requesting another 50% for Asha over the same window");
    match world
        .service
        .create(draft(1, 11, today, Some(quarter_end), 50), today)
    {
        Err(AllocationServiceError::Rejected(AllocationRejection::OverAllocation(decision))) => {
            println!(
                "   rejected: current {}%, would be {}%",
                decision.current_total, decision.would_be_total
            );
        }
        other => println!("   unexpected outcome: {other:?}"),
    }

    println!("\n3. Topping Asha up to exactly 100%");
    world
        .service
        .create(draft(1, 11, today, Some(quarter_end), 40), today)?;
    print_status(&world, 1);

    println!("\n4. Staffing Lena full-time as the Atlas anchor");
    world
        .service
        .create(draft(3, 10, today, Some(quarter_end), 100), today)?;

    println!("\n5. Adding Ravi as a zero-capacity shadow under Lena");
    let shadow = AllocationDraft {
        employee_id: EmployeeId(4),
        project_id: ProjectId(10),
        start_date: today,
        end_date: Some(quarter_end),
        allocation_percentage: Some(0),
        internal_allocation_percentage: Some(0),
        billable_percentage: Some(0),
        billing_rate: None,
        is_trainee: true,
        mentoring_primary_emp_id: Some(EmployeeId(3)),
    };
    let shadow_record = world.service.create(shadow, today)?;
    print_status(&world, 4);
    if let Some(financial) = &shadow_record.financial {
        println!(
            "   shadow financials: billed {}h, revenue {:.2}, cost {:.2}",
            financial.billed_hours, financial.estimated_revenue, financial.estimated_cost
        );
    }

    println!("\n6. Staffing Marco with a rate override (no rate card on file)");
    let mut marco = draft(2, 11, today, Some(quarter_end), 100);
    marco.billing_rate = Some(95.0);
    world.service.create(marco, today)?;

    println!("\n7. Marco hands in notice");
    world.service.declare_notice_period(EmployeeId(2))?;
    print_status(&world, 2);

    println!("\nInternal allocation report");
    let report = world.service.allocation_report(
        ReportKind::Internal,
        ReportPeriod {
            start_date: today,
            end_date: quarter_end,
        },
        today,
    )?;
    print_report(&report);

    println!("\nProject ROI rollup");
    for entry in world.service.project_roi(10.0, today)? {
        println!(
            "  {} ({}): revenue {:.2}, cost {:.2}, roi {:.1}%{}",
            entry.project_name,
            entry.client_name,
            entry.revenue,
            entry.cost,
            entry.roi_percentage,
            if entry.below_threshold {
                " [below threshold]"
            } else {
                ""
            }
        );
    }

    Ok(())
}

fn print_status(world: &LedgerWorld, employee: u64) {
    let status = world
        .directory
        .status_of(&EmployeeId(employee))
        .map(|status| status.label())
        .unwrap_or("UNKNOWN");
    println!("   employee {employee} status: {status}");
}

fn print_report(report: &benchledger::workflows::allocation::AllocationReportView) {
    println!(
        "  {} report, {} to {} ({} resources)",
        report.kind_label,
        report.period.start_date,
        report.period.end_date,
        report.summary.total_resources
    );
    for row in &report.resources {
        let internal = row
            .internal_allocation_percentage
            .map(|pct| format!("{pct}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  - {} [{}] on {}: alloc {}%, internal {}, billed {}h @ {:.2} ({}), margin {:.1}%, {} / {}",
            row.employee_name,
            row.role_label,
            row.project_name,
            row.allocation_percentage,
            internal,
            row.billed_hours,
            row.hourly_rate,
            row.rate_source.label(),
            row.gross_margin_percentage,
            row.utilization_label,
            row.billing_posture_label,
        );
    }
    println!(
        "  totals: {:.1} monthly hours, {} billed hours, {:.2} amount, revenue {:.2}, cost {:.2}",
        report.summary.total_monthly_hours,
        report.summary.total_billed_hours,
        report.summary.total_monthly_amount,
        report.summary.total_estimated_revenue,
        report.summary.total_estimated_cost
    );
}
