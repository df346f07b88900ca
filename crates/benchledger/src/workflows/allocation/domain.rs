use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for employees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emp-{}", self.0)
    }
}

/// Identifier wrapper for projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proj-{}", self.0)
    }
}

/// Identifier wrapper for allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationId(pub u64);

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alloc-{}", self.0)
    }
}

/// Identifier wrapper for rate cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateCardId(pub u64);

impl fmt::Display for RateCardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rate-{}", self.0)
    }
}

/// Identifier wrapper for industry domains used in rate-card scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(pub u64);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain-{}", self.0)
    }
}

/// A capacity fraction in whole percentage points, guaranteed to lie in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(100);

    pub fn new(value: u8) -> Result<Self, PercentOutOfRange> {
        if value > 100 {
            return Err(PercentOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Percent {
    type Error = PercentOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Raised when a percentage field falls outside the 0..=100 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("percentage {0} is outside the allowed 0-100 range")]
pub struct PercentOutOfRange(pub u8);

/// Availability state of an employee, derived from their allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Bench,
    Allocated,
    NoticePeriod,
}

impl EmployeeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EmployeeStatus::Bench => "BENCH",
            EmployeeStatus::Allocated => "ALLOCATED",
            EmployeeStatus::NoticePeriod => "NOTICE_PERIOD",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseStatusError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BENCH" => Ok(Self::Bench),
            "ALLOCATED" => Ok(Self::Allocated),
            "NOTICE_PERIOD" => Ok(Self::NoticePeriod),
            _ => Err(ParseStatusError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized employee status '{0}'")]
pub struct ParseStatusError(pub String);

/// Seniority band carried on the employee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLevel {
    Jr,
    Mid,
    Sr,
    Lead,
    Principal,
}

impl RoleLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RoleLevel::Jr => "Jr",
            RoleLevel::Mid => "Mid",
            RoleLevel::Sr => "Sr",
            RoleLevel::Lead => "Lead",
            RoleLevel::Principal => "Principal",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseRoleError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jr" | "junior" => Ok(Self::Jr),
            "mid" => Ok(Self::Mid),
            "sr" | "senior" => Ok(Self::Sr),
            "lead" => Ok(Self::Lead),
            "principal" => Ok(Self::Principal),
            _ => Err(ParseRoleError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role level '{0}'")]
pub struct ParseRoleError(pub String);

/// The resource side of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_level: RoleLevel,
    /// Monthly cost to company, in the employee's payroll currency.
    pub ctc_monthly: f64,
    pub currency: String,
    pub status: EmployeeStatus,
    pub joined_date: Option<NaiveDate>,
    /// Employees are never deleted; departures flip this flag.
    pub active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pipeline,
    Active,
    Closed,
}

impl ProjectStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProjectStatus::Pipeline => "PIPELINE",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Closed => "CLOSED",
        }
    }
}

/// The demand side of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub client_name: String,
    pub project_name: String,
    pub status: ProjectStatus,
    /// Industry domain driving domain-specific rate-card selection.
    pub industry_domain: Option<DomainId>,
}

/// Classification of an allocation by comparing what is billed against what
/// is actually consumed internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPosture {
    /// Billing more capacity than is internally consumed.
    OverBilled,
    /// Internally consuming more capacity than is billed.
    UnderBilled,
    Aligned,
}

impl BillingPosture {
    pub const fn label(self) -> &'static str {
        match self {
            BillingPosture::OverBilled => "Over-billed",
            BillingPosture::UnderBilled => "Under-billed",
            BillingPosture::Aligned => "Aligned",
        }
    }
}

/// The unit of commitment linking an employee to a project over a date range.
///
/// The three percentage fields are independent: `allocation_percentage` is
/// the capacity reported to the client, `internal_allocation_percentage` the
/// capacity actually staffed, and `billable_percentage` the invoiced share of
/// the reported capacity. Rows migrated from older schemas may carry `None`
/// in any of them; the `effective_*` accessors apply the documented fallback
/// chain (internal -> allocation -> legacy utilization -> full).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub start_date: NaiveDate,
    /// `None` means open-ended/ongoing.
    pub end_date: Option<NaiveDate>,
    pub allocation_percentage: Option<Percent>,
    pub internal_allocation_percentage: Option<Percent>,
    pub billable_percentage: Option<Percent>,
    pub billing_rate: Option<f64>,
    pub is_trainee: bool,
    pub mentoring_primary_emp_id: Option<EmployeeId>,
    pub rate_card_id: Option<RateCardId>,
    /// Percentage column from the pre-split schema, kept for fallback only.
    pub utilization: Option<Percent>,
}

impl Allocation {
    /// First percentage the row actually declares, walking the legacy chain.
    pub fn declared_internal_percent(&self) -> Option<Percent> {
        self.internal_allocation_percentage
            .or(self.allocation_percentage)
            .or(self.utilization)
    }

    /// Internal capacity used for budget arithmetic; undeclared legacy rows
    /// count as fully committed.
    pub fn effective_internal_percent(&self) -> Percent {
        self.declared_internal_percent().unwrap_or(Percent::FULL)
    }

    pub fn effective_allocation_percent(&self) -> Percent {
        self.allocation_percentage
            .or(self.utilization)
            .unwrap_or(Percent::FULL)
    }

    pub fn effective_billable_percent(&self) -> Percent {
        self.billable_percentage.unwrap_or(Percent::FULL)
    }

    pub fn active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| end >= date)
    }

    /// Two date ranges overlap iff `s1 <= e2 && s2 <= e1`, with open ends
    /// extending to the far future.
    pub fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        let own_end = self.end_date.unwrap_or(NaiveDate::MAX);
        let other_end = end.unwrap_or(NaiveDate::MAX);
        self.start_date <= other_end && start <= own_end
    }

    /// A shadow entry that consumes no real capacity.
    pub fn is_pure_shadow(&self) -> bool {
        self.is_trainee
            && self
                .declared_internal_percent()
                .unwrap_or(Percent::ZERO)
                .is_zero()
    }

    pub fn billing_posture(&self) -> BillingPosture {
        let internal = self.effective_internal_percent();
        let reported = self.effective_allocation_percent();
        match internal.cmp(&reported) {
            std::cmp::Ordering::Less => BillingPosture::OverBilled,
            std::cmp::Ordering::Greater => BillingPosture::UnderBilled,
            std::cmp::Ordering::Equal => BillingPosture::Aligned,
        }
    }
}

/// Inbound write request for creating or re-staffing an allocation.
///
/// Percentage defaults follow the wire contract: reported capacity defaults
/// to 100, internal capacity to the reported value, billable share to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDraft {
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub allocation_percentage: Option<u8>,
    #[serde(default)]
    pub internal_allocation_percentage: Option<u8>,
    #[serde(default)]
    pub billable_percentage: Option<u8>,
    #[serde(default)]
    pub billing_rate: Option<f64>,
    #[serde(default)]
    pub is_trainee: bool,
    #[serde(default)]
    pub mentoring_primary_emp_id: Option<EmployeeId>,
}

/// Validated percentage triple resolved from a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPercentages {
    pub allocation: Percent,
    pub internal: Percent,
    pub billable: Percent,
}

impl AllocationDraft {
    pub fn resolve_percentages(&self) -> Result<ResolvedPercentages, PercentOutOfRange> {
        let allocation = Percent::new(self.allocation_percentage.unwrap_or(100))?;
        let internal = match self.internal_allocation_percentage {
            Some(value) => Percent::new(value)?,
            None => allocation,
        };
        let billable = Percent::new(self.billable_percentage.unwrap_or(100))?;
        Ok(ResolvedPercentages {
            allocation,
            internal,
            billable,
        })
    }
}

/// Pricing category of a rate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Base,
    DomainSpecific,
}

impl RateType {
    pub const fn label(self) -> &'static str {
        match self {
            RateType::Base => "BASE",
            RateType::DomainSpecific => "DOMAIN_SPECIFIC",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ParseRateTypeError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BASE" => Ok(Self::Base),
            "DOMAIN_SPECIFIC" => Ok(Self::DomainSpecific),
            _ => Err(ParseRateTypeError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized rate type '{0}'")]
pub struct ParseRateTypeError(pub String);

/// A time-bounded hourly rate scoped to an employee and optionally a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub id: RateCardId,
    pub employee_id: EmployeeId,
    pub domain_id: Option<DomainId>,
    pub hourly_rate: f64,
    pub currency: String,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub rate_type: RateType,
    pub is_active: bool,
}

impl RateCard {
    /// Whether the card is applicable on the given day.
    pub fn covers(&self, as_of: NaiveDate) -> bool {
        self.is_active
            && self.effective_date <= as_of
            && self.expiry_date.map_or(true, |expiry| expiry >= as_of)
    }
}
