use serde::{Deserialize, Serialize};

use super::domain::{Allocation, AllocationId, Percent, RateCardId};
use super::rates::{RateSource, ResolvedRate};

/// Hours assumed per month when converting a monthly CTC into an hourly
/// cost rate (8 hours x 20 working days).
pub const MONTHLY_WORKING_HOURS: f64 = 160.0;

/// Computed financial figures for one allocation over one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialBreakdown {
    pub billed_hours: u32,
    pub cost_hours: u32,
    pub billing_rate: f64,
    pub cost_rate: f64,
    pub estimated_revenue: f64,
    pub estimated_cost: f64,
    pub gross_margin_percentage: f64,
    pub rate_source: RateSource,
}

/// Persisted, recomputable snapshot of an allocation's financials. Owned by
/// its allocation and deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationFinancial {
    pub allocation_id: AllocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_card_id: Option<RateCardId>,
    pub billing_rate: f64,
    pub cost_rate: f64,
    pub billed_hours: u32,
    /// Hours the employee actually spends, driven by internal capacity.
    pub utilized_hours: u32,
    pub total_hours_in_period: u32,
    pub estimated_revenue: f64,
    pub estimated_cost: f64,
    pub gross_margin_percentage: f64,
    pub rate_source: RateSource,
}

/// Converts allocation percentages and rates into billed/cost hours,
/// revenue, cost, and gross margin for a reporting period.
///
/// Trainee allocations are the degenerate case: zero billed hours and zero
/// revenue regardless of any other field, pure cost.
#[derive(Debug, Clone, Copy)]
pub struct FinancialReconciler {
    total_hours_in_period: u32,
}

impl FinancialReconciler {
    pub fn new(total_hours_in_period: u32) -> Self {
        Self {
            total_hours_in_period,
        }
    }

    pub fn total_hours_in_period(&self) -> u32 {
        self.total_hours_in_period
    }

    pub fn reconcile(
        &self,
        allocation: &Allocation,
        ctc_monthly: f64,
        rate: &ResolvedRate,
    ) -> FinancialBreakdown {
        let hours = self.total_hours_in_period;
        let allocation_pct = u32::from(allocation.effective_allocation_percent().value());
        let billable_pct = u32::from(allocation.effective_billable_percent().value());
        let internal_pct = u32::from(allocation.effective_internal_percent().value());

        let (billed_hours, billing_rate) = if allocation.is_trainee {
            (0, 0.0)
        } else {
            (
                hours * allocation_pct * billable_pct / 10_000,
                rate.hourly_rate,
            )
        };
        let cost_hours = hours * internal_pct / 100;

        let cost_rate = if ctc_monthly > 0.0 {
            ctc_monthly / MONTHLY_WORKING_HOURS
        } else {
            0.0
        };

        let estimated_revenue = billing_rate * f64::from(billed_hours);
        let estimated_cost = cost_rate * f64::from(cost_hours);
        let gross_margin_percentage = if estimated_revenue > 0.0 {
            (estimated_revenue - estimated_cost) / estimated_revenue * 100.0
        } else {
            0.0
        };

        FinancialBreakdown {
            billed_hours,
            cost_hours,
            billing_rate,
            cost_rate,
            estimated_revenue,
            estimated_cost,
            gross_margin_percentage,
            rate_source: rate.source,
        }
    }

    /// Build the persistable snapshot for an allocation.
    pub fn snapshot(
        &self,
        allocation: &Allocation,
        ctc_monthly: f64,
        rate: &ResolvedRate,
    ) -> AllocationFinancial {
        let breakdown = self.reconcile(allocation, ctc_monthly, rate);
        AllocationFinancial {
            allocation_id: allocation.id,
            rate_card_id: rate.rate_card_id,
            billing_rate: breakdown.billing_rate,
            cost_rate: breakdown.cost_rate,
            billed_hours: breakdown.billed_hours,
            utilized_hours: breakdown.cost_hours,
            total_hours_in_period: self.total_hours_in_period,
            estimated_revenue: breakdown.estimated_revenue,
            estimated_cost: breakdown.estimated_cost,
            gross_margin_percentage: breakdown.gross_margin_percentage,
            rate_source: breakdown.rate_source,
        }
    }
}

impl Default for FinancialReconciler {
    fn default() -> Self {
        Self::new(MONTHLY_WORKING_HOURS as u32)
    }
}

/// Hours per period implied by the reported allocation percentage alone.
pub fn monthly_hours(total_hours: u32, allocation_percent: Percent) -> f64 {
    f64::from(total_hours) * f64::from(allocation_percent.value()) / 100.0
}
