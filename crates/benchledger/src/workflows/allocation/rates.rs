use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{DomainId, RateCard, RateCardId, RateType};

/// Where a resolved hourly rate came from. `Missing` is not an error:
/// downstream financials degrade to zero revenue, and report consumers can
/// tell an absent rate card apart from a genuinely zero margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    DomainCard,
    BaseCard,
    AllocationOverride,
    Missing,
}

impl RateSource {
    pub const fn label(self) -> &'static str {
        match self {
            RateSource::DomainCard => "domain rate card",
            RateSource::BaseCard => "base rate card",
            RateSource::AllocationOverride => "allocation billing rate",
            RateSource::Missing => "missing",
        }
    }

    pub const fn is_missing(self) -> bool {
        matches!(self, RateSource::Missing)
    }
}

/// Outcome of rate resolution for one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub hourly_rate: f64,
    pub source: RateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_card_id: Option<RateCardId>,
}

impl ResolvedRate {
    pub const fn missing() -> Self {
        Self {
            hourly_rate: 0.0,
            source: RateSource::Missing,
            rate_card_id: None,
        }
    }
}

/// Pick the applicable hourly rate from an employee's rate cards: the most
/// recently effective, currently active domain-scoped card wins, then the
/// active base card, then the allocation's own billing rate, then nothing.
pub fn resolve_rate(
    cards: &[RateCard],
    domain: Option<DomainId>,
    as_of: NaiveDate,
    allocation_override: Option<f64>,
) -> ResolvedRate {
    if let Some(domain) = domain {
        if let Some(card) = most_recent(cards, as_of, |card| card.domain_id == Some(domain)) {
            return ResolvedRate {
                hourly_rate: card.hourly_rate,
                source: RateSource::DomainCard,
                rate_card_id: Some(card.id),
            };
        }
    }

    if let Some(card) = most_recent(cards, as_of, |card| {
        card.domain_id.is_none() && card.rate_type == RateType::Base
    }) {
        return ResolvedRate {
            hourly_rate: card.hourly_rate,
            source: RateSource::BaseCard,
            rate_card_id: Some(card.id),
        };
    }

    match allocation_override {
        Some(rate) if rate > 0.0 => ResolvedRate {
            hourly_rate: rate,
            source: RateSource::AllocationOverride,
            rate_card_id: None,
        },
        _ => ResolvedRate::missing(),
    }
}

fn most_recent<'a, F>(cards: &'a [RateCard], as_of: NaiveDate, matches: F) -> Option<&'a RateCard>
where
    F: Fn(&RateCard) -> bool,
{
    cards
        .iter()
        .filter(|card| card.covers(as_of))
        .filter(|card| matches(card))
        .max_by_key(|card| card.effective_date)
}
