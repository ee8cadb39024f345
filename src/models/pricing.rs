//! Day-by-day pricing as returned by OwnerRez and the summary derived from it.

use serde::{Deserialize, Serialize};

/// One night of the upstream pricing schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingDay {
    pub date: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, alias = "is_stay_disallowed")]
    pub stay_disallowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_nights: Option<u32>,
}

/// Pricing endpoint payload; OwnerRez may answer with a bare list or a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PricingPayload {
    Days(Vec<PricingDay>),
    Page { items: Vec<PricingDay> },
}

impl PricingPayload {
    pub fn into_days(self) -> Vec<PricingDay> {
        match self {
            PricingPayload::Days(days) => days,
            PricingPayload::Page { items } => items,
        }
    }
}

/// Aggregated pricing for a requested stay.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub start_date: String,
    pub end_date: String,
    pub total_nights: usize,
    pub available_nights: usize,
    pub blocked_nights: usize,
    pub total_amount: f64,
    pub average_per_night: f64,
    pub days: Vec<PricingDay>,
}
