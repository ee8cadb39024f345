//! Aggregation of the nightly pricing schedule.

use chrono::NaiveDate;

use crate::models::{PricingDay, PricingSummary};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarize a stay. Nights flagged `stay_disallowed` count as blocked and are
/// excluded from the total; the average is over available nights only.
pub fn summarize(start: NaiveDate, end: NaiveDate, days: Vec<PricingDay>) -> PricingSummary {
    let total_nights = days.len();
    let mut blocked_nights = 0;
    let mut total = 0.0;

    for day in &days {
        if day.stay_disallowed {
            blocked_nights += 1;
        } else {
            total += day.amount;
        }
    }

    let available_nights = total_nights - blocked_nights;
    let total_amount = round2(total);
    let average_per_night = if available_nights > 0 {
        round2(total_amount / available_nights as f64)
    } else {
        0.0
    };

    PricingSummary {
        start_date: start.to_string(),
        end_date: end.to_string(),
        total_nights,
        available_nights,
        blocked_nights,
        total_amount,
        average_per_night,
        days,
    }
}
