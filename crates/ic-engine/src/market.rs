//! Market sample aggregation.

use std::collections::BTreeMap;

use ic_protocol::{Confidence, MarketSample, MarketSummary};

/// Newest samples carried in a summary.
pub const RECENT_SAMPLES: usize = 10;

/// Aggregate samples in the most common currency; the rest are excluded.
/// Currency ties go to the alphabetically first code.
pub fn summarize(
    make: &str,
    model: &str,
    year: Option<i32>,
    mut samples: Vec<MarketSample>,
) -> Option<MarketSummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for sample in &samples {
        *counts.entry(sample.currency.as_str()).or_default() += 1;
    }
    let currency = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(code, _)| (*code).to_string())?;

    samples.retain(|s| s.currency == currency);
    samples.sort_by(|a, b| b.listing_date.cmp(&a.listing_date));

    let prices: Vec<i64> = samples.iter().map(|s| s.price_minor).collect();
    let sample_count = prices.len();
    let total: i128 = prices.iter().map(|p| i128::from(*p)).sum();
    let average_price = i64::try_from(total / sample_count as i128).unwrap_or(i64::MAX);
    let min_price = prices.iter().copied().min()?;
    let max_price = prices.iter().copied().max()?;
    samples.truncate(RECENT_SAMPLES);

    Some(MarketSummary {
        make: make.to_string(),
        model: model.to_string(),
        year,
        sample_count,
        average_price,
        min_price,
        max_price,
        currency,
        recent_samples: samples,
    })
}

/// `min(90, 40 + 10 * n)`.
pub fn market_confidence(sample_count: usize) -> Confidence {
    let n = i64::try_from(sample_count).unwrap_or(i64::MAX);
    Confidence::new(n.saturating_mul(10).saturating_add(40).min(90))
}

/// Minor units as a decimal amount, e.g. `185000, "USD"` → "1850.00 USD".
pub fn format_minor(amount: i64, currency: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}
