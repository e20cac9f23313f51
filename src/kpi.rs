use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Dimension, FilterState, KpiSummary, Segment, Transaction};

/// Label under which rows without a value for the grouping dimension land.
pub const UNSPECIFIED_LABEL: &str = "unspecified";

/// Sum revenue, orders and leads over the rows and derive the ratio KPIs.
/// Ratios fall back to 0 when their denominator is 0 and are rounded to
/// two decimals, half away from zero.
pub fn compute_summary(rows: &[Transaction]) -> KpiSummary {
    let mut revenue = Decimal::ZERO;
    let mut orders = 0u64;
    let mut leads = 0u64;

    for row in rows {
        revenue += row.revenue;
        orders += row.orders;
        leads += row.leads;
    }

    KpiSummary {
        revenue,
        orders,
        leads,
        conversion_rate: ratio(Decimal::from(orders) * Decimal::ONE_HUNDRED, leads),
        average_order_value: ratio(revenue, orders),
        revenue_per_lead: ratio(revenue, leads),
    }
}

pub fn filter_transactions(rows: &[Transaction], filters: &FilterState) -> Vec<Transaction> {
    rows.iter().filter(|row| filters.allows(row)).cloned().collect()
}

/// Partition rows by their value for `dimension` and summarize each group.
/// Segments come back sorted by revenue descending; equal revenues keep
/// first-encountered group order. No dimension means no segments.
pub fn group_by_dimension(rows: &[Transaction], dimension: Option<Dimension>) -> Vec<Segment> {
    let Some(dimension) = dimension else {
        return Vec::new();
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Transaction>> = HashMap::new();

    for row in rows {
        let key = row
            .dimension_value(dimension)
            .unwrap_or(UNSPECIFIED_LABEL)
            .to_string();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row.clone());
    }

    let mut segments: Vec<Segment> = order
        .into_iter()
        .filter_map(|value| {
            groups.remove(&value).map(|rows| Segment {
                summary: compute_summary(&rows),
                dimension_value: value,
            })
        })
        .collect();

    segments.sort_by(|a, b| b.summary.revenue.cmp(&a.summary.revenue));
    segments
}

/// Distinct values present for a dimension, sorted. Rows without a value
/// are skipped; these are the selectable filter options for the dimension.
pub fn dimension_values(rows: &[Transaction], dimension: Dimension) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .filter_map(|row| row.dimension_value(dimension))
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    values
}

fn ratio(numerator: Decimal, denominator: u64) -> Decimal {
    if denominator == 0 {
        Decimal::ZERO
    } else {
        (numerator / Decimal::from(denominator))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
