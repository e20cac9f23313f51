use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::kpi;
use crate::models::{Dimension, FilterState, Transaction};

pub fn build_report(
    transactions: &[Transaction],
    filters: &FilterState,
    dimension: Option<Dimension>,
) -> String {
    let rows = kpi::filter_transactions(transactions, filters);
    let summary = kpi::compute_summary(&rows);
    let segments = kpi::group_by_dimension(&rows, dimension);

    let mut output = String::new();

    let _ = writeln!(output, "# Marketing KPI Report");
    let _ = writeln!(
        output,
        "Computed over {} of {} transactions (filters: {})",
        rows.len(),
        transactions.len(),
        describe_filters(filters)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Indicators");
    let _ = writeln!(output, "- Revenue: {:.2}", money(summary.revenue));
    let _ = writeln!(output, "- Orders: {}", summary.orders);
    let _ = writeln!(output, "- Leads: {}", summary.leads);
    let _ = writeln!(output, "- Conversion rate: {:.2} %", summary.conversion_rate);
    let _ = writeln!(output, "- Average order value: {:.2}", summary.average_order_value);
    let _ = writeln!(output, "- Revenue per lead: {:.2}", summary.revenue_per_lead);

    if let Some(dimension) = dimension {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Breakdown by {dimension}");

        if segments.is_empty() {
            let _ = writeln!(output, "No transactions match the active filters.");
        } else {
            for segment in segments.iter() {
                let _ = writeln!(
                    output,
                    "- {}: revenue {:.2}, {} orders, {} leads, conversion {:.2} %",
                    segment.dimension_value,
                    money(segment.summary.revenue),
                    segment.summary.orders,
                    segment.summary.leads,
                    segment.summary.conversion_rate
                );
            }
        }
    }

    let mut recent = rows;
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Transactions");

    if recent.is_empty() {
        let _ = writeln!(output, "No transactions match the active filters.");
    } else {
        for row in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({} / {} / {}): revenue {:.2}, {} orders, {} leads",
                row.date,
                row.channel.as_deref().unwrap_or(kpi::UNSPECIFIED_LABEL),
                row.campaign.as_deref().unwrap_or(kpi::UNSPECIFIED_LABEL),
                row.product.as_deref().unwrap_or(kpi::UNSPECIFIED_LABEL),
                money(row.revenue),
                row.orders,
                row.leads
            );
        }
    }

    output
}

/// Clamp an amount to two decimals for display, half away from zero.
pub fn money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn describe_filters(filters: &FilterState) -> String {
    let mut parts = Vec::new();

    for dimension in Dimension::ALL {
        let Some(values) = filters.selected(dimension) else {
            continue;
        };
        if values.is_empty() {
            continue;
        }
        let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
        values.sort_unstable();
        parts.push(format!("{dimension}={}", values.join("|")));
    }

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}
