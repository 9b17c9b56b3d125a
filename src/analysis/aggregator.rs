//! Per-channel aggregation and result grid assembly.
//!
//! This module computes summary statistics over partitions of the post
//! records and lays them out as the metric × partition grid.

use crate::models::{Cell, Metric, Partition, PostRecord, ResultRow, ResultTable, StatsSummary};
use std::collections::HashMap;
use tracing::debug;

/// Compute summary statistics over a set of posts.
///
/// Impressions are summed over all three platform columns for every record
/// in the set, regardless of the record's channel. An empty set yields zero
/// sums and no rates.
pub fn calculate_stats<'a, I>(records: I) -> StatsSummary
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let mut summary = StatsSummary::default();

    for record in records {
        summary.total_posts += 1;
        summary.total_impressions += record.impressions();
        summary.total_engagements += record.engagements.unwrap_or(0.0);
        summary.total_weighted_engagements += record.weighted_engagements.unwrap_or(0.0);
        summary.total_link_clicks += record.link_clicks.unwrap_or(0.0);
    }

    if summary.total_impressions > 0.0 {
        summary.ctr = Some(summary.total_link_clicks / summary.total_impressions);
        summary.weng_rate = Some(summary.total_weighted_engagements / summary.total_impressions);
    }

    summary
}

/// Records belonging to a partition, in input order.
pub fn partition_records(records: &[PostRecord], partition: Partition) -> Vec<&PostRecord> {
    records.iter().filter(|r| partition.contains(r)).collect()
}

/// Summaries for every partition, in grid column order.
pub fn summarize_partitions(records: &[PostRecord]) -> Vec<(Partition, StatsSummary)> {
    Partition::ALL
        .iter()
        .map(|&partition| {
            let subset = partition_records(records, partition);
            debug!("Partition {}: {} posts", partition, subset.len());
            (partition, calculate_stats(subset))
        })
        .collect()
}

/// Round to a number of decimal places.
///
/// Rounds the exact binary value through a decimal conversion instead of
/// scaling, so `1/800 * 100` gives `0.12`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Render a ratio as a percentage with two decimals.
///
/// A partition without impressions has no rate and renders as `0%`.
/// Whole percentages keep one decimal (`10.0%`).
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(ratio) => format!("{}%", crate::models::format_float(round_to(ratio * 100.0, 2))),
        None => "0%".to_string(),
    }
}

fn metric_value(summary: &StatsSummary, metric: Metric) -> f64 {
    match metric {
        Metric::TotalPosts => summary.total_posts as f64,
        Metric::TotalImpressions => summary.total_impressions,
        Metric::TotalEngagements => summary.total_engagements,
        Metric::TotalWeightedEngagements => summary.total_weighted_engagements,
        Metric::TotalLinkClicks => summary.total_link_clicks,
        Metric::AvgCtr => summary.ctr.unwrap_or(0.0),
        Metric::AvgWengRate => summary.weng_rate.unwrap_or(0.0),
    }
}

fn fits_i64(value: f64) -> bool {
    value.is_finite() && value >= i64::MIN as f64 && value <= i64::MAX as f64
}

/// Whether every numeric cell of the grid can be shown as an integer.
///
/// The cast is all or nothing across the numeric rows: a single non-finite
/// or out-of-range sum keeps every sum as a float.
fn numeric_rows_castable(summaries: &[(Partition, StatsSummary)]) -> bool {
    summaries.iter().all(|(_, summary)| {
        Metric::ALL
            .iter()
            .filter(|m| m.is_numeric())
            .all(|&metric| fits_i64(metric_value(summary, metric)))
    })
}

fn numeric_cell(value: f64, metric: Metric, castable: bool) -> Cell {
    // Post counts are integers whether or not the sums cast.
    if castable || metric == Metric::TotalPosts {
        Cell::Int(value.trunc() as i64)
    } else {
        Cell::Float(value)
    }
}

/// Lay out partition summaries as the metric × partition grid.
pub fn build_result_table(summaries: &[(Partition, StatsSummary)]) -> ResultTable {
    let columns: Vec<Partition> = summaries.iter().map(|(p, _)| *p).collect();
    let castable = numeric_rows_castable(summaries);
    if !castable {
        debug!("Integer cast skipped: a numeric sum is not finite");
    }

    let rows = Metric::ALL
        .iter()
        .map(|&metric| {
            let cells = match metric {
                Metric::AvgCtr => summaries
                    .iter()
                    .map(|(_, s)| Cell::Text(format_rate(s.ctr)))
                    .collect(),
                Metric::AvgWengRate => summaries
                    .iter()
                    .map(|(_, s)| Cell::Text(format_rate(s.weng_rate)))
                    .collect(),
                _ => summaries
                    .iter()
                    .map(|(_, s)| numeric_cell(metric_value(s, metric), metric, castable))
                    .collect(),
            };
            ResultRow { metric, cells }
        })
        .collect();

    ResultTable { columns, rows }
}

/// Channel values outside the known set, with their post counts, most
/// frequent first. Such posts only count towards the overall partition.
pub fn unknown_channels(records: &[PostRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records.iter().filter(|r| r.channel().is_none()) {
        *counts.entry(record.channel.as_str()).or_default() += 1;
    }

    let mut unknown: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(channel, count)| (channel.to_string(), count))
        .collect();
    unknown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    unknown
}
