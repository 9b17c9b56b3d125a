//! Overall statistics report generation.
//!
//! Ties ingestion, aggregation and rendering together and produces the
//! textual summaries that accompany the rendered table.

use crate::analysis::{build_result_table, format_rate, summarize_partitions, unknown_channels};
use crate::error::Result;
use crate::ingest::{to_records, RawTable};
use crate::models::{ChartType, Partition, ResultTable, StatsSummary, Visualization};
use crate::report::renderer::{render_table_png, Grid};
use crate::report::style::{Orientation, TableStyle};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Title of the overall statistics visualization.
pub const OVERALL_TITLE: &str = "Overall Statistics";

/// Aggregated statistics for one input table.
#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub generated_at: DateTime<Utc>,
    pub total_rows: usize,
    /// Per-partition summaries, in grid column order.
    pub partitions: Vec<PartitionSummary>,
    pub table: ResultTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub partition: String,
    #[serde(flatten)]
    pub stats: StatsSummary,
    pub avg_ctr: String,
    pub avg_weng_rate: String,
}

impl OverallStats {
    /// Summary of a single partition.
    pub fn partition(&self, partition: Partition) -> Option<&PartitionSummary> {
        self.partitions.iter().find(|p| p.partition == partition.label())
    }
}

/// Coerce, partition and aggregate a raw post table.
pub fn compute_overall_stats(table: &RawTable) -> Result<OverallStats> {
    let records = to_records(table)?;

    for (channel, count) in unknown_channels(&records) {
        warn!(
            "{} post(s) with unrecognized channel '{}' count only towards Overall",
            count, channel
        );
    }

    let summaries = summarize_partitions(&records);
    let result_table = build_result_table(&summaries);

    let partitions = summaries
        .into_iter()
        .map(|(partition, stats)| PartitionSummary {
            partition: partition.label().to_string(),
            avg_ctr: format_rate(stats.ctr),
            avg_weng_rate: format_rate(stats.weng_rate),
            stats,
        })
        .collect();

    Ok(OverallStats {
        generated_at: Utc::now(),
        total_rows: records.len(),
        partitions,
        table: result_table,
    })
}

/// Render already computed statistics as a table visualization.
pub fn render_overall_stats(stats: &OverallStats, style: &TableStyle) -> Result<Visualization> {
    let img = render_table_png(&stats.table, style)?;
    info!("Rendered '{}' ({} bytes)", OVERALL_TITLE, img.len());

    Ok(Visualization {
        title: OVERALL_TITLE.to_string(),
        img,
        chart_type: ChartType::Table,
    })
}

/// Compute per-channel statistics for a post table and render them as a
/// styled PNG table.
///
/// The input table is only read. Fails if a required column is missing.
pub fn overall_stats_table(table: &RawTable, style: &TableStyle) -> Result<Visualization> {
    let stats = compute_overall_stats(table)?;
    render_overall_stats(&stats, style)
}

/// Serialize the statistics as pretty JSON.
pub fn generate_json_summary(stats: &OverallStats) -> Result<String> {
    serde_json::to_string_pretty(stats).map_err(Into::into)
}

/// Render the statistics as a Markdown document.
pub fn generate_markdown_summary(stats: &OverallStats, orientation: Orientation) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", OVERALL_TITLE));
    output.push_str(&format!(
        "- **Generated:** {}\n",
        stats.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Posts:** {}\n\n", stats.total_rows));

    let grid = Grid::from_table(&stats.table, orientation);
    output.push_str(&format!("| {} |\n", grid.header.join(" | ")));
    output.push_str(&format!(
        "|:---|{}\n",
        ":---:|".repeat(grid.header.len().saturating_sub(1))
    ));
    for row in &grid.rows {
        output.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::ingest::columns;
    use crate::models::{Cell, Channel, Metric};

    fn headers() -> Vec<String> {
        let mut headers = vec![columns::CHANNEL.to_string()];
        headers.extend(columns::METRICS.iter().map(|c| c.to_string()));
        headers
    }

    fn row(cells: [&str; 7]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_table() -> RawTable {
        // Channel, FB impressions, LI impressions, TW impressions, clicks, ENG, wENG
        RawTable::new(
            headers(),
            vec![
                row(["Facebook", "100", "", "", "10", "20", "5"]),
                row(["Twitter", "", "", "200", "20", "40", "10"]),
            ],
        )
    }

    fn fast_style() -> TableStyle {
        TableStyle {
            dpi: 72.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_overall_stats_table_returns_png_visualization() {
        let table = sample_table();
        let viz = overall_stats_table(&table, &fast_style()).unwrap();

        assert_eq!(viz.title, "Overall Statistics");
        assert_eq!(viz.chart_type, ChartType::Table);
        assert!(viz.img.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
    }

    #[test]
    fn test_compute_overall_stats() {
        let stats = compute_overall_stats(&sample_table()).unwrap();

        assert_eq!(stats.total_rows, 2);
        let overall = stats.partition(Partition::Overall).unwrap();
        assert_eq!(overall.stats.total_posts, 2);
        assert_eq!(overall.avg_ctr, "10.0%");
        assert_eq!(overall.avg_weng_rate, "5.0%");

        let linkedin = stats.partition(Partition::Channel(Channel::Linkedin)).unwrap();
        assert_eq!(linkedin.stats.total_posts, 0);
        assert_eq!(linkedin.avg_ctr, "0%");
    }

    #[test]
    fn test_bad_cells_do_not_fail() {
        let table = RawTable::new(
            headers(),
            vec![
                row(["Facebook", "10", "", "", "1", "10", ""]),
                row(["Facebook", "bad", "", "", "x", "bad", ""]),
                row(["Facebook", "5", "", "", "1", "5", ""]),
            ],
        );
        let stats = compute_overall_stats(&table).unwrap();
        assert_eq!(
            stats.table.cell(Metric::TotalImpressions, Partition::Overall),
            Some(&Cell::Int(15))
        );
        assert_eq!(
            stats.table.cell(Metric::TotalEngagements, Partition::Overall),
            Some(&Cell::Int(15))
        );
    }

    #[test]
    fn test_empty_table_still_renders() {
        let table = RawTable::new(headers(), Vec::new());
        let stats = compute_overall_stats(&table).unwrap();

        for partition in &stats.partitions {
            assert_eq!(partition.stats.total_posts, 0);
            assert_eq!(partition.avg_ctr, "0%");
            assert_eq!(partition.avg_weng_rate, "0%");
        }

        let viz = render_overall_stats(&stats, &fast_style()).unwrap();
        assert!(!viz.img.is_empty());
        assert_eq!(&viz.img[1..4], b"PNG");
    }

    #[test]
    fn test_missing_column_propagates() {
        let mut headers = headers();
        headers.retain(|h| h != columns::WEIGHTED_ENGAGEMENTS);
        let table = RawTable::new(headers, Vec::new());

        let err = overall_stats_table(&table, &fast_style()).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn { ref column } if column == "wENG"));
        assert!(err.to_string().contains("wENG"));
    }

    #[test]
    fn test_generate_json_summary() {
        let stats = compute_overall_stats(&sample_table()).unwrap();
        let json = generate_json_summary(&stats).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_rows"], 2);
        assert_eq!(value["partitions"][3]["partition"], "Overall");
        assert_eq!(value["partitions"][3]["total_impressions"], 300.0);
        assert_eq!(value["partitions"][3]["avg_ctr"], "10.0%");
        assert_eq!(value["partitions"][2]["ctr"], serde_json::Value::Null);
    }

    #[test]
    fn test_generate_markdown_summary() {
        let stats = compute_overall_stats(&sample_table()).unwrap();
        let markdown = generate_markdown_summary(&stats, Orientation::MetricsByRow);

        assert!(markdown.contains("# Overall Statistics"));
        assert!(markdown.contains("| Platform/Metric | Facebook | Twitter | Linkedin | Overall |"));
        assert!(markdown.contains("|:---|:---:|:---:|:---:|:---:|"));
        assert!(markdown.contains("| Total Impressions | 100 | 200 | 0 | 300 |"));
        assert!(markdown.contains("| Avg CTR | 10.0% | 10.0% | 0% | 10.0% |"));
    }
}
