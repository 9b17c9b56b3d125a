//! Data models for post statistics.
//!
//! This module contains the core data structures shared by ingestion,
//! aggregation and rendering: channels, typed post records, per-partition
//! summaries and the assembled result grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Publishing channel a post belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Facebook,
    Twitter,
    Linkedin,
}

impl Channel {
    /// Channels in grid column order.
    pub const ALL: [Channel; 3] = [Channel::Facebook, Channel::Twitter, Channel::Linkedin];

    /// The exact value of the `Channel` column for this channel.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Facebook => "Facebook",
            Channel::Twitter => "Twitter",
            Channel::Linkedin => "Linkedin",
        }
    }

    /// Exact, case-sensitive match against the channel label.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == value)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single post after numeric coercion.
///
/// Metric fields are `None` when the source cell was empty or could not be
/// parsed as a number. Missing values are skipped by every sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Raw channel value, kept verbatim so unknown channels still count
    /// towards the overall partition.
    pub channel: String,
    pub facebook_impressions: Option<f64>,
    pub linkedin_impressions: Option<f64>,
    pub twitter_impressions: Option<f64>,
    pub link_clicks: Option<f64>,
    pub engagements: Option<f64>,
    pub weighted_engagements: Option<f64>,
}

impl PostRecord {
    /// The channel this post was published on, if it is a known one.
    pub fn channel(&self) -> Option<Channel> {
        Channel::from_label(&self.channel)
    }

    /// Impressions of this post summed over all three platform columns.
    ///
    /// The platform column is not selected by `channel`: a Twitter post with
    /// a Facebook impression value contributes that value too.
    pub fn impressions(&self) -> f64 {
        [
            self.facebook_impressions,
            self.linkedin_impressions,
            self.twitter_impressions,
        ]
        .into_iter()
        .flatten()
        .sum()
    }
}

/// Subset of posts a summary is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Channel(Channel),
    Overall,
}

impl Partition {
    /// Partitions in grid column order.
    pub const ALL: [Partition; 4] = [
        Partition::Channel(Channel::Facebook),
        Partition::Channel(Channel::Twitter),
        Partition::Channel(Channel::Linkedin),
        Partition::Overall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Partition::Channel(channel) => channel.label(),
            Partition::Overall => "Overall",
        }
    }

    /// Whether a post belongs to this partition.
    pub fn contains(&self, record: &PostRecord) -> bool {
        match self {
            Partition::Channel(channel) => record.channel == channel.label(),
            Partition::Overall => true,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Summary statistics for one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_posts: usize,
    pub total_impressions: f64,
    pub total_engagements: f64,
    pub total_weighted_engagements: f64,
    pub total_link_clicks: f64,
    /// Link clicks per impression. `None` when the partition has no impressions.
    pub ctr: Option<f64>,
    /// Weighted engagements per impression. `None` when the partition has no impressions.
    pub weng_rate: Option<f64>,
}

/// Row labels of the result grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    TotalPosts,
    TotalImpressions,
    TotalEngagements,
    TotalWeightedEngagements,
    TotalLinkClicks,
    AvgCtr,
    AvgWengRate,
}

impl Metric {
    /// Metrics in grid row order.
    pub const ALL: [Metric; 7] = [
        Metric::TotalPosts,
        Metric::TotalImpressions,
        Metric::TotalEngagements,
        Metric::TotalWeightedEngagements,
        Metric::TotalLinkClicks,
        Metric::AvgCtr,
        Metric::AvgWengRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalPosts => "Total Posts",
            Metric::TotalImpressions => "Total Impressions",
            Metric::TotalEngagements => "Total Engagements",
            Metric::TotalWeightedEngagements => "Total Weighted Engagements",
            Metric::TotalLinkClicks => "Total Link Clicks",
            Metric::AvgCtr => "Avg CTR",
            Metric::AvgWengRate => "Avg wEng Rate",
        }
    }

    /// Whether the metric is a count/sum that gets cast to an integer.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Metric::AvgCtr | Metric::AvgWengRate)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single value in the result grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    /// A sum whose integer cast failed and was left as-is.
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", format_float(*v)),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Formats a float the way a numeric literal is usually read back:
/// whole numbers keep a trailing `.0`, everything else uses the shortest
/// round-trip representation. Magnitudes from `1e16` up, or below `1e-4`,
/// switch to exponent form with a signed two-digit exponent (`1e+20`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// One metric across every partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub metric: Metric,
    /// One cell per partition, in [`Partition::ALL`] order.
    pub cells: Vec<Cell>,
}

/// The metric × partition grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<Partition>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Look up a single cell.
    pub fn cell(&self, metric: Metric, partition: Partition) -> Option<&Cell> {
        let col = self.columns.iter().position(|p| *p == partition)?;
        self.rows
            .iter()
            .find(|r| r.metric == metric)
            .and_then(|r| r.cells.get(col))
    }

    /// Column labels, in grid order.
    pub fn column_labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(Partition::label).collect()
    }
}

/// Kind of visualization a report entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Table,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartType::Table => write!(f, "table"),
        }
    }
}

/// A rendered report entry, ready to be collected into a larger report.
#[derive(Debug, Clone)]
pub struct Visualization {
    pub title: String,
    /// PNG-encoded image.
    pub img: Vec<u8>,
    pub chart_type: ChartType,
}

impl Visualization {
    /// A reader positioned at the start of the image buffer.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.img.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_channel_from_label_is_exact() {
        assert_eq!(Channel::from_label("Facebook"), Some(Channel::Facebook));
        assert_eq!(Channel::from_label("Linkedin"), Some(Channel::Linkedin));
        assert_eq!(Channel::from_label("facebook"), None);
        assert_eq!(Channel::from_label("LinkedIn"), None);
        assert_eq!(Channel::from_label(" Twitter"), None);
    }

    #[test]
    fn test_impressions_sum_all_platform_columns() {
        let record = PostRecord {
            channel: "Twitter".to_string(),
            facebook_impressions: Some(7.0),
            twitter_impressions: Some(100.0),
            linkedin_impressions: None,
            ..Default::default()
        };
        assert_eq!(record.impressions(), 107.0);
        assert_eq!(record.channel(), Some(Channel::Twitter));
    }

    #[test]
    fn test_partition_order_and_membership() {
        let labels: Vec<_> = Partition::ALL.iter().map(Partition::label).collect();
        assert_eq!(labels, vec!["Facebook", "Twitter", "Linkedin", "Overall"]);

        let record = PostRecord {
            channel: "Instagram".to_string(),
            ..Default::default()
        };
        assert!(Partition::Overall.contains(&record));
        assert!(!Partition::Channel(Channel::Facebook).contains(&record));
    }

    #[test]
    fn test_metric_numeric_flags() {
        let numeric: Vec<_> = Metric::ALL.iter().filter(|m| m.is_numeric()).collect();
        assert_eq!(numeric.len(), 5);
        assert!(!Metric::AvgCtr.is_numeric());
        assert_eq!(Metric::AvgWengRate.label(), "Avg wEng Rate");
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Int(300).to_string(), "300");
        assert_eq!(Cell::Float(300.0).to_string(), "300.0");
        assert_eq!(Cell::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(Cell::Float(2.5).to_string(), "2.5");
        assert_eq!(Cell::Text("10.0%".to_string()).to_string(), "10.0%");
    }

    #[test]
    fn test_format_float_exponent_form() {
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(-2.5e17), "-2.5e+17");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn test_visualization_reader_starts_at_beginning() {
        let viz = Visualization {
            title: "Overall Statistics".to_string(),
            img: vec![1, 2, 3],
            chart_type: ChartType::Table,
        };
        let mut buf = Vec::new();
        viz.reader().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
        assert_eq!(viz.chart_type.to_string(), "table");
    }
}
