//! Postats - per-channel statistics for social media posts
//!
//! Loads a table of posts, aggregates impressions, engagements and link
//! clicks per channel and renders the result as a styled PNG table.
//!
//! ```no_run
//! use postats::{ingest::RawTable, report::{overall_stats_table, TableStyle}};
//!
//! # fn main() -> postats::Result<()> {
//! let table = RawTable::from_csv_reader(std::fs::File::open("posts.csv")?)?;
//! let viz = overall_stats_table(&table, &TableStyle::default())?;
//! std::fs::write("overall_stats.png", &viz.img)?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;

pub use error::{Result, StatsError};
