//! Report generation.
//!
//! Rendering of the statistics table and its textual summaries.

pub mod generator;
pub mod renderer;
pub mod style;

pub use generator::*;
pub use style::{Color, Orientation, Parity, RowRule, TableStyle};
