//! Interactive terminal time tracker. Switch between a fixed list of tasks with single keys and
//! get per-day totals in a readable text log and a CSV export.
//!

pub mod cli;
pub mod fs;
pub mod terminal;
pub mod tracker;
pub mod utils;
