//! Console output for run results

pub mod console;
