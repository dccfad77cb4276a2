//! Output layout, combined report and cross-model comparison.

pub mod combined;
pub mod comparison;
pub mod layout;

pub use combined::render_combined_report;
pub use comparison::{ComparisonRow, ComparisonSummary, ModelRunState, RunLinks};
pub use layout::{RunLayout, comparison_summary_path, date_stamp, parse_run_dir_name};
