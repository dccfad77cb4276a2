//! Application-level configuration.
//!
//! Types that control how use cases behave, independent of where the values
//! come from (config file, environment, command line).

mod pipeline_params;

pub use pipeline_params::{PipelineParams, RetryPolicy};
