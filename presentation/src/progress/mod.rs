//! Progress observers for the pipeline

pub mod reporter;
