//! Service layer for docpipe business logic.
//!
//! Services are independent of the CLI and can be driven by any trigger.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineConfig};
