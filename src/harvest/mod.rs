//! Harvest module - the directory-to-harvest gather pipeline.
//!
//! - **Pipeline**: sequential stages via [`pipeline::GatherPipeline`]
//! - **Stats**: per-run counters via [`HarvestStats`]

pub mod pipeline;

pub use pipeline::{build_harvest, GatherPipeline, GatherResult, HarvestStats};
