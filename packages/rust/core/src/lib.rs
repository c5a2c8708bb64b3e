//! Run orchestration for leafdex.
//!
//! This crate ties together discovery, scheduled item extraction, result
//! aggregation, and persistence into one end-to-end [`run`].

pub mod aggregator;
pub mod persist;
pub mod pipeline;
pub mod progress;

pub use aggregator::ResultAggregator;
pub use leafdex_crawler::{ProgressSnapshot, SectionFailure};
pub use persist::{JsonFileWriter, ResultWriter};
pub use pipeline::run;
pub use progress::{ProgressSink, SilentProgress};
