//! Hook pipeline
//!
//! Decides, for each observed mouse-move event, whether to let it through or
//! to replace it with a percentage-preserving position on the destination
//! monitor.

mod pipeline;

pub use pipeline::{CrossingPipeline, Disposition};
