//! Tag Model
//!
//! Declared data points, their typed values and the per-cycle snapshot.

mod registry;
mod values;

pub use registry::{CycleReport, Tag, TagReadFailure, TagRegistry};
pub use values::TagValue;
