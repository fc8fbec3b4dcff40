//! Controller access
//!
//! The logger never speaks a wire protocol itself; it reads tags through the
//! [`TagSource`] capability. A simulated controller is provided for running
//! without hardware.

mod error;
mod simulated;

pub use error::SourceError;
pub use simulated::{SimulatedController, SIMULATED_TAGS};

use std::future::Future;

use crate::tag::TagValue;

/// Something that can read a named tag from a controller.
///
/// `Ok(None)` means the controller answered but returned no value.
pub trait TagSource: Send {
    /// Read the current value of `tag_name`
    fn read(
        &mut self,
        tag_name: &str,
    ) -> impl Future<Output = Result<Option<TagValue>, SourceError>> + Send;
}
