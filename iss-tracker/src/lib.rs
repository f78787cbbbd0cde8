///! ISS tracker
///!
///! Fetches the ISS position and the people in space, decides whether the
///! station is over water or land, and renders an annotated image.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod module;
pub mod pipeline;

pub use error::{TrackerError, TrackerResult};
pub use pipeline::Pipeline;
