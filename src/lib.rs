pub mod annotate;
pub mod deadzone;
pub mod error;
pub mod location_client;
pub mod modules;
pub mod position;
pub mod settings;
pub mod single_object;
pub mod tracker;

pub use error::{Result, TrackerError};
