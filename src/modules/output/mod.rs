pub mod display;
pub mod image;
pub mod leds;
pub mod location;

pub use display::HighGuiDisplay;
pub use image::ImageServer;
pub use leds::NoLeds;
pub use location::{Location, LocationServer};
