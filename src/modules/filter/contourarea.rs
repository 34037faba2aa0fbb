use crate::modules::FilterModule;
use crate::modules::TrackingData;

/// Rejects contours smaller than a minimum pixel area.
pub struct ContourArea {
	min: f64,
}

impl FilterModule for ContourArea {
	fn run(&mut self, object: &TrackingData) -> bool {
		object.area >= self.min
	}
}

impl ContourArea {
	pub fn new(min: f64) -> Self {
		Self { min }
	}
}
