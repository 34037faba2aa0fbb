use crate::annotate;
use crate::deadzone;
use crate::modules::{Axis, OutputData, ThresholdModule};
use crate::position::{get_moment, Position, NOT_FOUND};
use crate::settings::TrackingSettings;
use crate::tracker::{FrameProcessor, Outputs, TrackerState};
use crate::Result;

use opencv::core::*;
use opencv::prelude::*;

/// Tracks the single largest contour of the target color.
pub struct SingleObjectProcessor {
	finder: Box<dyn ThresholdModule>,
	percent: u8,
	markup: bool,
}

impl SingleObjectProcessor {
	pub fn new(finder: Box<dyn ThresholdModule>, settings: &TrackingSettings) -> Self {
		Self {
			finder,
			percent: settings.percent,
			markup: settings.markup,
		}
	}
}

impl FrameProcessor for SingleObjectProcessor {
	fn process(&mut self, frame: &mut Mat, state: &mut TrackerState, outputs: &mut Outputs) -> Result<()> {
		let (width, height) = (frame.cols(), frame.rows());
		let mut text = format!("#{} ({}, {}) {}%", state.frame_counter, width, height, self.percent);

		let contours = self.finder.run(frame, 1)?;

		// Anything but exactly one contour is ambiguous
		let mut position = NOT_FOUND;
		if let [target] = contours.as_slice() {
			if let Some((centroid, area)) = get_moment(&target.cnt)? {
				position = centroid;
				if self.markup {
					annotate::draw_target(frame, target, centroid)?;
					text += &describe_target(centroid, area);
				}
			}
		}

		let zone = deadzone::classify(position, width, height, self.percent);

		outputs.indicators.set_axis(Axis::Left, zone.x.color.into())?;
		outputs.indicators.set_axis(Axis::Right, zone.y.color.into())?;

		if position != state.previous_position {
			outputs.location.run(OutputData {
				x: position.x,
				y: position.y,
				width,
				height,
				middle_inc: zone.x.middle_inc,
			});
			state.previous_position = position;
		}

		if self.markup {
			annotate::draw_zone(frame, &zone, width, height)?;
			annotate::draw_text(frame, &text)?;
		}
		Ok(())
	}
}

fn describe_target(centroid: Position, area: f64) -> String {
	format!(" ({}, {}) {:.1}", centroid.x, centroid.y, area)
}
