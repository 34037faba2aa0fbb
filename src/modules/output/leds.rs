use crate::modules::{Axis, IndicatorColor, IndicatorModule};
use crate::Result;

use log::warn;

/// Used when LEDs are disabled or unavailable.
pub struct NoLeds;

impl IndicatorModule for NoLeds {
	fn set_axis(&mut self, _axis: Axis, _color: IndicatorColor) -> Result<()> {
		Ok(())
	}

	fn clear_all(&mut self) -> Result<()> {
		Ok(())
	}
}

#[cfg(feature = "leds")]
pub use blinkt_leds::BlinktLeds;

#[cfg(feature = "leds")]
mod blinkt_leds {
	use super::*;
	use crate::TrackerError;

	use blinkt::Blinkt;

	use std::ops::Range;

	const BRIGHTNESS: f32 = 0.1;
	const LEFT: Range<usize> = 0..4;
	const RIGHT: Range<usize> = 4..8;

	/// Pimoroni Blinkt strip: the left four pixels show the x axis, the right four the y axis.
	pub struct BlinktLeds {
		blinkt: Blinkt,
	}

	impl BlinktLeds {
		pub fn new() -> Result<Self> {
			let mut blinkt = Blinkt::new().map_err(|e| TrackerError::Indicator(e.to_string()))?;
			blinkt.set_clear_on_drop(true);
			blinkt.set_all_pixels_brightness(BRIGHTNESS);
			Ok(Self { blinkt })
		}
	}

	impl IndicatorModule for BlinktLeds {
		fn set_axis(&mut self, axis: Axis, color: IndicatorColor) -> Result<()> {
			let (r, g, b) = color.rgb();
			let pixels = match axis {
				Axis::Left => LEFT,
				Axis::Right => RIGHT,
			};
			for pixel in pixels {
				self.blinkt.set_pixel(pixel, r, g, b);
			}
			self.blinkt.show().map_err(|e| TrackerError::Indicator(e.to_string()))
		}

		fn clear_all(&mut self) -> Result<()> {
			self.blinkt.clear();
			self.blinkt.show().map_err(|e| TrackerError::Indicator(e.to_string()))
		}
	}
}

/// LEDs when requested and supported by this build, otherwise `NoLeds`.
pub fn indicator_module(enabled: bool) -> Box<dyn IndicatorModule> {
	if !enabled {
		return Box::new(NoLeds);
	}

	#[cfg(feature = "leds")]
	{
		match BlinktLeds::new() {
			Ok(leds) => return Box::new(leds),
			Err(e) => warn!("Unable to open Blinkt LEDs, continuing without them: {}", e),
		}
	}
	#[cfg(not(feature = "leds"))]
	warn!("LEDs requested but this build has no LED support (enable the \"leds\" feature)");

	Box::new(NoLeds)
}
