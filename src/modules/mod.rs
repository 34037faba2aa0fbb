pub mod input;
pub mod threshold;
pub mod filter;
pub mod output;

use opencv::core::*;

use crate::deadzone::ZoneColor;
use crate::Result;

/// A contour candidate produced by a threshold module.
#[derive(Clone, Debug)]
pub struct TrackingData {
	pub cnt: Vector<Point>,
	pub area: f64,
	pub bounding: Rect,
}

/// What the location output is told about the tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputData {
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,
	pub middle_inc: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
	Left,
	Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorColor {
	Green,
	Red,
	Blue,
	Off,
}

impl IndicatorColor {
	pub fn rgb(&self) -> (u8, u8, u8) {
		match self {
			IndicatorColor::Green => (0, 255, 0),
			IndicatorColor::Red => (255, 0, 0),
			IndicatorColor::Blue => (0, 0, 255),
			IndicatorColor::Off => (0, 0, 0),
		}
	}

	/// Same color as an OpenCV BGR scalar, for drawing.
	pub fn scalar(&self) -> Scalar {
		let (r, g, b) = self.rgb();
		Scalar::new(b as f64, g as f64, r as f64, 0.)
	}
}

impl From<ZoneColor> for IndicatorColor {
	fn from(color: ZoneColor) -> Self {
		match color {
			ZoneColor::InZone => IndicatorColor::Green,
			ZoneColor::OutOfZone => IndicatorColor::Blue,
			ZoneColor::NotFound => IndicatorColor::Red,
		}
	}
}

pub trait InputModule {
	fn is_open(&self) -> bool;
	fn run(&mut self) -> Result<Mat>;
	fn close(&mut self) -> Result<()>;
}

pub trait ThresholdModule {
	/// At most `count` contours, largest area first.
	fn run(&mut self, frame: &Mat, count: usize) -> Result<Vec<TrackingData>>;
}

pub trait FilterModule {
	fn run(&mut self, object: &TrackingData) -> bool;
}

pub trait IndicatorModule {
	fn set_axis(&mut self, axis: Axis, color: IndicatorColor) -> Result<()>;
	fn clear_all(&mut self) -> Result<()>;
}

pub trait OutputModule {
	fn run(&mut self, data: OutputData);
}

pub trait ImageModule {
	fn announce_dimensions(&mut self, width: i32, height: i32) -> Result<()>;
	fn serve_frame(&mut self, frame: &Mat) -> Result<()>;
}

pub trait DisplayModule {
	/// Returns `TrackerError::StopRequested` when the viewer asks to quit.
	fn show(&mut self, frame: &Mat) -> Result<()>;
	fn close(&mut self) -> Result<()>;
}
