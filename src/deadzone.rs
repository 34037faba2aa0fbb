//! Classifies a tracked position against the band around the frame center.

use crate::position::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneColor {
	InZone,
	OutOfZone,
	NotFound,
}

/// Classification along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisZone {
	pub in_middle: bool,
	pub color: ZoneColor,
	pub center: i32,
	pub middle_inc: i32,
}

impl AxisZone {
	pub fn lower(&self) -> i32 {
		self.center - self.middle_inc
	}

	pub fn upper(&self) -> i32 {
		self.center + self.middle_inc
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadZoneResult {
	pub x: AxisZone,
	pub y: AxisZone,
}

/// Half width of the dead zone for a frame extent: `floor((extent / 2) * (percent / 100) / 2)`.
pub fn middle_inc(extent: i32, percent: u8) -> i32 {
	let half = (extent / 2) as f64;
	(half * (percent as f64 / 100.) / 2.).floor() as i32
}

fn classify_axis(coord: i32, extent: i32, percent: u8) -> AxisZone {
	let center = extent / 2;
	let middle_inc = middle_inc(extent, percent);
	let in_middle = center - middle_inc <= coord && coord <= center + middle_inc;

	let color = if coord < 0 {
		ZoneColor::NotFound
	} else if in_middle {
		ZoneColor::InZone
	} else {
		ZoneColor::OutOfZone
	};

	AxisZone {
		in_middle,
		color,
		center,
		middle_inc,
	}
}

pub fn classify(position: Position, width: i32, height: i32, percent: u8) -> DeadZoneResult {
	DeadZoneResult {
		x: classify_axis(position.x, width, percent),
		y: classify_axis(position.y, height, percent),
	}
}
