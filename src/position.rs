use opencv::core::{Point, Vector};
use opencv::imgproc;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Reported when no single qualifying contour was found.
pub const NOT_FOUND: Position = Position { x: -1, y: -1 };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
	pub x: i32,
	pub y: i32,
}

impl Position {
	pub fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}

	pub fn is_found(&self) -> bool {
		*self != NOT_FOUND
	}
}

impl Default for Position {
	fn default() -> Self {
		NOT_FOUND
	}
}

/// Centroid (rounded to the nearest pixel) and area of a contour, from its spatial moments.
///
/// Returns `None` for a degenerate contour that encloses no area.
pub fn get_moment(cnt: &Vector<Point>) -> Result<Option<(Position, f64)>> {
	let moments = imgproc::moments(cnt, false)?;
	if moments.m00.abs() < f64::EPSILON {
		return Ok(None);
	}

	let x = (moments.m10 / moments.m00).round() as i32;
	let y = (moments.m01 / moments.m00).round() as i32;

	Ok(Some((Position::new(x, y), moments.m00.abs())))
}
