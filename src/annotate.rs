//! Debug markup drawn onto frames before they are displayed and served.

use opencv::core::*;
use opencv::imgproc;

use crate::deadzone::DeadZoneResult;
use crate::modules::{IndicatorColor, TrackingData};
use crate::position::Position;
use crate::Result;

const TEXT_LOC: (i32, i32) = (10, 25);
const TEXT_SIZE: f64 = 0.5;

/// Bounding box, contour outline and centroid of the tracked object.
pub fn draw_target(frame: &mut Mat, target: &TrackingData, centroid: Position) -> Result<()> {
	imgproc::rectangle(frame, target.bounding, IndicatorColor::Blue.scalar(), 2, imgproc::LINE_8, 0)?;

	let mut cnts = Vector::<Vector<Point>>::new();
	cnts.push(target.cnt.clone());
	imgproc::draw_contours(
		frame,
		&cnts,
		-1,
		IndicatorColor::Green.scalar(),
		2,
		imgproc::LINE_8,
		&no_array(),
		i32::MAX,
		Point::new(0, 0),
	)?;

	imgproc::circle(
		frame,
		Point::new(centroid.x, centroid.y),
		4,
		IndicatorColor::Red.scalar(),
		imgproc::FILLED,
		imgproc::LINE_8,
		0,
	)?;
	Ok(())
}

/// Dead zone boundaries, each axis in its indicator color.
pub fn draw_zone(frame: &mut Mat, zone: &DeadZoneResult, width: i32, height: i32) -> Result<()> {
	let x_color = IndicatorColor::from(zone.x.color).scalar();
	let y_color = IndicatorColor::from(zone.y.color).scalar();

	for x in [zone.x.lower(), zone.x.upper()] {
		imgproc::line(frame, Point::new(x, 0), Point::new(x, height), x_color, 1, imgproc::LINE_8, 0)?;
	}
	for y in [zone.y.lower(), zone.y.upper()] {
		imgproc::line(frame, Point::new(0, y), Point::new(width, y), y_color, 1, imgproc::LINE_8, 0)?;
	}
	Ok(())
}

pub fn draw_text(frame: &mut Mat, text: &str) -> Result<()> {
	imgproc::put_text(
		frame,
		text,
		Point::new(TEXT_LOC.0, TEXT_LOC.1),
		imgproc::FONT_HERSHEY_SIMPLEX,
		TEXT_SIZE,
		IndicatorColor::Red.scalar(),
		1,
		imgproc::LINE_8,
		false,
	)?;
	Ok(())
}
