use crate::modules::filter::ContourArea;
use crate::modules::{FilterModule, ThresholdModule, TrackingData};
use crate::settings::ThresholdSettings;
use crate::Result;

use opencv::core::*;
use opencv::imgproc;
use opencv::prelude::*;

use itertools::Itertools;

use std::cmp::Ordering;

/// Finds contours whose hue lies within a range around a target BGR color.
pub struct SimpleColor {
	color_l: [u8; 3],
	color_u: [u8; 3],
	filters: Vec<Box<dyn FilterModule>>,
}

impl ThresholdModule for SimpleColor {
	fn run(&mut self, frame: &Mat, count: usize) -> Result<Vec<TrackingData>> {
		let mut hsv = Mat::default();
		imgproc::cvt_color_def(frame, &mut hsv, imgproc::COLOR_BGR2HSV)?;

		let mut mask = Mat::default();
		in_range(&hsv, &to_scalar(self.color_l), &to_scalar(self.color_u), &mut mask)?;

		let mut cnts = Vector::<Vector<Point>>::new();
		imgproc::find_contours(&mask, &mut cnts, imgproc::RETR_EXTERNAL, imgproc::CHAIN_APPROX_SIMPLE, Point::new(0, 0))?;

		let mut tracked_objects = Vec::<TrackingData>::with_capacity(cnts.len());
		for cnt in cnts.iter() {
			let area = imgproc::contour_area(&cnt, false)?;
			let bounding = imgproc::bounding_rect(&cnt)?;
			tracked_objects.push(TrackingData {
				cnt,
				area,
				bounding,
			});
		}

		for module in self.filters.iter_mut() {
			tracked_objects.retain(|obj| module.run(obj));
		}

		Ok(tracked_objects
			.into_iter()
			.sorted_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal))
			.take(count)
			.collect())
	}
}

impl SimpleColor {
	pub fn new(settings: &ThresholdSettings) -> Result<Self> {
		let (color_l, color_u) = hsv_range(settings.bgr, settings.hsv_range)?;
		Ok(Self {
			color_l,
			color_u,
			filters: vec![Box::new(ContourArea::new(settings.minimum))],
		})
	}
}

/// HSV bounds for a BGR color: hue within `range` of the color's hue, saturation and value at least 100.
pub fn hsv_range(bgr: [u8; 3], range: u8) -> Result<([u8; 3], [u8; 3])> {
	let pixel = Mat::new_rows_cols_with_default(1, 1, CV_8UC3, to_scalar(bgr))?;
	let mut hsv = Mat::default();
	imgproc::cvt_color_def(&pixel, &mut hsv, imgproc::COLOR_BGR2HSV)?;
	let hue = hsv.at_2d::<Vec3b>(0, 0)?.0[0];

	// OpenCV hue for 8-bit images is 0..=179
	let lower = hue.saturating_sub(range);
	let upper = hue.saturating_add(range).min(179);

	Ok(([lower, 100, 100], [upper, 255, 255]))
}

fn to_scalar(color: [u8; 3]) -> Scalar {
	Scalar::new(color[0] as f64, color[1] as f64, color[2] as f64, 0.)
}
