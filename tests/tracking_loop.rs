use ferrotrack::deadzone::classify;
use ferrotrack::modules::{
	Axis, DisplayModule, ImageModule, IndicatorColor, IndicatorModule, InputModule, OutputData, OutputModule,
	ThresholdModule, TrackingData,
};
use ferrotrack::position::{Position, NOT_FOUND};
use ferrotrack::settings::TrackingSettings;
use ferrotrack::single_object::SingleObjectProcessor;
use ferrotrack::tracker::{FrameProcessor, Outputs, RunState, Tracker, TrackerState};
use ferrotrack::{Result, TrackerError};

use opencv::core::*;
use opencv::imgproc;
use opencv::prelude::*;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Record {
	reads: usize,
	closes: usize,
	clears: usize,
	indicators: Vec<(Axis, IndicatorColor)>,
	locations: Vec<OutputData>,
	announced: Vec<(i32, i32)>,
	served: usize,
	shown: usize,
	display_closed: bool,
	events: Vec<&'static str>,
	stop: Option<Arc<AtomicBool>>,
}

type Shared = Rc<RefCell<Record>>;

struct FakeCamera {
	frames: VecDeque<Mat>,
	record: Shared,
	stop_after: Option<usize>,
	fail_close: bool,
}

impl InputModule for FakeCamera {
	fn is_open(&self) -> bool {
		!self.frames.is_empty()
	}

	fn run(&mut self) -> Result<Mat> {
		let mut record = self.record.borrow_mut();
		record.reads += 1;
		if Some(record.reads) == self.stop_after {
			if let Some(stop) = &record.stop {
				stop.store(true, Ordering::SeqCst);
			}
		}
		self.frames
			.pop_front()
			.ok_or_else(|| TrackerError::Capture(String::from("no frames left")))
	}

	fn close(&mut self) -> Result<()> {
		let mut record = self.record.borrow_mut();
		record.closes += 1;
		record.events.push("close");
		if self.fail_close {
			return Err(TrackerError::Capture(String::from("close failed")));
		}
		Ok(())
	}
}

/// Returns a scripted list of contours per frame.
struct ScriptedFinder {
	script: VecDeque<Result<Vec<TrackingData>>>,
}

impl ThresholdModule for ScriptedFinder {
	fn run(&mut self, _frame: &Mat, count: usize) -> Result<Vec<TrackingData>> {
		assert_eq!(count, 1);
		self.script.pop_front().unwrap_or_else(|| Ok(vec![]))
	}
}

struct FakeLeds {
	record: Shared,
	fail_clear: bool,
	fail_first_set: bool,
}

impl IndicatorModule for FakeLeds {
	fn set_axis(&mut self, axis: Axis, color: IndicatorColor) -> Result<()> {
		if self.fail_first_set {
			self.fail_first_set = false;
			return Err(TrackerError::Indicator(String::from("set failed")));
		}
		self.record.borrow_mut().indicators.push((axis, color));
		Ok(())
	}

	fn clear_all(&mut self) -> Result<()> {
		let mut record = self.record.borrow_mut();
		record.clears += 1;
		record.events.push("clear");
		if self.fail_clear {
			return Err(TrackerError::Indicator(String::from("clear failed")));
		}
		Ok(())
	}
}

struct FakeLocation(Shared);

impl OutputModule for FakeLocation {
	fn run(&mut self, data: OutputData) {
		self.0.borrow_mut().locations.push(data);
	}
}

struct FakeImages(Shared);

impl ImageModule for FakeImages {
	fn announce_dimensions(&mut self, width: i32, height: i32) -> Result<()> {
		self.0.borrow_mut().announced.push((width, height));
		Ok(())
	}

	fn serve_frame(&mut self, _frame: &Mat) -> Result<()> {
		self.0.borrow_mut().served += 1;
		Ok(())
	}
}

struct QuittingDisplay {
	record: Shared,
	quit_on: usize,
}

impl DisplayModule for QuittingDisplay {
	fn show(&mut self, _frame: &Mat) -> Result<()> {
		let mut record = self.record.borrow_mut();
		record.shown += 1;
		if record.shown == self.quit_on {
			return Err(TrackerError::StopRequested);
		}
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		self.record.borrow_mut().display_closed = true;
		Ok(())
	}
}

fn frame(width: i32, height: i32) -> Mat {
	Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.)).unwrap()
}

fn frames(count: usize) -> VecDeque<Mat> {
	(0..count).map(|_| frame(640, 480)).collect()
}

fn contour_at(x: i32, y: i32) -> TrackingData {
	let cnt = Vector::from_slice(&[
		Point::new(x - 2, y - 2),
		Point::new(x + 2, y - 2),
		Point::new(x + 2, y + 2),
		Point::new(x - 2, y + 2),
	]);
	TrackingData {
		bounding: imgproc::bounding_rect(&cnt).unwrap(),
		area: 16.,
		cnt,
	}
}

/// A contour with no area; its centroid is undefined.
fn collinear_contour() -> TrackingData {
	let cnt = Vector::from_slice(&[Point::new(10, 10), Point::new(20, 10), Point::new(30, 10)]);
	TrackingData {
		bounding: imgproc::bounding_rect(&cnt).unwrap(),
		area: 0.,
		cnt,
	}
}

fn settings() -> TrackingSettings {
	TrackingSettings {
		width: 640,
		percent: 20,
		backoff_ms: 0,
		..TrackingSettings::default()
	}
}

fn camera(record: &Shared, frames: VecDeque<Mat>) -> Box<FakeCamera> {
	Box::new(FakeCamera {
		frames,
		record: Rc::clone(record),
		stop_after: None,
		fail_close: false,
	})
}

fn outputs(record: &Shared) -> Outputs {
	Outputs {
		indicators: Box::new(FakeLeds {
			record: Rc::clone(record),
			fail_clear: false,
			fail_first_set: false,
		}),
		location: Box::new(FakeLocation(Rc::clone(record))),
		images: Box::new(FakeImages(Rc::clone(record))),
		display: None,
	}
}

fn single_object(script: Vec<Result<Vec<TrackingData>>>) -> SingleObjectProcessor {
	SingleObjectProcessor::new(
		Box::new(ScriptedFinder {
			script: script.into_iter().collect(),
		}),
		&settings(),
	)
}

#[test]
fn location_is_reported_only_on_change() {
	let record = Shared::default();
	let processor = single_object(vec![
		Ok(vec![contour_at(5, 5)]),
		Ok(vec![contour_at(5, 5)]),
		Ok(vec![contour_at(6, 5)]),
		Ok(vec![contour_at(6, 5)]),
	]);
	let mut tracker = Tracker::new(camera(&record, frames(4)), processor, outputs(&record), &settings());

	tracker.run();

	let record = record.borrow();
	let written: Vec<(i32, i32)> = record.locations.iter().map(|l| (l.x, l.y)).collect();
	assert_eq!(written, vec![(5, 5), (6, 5)]);
	assert_eq!(record.locations[0].width, 640);
	assert_eq!(record.locations[0].height, 480);
	assert_eq!(record.locations[0].middle_inc, 32);

	// Indicators and images are continuous
	assert_eq!(record.indicators.len(), 8);
	assert_eq!(record.served, 4);
	assert_eq!(tracker.state().frame_counter, 4);
	assert_eq!(tracker.state().previous_position, Position::new(6, 5));
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn losing_the_target_is_reported_once() {
	let record = Shared::default();
	let processor = single_object(vec![Ok(vec![contour_at(100, 100)]), Ok(vec![]), Ok(vec![])]);
	let mut tracker = Tracker::new(camera(&record, frames(3)), processor, outputs(&record), &settings());

	tracker.run();

	let written: Vec<(i32, i32)> = record.borrow().locations.iter().map(|l| (l.x, l.y)).collect();
	assert_eq!(written, vec![(100, 100), (-1, -1)]);
}

#[test]
fn ambiguous_contours_are_not_found() {
	let record = Shared::default();
	let processor = single_object(vec![Ok(vec![contour_at(320, 240), contour_at(100, 100)])]);
	let mut tracker = Tracker::new(camera(&record, frames(1)), processor, outputs(&record), &settings());

	tracker.run();

	let record = record.borrow();
	// Nothing changed from the initial not-found position
	assert!(record.locations.is_empty());
	assert_eq!(
		record.indicators,
		vec![(Axis::Left, IndicatorColor::Red), (Axis::Right, IndicatorColor::Red)]
	);
	assert_eq!(tracker.state().previous_position, NOT_FOUND);
}

#[test]
fn degenerate_contour_is_not_found() {
	let record = Shared::default();
	let processor = single_object(vec![Ok(vec![contour_at(100, 100)]), Ok(vec![collinear_contour()])]);
	let mut tracker = Tracker::new(camera(&record, frames(2)), processor, outputs(&record), &settings());

	tracker.run();

	let record = record.borrow();
	let written: Vec<(i32, i32)> = record.locations.iter().map(|l| (l.x, l.y)).collect();
	assert_eq!(written, vec![(100, 100), (-1, -1)]);
	assert_eq!(
		record.indicators[2..],
		[(Axis::Left, IndicatorColor::Red), (Axis::Right, IndicatorColor::Red)]
	);
	assert_eq!(tracker.state().previous_position, NOT_FOUND);
}

#[test]
fn indicators_follow_dead_zone() {
	let record = Shared::default();
	let processor = single_object(vec![Ok(vec![contour_at(320, 240)]), Ok(vec![contour_at(320, 50)])]);
	let mut tracker = Tracker::new(camera(&record, frames(2)), processor, outputs(&record), &settings());

	tracker.run();

	let zone = classify(Position::new(320, 50), 640, 480, 20);
	assert!(zone.x.in_middle && !zone.y.in_middle);
	assert_eq!(
		record.borrow().indicators,
		vec![
			(Axis::Left, IndicatorColor::Green),
			(Axis::Right, IndicatorColor::Green),
			(Axis::Left, IndicatorColor::Green),
			(Axis::Right, IndicatorColor::Blue),
		]
	);
}

#[test]
fn finder_errors_skip_only_that_frame() {
	let record = Shared::default();
	let processor = single_object(vec![
		Err(TrackerError::Capture(String::from("transient"))),
		Ok(vec![contour_at(10, 10)]),
	]);
	let mut tracker = Tracker::new(camera(&record, frames(2)), processor, outputs(&record), &settings());

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 2);
	assert_eq!(record.served, 1);
	assert_eq!(record.locations.len(), 1);
	assert_eq!(tracker.state().frame_counter, 1);
}

/// Fails while annotating the first frame.
struct FailingAnnotation {
	calls: usize,
}

impl FrameProcessor for FailingAnnotation {
	fn process(&mut self, frame: &mut Mat, _state: &mut TrackerState, _outputs: &mut Outputs) -> Result<()> {
		self.calls += 1;
		if self.calls == 1 {
			// OpenCV rejects lines with a non-positive thickness
			imgproc::line(frame, Point::new(0, 0), Point::new(10, 10), Scalar::all(255.), 0, imgproc::LINE_8, 0)?;
			return Err(TrackerError::Capture(String::from("line was not rejected")));
		}
		Ok(())
	}
}

#[test]
fn annotation_failure_does_not_stop_the_run() {
	let record = Shared::default();
	let mut tracker = Tracker::new(
		camera(&record, frames(3)),
		FailingAnnotation { calls: 0 },
		outputs(&record),
		&settings(),
	);

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 3);
	assert_eq!(record.served, 2);
	assert_eq!(record.events, vec!["clear", "close"]);
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn indicator_failure_skips_only_that_frame() {
	let record = Shared::default();
	let tracker_outputs = Outputs {
		indicators: Box::new(FakeLeds {
			record: Rc::clone(&record),
			fail_clear: false,
			fail_first_set: true,
		}),
		..outputs(&record)
	};
	let processor = single_object(vec![Ok(vec![contour_at(10, 10)]), Ok(vec![contour_at(20, 20)])]);
	let mut tracker = Tracker::new(camera(&record, frames(2)), processor, tracker_outputs, &settings());

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 2);
	assert_eq!(record.served, 1);
	let written: Vec<(i32, i32)> = record.locations.iter().map(|l| (l.x, l.y)).collect();
	assert_eq!(written, vec![(20, 20)]);
	assert_eq!(record.events, vec!["clear", "close"]);
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn stop_request_is_honoured_before_next_read() {
	let record = Shared::default();
	let input = Box::new(FakeCamera {
		frames: frames(10),
		record: Rc::clone(&record),
		stop_after: Some(2),
		fail_close: false,
	});
	let mut tracker = Tracker::new(input, single_object(vec![]), outputs(&record), &settings());
	// The camera raises the flag during its second read, as a signal handler would
	record.borrow_mut().stop = Some(tracker.stop_handle());

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 2);
	assert_eq!(record.served, 2);
	assert_eq!(record.events, vec!["clear", "close"]);
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn stop_flag_set_before_run_reads_nothing() {
	let record = Shared::default();
	let mut tracker = Tracker::new(camera(&record, frames(3)), single_object(vec![]), outputs(&record), &settings());
	tracker.stop_handle().store(true, Ordering::SeqCst);

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 0);
	assert_eq!(record.events, vec!["clear", "close"]);
}

#[test]
fn quit_key_skips_rest_of_iteration() {
	let record = Shared::default();
	let mut tracker_outputs = outputs(&record);
	tracker_outputs.display = Some(Box::new(QuittingDisplay {
		record: Rc::clone(&record),
		quit_on: 2,
	}));
	let mut tracker = Tracker::new(camera(&record, frames(5)), single_object(vec![]), tracker_outputs, &settings());

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.reads, 2);
	assert_eq!(record.shown, 2);
	assert_eq!(record.served, 1);
	assert!(record.display_closed);
	assert_eq!(tracker.state().frame_counter, 1);
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn cleanup_steps_are_independent() {
	let record = Shared::default();
	let tracker_outputs = Outputs {
		indicators: Box::new(FakeLeds {
			record: Rc::clone(&record),
			fail_clear: true,
			fail_first_set: false,
		}),
		..outputs(&record)
	};
	let input = Box::new(FakeCamera {
		frames: frames(1),
		record: Rc::clone(&record),
		stop_after: None,
		fail_close: true,
	});
	let mut tracker = Tracker::new(input, single_object(vec![]), tracker_outputs, &settings());

	tracker.run();

	let record = record.borrow();
	assert_eq!(record.events, vec!["clear", "close"]);
	assert_eq!((record.clears, record.closes), (1, 1));
	assert_eq!(tracker.state().run_state, RunState::Stopped);
}

#[test]
fn dimensions_are_announced_when_they_change() {
	let record = Shared::default();
	let frames: VecDeque<Mat> = vec![frame(1280, 960), frame(1280, 960), frame(1280, 720), frame(640, 360)]
		.into_iter()
		.collect();
	let mut tracker = Tracker::new(camera(&record, frames), single_object(vec![]), outputs(&record), &settings());

	tracker.run();

	assert_eq!(record.borrow().announced, vec![(640, 480), (640, 360)]);
}
