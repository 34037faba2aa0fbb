//! Tracking loop skeleton: frame acquisition, publishing, failure isolation
//! and shutdown. What happens to each frame is up to the `FrameProcessor`.

use crate::modules::{DisplayModule, ImageModule, IndicatorModule, InputModule, OutputModule};
use crate::position::{Position, NOT_FOUND};
use crate::settings::TrackingSettings;
use crate::{Result, TrackerError};

use log::{debug, error, info, warn};

use opencv::core::*;
use opencv::imgproc;
use opencv::prelude::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
	Running,
	Stopping,
	Stopped,
}

pub struct TrackerState {
	pub previous_position: Position,
	pub frame_counter: u64,
	pub stop_requested: Arc<AtomicBool>,
	pub run_state: RunState,
}

impl TrackerState {
	pub fn new() -> Self {
		Self {
			previous_position: NOT_FOUND,
			frame_counter: 0,
			stop_requested: Arc::new(AtomicBool::new(false)),
			run_state: RunState::Stopped,
		}
	}
}

impl Default for TrackerState {
	fn default() -> Self {
		Self::new()
	}
}

/// Everything a frame's results are sent to.
pub struct Outputs {
	pub indicators: Box<dyn IndicatorModule>,
	pub location: Box<dyn OutputModule>,
	pub images: Box<dyn ImageModule>,
	pub display: Option<Box<dyn DisplayModule>>,
}

pub trait FrameProcessor {
	/// Analyse and optionally annotate one prepared frame.
	fn process(&mut self, frame: &mut Mat, state: &mut TrackerState, outputs: &mut Outputs) -> Result<()>;
}

pub struct Tracker<P> {
	input: Box<dyn InputModule>,
	processor: P,
	outputs: Outputs,
	state: TrackerState,
	width: i32,
	flip_x: bool,
	flip_y: bool,
	backoff: Duration,
	dimensions: Option<(i32, i32)>,
}

impl<P: FrameProcessor> Tracker<P> {
	pub fn new(input: Box<dyn InputModule>, processor: P, outputs: Outputs, settings: &TrackingSettings) -> Self {
		Self {
			input,
			processor,
			outputs,
			state: TrackerState::new(),
			width: settings.width,
			flip_x: settings.flip_x,
			flip_y: settings.flip_y,
			backoff: Duration::from_millis(settings.backoff_ms),
			dimensions: None,
		}
	}

	/// Setting the returned flag stops the loop before its next frame.
	pub fn stop_handle(&self) -> Arc<AtomicBool> {
		Arc::clone(&self.state.stop_requested)
	}

	pub fn state(&self) -> &TrackerState {
		&self.state
	}

	/// Runs on the calling thread until stopped or the camera closes.
	pub fn run(&mut self) {
		if !self.input.is_open() {
			warn!("Camera is not open; nothing to track");
			self.shutdown();
			return;
		}

		info!("Tracking started");
		self.state.run_state = RunState::Running;

		while self.state.run_state == RunState::Running {
			if self.state.stop_requested.load(Ordering::SeqCst) {
				info!("Stop requested");
				self.state.run_state = RunState::Stopping;
				break;
			}
			if !self.input.is_open() {
				warn!("Camera is no longer open");
				self.state.run_state = RunState::Stopping;
				break;
			}

			match self.step() {
				Ok(()) => {}
				Err(TrackerError::StopRequested) => {
					info!("Stop requested at frame #{}", self.state.frame_counter);
					self.state.run_state = RunState::Stopping;
				}
				Err(e) => {
					error!("Unexpected error in main loop at frame #{} [{}]", self.state.frame_counter, e);
					thread::sleep(self.backoff);
				}
			}
		}

		self.shutdown();
	}

	fn step(&mut self) -> Result<()> {
		let frame = self.input.run()?;
		let mut frame = prepare_frame(frame, self.width, self.flip_x, self.flip_y)?;

		let dimensions = (frame.cols(), frame.rows());
		if self.dimensions != Some(dimensions) {
			debug!("Frame dimensions are now {}x{}", dimensions.0, dimensions.1);
			self.outputs.images.announce_dimensions(dimensions.0, dimensions.1)?;
			self.dimensions = Some(dimensions);
		}

		self.processor.process(&mut frame, &mut self.state, &mut self.outputs)?;

		if let Some(display) = self.outputs.display.as_mut() {
			display.show(&frame)?;
		}
		self.outputs.images.serve_frame(&frame)?;

		self.state.frame_counter += 1;
		Ok(())
	}

	fn shutdown(&mut self) {
		if let Err(e) = self.outputs.indicators.clear_all() {
			error!("Failed to clear indicators: {}", e);
		}
		if let Err(e) = self.input.close() {
			error!("Failed to close camera: {}", e);
		}
		if let Some(display) = self.outputs.display.as_mut() {
			if let Err(e) = display.close() {
				error!("Failed to close display: {}", e);
			}
		}
		self.state.run_state = RunState::Stopped;
		info!("Tracking stopped after {} frames", self.state.frame_counter);
	}
}

/// Resizes to `width` keeping the aspect ratio, then flips around the x and/or y axis.
pub fn prepare_frame(frame: Mat, width: i32, flip_x: bool, flip_y: bool) -> Result<Mat> {
	let mut image = resize(frame, width)?;

	if flip_x {
		let mut flipped = Mat::default();
		flip(&image, &mut flipped, 0)?;
		image = flipped;
	}
	if flip_y {
		let mut flipped = Mat::default();
		flip(&image, &mut flipped, 1)?;
		image = flipped;
	}
	Ok(image)
}

fn resize(frame: Mat, width: i32) -> Result<Mat> {
	let (w, h) = (frame.cols(), frame.rows());
	if w <= 0 || h <= 0 {
		return Err(TrackerError::Capture(String::from("empty frame")));
	}
	if w == width {
		return Ok(frame);
	}

	let height = ((h as f64) * (width as f64 / w as f64)) as i32;
	let mut resized = Mat::default();
	imgproc::resize(&frame, &mut resized, Size::new(width, height.max(1)), 0., 0., imgproc::INTER_AREA)?;
	Ok(resized)
}
