use crate::modules::InputModule;
use crate::settings::InputSettings;
use crate::{Result, TrackerError};

use log::{info, warn};

use opencv::core::*;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

pub struct CameraInput {
	cap: VideoCapture,
	open: bool,
	from_file: bool,
}

impl CameraInput {
	pub fn new(settings: &InputSettings) -> Result<Self> {
		let mut cap = match &settings.source {
			Some(source) => VideoCapture::from_file(source, videoio::CAP_ANY)?,
			None => VideoCapture::new(settings.camera, videoio::CAP_ANY)?,
		};
		if !cap.is_opened()? {
			return Err(TrackerError::Capture(format!(
				"unable to open {}",
				describe(settings)
			)));
		}

		if let Some(height) = settings.height {
			cap.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
		}
		if let Some(width) = settings.width {
			cap.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
		}
		if let Some(fps) = settings.fps {
			cap.set(videoio::CAP_PROP_FPS, fps as f64)?;
		}

		info!("Opened {}", describe(settings));
		Ok(Self {
			cap,
			open: true,
			from_file: settings.source.is_some(),
		})
	}
}

fn describe(settings: &InputSettings) -> String {
	match &settings.source {
		Some(source) => format!("video source {}", source),
		None => format!("camera #{}", settings.camera),
	}
}

impl InputModule for CameraInput {
	fn is_open(&self) -> bool {
		self.open && self.cap.is_opened().unwrap_or(false)
	}

	fn run(&mut self) -> Result<Mat> {
		let mut frame = Mat::default();
		if !self.cap.read(&mut frame)? || frame.empty() {
			if self.from_file {
				// A file source that stops producing frames has reached its end
				warn!("Video source exhausted");
				self.close()?;
			}
			return Err(TrackerError::Capture("no frame from capture device".to_string()));
		}
		Ok(frame)
	}

	fn close(&mut self) -> Result<()> {
		if self.open {
			self.open = false;
			self.cap.release()?;
			info!("Camera closed");
		}
		Ok(())
	}
}
