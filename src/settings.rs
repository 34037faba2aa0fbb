use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::{Result, TrackerError};

// Defaults; all of which can be overridden via the settings file or CLI args
const BGR_COLOR: [u8; 3] = [174, 56, 5];
const HSV_RANGE: u8 = 20;
const MINIMUM_PIXELS: f64 = 100.;
const WIDTH: i32 = 400;
const MIDDLE_PERCENT: u8 = 15;
const BACKOFF_MS: u64 = 1000;
const LOCATION_ADDR: &str = "0.0.0.0:50051";
const HTTP_ADDR: &str = "0.0.0.0:8080";
const HTTP_PATH: &str = "/image.jpg";
const HTTP_DELAY_SECS: f64 = 0.25;

#[derive(Parser, Debug)]
#[command(version, about = "Track a single colored object and report where it is", long_about = None)]
pub struct Cli {
	/// TOML file to load vision settings from
	#[arg(long = "config")]
	pub config_path: Option<PathBuf>,

	/// Target color as "b, g, r"
	#[arg(long)]
	pub bgr: Option<String>,

	/// Width frames are resized to before tracking
	#[arg(long)]
	pub width: Option<i32>,

	/// Size of the middle dead zone, in percent of the half frame
	#[arg(long)]
	pub percent: Option<u8>,

	/// Minimum contour area in pixels
	#[arg(long = "min")]
	pub minimum: Option<f64>,

	/// Hue range around the target color
	#[arg(long = "range")]
	pub hsv_range: Option<u8>,

	/// Address the location server listens on; a bare port binds all interfaces
	#[arg(long, alias = "port")]
	pub location: Option<String>,

	/// Show annotated frames in a window; press q to quit
	#[arg(long)]
	pub display: bool,

	/// Flip frames around the x axis
	#[arg(long = "flipx")]
	pub flip_x: bool,

	/// Flip frames around the y axis
	#[arg(long = "flipy")]
	pub flip_y: bool,

	/// Camera device index
	#[arg(long)]
	pub camera: Option<i32>,

	/// Read frames from a video file or stream URL instead of a camera
	#[arg(long)]
	pub source: Option<String>,

	/// Drive Blinkt LEDs
	#[arg(long)]
	pub leds: bool,

	/// Address the image server listens on
	#[arg(long)]
	pub http: Option<String>,

	/// Refresh delay of the image page, in seconds
	#[arg(long)]
	pub delay: Option<f64>,

	/// HTTP path the latest image is served on
	#[arg(long)]
	pub path: Option<String>,

	#[arg(long = "loglevel", default_value_t = String::from("info"))]
	pub log_level: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct InputSettings {
	pub camera: i32,
	pub source: Option<String>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub fps: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ThresholdSettings {
	pub bgr: [u8; 3],
	pub hsv_range: u8,
	pub minimum: f64,
}

impl Default for ThresholdSettings {
	fn default() -> Self {
		Self {
			bgr: BGR_COLOR,
			hsv_range: HSV_RANGE,
			minimum: MINIMUM_PIXELS,
		}
	}
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackingSettings {
	pub width: i32,
	pub percent: u8,
	pub flip_x: bool,
	pub flip_y: bool,
	pub markup: bool,
	pub display: bool,
	pub backoff_ms: u64,
}

impl Default for TrackingSettings {
	fn default() -> Self {
		Self {
			width: WIDTH,
			percent: MIDDLE_PERCENT,
			flip_x: false,
			flip_y: false,
			markup: true,
			display: false,
			backoff_ms: BACKOFF_MS,
		}
	}
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
	pub location: String,
	pub http: String,
	pub path: String,
	pub delay_secs: f64,
	pub leds: bool,
}

impl Default for OutputSettings {
	fn default() -> Self {
		Self {
			location: String::from(LOCATION_ADDR),
			http: String::from(HTTP_ADDR),
			path: String::from(HTTP_PATH),
			delay_secs: HTTP_DELAY_SECS,
			leds: false,
		}
	}
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VisionSettings {
	pub input: InputSettings,
	pub threshold: ThresholdSettings,
	pub tracking: TrackingSettings,
	pub output: OutputSettings,
}

impl VisionSettings {
	/// Settings file (if any), then CLI overrides, then validation.
	pub fn load(cli: &Cli) -> Result<Self> {
		let mut settings = match &cli.config_path {
			Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
			None => Self::default(),
		};
		settings.apply(cli)?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn from_toml(text: &str) -> Result<Self> {
		let settings: Self = toml::from_str(text)?;
		settings.validate()?;
		Ok(settings)
	}

	fn apply(&mut self, cli: &Cli) -> Result<()> {
		if let Some(bgr) = &cli.bgr {
			self.threshold.bgr = parse_bgr(bgr)?;
		}
		if let Some(range) = cli.hsv_range {
			self.threshold.hsv_range = range;
		}
		if let Some(minimum) = cli.minimum {
			self.threshold.minimum = minimum;
		}
		if let Some(width) = cli.width {
			self.tracking.width = width;
		}
		if let Some(percent) = cli.percent {
			self.tracking.percent = percent;
		}
		self.tracking.flip_x |= cli.flip_x;
		self.tracking.flip_y |= cli.flip_y;
		self.tracking.display |= cli.display;
		if let Some(camera) = cli.camera {
			self.input.camera = camera;
		}
		if let Some(source) = &cli.source {
			self.input.source = Some(source.clone());
		}
		if let Some(location) = &cli.location {
			self.output.location = match location.parse::<u16>() {
				Ok(port) => format!("0.0.0.0:{}", port),
				Err(_) => location.clone(),
			};
		}
		if let Some(http) = &cli.http {
			self.output.http = http.clone();
		}
		if let Some(path) = &cli.path {
			self.output.path = path.clone();
		}
		if let Some(delay) = cli.delay {
			self.output.delay_secs = delay;
		}
		self.output.leds |= cli.leds;
		Ok(())
	}

	fn validate(&self) -> Result<()> {
		if self.tracking.width <= 0 {
			return Err(TrackerError::Config(format!("width must be positive, got {}", self.tracking.width)));
		}
		if self.tracking.percent > 100 {
			return Err(TrackerError::Config(format!("percent must be within 0-100, got {}", self.tracking.percent)));
		}
		if self.threshold.hsv_range > 90 {
			return Err(TrackerError::Config(format!("hsv range must be at most 90, got {}", self.threshold.hsv_range)));
		}
		if self.threshold.minimum < 0. {
			return Err(TrackerError::Config(format!("minimum area must not be negative, got {}", self.threshold.minimum)));
		}
		if self.output.delay_secs < 0. {
			return Err(TrackerError::Config(format!("delay must not be negative, got {}", self.output.delay_secs)));
		}
		Ok(())
	}
}

/// Parses a "b, g, r" triplet.
pub fn parse_bgr(text: &str) -> Result<[u8; 3]> {
	let values = text
		.split(',')
		.map(|v| v.trim().parse::<u8>())
		.collect::<std::result::Result<Vec<u8>, _>>()
		.map_err(|e| TrackerError::Config(format!("invalid bgr color \"{}\": {}", text, e)))?;
	match values.as_slice() {
		[b, g, r] => Ok([*b, *g, *r]),
		_ => Err(TrackerError::Config(format!("bgr color needs 3 values, got \"{}\"", text))),
	}
}
