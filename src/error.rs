use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
	#[error("opencv: {0}")]
	OpenCv(#[from] opencv::Error),

	#[error("capture failed: {0}")]
	Capture(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("invalid settings: {0}")]
	Config(String),

	#[error(transparent)]
	Toml(#[from] toml::de::Error),

	#[error("indicator: {0}")]
	Indicator(String),

	/// Explicit request to leave the tracking loop (keyboard quit).
	#[error("stop requested")]
	StopRequested,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
