use crate::modules::DisplayModule;
use crate::{Result, TrackerError};

use opencv::core::*;
use opencv::highgui;

const KEY_ESC: i32 = 27;

/// HighGUI window; must be driven from the thread that created it.
pub struct HighGuiDisplay {
	window: String,
}

impl HighGuiDisplay {
	pub fn new(window: &str) -> Result<Self> {
		highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
		Ok(Self {
			window: window.to_string(),
		})
	}
}

impl DisplayModule for HighGuiDisplay {
	fn show(&mut self, frame: &Mat) -> Result<()> {
		highgui::imshow(&self.window, frame)?;
		let key = highgui::wait_key(1)? & 0xFF;
		if key == 'q' as i32 || key == KEY_ESC {
			return Err(TrackerError::StopRequested);
		}
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		highgui::destroy_window(&self.window)?;
		Ok(())
	}
}
