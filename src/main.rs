use anyhow::Context;

use clap::Parser;

use env_logger::Env;
use log::{debug, info};

use ferrotrack::modules::input::CameraInput;
use ferrotrack::modules::output::{leds, HighGuiDisplay, ImageServer, LocationServer};
use ferrotrack::modules::threshold::SimpleColor;
use ferrotrack::modules::DisplayModule;
use ferrotrack::settings::{Cli, VisionSettings};
use ferrotrack::single_object::SingleObjectProcessor;
use ferrotrack::tracker::{Outputs, Tracker};

use std::sync::atomic::Ordering;

const WINDOW_NAME: &str = "ferrotrack";

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

	debug!("Started; args: {:?}", cli);

	let settings = VisionSettings::load(&cli).context("failed to load vision settings")?;
	debug!("Vision settings: {:?}", settings);

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("failed to start async runtime")?;

	let location = runtime
		.block_on(LocationServer::bind(&settings.output.location))
		.with_context(|| format!("failed to start location server on {}", settings.output.location))?;
	let images = ImageServer::new(runtime.handle().clone(), &settings.output);

	let input = CameraInput::new(&settings.input).context("failed to open camera")?;
	let finder = SimpleColor::new(&settings.threshold).context("invalid target color")?;

	let display: Option<Box<dyn DisplayModule>> = if settings.tracking.display {
		Some(Box::new(HighGuiDisplay::new(WINDOW_NAME).context("failed to open display window")?))
	} else {
		None
	};

	let outputs = Outputs {
		indicators: leds::indicator_module(settings.output.leds),
		location: Box::new(location),
		images: Box::new(images),
		display,
	};

	let processor = SingleObjectProcessor::new(Box::new(finder), &settings.tracking);
	let mut tracker = Tracker::new(Box::new(input), processor, outputs, &settings.tracking);

	let stop = tracker.stop_handle();
	runtime.spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("Interrupted; stopping");
			stop.store(true, Ordering::SeqCst);
		}
	});

	// HighGUI needs the loop on the main thread
	tracker.run();

	info!("Exiting...");
	Ok(())
}
