use anyhow::Context;

use clap::Parser;

use env_logger::Env;
use log::{debug, info};

use ferrotrack::location_client::LocationClient;

#[derive(Parser, Debug)]
#[command(version, about = "Print locations published by a ferrotrack location server", long_about = None)]
struct Cli {
	/// Address of the location server
	#[arg(long, default_value_t = String::from("localhost:50051"))]
	host: String,

	#[arg(long = "loglevel", default_value_t = String::from("info"))]
	log_level: String,
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

	debug!("Started; args: {:?}", cli);

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("failed to start async runtime")?;

	let mut locations = LocationClient::start(runtime.handle(), &cli.host);

	runtime.block_on(async {
		loop {
			tokio::select! {
				_ = tokio::signal::ctrl_c() => break,
				location = locations.changed() => match location {
					Some(location) => println!("Got location: ({}, {})", location.x, location.y),
					None => break,
				},
			}
		}
	});

	locations.stop();
	if let Some(location) = locations.latest() {
		debug!("Last location: {:?}", location);
	}
	info!("Exiting...");
	Ok(())
}
