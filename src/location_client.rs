use crate::modules::output::Location;
use crate::position::NOT_FOUND;

use log::{error, info, warn};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Keeps the most recent location published by a location server,
/// reconnecting whenever the connection drops.
pub struct LocationClient {
	rx: watch::Receiver<Option<Location>>,
	task: JoinHandle<()>,
}

impl LocationClient {
	pub fn start(handle: &Handle, addr: &str) -> Self {
		let (tx, rx) = watch::channel(None);
		let task = handle.spawn(read_locations(addr.to_string(), tx));
		Self { rx, task }
	}

	/// Latest coordinates, or the not-found sentinel before anything arrived.
	pub fn get_xy(&self) -> (i32, i32) {
		match *self.rx.borrow() {
			Some(location) => (location.x, location.y),
			None => (NOT_FOUND.x, NOT_FOUND.y),
		}
	}

	pub fn latest(&self) -> Option<Location> {
		*self.rx.borrow()
	}

	/// Waits for the next location; `None` once the client is stopped.
	pub async fn changed(&mut self) -> Option<Location> {
		self.rx.changed().await.ok()?;
		*self.rx.borrow_and_update()
	}

	pub fn stop(&self) {
		self.task.abort();
	}
}

impl Drop for LocationClient {
	fn drop(&mut self) {
		self.task.abort();
	}
}

async fn read_locations(addr: String, tx: watch::Sender<Option<Location>>) {
	loop {
		match TcpStream::connect(&addr).await {
			Ok(stream) => {
				info!("Connected to location server at {}", addr);
				let mut lines = BufReader::new(stream).lines();
				loop {
					match lines.next_line().await {
						Ok(Some(line)) => match serde_json::from_str::<Location>(&line) {
							Ok(location) => {
								tx.send_replace(Some(location));
							}
							Err(e) => warn!("Ignoring malformed location \"{}\": {}", line, e),
						},
						Ok(None) => {
							warn!("Location server at {} closed the connection", addr);
							break;
						}
						Err(e) => {
							error!("Error reading from location server at {}: {}", addr, e);
							break;
						}
					}
				}
			}
			Err(e) => warn!("Unable to connect to location server at {}: {}", addr, e),
		}
		sleep(RECONNECT_DELAY).await;
	}
}
