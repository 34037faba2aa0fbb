use crate::modules::{OutputData, OutputModule};
use crate::Result;

use log::{debug, info, warn};

use serde::{Deserialize, Serialize};

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// One location update as sent to clients, one JSON object per line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	pub id: u64,
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,
	pub middle_inc: i32,
}

/// Streams location updates to every connected client. Only the latest
/// location is kept; slow clients skip intermediate values.
pub struct LocationServer {
	tx: watch::Sender<Option<Location>>,
	next_id: u64,
	local_addr: SocketAddr,
}

impl OutputModule for LocationServer {
	fn run(&mut self, data: OutputData) {
		self.next_id += 1;
		let location = Location {
			id: self.next_id,
			x: data.x,
			y: data.y,
			width: data.width,
			height: data.height,
			middle_inc: data.middle_inc,
		};
		debug!("Location changed: {:?}", location);
		self.tx.send_replace(Some(location));
	}
}

impl LocationServer {
	/// Binds the listener and spawns the accept loop on the current runtime.
	pub async fn bind(addr: &str) -> Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		let local_addr = listener.local_addr()?;
		let (tx, rx) = watch::channel(None);

		tokio::spawn(accept_clients(listener, rx));
		info!("Location server listening on {}", local_addr);

		Ok(Self {
			tx,
			next_id: 0,
			local_addr,
		})
	}

	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	#[cfg(test)]
	fn latest(&self) -> Option<Location> {
		*self.tx.borrow()
	}
}

async fn accept_clients(listener: TcpListener, rx: watch::Receiver<Option<Location>>) {
	loop {
		match listener.accept().await {
			Ok((socket, peer)) => {
				info!("Location client connected from {}", peer);
				let rx = rx.clone();
				tokio::spawn(async move {
					if let Err(e) = stream_locations(socket, rx).await {
						debug!("Location client {} dropped: {}", peer, e);
					}
					info!("Location client {} disconnected", peer);
				});
			}
			Err(e) => warn!("Failed to accept location client: {}", e),
		}
	}
}

async fn stream_locations(mut socket: TcpStream, mut rx: watch::Receiver<Option<Location>>) -> std::io::Result<()> {
	let current = *rx.borrow_and_update();
	if let Some(location) = current {
		write_location(&mut socket, &location).await?;
	}

	while rx.changed().await.is_ok() {
		let latest = *rx.borrow_and_update();
		if let Some(location) = latest {
			write_location(&mut socket, &location).await?;
		}
	}
	Ok(())
}

async fn write_location(socket: &mut TcpStream, location: &Location) -> std::io::Result<()> {
	let mut line = serde_json::to_vec(location)?;
	line.push(b'\n');
	socket.write_all(&line).await
}
