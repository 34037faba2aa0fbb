use crate::modules::ImageModule;
use crate::settings::OutputSettings;
use crate::Result;

use log::{debug, error, info};

use opencv::core::*;
use opencv::imgcodecs::*;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::watch;

const MJPEG_PATH: &str = "/mjpeg";
const BOUNDARY: &str = "frame";

type Jpeg = Option<Arc<Vec<u8>>>;

/// Serves the most recent frame over HTTP: a refreshing page at `/`, the
/// JPEG itself at the configured path, and an MJPEG stream at `/mjpeg`.
///
/// The listener is started when the first frame dimensions are announced.
pub struct ImageServer {
	handle: Handle,
	addr: String,
	path: String,
	delay_secs: f64,
	dimensions: Option<(i32, i32)>,
	dims_tx: watch::Sender<(i32, i32)>,
	frame_tx: watch::Sender<Jpeg>,
	params: Vector<i32>,
	local_addr: Option<SocketAddr>,
}

#[derive(Clone)]
struct HttpState {
	path: String,
	delay_secs: f64,
	dims: watch::Receiver<(i32, i32)>,
	frames: watch::Receiver<Jpeg>,
}

impl ImageModule for ImageServer {
	fn announce_dimensions(&mut self, width: i32, height: i32) -> Result<()> {
		if self.dimensions == Some((width, height)) {
			return Ok(());
		}
		if self.local_addr.is_none() {
			self.start()?;
		}
		self.dimensions = Some((width, height));
		self.dims_tx.send_replace((width, height));
		info!("Serving {}x{} images on http://{}{}", width, height, self.addr, self.path);
		Ok(())
	}

	fn serve_frame(&mut self, frame: &Mat) -> Result<()> {
		let jpeg = to_jpeg(frame, &self.params)?;
		self.frame_tx.send_replace(Some(Arc::new(jpeg)));
		Ok(())
	}
}

impl ImageServer {
	pub fn new(handle: Handle, settings: &OutputSettings) -> Self {
		let path = if settings.path.starts_with('/') {
			settings.path.clone()
		} else {
			format!("/{}", settings.path)
		};
		let (dims_tx, _) = watch::channel((0, 0));
		let (frame_tx, _) = watch::channel(None);

		Self {
			handle,
			addr: settings.http.clone(),
			path,
			delay_secs: settings.delay_secs,
			dimensions: None,
			dims_tx,
			frame_tx,
			params: Vector::new(),
			local_addr: None,
		}
	}

	/// Bound address, once the server has been started.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.local_addr
	}

	fn start(&mut self) -> Result<()> {
		let listener = std::net::TcpListener::bind(&self.addr)?;
		listener.set_nonblocking(true)?;
		self.local_addr = Some(listener.local_addr()?);

		let state = HttpState {
			path: self.path.clone(),
			delay_secs: self.delay_secs,
			dims: self.dims_tx.subscribe(),
			frames: self.frame_tx.subscribe(),
		};
		self.handle.spawn(async move {
			let listener = match TcpListener::from_std(listener) {
				Ok(listener) => listener,
				Err(e) => {
					error!("Unable to start image server: {}", e);
					return;
				}
			};
			loop {
				match listener.accept().await {
					Ok((socket, peer)) => {
						let state = state.clone();
						tokio::spawn(async move {
							if let Err(e) = handle_request(socket, state).await {
								debug!("Image client {} dropped: {}", peer, e);
							}
						});
					}
					Err(e) => error!("Failed to accept image client: {}", e),
				}
			}
		});
		Ok(())
	}
}

pub fn to_jpeg(frame: &Mat, params: &Vector<i32>) -> Result<Vec<u8>> {
	let mut jpeg = Vector::new();
	imencode(".jpg", frame, &mut jpeg, params)?;
	Ok(jpeg.to_vec())
}

async fn handle_request(socket: TcpStream, state: HttpState) -> std::io::Result<()> {
	let (reader, mut writer) = socket.into_split();
	let mut reader = BufReader::new(reader);

	let mut request_line = String::new();
	reader.read_line(&mut request_line).await?;
	loop {
		let mut header = String::new();
		if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
			break;
		}
	}

	let mut parts = request_line.split_whitespace();
	let method = parts.next().unwrap_or("");
	let target = parts.next().unwrap_or("/");
	let target = target.split('?').next().unwrap_or(target);

	if method != "GET" {
		return respond(&mut writer, "405 Method Not Allowed", "text/plain", b"method not allowed").await;
	}

	if target == state.path {
		let latest = state.frames.borrow().clone();
		return match latest {
			Some(jpeg) => respond(&mut writer, "200 OK", "image/jpeg", &jpeg).await,
			None => respond(&mut writer, "503 Service Unavailable", "text/plain", b"no image yet").await,
		};
	}

	match target {
		"/" => {
			let page = page(&state);
			respond(&mut writer, "200 OK", "text/html; charset=utf-8", page.as_bytes()).await
		}
		MJPEG_PATH => stream(&mut writer, state.frames).await,
		_ => respond(&mut writer, "404 Not Found", "text/plain", b"not found").await,
	}
}

fn page(state: &HttpState) -> String {
	let (width, height) = *state.dims.borrow();
	format!(
		"<html>\n<head>\n<title>ferrotrack</title>\n<meta http-equiv=\"refresh\" content=\"{}\">\n</head>\n<body>\n<img src=\"{}\" width=\"{}\" height=\"{}\">\n</body>\n</html>\n",
		state.delay_secs, state.path, width, height
	)
}

async fn respond<W: AsyncWrite + Unpin>(writer: &mut W, status: &str, content_type: &str, body: &[u8]) -> std::io::Result<()> {
	let head = format!(
		"HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
		status,
		content_type,
		body.len()
	);
	writer.write_all(head.as_bytes()).await?;
	writer.write_all(body).await?;
	writer.shutdown().await
}

async fn stream<W: AsyncWrite + Unpin>(writer: &mut W, mut frames: watch::Receiver<Jpeg>) -> std::io::Result<()> {
	let head = format!(
		"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary={}\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
		BOUNDARY
	);
	writer.write_all(head.as_bytes()).await?;

	loop {
		let latest = frames.borrow_and_update().clone();
		if let Some(jpeg) = latest {
			let part = format!(
				"--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
				BOUNDARY,
				jpeg.len()
			);
			writer.write_all(part.as_bytes()).await?;
			writer.write_all(&jpeg).await?;
			writer.write_all(b"\r\n").await?;
			writer.flush().await?;
		}
		if frames.changed().await.is_err() {
			return Ok(());
		}
	}
}
