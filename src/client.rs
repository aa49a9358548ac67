//! Client for a remote webcam-capture service.
//!
//! `CameraClient` is bound to one camera on one service. Construction is
//! fail-fast: the device list is queried immediately and a client is only
//! returned if the service answered and advertises the camera.
//!
//! Error policy:
//! - Connection failures during `get_frame`, `start_video_recording` and
//!   `stop_video_recording` degrade to `None`/`false` so polling loops keep
//!   running.
//! - A bad save directory, a non-200 stop while saving, and construction
//!   against an unusable service are hard errors.
//!
//! The recording flag is a local approximation of the service state:
//! - set by any response to a start request, whatever its status
//! - cleared by any response to a stop request
//! - untouched when the stop request never reaches the service

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use url::Url;

use crate::device::{parse_device_list, CameraIndex, DeviceInfo};
use crate::error::{CameraError, CameraResult};
use crate::transport::{HttpResponse, HttpTransport, TransportError, UreqTransport};

pub const DEFAULT_FRAME_NAME: &str = "frame";
pub const DEFAULT_VIDEO_NAME: &str = "video";
/// Stills are always written as PNG, whatever `Content-Type` the service sends.
pub const FRAME_EXTENSION: &str = "png";
pub const VIDEO_EXTENSION: &str = "mp4";
pub const VIDEO_CHUNK_SIZE: usize = 1024;

pub struct CameraClient<T: HttpTransport = UreqTransport> {
    transport: T,
    service_url: String,
    camera_index: CameraIndex,
    is_recording: bool,
}

impl CameraClient<UreqTransport> {
    /// Connects with the default `ureq` transport.
    pub fn connect(service_url: &str, camera_index: impl Into<CameraIndex>) -> CameraResult<Self> {
        Self::with_transport(UreqTransport::default(), service_url, camera_index)
    }
}

impl<T: HttpTransport> CameraClient<T> {
    pub fn with_transport(
        transport: T,
        service_url: &str,
        camera_index: impl Into<CameraIndex>,
    ) -> CameraResult<Self> {
        let service_url = normalize_service_url(service_url)?;
        let client = Self {
            transport,
            service_url,
            camera_index: camera_index.into(),
            is_recording: false,
        };

        if !client.check_availability() {
            return Err(CameraError::ConnectionFailure {
                url: client.service_url,
            });
        }
        log::info!(
            "camera {} available at {}",
            client.camera_index,
            client.service_url
        );
        Ok(client)
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn camera_index(&self) -> &CameraIndex {
        &self.camera_index
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches the device list advertised by the service.
    pub fn list_devices(&self) -> CameraResult<Vec<DeviceInfo>> {
        fetch_devices(&self.transport, &self.service_url)
    }

    /// True iff the service answers and lists this client's camera.
    pub fn check_availability(&self) -> bool {
        match self.list_devices() {
            Ok(devices) => devices.iter().any(|d| d.matches(&self.camera_index)),
            Err(CameraError::ConnectionFailure { .. }) => false,
            Err(err) => {
                log::warn!("device list from {} unusable: {}", self.service_url, err);
                false
            }
        }
    }

    /// Captures one still into `{save_dir}/{name}.png`.
    ///
    /// Returns `Ok(None)` when the service cannot be reached.
    pub fn get_frame(&self, save_dir: &Path, name: &str) -> CameraResult<Option<PathBuf>> {
        ensure_directory(save_dir)?;

        let url = self.endpoint(&format!("capture_image/{}", self.camera_index));
        let response = match self.transport.get(&url) {
            Ok(response) => response,
            Err(TransportError::Connection(msg)) => {
                log::warn!("Connection error fetching frame from {}: {}", url, msg);
                return Ok(None);
            }
            Err(TransportError::Request(msg)) => return Err(CameraError::Transport(msg)),
        };

        match response.content_type.as_deref() {
            Some(content_type) => log::debug!(
                "frame content type {} (saving as {})",
                content_type,
                FRAME_EXTENSION
            ),
            None => log::debug!("frame response carried no content type"),
        }

        let bytes = match read_body(response) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Connection error reading frame from {}: {}", url, err);
                return Ok(None);
            }
        };

        let save_path = save_dir.join(format!("{}.{}", name, FRAME_EXTENSION));
        std::fs::write(&save_path, &bytes).map_err(|e| CameraError::Io {
            path: save_path.clone(),
            source: e,
        })?;
        log::info!("saved frame ({} bytes) to {}", bytes.len(), save_path.display());
        Ok(Some(save_path))
    }

    /// Asks the service to start recording. Returns whether the response
    /// status was a success; `false` without touching the flag if the
    /// service was unreachable.
    ///
    /// Any response, even an error status, sets the recording flag.
    pub fn start_video_recording(&mut self) -> CameraResult<bool> {
        let url = self.endpoint(&format!("start_video_recording/{}", self.camera_index));
        let response = match self.transport.post(&url) {
            Ok(response) => response,
            Err(TransportError::Connection(msg)) => {
                log::warn!("Connection error starting recording at {}: {}", url, msg);
                return Ok(false);
            }
            Err(TransportError::Request(msg)) => return Err(CameraError::Transport(msg)),
        };

        self.is_recording = true;
        let ok = response.is_success();
        if ok {
            log::info!("recording started on camera {}", self.camera_index);
        } else {
            log::warn!(
                "start recording on camera {} returned status {}",
                self.camera_index,
                response.status
            );
        }
        Ok(ok)
    }

    /// Stops a recording this client started.
    ///
    /// - Not recording: `Ok(None)` without any request.
    /// - Unreachable service: `Ok(None)`, flag left set.
    /// - `save_dir` is `None`: the body is discarded and `Ok(None)` returned.
    /// - Otherwise the video is streamed to `{save_dir}/{name}.mp4`.
    pub fn stop_video_recording(
        &mut self,
        save_dir: Option<&Path>,
        name: &str,
    ) -> CameraResult<Option<PathBuf>> {
        if !self.is_recording {
            log::debug!("stop requested while not recording; ignoring");
            return Ok(None);
        }

        let url = self.endpoint(&format!("stop_video_recording/{}", self.camera_index));
        let response = match self.transport.post(&url) {
            Ok(response) => response,
            Err(TransportError::Connection(msg)) => {
                log::warn!("Connection error stopping recording at {}: {}", url, msg);
                return Ok(None);
            }
            Err(TransportError::Request(msg)) => return Err(CameraError::Transport(msg)),
        };
        self.is_recording = false;

        let Some(save_dir) = save_dir else {
            log::info!(
                "recording stopped on camera {} (status {}); video discarded",
                self.camera_index,
                response.status
            );
            return Ok(None);
        };

        ensure_directory(save_dir)?;

        if !response.is_ok_200() {
            return Err(CameraError::RecordingStopFailure {
                status: response.status,
            });
        }

        let save_path = save_dir.join(format!("{}.{}", name, VIDEO_EXTENSION));
        let written = stream_to_file(response.body, &save_path)?;
        log::info!(
            "recording stopped on camera {}; saved {} bytes to {}",
            self.camera_index,
            written,
            save_path.display()
        );
        Ok(Some(save_path))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.service_url, path)
    }
}

/// Queries `/available_webcams` without binding a client to a camera.
pub fn list_devices<T: HttpTransport>(
    transport: &T,
    service_url: &str,
) -> CameraResult<Vec<DeviceInfo>> {
    let service_url = normalize_service_url(service_url)?;
    fetch_devices(transport, &service_url)
}

fn fetch_devices<T: HttpTransport>(
    transport: &T,
    service_url: &str,
) -> CameraResult<Vec<DeviceInfo>> {
    let url = format!("{}/available_webcams", service_url);
    let service_down = || CameraError::ConnectionFailure {
        url: service_url.to_string(),
    };
    let response = transport.get(&url).map_err(|err| match err {
        TransportError::Connection(msg) => {
            log::debug!("device list request to {} failed: {}", url, msg);
            service_down()
        }
        TransportError::Request(msg) => CameraError::Transport(msg),
    })?;
    let bytes = read_body(response).map_err(|err| {
        log::debug!("device list body from {} broke off: {}", url, err);
        service_down()
    })?;
    parse_device_list(&bytes)
}

fn normalize_service_url(raw: &str) -> CameraResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| CameraError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(CameraError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'; expected http(s)", other),
        }),
    }
}

fn ensure_directory(dir: &Path) -> CameraResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(CameraError::InvalidDirectory(dir.to_path_buf()))
    }
}

fn read_body(response: HttpResponse) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut body = response.body;
    body.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Copies `body` into a new file at `path` in `VIDEO_CHUNK_SIZE` pieces.
/// A partially written file is removed if the stream breaks off.
fn stream_to_file(mut body: Box<dyn Read + Send>, path: &Path) -> CameraResult<u64> {
    let mut file = File::create(path).map_err(|e| CameraError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut chunk = [0u8; VIDEO_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let read = match body.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                drop(file);
                discard_partial(path);
                return Err(CameraError::Stream {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        if let Err(err) = file.write_all(&chunk[..read]) {
            drop(file);
            discard_partial(path);
            return Err(CameraError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
        written += read as u64;
    }

    file.flush().map_err(|e| CameraError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(written)
}

fn discard_partial(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        log::warn!("failed to remove partial video {}: {}", path.display(), err);
    }
}
