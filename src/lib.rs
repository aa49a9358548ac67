//! Webcam service client
//!
//! This crate drives a remote webcam-capture HTTP service on behalf of one
//! camera: it verifies the camera is advertised, captures still frames, and
//! starts/stops video recordings, optionally saving the results to disk.
//!
//! # Service contract
//!
//! | Call            | Method | Path                                  |
//! |-----------------|--------|---------------------------------------|
//! | List devices    | GET    | `/available_webcams`                  |
//! | Capture frame   | GET    | `/capture_image/{camera_index}`       |
//! | Start recording | POST   | `/start_video_recording/{camera_index}` |
//! | Stop recording  | POST   | `/stop_video_recording/{camera_index}`  |
//!
//! # Module Structure
//!
//! - `client`: `CameraClient` and the recording lifecycle
//! - `transport`: injectable HTTP seam (`HttpTransport`, `UreqTransport`)
//! - `device`: device listing model and camera identifiers
//! - `error`: typed failures (`CameraError`)
//! - `config`: settings for the `webcam_ctl` binary

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod transport;

pub use client::{
    list_devices, CameraClient, DEFAULT_FRAME_NAME, DEFAULT_VIDEO_NAME, FRAME_EXTENSION,
    VIDEO_CHUNK_SIZE, VIDEO_EXTENSION,
};
pub use config::ClientConfig;
pub use device::{parse_device_list, CameraIndex, DeviceInfo};
pub use error::{CameraError, CameraResult};
pub use transport::{HttpResponse, HttpTransport, TransportError, UreqTransport};
