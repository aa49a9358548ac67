use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by [`crate::CameraClient`].
///
/// Steady-state network trouble (frame fetch, start, stop) is reported through
/// sentinel return values, not through this type. What ends up here is either
/// structural misconfiguration or a service answer the caller must act on.
#[derive(Error, Debug)]
pub enum CameraError {
    /// The service was unreachable at construction, or it does not advertise
    /// the requested camera.
    #[error("Failed to connect to camera service at {url}")]
    ConnectionFailure { url: String },

    #[error("Invalid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    /// The stop request reached the service but did not return 200 while a
    /// save was requested.
    #[error("Failed to stop recording: {status}")]
    RecordingStopFailure { status: u16 },

    #[error("Invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid device list: {0}")]
    InvalidDeviceList(String),

    /// Client-side request failure that is not a connection problem.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The response body broke off while streaming into `path`.
    #[error("Stream interrupted while writing {}: {source}", path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CameraResult<T> = std::result::Result<T, CameraError>;
