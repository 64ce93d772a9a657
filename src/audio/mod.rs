// Audio loopback between the capture card's analog audio interface and an
// operator-chosen output device.
//
// This module defines the stream contracts and provides the worker plus
// OS-specific backends.

pub mod loopback;

#[cfg(all(target_os = "linux", feature = "pulseaudio"))]
pub mod pulse;

#[cfg(test)]
pub mod fake;


pub use loopback::AudioLoopback;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

use crate::config::PcmFormat;

/// Direction of an audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioDirection {
    Input,
    Output,
}

impl fmt::Display for AudioDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Opaque audio device descriptor, passed by value to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Backend-specific device identifier; empty means the default device
    pub id: String,
    pub direction: AudioDirection,
}

impl AudioDevice {
    pub fn input(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: AudioDirection::Input,
        }
    }

    pub fn output(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: AudioDirection::Output,
        }
    }
}

/// Errors surfaced by the audio subsystem
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// A device stream could not be opened
    #[error("failed to open {direction} device '{device}': {reason}")]
    OpenFailed {
        device: String,
        direction: AudioDirection,
        reason: String,
    },

    /// The worker is already running for this instance
    #[error("loopback worker already running")]
    AlreadyRunning,

    /// An error from the underlying audio backend
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Input stream bound to a device and format
///
/// Lives exclusively on the worker thread; released by drop.
pub trait AudioInput {
    /// Bytes ready to be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes into `buf`
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Output stream bound to a device and format
///
/// Lives exclusively on the worker thread; released by drop.
pub trait AudioOutput {
    /// Write `buf`; returns the number of bytes the stream accepted
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Apply an output gain in 0.0..=1.0
    fn set_volume(&mut self, volume: f64);
}

/// Opens device streams for the loopback worker
///
/// The backend handle is shared between the constructing thread and the
/// worker; the streams it opens stay on the worker thread.
pub trait AudioBackend: Send + Sync {
    fn open_input(
        &self,
        device: &AudioDevice,
        format: &PcmFormat,
    ) -> Result<Box<dyn AudioInput>, AudioError>;

    fn open_output(
        &self,
        device: &AudioDevice,
        format: &PcmFormat,
    ) -> Result<Box<dyn AudioOutput>, AudioError>;
}

/// Get the audio backend for the current platform
#[cfg(all(target_os = "linux", feature = "pulseaudio"))]
pub fn get_backend() -> std::sync::Arc<dyn AudioBackend> {
    std::sync::Arc::new(pulse::PulseAudioBackend::new())
}
