// Video pipeline plumbing
//
// Sink selection, queue tuning, and construction of the capture pipeline
// shown in the main window. The GStreamer-backed pieces are gated so the
// pure selection logic stays testable on any host.

pub mod sink;

#[cfg(all(target_os = "linux", feature = "gstreamer"))]
pub mod pipeline;
#[cfg(all(target_os = "linux", feature = "gstreamer"))]
pub mod queue;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while building or driving the capture pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VideoError {
    /// The multimedia backend failed to initialize
    Backend(String),
    /// No usable encoder for the recording branch
    EncoderUnavailable(String),
    /// Pipeline construction or state change failed
    Pipeline(String),
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(msg) => write!(f, "Backend error: {}", msg),
            Self::EncoderUnavailable(msg) => write!(f, "Encoder unavailable: {}", msg),
            Self::Pipeline(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for VideoError {}

/// Lookup surface answering "does the multimedia backend know this element?"
pub trait ElementRegistry {
    fn contains(&self, name: &str) -> bool;
}

/// Registry backed by the GStreamer element registry
#[cfg(all(target_os = "linux", feature = "gstreamer"))]
#[derive(Debug, Default)]
pub struct GstElementRegistry;

#[cfg(all(target_os = "linux", feature = "gstreamer"))]
impl ElementRegistry for GstElementRegistry {
    fn contains(&self, name: &str) -> bool {
        // Safe to call repeatedly
        if gstreamer::init().is_err() {
            tracing::warn!("Failed to initialize GStreamer for element lookup");
            return false;
        }
        gstreamer::ElementFactory::find(name).is_some()
    }
}

/// Registry that recognizes every name
///
/// Used when the multimedia backend is absent at build time: the registry
/// check is skipped and preference lists pass through as-is.
#[derive(Debug, Default)]
pub struct PermissiveRegistry;

impl ElementRegistry for PermissiveRegistry {
    fn contains(&self, _name: &str) -> bool {
        true
    }
}

/// Registry over a fixed set of names, for tests and headless tools
#[derive(Debug, Default)]
pub struct FixedRegistry {
    names: Vec<String>,
}

impl FixedRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ElementRegistry for FixedRegistry {
    fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Get the element registry for the current platform
#[cfg(all(target_os = "linux", feature = "gstreamer"))]
pub fn default_registry() -> impl ElementRegistry {
    GstElementRegistry
}

/// Get the element registry for the current platform
#[cfg(not(all(target_os = "linux", feature = "gstreamer")))]
pub fn default_registry() -> impl ElementRegistry {
    PermissiveRegistry
}
