use serde::{Deserialize, Serialize};

/// Events emitted by the audio loopback worker
///
/// The GUI subscribes once at construction via
/// [`AudioLoopback::events`](crate::audio::AudioLoopback::events). A worker
/// emits at most one `Error` per lifecycle and exactly one `Finished` after
/// its release sequence completes.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopbackEvent {
    /// Unrecoverable failure with a human-readable message
    Error(String),
    /// Release sequence complete; the worker thread is about to terminate
    Finished,
}

/// Payload for the audio error event as rendered by the GUI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioErrorEvent {
    pub message: String,
}

/// Payload emitted when the capture pipeline stops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStoppedEvent {
    pub sink: String,
    pub duration_ms: u64,
    pub recording_path: Option<String>,
}

/// Event names for the GUI event system
pub mod event_names {
    pub const AUDIO_ERROR: &str = "media:audio_error";
    pub const AUDIO_FINISHED: &str = "media:audio_finished";
    pub const PIPELINE_STOPPED: &str = "media:pipeline_stopped";
}
