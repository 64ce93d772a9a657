// Capture pipeline for the target's video feed
//
// Builds a v4l2src pipeline around the selected sink: the capture card
// feeds a tee, one branch goes through display-queue to the display sink,
// and an optional branch goes through recording-queue to an H.264 file.

use gstreamer::prelude::*;
use tracing::{debug, error, info, warn};

use super::{queue, sink, ElementRegistry, VideoError};
use crate::config::VideoConfig;
use crate::events::PipelineStoppedEvent;

/// H.264 encoders for the recording branch, hardware first
const RECORD_ENCODERS: &[&str] = &["vaapih264enc", "nvh264enc", "x264enc"];

/// Pick the recording encoder from the element registry
///
/// Returns None when the registry recognizes no H.264 encoder.
pub fn pick_record_encoder(registry: &dyn ElementRegistry) -> Option<&'static str> {
    for encoder in RECORD_ENCODERS {
        if registry.contains(encoder) {
            debug!(encoder, "found available H.264 encoder");
            return Some(encoder);
        }
    }
    warn!("no H.264 encoder found in element registry");
    None
}

/// The live capture pipeline shown in the main window
pub struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    sink_name: String,
    recording_path: Option<String>,
    start_time: Option<std::time::Instant>,
}

impl CapturePipeline {
    /// Build the pipeline for the given capture device
    ///
    /// Walks the sink candidate list and keeps the first description the
    /// backend accepts, then tunes the named queues. The pipeline is
    /// returned stopped; call [`start`](Self::start) to go live.
    pub fn new(config: &VideoConfig, registry: &dyn ElementRegistry) -> Result<Self, VideoError> {
        gstreamer::init()
            .map_err(|e| VideoError::Backend(format!("Failed to initialize GStreamer: {}", e)))?;

        let encoder = match &config.recording_path {
            Some(_) => Some(pick_record_encoder(registry).ok_or_else(|| {
                VideoError::EncoderUnavailable("No H.264 encoder available".to_string())
            })?),
            None => None,
        };

        let mut last_error = VideoError::Pipeline("No sink candidates".to_string());
        for candidate in sink::candidates(registry) {
            let description = build_description(config, &candidate, encoder);
            debug!(sink = %candidate, pipeline = %description, "constructing capture pipeline");

            let element = match gstreamer::parse::launch(&description) {
                Ok(element) => element,
                Err(e) => {
                    warn!(sink = %candidate, error = %e, "pipeline construction failed, trying next sink");
                    last_error =
                        VideoError::Pipeline(format!("Failed to create pipeline: {}", e));
                    continue;
                }
            };

            let pipeline = element.downcast::<gstreamer::Pipeline>().map_err(|_| {
                VideoError::Pipeline("Failed to downcast to Pipeline".to_string())
            })?;

            queue::configure(&pipeline);

            return Ok(Self {
                pipeline,
                sink_name: candidate,
                recording_path: config.recording_path.clone(),
                start_time: None,
            });
        }

        Err(last_error)
    }

    /// Name of the sink element the pipeline ended up with
    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Start the live feed
    pub fn start(&mut self) -> Result<(), VideoError> {
        info!(sink = %self.sink_name, "starting capture pipeline");

        // PAUSED first so linking failures surface before we go live
        self.set_state_checked(gstreamer::State::Paused)?;
        self.set_state_checked(gstreamer::State::Playing)?;

        self.start_time = Some(std::time::Instant::now());
        Ok(())
    }

    /// Stop the feed and finalize the recording branch if present
    ///
    /// With a recording branch, sends EOS and drains the bus so the muxer
    /// can close the file properly before the pipeline goes to NULL.
    pub fn stop(mut self) -> Result<PipelineStoppedEvent, VideoError> {
        info!(sink = %self.sink_name, "stopping capture pipeline");

        let duration_ms = self
            .start_time
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        let result = if self.recording_path.is_some() {
            self.finalize_recording()
        } else {
            Ok(())
        };

        let _ = self.pipeline.set_state(gstreamer::State::Null);
        result?;

        Ok(PipelineStoppedEvent {
            sink: self.sink_name.clone(),
            duration_ms,
            recording_path: self.recording_path.clone(),
        })
    }

    fn finalize_recording(&self) -> Result<(), VideoError> {
        self.pipeline.send_event(gstreamer::event::Eos::new());

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| VideoError::Pipeline("Failed to get pipeline bus".to_string()))?;

        loop {
            match bus.timed_pop(gstreamer::ClockTime::from_seconds(5)) {
                Some(msg) => {
                    use gstreamer::MessageView;
                    match msg.view() {
                        MessageView::Eos(..) => {
                            debug!("capture pipeline reached EOS");
                            return Ok(());
                        }
                        MessageView::Error(err) => {
                            let debug_info = err
                                .debug()
                                .map(|d| format!(" ({:?})", d))
                                .unwrap_or_default();
                            error!("capture pipeline error: {}{}", err.error(), debug_info);
                            return Err(VideoError::Pipeline(format!(
                                "Pipeline error: {}{}",
                                err.error(),
                                debug_info
                            )));
                        }
                        _ => {}
                    }
                }
                None => {
                    warn!("timed out waiting for EOS, recording may be truncated");
                    return Ok(());
                }
            }
        }
    }

    fn set_state_checked(&self, state: gstreamer::State) -> Result<(), VideoError> {
        self.pipeline.set_state(state).map_err(|e| {
            if let Some(bus) = self.pipeline.bus() {
                while let Some(msg) = bus.pop() {
                    if let gstreamer::MessageView::Error(err) = msg.view() {
                        error!(error = ?err.error(), debug = ?err.debug(), "pipeline bus error");
                    }
                }
            }
            VideoError::Pipeline(format!("Failed to reach {:?}: {}", state, e))
        })
    }
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("sink_name", &self.sink_name)
            .field("recording_path", &self.recording_path)
            .field("start_time", &self.start_time)
            .finish()
    }
}

/// Compose the textual pipeline description for one sink candidate
pub(super) fn build_description(config: &VideoConfig, sink: &str, encoder: Option<&str>) -> String {
    let source = format!(
        "v4l2src device={device} ! video/x-raw,width={width},height={height},framerate={fps}/1",
        device = config.device,
        width = config.width,
        height = config.height,
        fps = config.fps
    );

    match (&config.recording_path, encoder) {
        (Some(path), Some(encoder)) => format!(
            "{source} ! tee name=t \
             t. ! queue name={display_queue} ! videoconvert ! {sink} \
             t. ! queue name={recording_queue} ! videoconvert ! {encoder} ! mp4mux ! filesink location={path}",
            source = source,
            display_queue = queue::DISPLAY_QUEUE,
            recording_queue = queue::RECORDING_QUEUE,
            sink = sink,
            encoder = encoder,
            path = path
        ),
        _ => format!(
            "{source} ! videoconvert ! queue name={display_queue} ! {sink}",
            source = source,
            display_queue = queue::DISPLAY_QUEUE,
            sink = sink
        ),
    }
}
