// Queue tuning for the display and recording branches
//
// The display branch favors responsiveness: a shallow queue that drops the
// newest buffers when full. The recording branch favors continuity: a
// deeper queue that sheds the oldest buffered data when the sink stalls.

use gstreamer::prelude::*;
use tracing::debug;

/// Name of the queue feeding the display sink
pub const DISPLAY_QUEUE: &str = "display-queue";
/// Name of the queue feeding the recording branch
pub const RECORDING_QUEUE: &str = "recording-queue";

const DISPLAY_MAX_BUFFERS: u32 = 5;
const DISPLAY_MAX_TIME_NS: u64 = 100_000_000;
const RECORDING_MAX_BUFFERS: u32 = 10;
const RECORDING_MAX_TIME_NS: u64 = 500_000_000;

/// Tune the named queues of a constructed pipeline
///
/// Looks up `display-queue` and `recording-queue` by name and reconfigures
/// whichever are present; a missing queue is a no-op. Idempotent, so the
/// caller may re-apply it after rebuilding parts of the graph.
pub fn configure(pipeline: &gstreamer::Pipeline) {
    tune(
        pipeline,
        DISPLAY_QUEUE,
        DISPLAY_MAX_BUFFERS,
        DISPLAY_MAX_TIME_NS,
        "downstream",
    );
    tune(
        pipeline,
        RECORDING_QUEUE,
        RECORDING_MAX_BUFFERS,
        RECORDING_MAX_TIME_NS,
        "upstream",
    );
}

fn tune(pipeline: &gstreamer::Pipeline, name: &str, max_buffers: u32, max_time_ns: u64, leaky: &str) {
    let Some(element) = pipeline.by_name(name) else {
        debug!(queue = name, "queue not present in pipeline, skipping");
        return;
    };

    element.set_property("max-size-buffers", max_buffers);
    element.set_property("max-size-time", max_time_ns);
    element.set_property_from_str("leaky", leaky);

    debug!(
        queue = name,
        max_buffers, max_time_ns, leaky, "tuned pipeline queue"
    );
}
