// Video sink selection
//
// The host's GStreamer install may or may not ship specific video sinks;
// pick one that actually exists at runtime, with a manual override for the
// operator.

use tracing::{debug, warn};

use super::ElementRegistry;

/// Environment variable naming a preferred video-sink element
pub const SINK_ENV_VAR: &str = "OPENTERFACE_GST_SINK";

/// Video sinks in order of preference (X11-accelerated first, then fallbacks)
pub const SINK_PREFERENCE: &[&str] = &["xvimagesink", "ximagesink", "autovideosink", "qtsink"];

/// Last-resort sink when nothing in the registry is recognized
pub const FALLBACK_SINK: &str = "autovideosink";

/// Select the video-sink element to embed in the pipeline description
///
/// Honors the `OPENTERFACE_GST_SINK` override when the registry recognizes
/// it, then walks the preference list. Total: always returns a name, falling
/// back to `autovideosink` when the registry recognizes nothing.
pub fn select(registry: &dyn ElementRegistry) -> String {
    select_from(env_override().as_deref(), registry)
}

/// Preference-ordered sink names for sequential fallback attempts
///
/// An unrecognized override is still placed first so callers can attempt it
/// and report the failure. Never returns an empty list.
pub fn candidates(registry: &dyn ElementRegistry) -> Vec<String> {
    candidates_from(env_override().as_deref(), registry)
}

fn env_override() -> Option<String> {
    std::env::var(SINK_ENV_VAR).ok().filter(|v| !v.is_empty())
}

/// [`select`] with the environment read factored out
pub fn select_from(requested: Option<&str>, registry: &dyn ElementRegistry) -> String {
    if let Some(name) = requested {
        if registry.contains(name) {
            debug!(sink = name, "using requested video sink");
            return name.to_string();
        }
        warn!(
            sink = name,
            "requested video sink not found in element registry, falling back"
        );
    }

    for name in SINK_PREFERENCE {
        if registry.contains(name) {
            debug!(sink = name, "selected video sink");
            return (*name).to_string();
        }
    }

    debug!(sink = FALLBACK_SINK, "no preferred video sink available, using last resort");
    FALLBACK_SINK.to_string()
}

/// [`candidates`] with the environment read factored out
pub fn candidates_from(requested: Option<&str>, registry: &dyn ElementRegistry) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(SINK_PREFERENCE.len() + 1);

    if let Some(name) = requested {
        if !registry.contains(name) {
            warn!(
                sink = name,
                "requested video sink not found in element registry"
            );
        }
        out.push(name.to_string());
    }

    for name in SINK_PREFERENCE {
        if registry.contains(name) && !out.iter().any(|c| c == name) {
            out.push((*name).to_string());
        }
    }

    if out.is_empty() {
        out.push(FALLBACK_SINK.to_string());
    }

    out
}
