use super::sink::{self, FALLBACK_SINK, SINK_ENV_VAR, SINK_PREFERENCE};
use super::{ElementRegistry, FixedRegistry, PermissiveRegistry};

#[test]
fn test_preference_order() {
    // X11-accelerated sink first, generic fallbacks after
    assert_eq!(
        SINK_PREFERENCE,
        &["xvimagesink", "ximagesink", "autovideosink", "qtsink"]
    );
}

#[test]
fn test_select_returns_earliest_recognized_preference() {
    let registry = FixedRegistry::new(["ximagesink", "autovideosink"]);
    assert_eq!(sink::select_from(None, &registry), "ximagesink");

    let registry = FixedRegistry::new(["autovideosink", "xvimagesink"]);
    assert_eq!(sink::select_from(None, &registry), "xvimagesink");
}

#[test]
fn test_select_honors_recognized_override() {
    let registry = FixedRegistry::new(["qtsink", "xvimagesink"]);
    assert_eq!(sink::select_from(Some("qtsink"), &registry), "qtsink");
}

#[test]
fn test_select_falls_back_past_unrecognized_override() {
    let registry = FixedRegistry::new(["xvimagesink", "autovideosink"]);
    assert_eq!(sink::select_from(Some("nosuchsink"), &registry), "xvimagesink");
}

#[test]
fn test_select_total_with_empty_registry() {
    let registry = FixedRegistry::default();
    assert_eq!(sink::select_from(None, &registry), FALLBACK_SINK);
    assert_eq!(sink::select_from(Some("nosuchsink"), &registry), FALLBACK_SINK);
}

#[test]
fn test_candidates_override_listed_first() {
    let registry = FixedRegistry::new(["qtsink", "xvimagesink"]);
    assert_eq!(
        sink::candidates_from(Some("qtsink"), &registry),
        vec!["qtsink", "xvimagesink"]
    );
}

#[test]
fn test_candidates_keep_failed_override_for_diagnosis() {
    let registry = FixedRegistry::new(["xvimagesink", "autovideosink"]);
    assert_eq!(
        sink::candidates_from(Some("nosuchsink"), &registry),
        vec!["nosuchsink", "xvimagesink", "autovideosink"]
    );
}

#[test]
fn test_candidates_never_empty() {
    let registry = FixedRegistry::default();
    assert_eq!(sink::candidates_from(None, &registry), vec![FALLBACK_SINK]);

    // A lone unrecognized override still yields a non-empty list
    assert_eq!(
        sink::candidates_from(Some("nosuchsink"), &registry),
        vec!["nosuchsink"]
    );
}

#[test]
fn test_candidates_skip_duplicate_of_override() {
    let registry = FixedRegistry::new(["xvimagesink", "ximagesink"]);
    assert_eq!(
        sink::candidates_from(Some("xvimagesink"), &registry),
        vec!["xvimagesink", "ximagesink"]
    );
}

#[test]
fn test_selection_is_pure() {
    let registry = FixedRegistry::new(["ximagesink"]);
    let first = sink::select_from(None, &registry);
    for _ in 0..10 {
        assert_eq!(sink::select_from(None, &registry), first);
        assert_eq!(
            sink::candidates_from(None, &registry),
            vec!["ximagesink".to_string()]
        );
    }
}

#[test]
fn test_permissive_registry_returns_preference_as_is() {
    // Backend absent at build time: the registry check is skipped
    let registry = PermissiveRegistry;
    assert_eq!(sink::select_from(None, &registry), SINK_PREFERENCE[0]);
    assert_eq!(sink::candidates_from(None, &registry), SINK_PREFERENCE);
}

#[test]
fn test_env_override_read() {
    let registry = PermissiveRegistry;
    std::env::set_var(SINK_ENV_VAR, "qtsink");
    assert_eq!(sink::select(&registry), "qtsink");
    let candidates = sink::candidates(&registry);
    assert_eq!(candidates.first().map(String::as_str), Some("qtsink"));
    std::env::remove_var(SINK_ENV_VAR);

    // Empty value is treated as unset
    std::env::set_var(SINK_ENV_VAR, "");
    assert_eq!(sink::select(&registry), SINK_PREFERENCE[0]);
    std::env::remove_var(SINK_ENV_VAR);
}

#[test]
fn test_fixed_registry_lookup() {
    let registry = FixedRegistry::new(["xvimagesink"]);
    assert!(registry.contains("xvimagesink"));
    assert!(!registry.contains("ximagesink"));
}

#[cfg(all(target_os = "linux", feature = "gstreamer"))]
mod gst {
    use super::super::pipeline::{build_description, pick_record_encoder, CapturePipeline};
    use super::super::{queue, FixedRegistry, GstElementRegistry};
    use crate::config::VideoConfig;

    #[test]
    fn test_pick_record_encoder_prefers_hardware() {
        let registry = FixedRegistry::new(["x264enc", "vaapih264enc"]);
        assert_eq!(pick_record_encoder(&registry), Some("vaapih264enc"));

        let registry = FixedRegistry::new(["x264enc"]);
        assert_eq!(pick_record_encoder(&registry), Some("x264enc"));

        let registry = FixedRegistry::default();
        assert_eq!(pick_record_encoder(&registry), None);
    }

    #[test]
    fn test_description_names_both_queues_when_recording() {
        let config = VideoConfig {
            recording_path: Some("/tmp/capture.mp4".to_string()),
            ..Default::default()
        };
        let description = build_description(&config, "xvimagesink", Some("x264enc"));
        assert!(description.contains("tee name=t"));
        assert!(description.contains("queue name=display-queue"));
        assert!(description.contains("queue name=recording-queue"));
        assert!(description.contains("x264enc ! mp4mux ! filesink location=/tmp/capture.mp4"));
    }

    #[test]
    fn test_description_display_only_without_recording() {
        let config = VideoConfig::default();
        let description = build_description(&config, "autovideosink", None);
        assert!(description.contains("v4l2src device=/dev/video0"));
        assert!(description.contains("queue name=display-queue"));
        assert!(description.ends_with("autovideosink"));
        assert!(!description.contains("recording-queue"));
    }

    #[test]
    fn test_queue_tuning_is_idempotent() {
        if gstreamer::init().is_err() {
            return; // GStreamer not available, skip test
        }

        let pipeline = gstreamer::Pipeline::new();
        let display = match gstreamer::ElementFactory::make("queue")
            .name(queue::DISPLAY_QUEUE)
            .build()
        {
            Ok(e) => e,
            Err(_) => return, // queue plugin missing
        };
        let recording = gstreamer::ElementFactory::make("queue")
            .name(queue::RECORDING_QUEUE)
            .build()
            .unwrap();
        pipeline.add_many([&display, &recording]).unwrap();

        use gstreamer::prelude::*;
        let snapshot = |e: &gstreamer::Element| {
            (
                e.property::<u32>("max-size-buffers"),
                e.property::<u64>("max-size-time"),
            )
        };

        queue::configure(&pipeline);
        assert_eq!(snapshot(&display), (5, 100_000_000));
        assert_eq!(snapshot(&recording), (10, 500_000_000));

        let first = (snapshot(&display), snapshot(&recording));
        queue::configure(&pipeline);
        assert_eq!((snapshot(&display), snapshot(&recording)), first);
    }

    #[test]
    fn test_queue_tuning_tolerates_missing_queues() {
        if gstreamer::init().is_err() {
            return;
        }
        let pipeline = gstreamer::Pipeline::new();
        // Must not panic or error with neither queue present
        queue::configure(&pipeline);
        queue::configure(&pipeline);
    }

    /// Smoke test: construct a pipeline against the real registry.
    ///
    /// Ignored by default because it requires GStreamer plugins and a
    /// /dev/video0 capture node.
    #[test]
    #[ignore = "Requires GStreamer plugins and a V4L2 capture device"]
    fn test_capture_pipeline_smoke() {
        if gstreamer::init().is_err() {
            return;
        }
        let config = VideoConfig::default();
        let registry = GstElementRegistry;
        match CapturePipeline::new(&config, &registry) {
            Ok(mut pipeline) => {
                pipeline.start().expect("Failed to start pipeline");
                std::thread::sleep(std::time::Duration::from_millis(500));
                let summary = pipeline.stop().expect("Failed to stop pipeline");
                assert!(!summary.sink.is_empty());
            }
            Err(e) => println!("Skipping: {}", e),
        }
    }
}
