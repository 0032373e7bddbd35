use seesay::pipeline::{
    AnnouncerConfig, Pipeline, PipelineConfig, PipelineCoordinator, QuitSignal, RunEnd,
    StepOutcome, quit_signal,
};
use seesay::speech::MockSpeechEngine;
use seesay::vision::{
    BoundingBox, Candidate, CollectorRenderer, LabelMap, MockDetector, MockFrameSource,
    SidecarDetector,
};
use std::io::Cursor;
use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PERSON: usize = 0;

fn labels() -> LabelMap {
    LabelMap::parse("person\nbicycle\ncar\n")
}

fn person() -> Candidate {
    Candidate::new(BoundingBox::new(100.0, 80.0, 120.0, 300.0), 0.92, PERSON)
}

fn every_third_frame() -> PipelineConfig {
    PipelineConfig {
        skip_interval: NonZeroU64::new(3).unwrap(),
        window: NonZeroUsize::new(3).unwrap(),
        ..Default::default()
    }
}

fn start_with(
    config: PipelineConfig,
    frames: u64,
    detector: MockDetector,
    speech: MockSpeechEngine,
) -> PipelineCoordinator {
    Pipeline::new(config)
        .start(
            Box::new(MockFrameSource::new(frames)),
            Box::new(detector),
            Box::new(CollectorRenderer::new()),
            Arc::new(speech),
            labels(),
            QuitSignal::never(),
        )
        .unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_announces_once_when_window_fills() {
    let speech = MockSpeechEngine::new();
    let mut pipeline = start_with(
        every_third_frame(),
        9,
        MockDetector::new().with_fallback(vec![person()]),
        speech.clone(),
    );

    let mut announced_at = Vec::new();
    for _ in 0..9 {
        match pipeline.step().unwrap() {
            StepOutcome::Frame(report) => {
                if let Some(announcement) = report.announcement {
                    assert!(announcement.accepted);
                    announced_at.push((report.frame_index, announcement.text));
                }
            }
            StepOutcome::Finished(end) => panic!("Finished early: {:?}", end),
        }
    }

    assert_eq!(announced_at, vec![(9, "Detected: person".to_string())]);
    assert_eq!(pipeline.stats().announcements_accepted, 1);

    assert!(wait_for(|| speech.spoken() == vec!["Detected: person"]));
    pipeline.shutdown();
    assert_eq!(speech.call_count(), 1);
}

#[test]
fn test_run_summary_counts_frames_and_announcements() {
    let summary = start_with(
        every_third_frame(),
        9,
        MockDetector::new().with_fallback(vec![person()]),
        MockSpeechEngine::new(),
    )
    .run()
    .unwrap();

    assert_eq!(summary.end, RunEnd::EndOfStream);
    assert_eq!(summary.stats.frames, 9);
    assert_eq!(summary.stats.processed_frames, 3);
    assert_eq!(summary.stats.announcements_accepted, 1);
    assert_eq!(summary.stats.announcements_dropped, 0);
    assert_eq!(
        summary.stats.last_announcement.as_deref(),
        Some("Detected: person")
    );
}

#[test]
fn test_sidecar_protocol_drives_pipeline() {
    let reply = "{\"detections\":[{\"box\":[100,80,120,300],\"confidence\":0.92,\"class_id\":0},\
                 {\"box\":[104,82,118,296],\"confidence\":0.71,\"class_id\":0},\
                 {\"box\":[400,50,60,40],\"confidence\":0.35,\"class_id\":2}]}\n";
    let detector = SidecarDetector::from_streams(
        Cursor::new(reply.repeat(3).into_bytes()),
        std::io::sink(),
        320,
    );

    let summary = Pipeline::new(every_third_frame())
        .start(
            Box::new(MockFrameSource::new(9)),
            Box::new(detector),
            Box::new(CollectorRenderer::new()),
            Arc::new(MockSpeechEngine::new()),
            labels(),
            QuitSignal::never(),
        )
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.stats.detector_failures, 0);
    assert_eq!(
        summary.stats.last_announcement.as_deref(),
        Some("Detected: person")
    );
}

#[test]
fn test_slow_speech_drops_instead_of_blocking() {
    let config = PipelineConfig {
        skip_interval: NonZeroU64::new(1).unwrap(),
        window: NonZeroUsize::new(1).unwrap(),
        announcer: AnnouncerConfig {
            capacity: NonZeroUsize::new(1).unwrap(),
            shutdown_timeout: Duration::from_secs(2),
            ..Default::default()
        },
        ..Default::default()
    };
    let speech = MockSpeechEngine::new().with_delay(Duration::from_millis(300));

    let started = Instant::now();
    let summary = start_with(
        config,
        5,
        MockDetector::new().with_fallback(vec![person()]),
        speech,
    )
    .run()
    .unwrap();

    let stats = summary.stats;
    assert_eq!(stats.announcements_accepted + stats.announcements_dropped, 5);
    assert!(stats.announcements_dropped >= 3);
    // Only the in-flight utterance is waited for at shutdown.
    assert!(started.elapsed() < Duration::from_millis(1_500));
}

#[test]
fn test_quit_from_another_thread() {
    let (trigger, quit) = quit_signal();
    let source = MockFrameSource::new(u64::MAX);
    let released = source.released_flag();
    let renderer = CollectorRenderer::new();

    let coordinator = Pipeline::new(every_third_frame())
        .start(
            Box::new(source),
            Box::new(MockDetector::new()),
            Box::new(renderer.clone()),
            Arc::new(MockSpeechEngine::new()),
            labels(),
            quit,
        )
        .unwrap();
    let handle = thread::spawn(move || coordinator.run());

    thread::sleep(Duration::from_millis(50));
    trigger.trigger();
    let summary = handle.join().unwrap().unwrap();

    assert_eq!(summary.end, RunEnd::Quit);
    assert!(summary.stats.frames > 0);
    assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    assert!(renderer.is_closed());
}

#[test]
fn test_camera_failure_ends_run_with_error() {
    let result = Pipeline::new(every_third_frame())
        .start(
            Box::new(MockFrameSource::new(100).with_failure_after(4)),
            Box::new(MockDetector::new()),
            Box::new(CollectorRenderer::new()),
            Arc::new(MockSpeechEngine::new()),
            labels(),
            QuitSignal::never(),
        )
        .unwrap()
        .run();

    assert!(matches!(
        result,
        Err(seesay::SeesayError::FrameRead { .. })
    ));
}
