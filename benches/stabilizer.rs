use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use seesay::pipeline::{DetectionStabilizer, format_announcement};
use seesay::vision::nms::postprocess;
use seesay::vision::{BoundingBox, Candidate, DetectionSet, LabelMap};
use std::hint::black_box;
use std::num::NonZeroUsize;

const LABELS: &[&str] = &[
    "person", "bicycle", "car", "motorbike", "bus", "truck", "dog", "cat", "chair", "bottle",
];

/// A frame's worth of label sets, cycling so some labels persist and some flicker.
fn label_sets(count: usize) -> Vec<DetectionSet> {
    (0..count)
        .map(|i| {
            LABELS
                .iter()
                .enumerate()
                .filter(|(j, _)| *j < 3 || (i + j) % 3 != 0)
                .map(|(_, label)| *label)
                .collect()
        })
        .collect()
}

/// Overlapping boxes per class, as a raw YOLO head would report them.
fn raw_candidates(per_class: usize) -> Vec<Candidate> {
    (0..LABELS.len())
        .flat_map(|class_id| {
            (0..per_class).map(move |k| {
                let offset = k as f32 * 2.0;
                Candidate::new(
                    BoundingBox::new(class_id as f32 * 50.0 + offset, 40.0 + offset, 80.0, 120.0),
                    0.3 + (k as f32 / per_class as f32) * 0.65,
                    class_id,
                )
            })
        })
        .collect()
}

fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("stabilizer_observe");
    let sets = label_sets(64);

    for window in [1usize, 3, 10] {
        let window = NonZeroUsize::new(window).unwrap_or(NonZeroUsize::MIN);
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &window| {
            b.iter(|| {
                let mut stabilizer = DetectionStabilizer::new(window);
                for set in &sets {
                    stabilizer.observe(set.clone());
                    black_box(stabilizer.stable_objects());
                }
            })
        });
    }
    group.finish();
}

fn bench_postprocess(c: &mut Criterion) {
    let labels = LabelMap::from_labels(LABELS.iter().copied());
    let mut group = c.benchmark_group("postprocess");

    for per_class in [4usize, 16, 64] {
        let candidates = raw_candidates(per_class);
        group.bench_with_input(
            BenchmarkId::from_parameter(candidates.len()),
            &candidates,
            |b, candidates| {
                b.iter(|| black_box(postprocess(candidates.clone(), 0.6, 0.45, &labels)))
            },
        );
    }
    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let objects: DetectionSet = LABELS.iter().copied().collect();
    let max = NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN);
    c.bench_function("format_announcement", |b| {
        b.iter(|| black_box(format_announcement("Detected", black_box(&objects), max)))
    });
}

criterion_group!(benches, bench_observe, bench_postprocess, bench_format);
criterion_main!(benches);
