use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use reptrack::classifier::{Centroid, CentroidModel};
use reptrack::debounce::RingBuffer;
use reptrack::{
    AngleExtractor, AngleTable, Config, Joint, Label, Landmark, ModelBundle, Pose, PoseProcessor,
};
use std::collections::BTreeMap;
use std::hint::black_box;

/// Upright pose with every joint the reference angles need.
fn standing_pose() -> Pose {
    let points = [
        (Joint::LeftShoulder, [0.2, 1.5, 0.0]),
        (Joint::RightShoulder, [-0.2, 1.5, 0.0]),
        (Joint::LeftElbow, [0.25, 1.2, 0.05]),
        (Joint::RightElbow, [-0.25, 1.2, 0.05]),
        (Joint::LeftWrist, [0.27, 0.9, 0.1]),
        (Joint::RightWrist, [-0.27, 0.9, 0.1]),
        (Joint::LeftHip, [0.15, 1.0, 0.0]),
        (Joint::RightHip, [-0.15, 1.0, 0.0]),
        (Joint::LeftKnee, [0.15, 0.5, 0.0]),
        (Joint::RightKnee, [-0.15, 0.5, 0.0]),
        (Joint::LeftAnkle, [0.15, 0.0, 0.0]),
        (Joint::RightAnkle, [-0.15, 0.0, 0.0]),
    ];
    points.into_iter().fold(Pose::new(), |pose, (joint, [x, y, z])| {
        pose.with(joint, Landmark::new(x, y, z))
    })
}

/// Bundle with `classes` exercise centroids, each with a two-stage model.
fn synthetic_bundle(classes: usize) -> ModelBundle {
    let center = |seed: usize| -> Vec<f64> {
        (0..12)
            .map(|i| ((seed * 12 + i) % 31) as f64 / 10.0)
            .collect()
    };
    let mut stages = BTreeMap::new();
    let mut exercise = Vec::new();
    for class in 0..classes {
        let label = Label::from(format!("exercise-{}", class));
        exercise.push(Centroid {
            label: label.clone(),
            center: center(class),
        });
        stages.insert(
            label,
            CentroidModel {
                centroids: vec![
                    Centroid {
                        label: Label::from("start"),
                        center: center(class + 100),
                    },
                    Centroid {
                        label: Label::from("end"),
                        center: center(class + 200),
                    },
                ],
                max_distance: None,
            },
        );
    }
    ModelBundle {
        exercise: CentroidModel {
            centroids: exercise,
            max_distance: None,
        },
        stages,
    }
}

fn bench_extraction(c: &mut Criterion) {
    let extractor = AngleExtractor::new(AngleTable::reference());
    let pose = standing_pose();
    c.bench_function("extract_reference_angles", |b| {
        b.iter(|| extractor.extract(black_box(&pose)))
    });
}

fn bench_majority(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer_majority");
    for capacity in [5usize, 120, 600] {
        let mut buffer = RingBuffer::new(capacity).unwrap_or_else(|e| panic!("{}", e));
        for i in 0..capacity {
            buffer.push(Label::from(if i % 3 == 0 { "squat" } else { "push-up" }));
        }
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &buffer, |b, buffer| {
            b.iter(|| black_box(buffer).majority().cloned())
        });
    }
    group.finish();
}

fn bench_process_pose(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_pose");
    let pose = standing_pose();
    for classes in [3usize, 20] {
        let classifiers = synthetic_bundle(classes)
            .into_classifier_set()
            .unwrap_or_else(|e| panic!("{}", e));
        let mut processor = PoseProcessor::from_config(&Config::default(), classifiers)
            .unwrap_or_else(|e| panic!("{}", e));
        group.bench_function(BenchmarkId::from_parameter(classes), |b| {
            b.iter(|| processor.process_pose(black_box(&pose)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_majority, bench_process_pose);
criterion_main!(benches);
