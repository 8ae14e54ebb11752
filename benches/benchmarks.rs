use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use curation::*;

const LABELS: [&str; 4] = ["PER", "ORG", "LOC", "MISC"];

fn typesystem() -> Arc<TypeSystem> {
    Arc::new(
        TypeSystem::new()
            .with_type(AnnotationType::new("Span").with_field("label", FieldKind::String))
            .unwrap()
            .with_type(
                AnnotationType::new("Token")
                    .with_field("form", FieldKind::String)
                    .with_field("index", FieldKind::Integer),
            )
            .unwrap()
            .with_type(
                AnnotationType::new("Dependency")
                    .with_field("relation", FieldKind::String)
                    .with_field("governor", FieldKind::Composite("Token".into())),
            )
            .unwrap(),
    )
}

/// Builds a version with `size` spans and dependencies, every `skew`th label deviates per annotator
fn version(typesystem: &Arc<TypeSystem>, annotator: usize, size: usize, skew: usize) -> AnnotatorVersion {
    let mut version = AnnotatorVersion::new(format!("annotator{}", annotator), typesystem.clone());
    for i in 0..size {
        let begin = i * 10;
        let label = if i % skew == annotator % skew {
            LABELS[(i + annotator) % LABELS.len()]
        } else {
            LABELS[i % LABELS.len()]
        };
        version
            .add_record(AnnotationRecordBuilder::new("Span", begin, begin + 5).with_value("label", label))
            .unwrap();
        let governor = version
            .add_record(
                AnnotationRecordBuilder::new("Token", begin, begin + 5)
                    .with_value("form", format!("w{}", i))
                    .with_value("index", i),
            )
            .unwrap();
        version
            .add_record(
                AnnotationRecordBuilder::new("Dependency", begin, begin + 5)
                    .with_value("relation", label)
                    .with_nested("governor", governor),
            )
            .unwrap();
    }
    version
}

pub fn bench_diff(c: &mut Criterion) {
    let typesystem = typesystem();
    let size = 1000;

    let mut group = c.benchmark_group("compute_diff");
    for annotators in [2, 4, 8] {
        let versions: Vec<_> = (0..annotators)
            .map(|annotator| version(&typesystem, annotator, size, 7))
            .collect();
        let versionset = VersionSet::from_versions(versions.iter()).unwrap();
        group.throughput(Throughput::Elements((size * annotators) as u64));
        group.bench_with_input(BenchmarkId::new("spans", annotators), &versionset, |b, versionset| {
            b.iter(|| {
                let diff = compute_diff(black_box(&["Span"]), versionset, 0, size * 10).unwrap();
                assert!(!diff.is_empty());
            })
        });
        group.bench_with_input(
            BenchmarkId::new("all_types", annotators),
            &versionset,
            |b, versionset| {
                b.iter(|| {
                    let diff = compute_diff(
                        black_box(&["Span", "Token", "Dependency"]),
                        versionset,
                        0,
                        size * 10,
                    )
                    .unwrap();
                    assert!(!diff.is_empty());
                })
            },
        );
    }
    group.finish();

    let versions: Vec<_> = (0..4).map(|annotator| version(&typesystem, annotator, size, 7)).collect();
    let versionset = VersionSet::from_versions(versions.iter()).unwrap();
    let diff = compute_diff(&["Span", "Dependency"], &versionset, 0, size * 10).unwrap();

    c.bench_function("build_options", |b| {
        b.iter(|| {
            let options = build_options(black_box(&diff));
            assert_eq!(options.len(), diff.positions().len());
        })
    });

    c.bench_function("classify_summary", |b| {
        let decisions = std::collections::BTreeMap::new();
        b.iter(|| {
            let summary = Classifier::new(black_box(&diff)).summary(&decisions);
            assert!(!summary.is_empty());
        })
    });
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
