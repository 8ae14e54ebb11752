#[cfg(test)]
use crate::*;

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
fn typesystem() -> Arc<TypeSystem> {
    Arc::new(
        TypeSystem::new()
            .with_type(AnnotationType::new("Span").with_field("label", FieldKind::String))
            .unwrap()
            .with_type(
                AnnotationType::new("Token")
                    .with_field("label", FieldKind::String)
                    .with_field("index", FieldKind::Integer),
            )
            .unwrap()
            .with_type(
                AnnotationType::new("Node")
                    .with_field("label", FieldKind::String)
                    .with_field("next", FieldKind::Composite("Node".into())),
            )
            .unwrap()
            .with_type(AnnotationType::new("Score").with_field("value", FieldKind::Float))
            .unwrap()
            .with_type(
                AnnotationType::new("Root")
                    .with_field("left", FieldKind::Composite("Node".into()))
                    .with_field("right", FieldKind::Composite("Node".into())),
            )
            .unwrap(),
    )
}

#[cfg(test)]
fn first(version: &AnnotatorVersion) -> ResultItem<'_, AnnotationRecord> {
    version.record(RecordHandle::new(0)).unwrap()
}

#[cfg(test)]
fn span(annotator: &str, ts: &Arc<TypeSystem>, label: Option<&str>) -> AnnotatorVersion {
    let mut builder = AnnotationRecordBuilder::new("Span", 0, 5);
    if let Some(label) = label {
        builder = builder.with_value("label", label);
    }
    AnnotatorVersion::new(annotator, ts.clone())
        .with_record(builder)
        .unwrap()
}

/// Builds a version with a chain of two Nodes, the outer one (handle 1) pointing at the inner one (handle 0)
#[cfg(test)]
fn chain(annotator: &str, ts: &Arc<TypeSystem>, outer: &str, inner: Option<&str>) -> AnnotatorVersion {
    let mut version = AnnotatorVersion::new(annotator, ts.clone());
    let mut builder = AnnotationRecordBuilder::new("Node", 0, 5).with_value("label", outer);
    if let Some(inner) = inner {
        let inner = version
            .add_record(AnnotationRecordBuilder::new("Node", 0, 5).with_value("label", inner))
            .unwrap();
        builder = builder.with_nested("next", inner);
    } else {
        version
            .add_record(AnnotationRecordBuilder::new("Token", 0, 5).with_value("label", "pad"))
            .unwrap();
    }
    version.add_record(builder).unwrap();
    version
}

#[test]
fn span_covered_by() {
    let span = Span::new(3, 7);
    assert!(span.covered_by(0, 10));
    assert!(span.covered_by(3, 7));
    assert!(!span.covered_by(4, 10), "overlapping is not covered");
    assert!(!span.covered_by(0, 6));
    assert_eq!(span.len(), 4);
    assert_eq!(span.to_string(), "[3,7)");
}

#[test]
fn fieldvalue_fits() {
    assert!(FieldValue::Null.fits(&FieldKind::Integer));
    assert!(FieldValue::Null.fits(&FieldKind::Composite("Node".into())));
    assert!(FieldValue::from("x").fits(&FieldKind::String));
    assert!(!FieldValue::from("x").fits(&FieldKind::Integer));
    assert!(FieldValue::from(3).fits(&FieldKind::Integer));
    assert!(!FieldValue::from(3.0).fits(&FieldKind::Integer));
    assert!(FieldValue::Record(RecordHandle::new(0)).fits(&FieldKind::Composite("Node".into())));
}

#[test]
fn config_from_json() {
    let config = Config::from_json_str(r#"{ "debug": true, "parallel": false }"#).unwrap();
    assert!(config.debug());
    assert!(!config.parallel());
    assert!(!config.generate_ids(), "absent fields take their default");
}

#[test]
fn config_from_json_invalid() {
    let err = Config::from_json_str(r#"{ "debug": "yes" }"#).unwrap_err();
    match err {
        CurationError::JsonError(_, path, _) => assert_eq!(path, "debug"),
        e => panic!("unexpected error {}", e),
    }
}

#[test]
fn typesystem_duplicate_type() {
    let mut ts = TypeSystem::new();
    ts.add_type(AnnotationType::new("Span").with_field("label", FieldKind::String))
        .unwrap();
    //identical definition returns the existing handle
    assert!(ts
        .add_type(AnnotationType::new("Span").with_field("label", FieldKind::String))
        .is_ok());
    assert_eq!(ts.len(), 1);
    assert!(matches!(
        ts.add_type(AnnotationType::new("Span").with_field("label", FieldKind::Integer)),
        Err(CurationError::DuplicateIdError(..))
    ));
}

#[test]
fn typesystem_validate() {
    let ts = TypeSystem::new()
        .with_type(AnnotationType::new("Relation").with_field("governor", FieldKind::Composite("Token".into())))
        .unwrap();
    assert!(matches!(ts.validate(), Err(CurationError::SchemaError(..))));
    assert!(typesystem().validate().is_ok());
}

#[test]
fn compare_reflexive() {
    let ts = typesystem();
    let a = span("a", &ts, Some("PER"));
    let verdict = compare(first(&a), first(&a)).unwrap();
    assert!(verdict.is_equal());

    //even for types the comparator can not otherwise handle
    let s = AnnotatorVersion::new("a", ts.clone())
        .with_record(AnnotationRecordBuilder::new("Score", 0, 5).with_value("value", 0.5))
        .unwrap();
    assert!(compare(first(&s), first(&s)).unwrap().is_equal());
}

#[test]
fn compare_equal_strings() {
    let ts = typesystem();
    let a = span("a", &ts, Some("PER"));
    let b = span("b", &ts, Some("PER"));
    assert!(compare(first(&a), first(&b)).unwrap().is_equal());
}

#[test]
fn compare_different_strings_marks_both() {
    let ts = typesystem();
    let a = span("a", &ts, Some("PER"));
    let b = span("b", &ts, Some("LOC"));
    let verdict = compare(first(&a), first(&b)).unwrap();
    assert!(!verdict.is_equal());
    assert_eq!(verdict.left().len(), 1);
    assert!(verdict.left().contains(&RecordHandle::new(0)));
    assert!(verdict.right().contains(&RecordHandle::new(0)));
}

#[test]
fn compare_null_strings() {
    let ts = typesystem();
    let a = span("a", &ts, None);
    let b = span("b", &ts, None);
    let c = span("c", &ts, Some("PER"));
    assert!(compare(first(&a), first(&b)).unwrap().is_equal());
    assert!(!compare(first(&a), first(&c)).unwrap().is_equal());
    assert!(!compare(first(&c), first(&a)).unwrap().is_equal());
}

#[test]
fn compare_integers() {
    let ts = typesystem();
    let token = |annotator: &str, index: i64| {
        AnnotatorVersion::new(annotator, ts.clone())
            .with_record(
                AnnotationRecordBuilder::new("Token", 0, 5)
                    .with_value("label", "x")
                    .with_value("index", index),
            )
            .unwrap()
    };
    let (a, b, c) = (token("a", 1), token("b", 1), token("c", 2));
    assert!(compare(first(&a), first(&b)).unwrap().is_equal());
    let verdict = compare(first(&a), first(&c)).unwrap();
    assert!(!verdict.is_equal());
    assert_eq!(verdict.left().len(), 1);
    assert_eq!(verdict.right().len(), 1);
}

#[test]
fn compare_unsupported_kind() {
    let ts = typesystem();
    let score = |annotator: &str| {
        AnnotatorVersion::new(annotator, ts.clone())
            .with_record(AnnotationRecordBuilder::new("Score", 0, 5).with_value("value", 0.5))
            .unwrap()
    };
    let (a, b) = (score("a"), score("b"));
    let err = compare(first(&a), first(&b)).unwrap_err();
    assert!(err.is_comparison_error());
    match err {
        CurationError::ComparisonError(typename, field, msg) => {
            assert_eq!(typename, "Score");
            assert_eq!(field, "value");
            assert_eq!(msg, "range not yet supported");
        }
        e => panic!("unexpected error {}", e),
    }
}

#[test]
fn compare_nested_difference_marks_parent() {
    let ts = typesystem();
    let a = chain("a", &ts, "outer", Some("inner"));
    let b = chain("b", &ts, "outer", Some("other"));
    let outer_a = a.record(RecordHandle::new(1)).unwrap();
    let outer_b = b.record(RecordHandle::new(1)).unwrap();
    let verdict = compare(outer_a, outer_b).unwrap();
    assert!(!verdict.is_equal());
    //inner (0) differs directly, outer (1) holds a differing descendant
    let expected = [RecordHandle::new(0), RecordHandle::new(1)];
    assert_eq!(verdict.left().iter().copied().collect::<Vec<_>>(), expected);
    assert_eq!(verdict.right().iter().copied().collect::<Vec<_>>(), expected);
}

#[test]
fn compare_nested_equal() {
    let ts = typesystem();
    let a = chain("a", &ts, "outer", Some("inner"));
    let b = chain("b", &ts, "outer", Some("inner"));
    let verdict = compare(
        a.record(RecordHandle::new(1)).unwrap(),
        b.record(RecordHandle::new(1)).unwrap(),
    )
    .unwrap();
    assert!(verdict.is_equal());
}

#[test]
fn compare_composite_absent_on_one_side() {
    let ts = typesystem();
    let a = chain("a", &ts, "outer", Some("inner"));
    let b = chain("b", &ts, "outer", None);
    let outer_a = a.record(RecordHandle::new(1)).unwrap();
    let outer_b = b.record(RecordHandle::new(1)).unwrap();
    let verdict = compare(outer_a, outer_b).unwrap();
    assert!(!verdict.is_equal());
    //the difference is attributed to the side that has the nested record
    assert_eq!(verdict.left().len(), 2);
    assert!(verdict.right().is_empty());

    let verdict = compare(outer_b, outer_a).unwrap();
    assert!(verdict.left().is_empty());
    assert_eq!(verdict.right().len(), 2);
}

#[test]
fn compare_type_mismatch_flags_subtrees() {
    let ts = typesystem();
    let a = chain("a", &ts, "outer", Some("inner"));
    let b = span("b", &ts, Some("outer"));
    let verdict = compare(a.record(RecordHandle::new(1)).unwrap(), first(&b)).unwrap();
    assert!(!verdict.is_equal());
    assert_eq!(verdict.left().len(), 2, "root and nested record");
    assert_eq!(verdict.right().len(), 1);
}

#[test]
fn compare_symmetric_verdict() {
    let ts = typesystem();
    let versions = [
        chain("a", &ts, "outer", Some("inner")),
        chain("b", &ts, "outer", Some("other")),
        chain("c", &ts, "outer", None),
        chain("d", &ts, "outer", Some("inner")),
    ];
    for x in versions.iter() {
        for y in versions.iter() {
            let rx = x.record(RecordHandle::new(1)).unwrap();
            let ry = y.record(RecordHandle::new(1)).unwrap();
            assert_eq!(
                compare(rx, ry).unwrap().is_equal(),
                compare(ry, rx).unwrap().is_equal()
            );
        }
    }
}

/// Builds a root (3) with two mid nodes (1, 2) that share a single leaf (0)
#[cfg(test)]
fn shared_leaf(annotator: &str, ts: &Arc<TypeSystem>, leaf: &str) -> AnnotatorVersion {
    let mut version = AnnotatorVersion::new(annotator, ts.clone());
    let leaf = version
        .add_record(AnnotationRecordBuilder::new("Node", 0, 5).with_value("label", leaf))
        .unwrap();
    let mut mids = Vec::new();
    for _ in 0..2 {
        mids.push(
            version
                .add_record(
                    AnnotationRecordBuilder::new("Node", 0, 5)
                        .with_value("label", "mid")
                        .with_nested("next", leaf),
                )
                .unwrap(),
        );
    }
    version
        .add_record(
            AnnotationRecordBuilder::new("Root", 0, 5)
                .with_nested("left", mids[0])
                .with_nested("right", mids[1]),
        )
        .unwrap();
    version
}

#[test]
fn compare_shared_nested_record_marks_every_parent() {
    let ts = typesystem();
    let a = shared_leaf("a", &ts, "PER");
    let b = shared_leaf("b", &ts, "LOC");
    let verdict = compare(
        a.record(RecordHandle::new(3)).unwrap(),
        b.record(RecordHandle::new(3)).unwrap(),
    )
    .unwrap();
    //both mid nodes hold the differing leaf
    let expected: Vec<_> = (0..4).map(RecordHandle::new).collect();
    assert_eq!(verdict.left().iter().copied().collect::<Vec<_>>(), expected);
    assert_eq!(verdict.right().iter().copied().collect::<Vec<_>>(), expected);

    let c = shared_leaf("c", &ts, "PER");
    assert!(compare(
        a.record(RecordHandle::new(3)).unwrap(),
        c.record(RecordHandle::new(3)).unwrap()
    )
    .unwrap()
    .is_equal());
}

#[cfg(test)]
fn cycle(annotator: &str, ts: &Arc<TypeSystem>, second_label: &str) -> AnnotatorVersion {
    let mut version = AnnotatorVersion::new(annotator, ts.clone());
    let n0 = version
        .add_record(AnnotationRecordBuilder::new("Node", 0, 5).with_value("label", "x"))
        .unwrap();
    version
        .add_record(
            AnnotationRecordBuilder::new("Node", 0, 5)
                .with_value("label", second_label)
                .with_nested("next", n0),
        )
        .unwrap();
    //close the cycle: n0 -> n1 -> n0
    version.store_mut()[0].set_value(1, FieldValue::Record(RecordHandle::new(1)));
    version
}

#[test]
fn compare_cycle_terminates() {
    let ts = typesystem();
    let a = cycle("a", &ts, "y");
    let b = cycle("b", &ts, "y");
    let c = cycle("c", &ts, "z");
    assert!(compare(first(&a), first(&b)).unwrap().is_equal());

    let verdict = compare(first(&a), first(&c)).unwrap();
    assert!(!verdict.is_equal());
    assert_eq!(verdict.left().len(), 2);

    //subtree collection terminates as well
    let s = span("s", &ts, Some("x"));
    let verdict = compare(first(&a), first(&s)).unwrap();
    assert_eq!(verdict.left().len(), 2);
}

#[test]
fn records_in_window() {
    let ts = typesystem();
    let version = AnnotatorVersion::new("a", ts.clone())
        .with_text("Hello world, how are you?")
        .with_record(AnnotationRecordBuilder::new("Span", 0, 5))
        .unwrap()
        .with_record(AnnotationRecordBuilder::new("Span", 6, 11))
        .unwrap()
        .with_record(AnnotationRecordBuilder::new("Span", 4, 8))
        .unwrap()
        .with_record(AnnotationRecordBuilder::new("Span", 11, 11))
        .unwrap();
    let spantype = ts.resolve_type("Span").unwrap();
    let spans: Vec<Span> = version
        .records_in_window(spantype, 5, 11)
        .map(|record| record.span())
        .collect();
    assert_eq!(spans, vec![Span::new(6, 11), Span::new(11, 11)]);
    assert_eq!(version.records_in_window(spantype, 0, 25).count(), 4);
    assert_eq!(version.records_in_window(spantype, 8, 2).count(), 0);

    assert_eq!(version.records_at(spantype, Span::new(4, 8)).count(), 1);
    assert_eq!(version.records_at(spantype, Span::new(4, 9)).count(), 0);
}

#[test]
fn record_validation() {
    let ts = typesystem();
    let mut version = AnnotatorVersion::new("a", ts.clone()).with_text("Hello");
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Nonexistent", 0, 5)),
        Err(CurationError::IdNotFoundError(..))
    ));
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 4, 2)),
        Err(CurationError::InvalidOffset(..))
    ));
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 0, 6)),
        Err(CurationError::InvalidOffset(..))
    ));
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 0, 5).with_value("label", 3)),
        Err(CurationError::SchemaError(..))
    ));
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 0, 5).with_value("colour", "red")),
        Err(CurationError::SchemaError(..))
    ));
    let token = version
        .add_record(AnnotationRecordBuilder::new("Token", 0, 5))
        .unwrap();
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Node", 0, 5).with_nested("next", token)),
        Err(CurationError::SchemaError(..))
    ));
    assert_eq!(version.len(), 1);
}

#[test]
fn record_ids() {
    let ts = typesystem();
    let mut version = AnnotatorVersion::new("a", ts.clone());
    version
        .add_record(AnnotationRecordBuilder::new("Span", 0, 5).with_id("s1"))
        .unwrap();
    assert!(version.record_by_id("s1").is_some());
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 1, 5).with_id("s1")),
        Err(CurationError::DuplicateIdError(..))
    ));

    let mut version = AnnotatorVersion::new("b", ts.clone())
        .with_config(Config::default().with_generate_ids(true));
    let handle = version
        .add_record(AnnotationRecordBuilder::new("Span", 0, 5))
        .unwrap();
    let record = version.record(handle).unwrap();
    let id = record.id().expect("id must be generated");
    assert!(id.starts_with('R'));
    assert_eq!(version.record_by_id(id).map(|r| r.handle()), Some(handle));
}

#[test]
fn span_inverted_has_no_length() {
    let span = Span::new(7, 3);
    assert_eq!(span.len(), 0);
    assert!(span.is_empty());
}

#[test]
fn record_validation_against_text() {
    let ts = typesystem();
    //an empty text still bounds the records
    let mut version = AnnotatorVersion::new("a", ts.clone()).with_text("");
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 0, 1)),
        Err(CurationError::InvalidOffset(..))
    ));
    assert!(version.add_record(AnnotationRecordBuilder::new("Span", 0, 0)).is_ok());

    //text associated after the records were added
    let mut version = AnnotatorVersion::new("b", ts.clone())
        .with_record(AnnotationRecordBuilder::new("Span", 0, 11))
        .unwrap();
    assert!(matches!(
        version.set_text("Hello"),
        Err(CurationError::InvalidOffset(0, 11, _))
    ));
    assert_eq!(version.text(), None);
    version.set_text("Hello world").unwrap();
    assert_eq!(version.textlen(), 11);
    assert!(matches!(
        version.add_record(AnnotationRecordBuilder::new("Span", 6, 12)),
        Err(CurationError::InvalidOffset(..))
    ));
}
