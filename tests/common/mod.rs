#![allow(dead_code)]
use std::sync::Arc;

use curation::*;

pub const TEXT: &str = "Barack Obama visited the United Nations in New York yesterday.";

/// Routes debug output of the library to the test output, run with `RUST_LOG=curation=debug` to see it
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn setup_typesystem() -> Result<Arc<TypeSystem>, CurationError> {
    let typesystem = TypeSystem::new()
        .with_type(AnnotationType::new("Span").with_field("label", FieldKind::String))?
        .with_type(
            AnnotationType::new("Token")
                .with_field("form", FieldKind::String)
                .with_field("index", FieldKind::Integer),
        )?
        .with_type(
            AnnotationType::new("Dependency")
                .with_field("relation", FieldKind::String)
                .with_field("governor", FieldKind::Composite("Token".into())),
        )?
        .with_type(AnnotationType::new("Sentiment").with_field("score", FieldKind::Float))?;
    typesystem.validate()?;
    Ok(Arc::new(typesystem))
}

/// Creates a version for the annotator with the given `Span` records (begin, end, label)
pub fn spans(
    typesystem: &Arc<TypeSystem>,
    annotator: &str,
    records: &[(usize, usize, &str)],
) -> Result<AnnotatorVersion, CurationError> {
    let mut version = AnnotatorVersion::new(annotator, typesystem.clone())
        .with_config(Config::default().with_debug(true))
        .with_text(TEXT);
    for (begin, end, label) in records {
        version.add_record(AnnotationRecordBuilder::new("Span", *begin, *end).with_value("label", *label))?;
    }
    Ok(version)
}

/// Adds a dependency at the span of the governor token, returns the handle of the dependency
pub fn add_dependency(
    version: &mut AnnotatorVersion,
    begin: usize,
    end: usize,
    form: &str,
    relation: &str,
) -> Result<RecordHandle, CurationError> {
    let governor = version.add_record(
        AnnotationRecordBuilder::new("Token", begin, end)
            .with_value("form", form)
            .with_value("index", begin as i64),
    )?;
    version.add_record(
        AnnotationRecordBuilder::new("Dependency", begin, end)
            .with_value("relation", relation)
            .with_nested("governor", governor),
    )
}

pub fn handle(intid: usize) -> RecordHandle {
    RecordHandle::new(intid)
}
