use serde_json::json;

use super::*;

#[test]
fn source_json_round_trips_through_kind_tag() {
    let src = SequenceSource::from_json_str(
        r#"{ "kind": "pattern", "template": "/f_{index}.jpg", "start": 1, "end": 3, "pad": 2 }"#,
    )
    .unwrap();
    assert_eq!(
        src,
        SequenceSource::Pattern {
            template: "/f_{index}.jpg".to_owned(),
            start: 1,
            end: 3,
            pad: Some(2),
        }
    );
    assert_eq!(src.kind_name(), "pattern");

    let manual = SequenceSource::from_json_str(r#"{ "kind": "manual", "frames": ["/a.jpg"] }"#)
        .unwrap();
    assert_eq!(manual.kind_name(), "manual");

    let err = SequenceSource::from_json_str(r#"{ "kind": "video" }"#).unwrap_err();
    assert!(matches!(err, FlipbookError::Serde(_)));
}

#[test]
fn manifest_frames_shape() {
    let src = source_from_manifest(&json!({ "frames": ["/a.jpg", "/b.jpg"] })).unwrap();
    assert_eq!(
        src,
        SequenceSource::Manual {
            frames: vec!["/a.jpg".to_owned(), "/b.jpg".to_owned()]
        }
    );
}

#[test]
fn manifest_frames_must_all_be_strings() {
    let err = source_from_manifest(&json!({ "frames": ["/a.jpg", 3] })).unwrap_err();
    assert!(matches!(err, FlipbookError::Validation(_)));
    let err = source_from_manifest(&json!({ "frames": "/a.jpg" })).unwrap_err();
    assert!(matches!(err, FlipbookError::Validation(_)));
}

#[test]
fn manifest_pattern_defaults() {
    let src = source_from_manifest(&json!({ "pattern": "/f_{index}.png", "end": 4 })).unwrap();
    assert_eq!(
        src,
        SequenceSource::Pattern {
            template: "/f_{index}.png".to_owned(),
            start: 1,
            end: 4,
            pad: None,
        }
    );
}

#[test]
fn manifest_pattern_rejects_non_positive_or_non_integer_fields() {
    for doc in [
        json!({ "pattern": "/f_{index}.png", "start": 0, "end": 4 }),
        json!({ "pattern": "/f_{index}.png", "start": -2, "end": 4 }),
        json!({ "pattern": "/f_{index}.png", "start": 1.5, "end": 4 }),
        json!({ "pattern": "/f_{index}.png", "end": 4, "pad": 0 }),
        json!({ "pattern": "/f_{index}.png", "end": 4, "pad": "3" }),
        json!({ "pattern": "/f_{index}.png", "end": 4, "pad": 21 }),
        json!({ "pattern": "/f_{index}.png", "end": 4, "pad": 70_000 }),
        json!({ "pattern": "/f_{index}.png" }),
        json!({ "pattern": "/f_{index}.png", "end": "4" }),
        json!({ "pattern": 7, "end": 4 }),
    ] {
        let err = source_from_manifest(&doc).unwrap_err();
        assert!(matches!(err, FlipbookError::Validation(_)), "doc={doc}");
    }
}

#[test]
fn manifest_other_shapes_rejected() {
    for doc in [
        json!([]),
        json!("frames"),
        json!({}),
        json!({ "images": ["/a.jpg"] }),
    ] {
        let err = source_from_manifest(&doc).unwrap_err();
        assert!(matches!(err, FlipbookError::Validation(_)), "doc={doc}");
    }
}

#[test]
fn resolved_sequence_count_tracks_frames() {
    let seq = ResolvedSequence::new(vec!["/a".to_owned(), "/b".to_owned()]);
    assert_eq!(seq.frame_count(), seq.frames().len());
    assert!(!seq.is_empty());
    assert_eq!(seq.into_frames().len(), 2);
}
