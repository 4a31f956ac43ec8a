// Trigger event unit tests

use inkstamp::error::ProcessingError;
use inkstamp::event::S3Event;
use rstest::rstest;

#[rstest]
#[case("photo.jpg", "photo.jpg")]
#[case("my+photo.jpg", "my photo.jpg")]
#[case("dir%2Fsub%2Fa.png", "dir/sub/a.png")]
#[case("caf%C3%A9.png", "café.png")]
#[case("a%2Bb.png", "a+b.png")]
fn test_key_decoding(#[case] raw: &str, #[case] expected: &str) {
    let object = S3Event::for_object("uploads", raw).object_ref().unwrap();
    assert_eq!(object.key, expected);
}

#[test]
fn test_extra_fields_are_ignored() {
    let payload = r#"{
        "Records": [{
            "eventVersion": "2.1",
            "awsRegion": "us-east-1",
            "eventName": "ObjectCreated:Put",
            "userIdentity": {"principalId": "EXAMPLE"},
            "s3": {
                "s3SchemaVersion": "1.0",
                "bucket": {"name": "uploads", "ownerIdentity": {"principalId": "EXAMPLE"}},
                "object": {"key": "x.png", "size": 7, "eTag": "abc", "sequencer": "0A"}
            }
        }]
    }"#;
    let event = S3Event::from_json(payload).unwrap();
    assert_eq!(
        event.records[0].event_name.as_deref(),
        Some("ObjectCreated:Put")
    );
    assert_eq!(event.object_ref().unwrap().to_string(), "s3://uploads/x.png");
}

#[rstest]
#[case::not_json("nope")]
#[case::missing_s3(r#"{"Records": [{}]}"#)]
#[case::missing_key(r#"{"Records": [{"s3": {"bucket": {"name": "b"}, "object": {}}}]}"#)]
fn test_malformed_payloads(#[case] payload: &str) {
    let err = S3Event::from_json(payload).unwrap_err();
    assert!(matches!(err, ProcessingError::InvalidEvent(_)));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_empty_records_rejected_at_resolution() {
    let event = S3Event::from_json(r#"{"Records": []}"#).unwrap();
    assert!(matches!(
        event.object_ref(),
        Err(ProcessingError::InvalidEvent(_))
    ));
}
