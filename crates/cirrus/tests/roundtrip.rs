//! Round trips through every version and content mode.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use cirrus::core::BoxedFormatter;
use cirrus::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};

const EXTENSION: &str = "comexampleextension1";
const OPAQUE: &str = "comexampleopaque";
const EXPIRY: &str = "comexampleexpiry";
const FLAG: &str = "comexampleflag";
const COUNT: &str = "comexamplecount";

fn version() -> impl Strategy<Value = SpecVersion> {
    prop::sample::select(SpecVersion::ALL.to_vec())
}

fn mode() -> impl Strategy<Value = ContentMode> {
    prop_oneof![Just(ContentMode::Structured), Just(ContentMode::Binary)]
}

fn time() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1000).prop_map(|(secs, millis)| {
        Utc.timestamp_opt(secs, millis * 1_000_000).unwrap()
    })
}

fn source() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "/src",
        "https://example.com/events",
        "urn:example:source",
    ])
}

prop_compose! {
    fn event()(
        version in version(),
        id in "[A-Za-z0-9-]{1,16}",
        event_type in "[a-z]{1,10}(\\.[a-z]{1,10}){0,3}",
        source in source(),
        subject in proptest::option::of("[a-z0-9]{1,8}"),
        time in proptest::option::of(time()),
        extension in proptest::option::of("[a-z]{1,8}"),
        opaque in proptest::option::of(any::<i32>()),
        expiry in proptest::option::of(time()),
        flag in proptest::option::of(any::<bool>()),
        count in proptest::option::of(any::<i32>()),
        payload in proptest::collection::vec(any::<u8>(), 0..32),
    ) -> CloudEvent {
        let mut builder = CloudEvent::builder(version)
            .id(id)
            .event_type(event_type)
            .source(source)
            .data_content_type("application/octet-stream")
            .data(Data::Binary(payload));
        if let Some(subject) = subject {
            builder = builder.subject(subject);
        }
        if let Some(time) = time {
            builder = builder.time(time);
        }
        if let Some(value) = extension {
            builder = builder.attribute(EXTENSION, value);
        }
        if let Some(k) = opaque {
            builder = builder.attribute(OPAQUE, AttributeValue::Opaque(json!({"k": k})));
        }
        if let Some(expiry) = expiry {
            builder = builder.attribute(EXPIRY, expiry);
        }
        if let Some(flag) = flag {
            builder = builder.attribute(FLAG, flag);
        }
        if let Some(count) = count {
            builder = builder.attribute(COUNT, count);
        }
        builder.build().unwrap()
    }
}

fn byte_codec() -> MessageCodec {
    let formatter: BoxedFormatter = Arc::new(JsonFormatter::<Vec<u8>>::new());
    MessageCodec::new().with_formatter(formatter)
}

proptest! {
    #[test]
    fn test_message_round_trip(event in event(), mode in mode()) {
        let codec = byte_codec();
        let message = codec.to_message(&event, mode).unwrap();
        prop_assert!(codec.is_cloud_event(&message));
        prop_assert_eq!(message.message_id.as_deref(), event.id());

        let decoded = codec.to_cloud_event(&message, &[]).unwrap();
        prop_assert_eq!(decoded, event);
    }

    #[test]
    fn test_structured_json_payload_round_trip(
        version in version(),
        n in any::<i32>(),
        label in "[a-z ]{0,12}",
    ) {
        let event = CloudEvent::builder(version)
            .id("1")
            .event_type("com.example.test")
            .source("/src")
            .data_content_type("application/json")
            .data(json!({"n": n, "label": label}))
            .build()
            .unwrap();

        let formatter = JsonFormatter::<Value>::new();
        let (body, content_type) = formatter.encode_structured(&event).unwrap();
        prop_assert_eq!(content_type.media_type(), "application/cloudevents+json");

        let decoded = formatter.decode_structured(&body, &[]).unwrap();
        prop_assert_eq!(decoded, event);
    }
}

#[test]
fn test_time_offset_is_normalized() {
    let body = br#"{
        "specversion": "1.0",
        "id": "1",
        "type": "t",
        "source": "/s",
        "time": "2018-04-05T19:31:00+02:00"
    }"#;
    let event = JsonFormatter::<Value>::new().decode(body, &[]).unwrap();

    let expected: DateTime<Utc> = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2018, 4, 5, 19, 31, 0)
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(event.time(), Some(&expected));

    let reencoded: Value = serde_json::from_slice(&JsonFormatter::<Value>::new().encode(&event).unwrap()).unwrap();
    assert_eq!(reencoded["time"], "2018-04-05T17:31:00Z");
}

#[test]
fn test_version_changes_rename_roles() {
    let mut event = CloudEvent::builder(SpecVersion::V1_0)
        .id("1")
        .event_type("t")
        .source("/s")
        .data_content_type("text/plain")
        .build()
        .unwrap();
    event.set_spec_version(SpecVersion::V0_1).unwrap();

    let message = MessageCodec::new()
        .to_message(&event, ContentMode::Structured)
        .unwrap();
    let document: Value = serde_json::from_slice(&message.body).unwrap();
    assert_eq!(document["cloudEventsVersion"], "0.1");
    assert_eq!(document["eventID"], "1");
    assert_eq!(document["eventType"], "t");
    assert_eq!(document["contentType"], "text/plain");
}
