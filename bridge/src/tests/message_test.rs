use super::*;
use crate::{errors::CodecError, message::Message};

#[rstest]
#[case(42, "hello")]
#[case(0, "")]
#[case(-7, "负数 id")]
#[case(i64::MAX, "line\nbreak \"quoted\"")]
fn round_trip(#[from(tracing_setup)] _init: (), #[case] id: i64, #[case] data: &str) {
    let msg = Message::new(id, data);
    let text = msg.encode().unwrap();
    assert_eq!(Message::decode(&text).unwrap(), msg);
    assert_eq!(Message::from_bytes(text.as_bytes()).unwrap(), msg);
}

#[test]
fn encode_uses_lowercase_fields() {
    let text = Message::new(42, "hello").encode().unwrap();
    assert_eq!(text, r#"{"id":42,"data":"hello"}"#);
}

#[test]
fn decode_accepts_capitalized_fields() {
    let msg = Message::decode(r#"{"Id":7,"Data":"This is message 1"}"#).unwrap();
    assert_eq!(msg, Message::new(7, "This is message 1"));
}

#[test]
fn decode_ignores_unknown_fields() {
    let msg = Message::decode(r#"{"id":1,"data":"x","extra":true}"#).unwrap();
    assert_eq!(msg, Message::new(1, "x"));
}

#[rstest]
#[case::empty("")]
#[case::not_json("hello")]
#[case::truncated(r#"{"id":1,"data":"x""#)]
#[case::string_id(r#"{"id":"42","data":"x"}"#)]
#[case::fractional_id(r#"{"id":4.2,"data":"x"}"#)]
#[case::null_id(r#"{"id":null,"data":"x"}"#)]
#[case::numeric_data(r#"{"id":1,"data":2}"#)]
#[case::missing_data(r#"{"id":1}"#)]
#[case::missing_id(r#"{"data":"x"}"#)]
#[case::array(r#"[1,"x"]"#)]
#[case::null("null")]
#[case::trailing(r#"{"id":1,"data":"x"} {}"#)]
fn decode_rejects_malformed(#[from(tracing_setup)] _init: (), #[case] text: &str) {
    let result = Message::decode(text);
    assert!(matches!(result, Err(CodecError::Decoding(_))), "{text}");
}

#[test]
fn from_bytes_rejects_invalid_utf8() {
    let result = Message::from_bytes(&[0x7b, 0xff, 0xfe, 0x7d]);
    assert!(matches!(result, Err(CodecError::Decoding(_))));
}
