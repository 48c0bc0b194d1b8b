//! Compact interchange codec.
//!
//! Records are written as JSON without whitespace and with fields in sorted
//! order, so equal results always encode to identical bytes.

use crate::value::OperationResult;
use crate::{Result, StateError};

/// Encode a result into its canonical byte form.
pub fn encode(result: &OperationResult) -> Result<Vec<u8>> {
    serde_json::to_vec(result).map_err(|e| StateError::Encode(e.to_string()))
}

/// Decode bytes produced by [`encode`].
///
/// Anything that is not an object of strings, integers and nested objects
/// is rejected.
pub fn decode(bytes: &[u8]) -> Result<OperationResult> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StateValue;

    fn sample() -> OperationResult {
        OperationResult::new()
            .with("software", "chrome")
            .with("pid", 4242)
            .with("negative", i64::MIN)
            .with("unicode", "café ☕")
            .with(
                "window",
                OperationResult::new()
                    .with("desktop", 2)
                    .with("title", "Inbox")
                    .with("empty", OperationResult::new()),
            )
    }

    #[test]
    fn test_encode_is_compact_and_sorted() {
        let result = OperationResult::new().with("b", 1).with("a", "x");
        assert_eq!(encode(&result).unwrap(), br#"{"a":"x","b":1}"#.to_vec());
    }

    #[test]
    fn test_decode_encode_identity() {
        let result = sample();
        assert_eq!(decode(&encode(&result).unwrap()).unwrap(), result);
    }

    #[test]
    fn test_encode_decode_identity_on_canonical_bytes() {
        let bytes = br#"{"a":{"b":{"c":-7}},"d":"e\"f","z":0}"#;
        assert_eq!(encode(&decode(bytes).unwrap()).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(encode(&OperationResult::new()).unwrap(), b"{}".to_vec());
        assert!(decode(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_encode_escapes_nul() {
        let result = OperationResult::new().with("k", "a\0b");
        let bytes = encode(&result).unwrap();
        assert!(!bytes.contains(&0));
        assert_eq!(bytes, br#"{"k":"a\u0000b"}"#.to_vec());
        assert_eq!(decode(&bytes).unwrap(), result);
    }

    #[test]
    fn test_string_digits_stay_strings() {
        let result = decode(br#"{"n":"42","m":42}"#).unwrap();
        assert_eq!(result.get("n"), Some(&StateValue::Str("42".to_string())));
        assert_eq!(result.get("m"), Some(&StateValue::Int(42)));
    }

    #[test]
    fn test_malformed_inputs() {
        let cases: &[&[u8]] = &[
            b"",
            b"not json",
            b"[1,2]",
            b"42",
            br#"{"a":1.5}"#,
            br#"{"a":true}"#,
            br#"{"a":null}"#,
            br#"{"a":[1]}"#,
            br#"{"a":18446744073709551615}"#,
            br#"{"a":1} trailing"#,
            &[0xff, 0xfe],
        ];

        for bytes in cases {
            assert!(
                matches!(decode(bytes), Err(StateError::Malformed(_))),
                "{:?} should be malformed",
                String::from_utf8_lossy(bytes)
            );
        }
    }
}
