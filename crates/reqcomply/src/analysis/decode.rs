//! Decoding model output into stage records

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Remove a surrounding markdown code fence (```json or bare ```)
///
/// Text without an opening fence is returned trimmed and otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Decode a stage response, reporting shape errors as `MalformedResponse`
pub fn decode<T: DeserializeOwned>(stage: &'static str, text: &str) -> Result<T> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(Error::malformed(stage, "empty response"));
    }
    serde_json::from_str(body).map_err(|e| Error::malformed(stage, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_decode() {
        let sample: Sample = decode("stage1", "```json\n{\"a\": 7}\n```").unwrap();
        assert_eq!(sample, Sample { a: 7 });
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode::<Sample>("stage2", "Sure! Here is the JSON you asked for").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { stage: "stage2", .. }));

        let err = decode::<Sample>("stage3", "```json\n```").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { stage: "stage3", .. }));

        // prose around a fence is not recovered
        assert!(decode::<Sample>("stage1", "Result:\n```json\n{\"a\":1}\n```").is_err());
    }
}
