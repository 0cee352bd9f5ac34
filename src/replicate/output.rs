use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use crate::error::{Result, VaultError};

/// Image payload of a finished prediction, classified before any bytes are
/// fetched. The provider returns either a single stream (data URI or hosted
/// URL) or a list of them; a list resolves to its first element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutput {
    Inline(Vec<u8>),
    Url(String),
}

impl PredictionOutput {
    pub fn classify(output: &Value) -> Result<Self> {
        match output {
            Value::String(s) => Self::classify_str(s),
            Value::Array(items) => match items.first() {
                Some(first) => Self::classify(first),
                None => Err(VaultError::UnexpectedResponseShape(
                    "prediction output is an empty list".to_string(),
                )),
            },
            other => Err(VaultError::UnexpectedResponseShape(format!(
                "prediction output is {}, expected a URL, a data URI, or a list of them",
                json_type_name(other)
            ))),
        }
    }

    fn classify_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("data:") {
            let payload = rest
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| {
                    VaultError::UnexpectedResponseShape(
                        "prediction output is a data URI without a payload".to_string(),
                    )
                })?;
            let bytes = BASE64.decode(payload.as_bytes()).map_err(|e| {
                VaultError::ResponseError(format!("Failed to decode data URI payload: {}", e))
            })?;
            Ok(PredictionOutput::Inline(bytes))
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Ok(PredictionOutput::Url(s.to_string()))
        } else {
            Err(VaultError::UnexpectedResponseShape(
                "prediction output is a string that is neither a URL nor a data URI".to_string(),
            ))
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_data_uri() {
        let uri = format!("data:image/png;base64,{}", BASE64.encode([1u8, 2, 3]));
        let output = PredictionOutput::classify(&json!(uri)).unwrap();
        assert_eq!(output, PredictionOutput::Inline(vec![1, 2, 3]));
    }

    #[test]
    fn test_classify_hosted_url() {
        let output =
            PredictionOutput::classify(&json!("https://replicate.delivery/pbxt/abc/out.png"))
                .unwrap();
        assert_eq!(
            output,
            PredictionOutput::Url("https://replicate.delivery/pbxt/abc/out.png".to_string())
        );
    }

    #[test]
    fn test_classify_list_takes_first_element() {
        let output = PredictionOutput::classify(&json!([
            "https://replicate.delivery/pbxt/abc/0.png",
            "https://replicate.delivery/pbxt/abc/1.png"
        ]))
        .unwrap();
        assert_eq!(
            output,
            PredictionOutput::Url("https://replicate.delivery/pbxt/abc/0.png".to_string())
        );
    }

    #[test]
    fn test_classify_empty_list_fails() {
        let err = PredictionOutput::classify(&json!([])).unwrap_err();
        match err {
            VaultError::UnexpectedResponseShape(msg) => assert!(msg.contains("empty list")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_names_the_json_type() {
        let err = PredictionOutput::classify(&json!(42)).unwrap_err();
        match err {
            VaultError::UnexpectedResponseShape(msg) => assert!(msg.contains("a number")),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = PredictionOutput::classify(&Value::Null).unwrap_err();
        match err {
            VaultError::UnexpectedResponseShape(msg) => assert!(msg.contains("null")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_rejects_bare_string() {
        assert!(PredictionOutput::classify(&json!("not-a-url")).is_err());
    }

    #[test]
    fn test_classify_rejects_data_uri_without_payload() {
        assert!(PredictionOutput::classify(&json!("data:image/png;base64")).is_err());
    }

    #[test]
    fn test_classify_rejects_malformed_base64() {
        let err = PredictionOutput::classify(&json!("data:image/png;base64,$$$$")).unwrap_err();
        assert!(matches!(err, VaultError::ResponseError(_)));
    }
}
