use reqwest::Response;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Decodes a provider response. Non-success statuses become
/// [`Error::Upstream`] with the raw body; an empty body decodes to `null`
/// and a non-JSON body is passed through as a string.
pub async fn read_json(response: Response) -> Result<JsonValue> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(Error::Upstream {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(decode_body(&text))
}

pub fn decode_body(text: &str) -> JsonValue {
    if text.trim().is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
}

/// Reads an integer that providers send either as a number or a numeric string.
pub fn as_i64_lenient(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_null() {
        assert_eq!(decode_body(""), JsonValue::Null);
        assert_eq!(decode_body("  \n"), JsonValue::Null);
    }

    #[test]
    fn non_json_body_passes_through_as_text() {
        assert_eq!(decode_body("Created"), json!("Created"));
        assert_eq!(decode_body(r#"{"id":"1"}"#), json!({"id": "1"}));
    }

    #[test]
    fn lenient_integers() {
        assert_eq!(as_i64_lenient(&json!(1800)), Some(1800));
        assert_eq!(as_i64_lenient(&json!("1800")), Some(1800));
        assert_eq!(as_i64_lenient(&json!(null)), None);
    }
}
