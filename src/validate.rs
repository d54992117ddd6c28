use serde_json::Value;

use crate::error::ApiError;

/// Parse an id out of a query-string value. Non-numeric input is a client
/// error, not a lookup miss.
pub fn parse_id_param(raw: &str, code: &'static str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(code, format!("Valid {what} is required")))
}

/// Required id field in a JSON body. Accepts a number or a numeric string,
/// the way the original clients send both.
pub fn require_id(
    value: Option<&Value>,
    missing: &'static str,
    invalid: &'static str,
    what: &str,
) -> Result<i64, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::bad_request(
            missing,
            format!("{what} is required"),
        )),
        Some(v) => coerce_id(v)
            .ok_or_else(|| ApiError::bad_request(invalid, format!("{what} must be a valid integer"))),
    }
}

/// Optional id field: absent is fine, present-but-malformed is not.
pub fn optional_id(
    value: Option<&Value>,
    invalid: &'static str,
    what: &str,
) -> Result<Option<i64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => coerce_id(v)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(invalid, format!("{what} must be a valid integer"))),
    }
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Required non-blank string field, trimmed before storage.
pub fn require_trimmed(
    value: Option<&str>,
    missing: &'static str,
    what: &str,
) -> Result<String, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::bad_request(
            missing,
            format!("{what} is required"),
        )),
    }
}

/// Non-negative integer field (streak counters, denormalized counts).
pub fn require_non_negative(
    value: &Value,
    invalid: &'static str,
    what: &str,
) -> Result<i32, ApiError> {
    value
        .as_i64()
        .filter(|v| *v >= 0 && *v <= i32::MAX as i64)
        .map(|v| v as i32)
        .ok_or_else(|| {
            ApiError::bad_request(invalid, format!("{what} must be a non-negative number"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_id_param_rejects_non_numeric() {
        assert_eq!(parse_id_param("42", "INVALID_ID", "ID").unwrap(), 42);
        assert!(parse_id_param("abc", "INVALID_ID", "ID").is_err());
        assert!(parse_id_param("4.5", "INVALID_ID", "ID").is_err());
    }

    #[test]
    fn require_id_accepts_number_or_numeric_string() {
        assert_eq!(
            require_id(Some(&json!(7)), "M", "I", "userId").unwrap(),
            7
        );
        assert_eq!(
            require_id(Some(&json!("7")), "M", "I", "userId").unwrap(),
            7
        );
    }

    #[test]
    fn require_id_distinguishes_missing_from_invalid() {
        let missing = require_id(None, "MISSING_USER_ID", "INVALID_USER_ID", "userId").unwrap_err();
        assert!(matches!(
            missing,
            ApiError::BadRequest { code: "MISSING_USER_ID", .. }
        ));

        let invalid = require_id(
            Some(&json!("seven")),
            "MISSING_USER_ID",
            "INVALID_USER_ID",
            "userId",
        )
        .unwrap_err();
        assert!(matches!(
            invalid,
            ApiError::BadRequest { code: "INVALID_USER_ID", .. }
        ));
    }

    #[test]
    fn optional_id_passes_through_absent() {
        assert_eq!(optional_id(None, "I", "authorId").unwrap(), None);
        assert_eq!(
            optional_id(Some(&json!(null)), "I", "authorId").unwrap(),
            None
        );
        assert_eq!(
            optional_id(Some(&json!(3)), "I", "authorId").unwrap(),
            Some(3)
        );
        assert!(optional_id(Some(&json!([])), "I", "authorId").is_err());
    }

    #[test]
    fn require_trimmed_treats_blank_as_missing() {
        assert_eq!(
            require_trimmed(Some("  hi  "), "MISSING_CONTENT", "Content").unwrap(),
            "hi"
        );
        assert!(require_trimmed(Some("   "), "MISSING_CONTENT", "Content").is_err());
        assert!(require_trimmed(None, "MISSING_CONTENT", "Content").is_err());
    }

    #[test]
    fn require_non_negative_rejects_negatives_and_floats() {
        assert_eq!(
            require_non_negative(&json!(0), "INVALID", "likesCount").unwrap(),
            0
        );
        assert!(require_non_negative(&json!(-1), "INVALID", "likesCount").is_err());
        assert!(require_non_negative(&json!(1.5), "INVALID", "likesCount").is_err());
        assert!(require_non_negative(&json!("3"), "INVALID", "likesCount").is_err());
    }
}
