use crate::error::ApiError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Lenient policy used by every plain list endpoint: unparsable or
/// out-of-range values fall back to the default and get clamped into range.
pub fn clamped_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT)
}

pub fn clamped_offset(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0)
}

/// Strict policy used by the community feed: out-of-range input is rejected
/// outright instead of clamped.
pub fn strict_limit(raw: Option<&str>, max: i64) -> Result<i64, ApiError> {
    let limit = match raw {
        Some(v) => v.trim().parse::<i64>().map_err(|_| {
            ApiError::bad_request(
                "INVALID_LIMIT",
                "Invalid limit parameter. Must be a positive integer.",
            )
        })?,
        None => DEFAULT_LIMIT,
    };
    if limit < 1 {
        return Err(ApiError::bad_request(
            "INVALID_LIMIT",
            "Invalid limit parameter. Must be a positive integer.",
        ));
    }
    if limit > max {
        return Err(ApiError::bad_request(
            "LIMIT_EXCEEDED",
            format!("Limit cannot exceed {max}"),
        ));
    }
    Ok(limit)
}

pub fn strict_offset(raw: Option<&str>) -> Result<i64, ApiError> {
    let offset = match raw {
        Some(v) => v.trim().parse::<i64>().map_err(|_| {
            ApiError::bad_request(
                "INVALID_OFFSET",
                "Invalid offset parameter. Must be a non-negative integer.",
            )
        })?,
        None => 0,
    };
    if offset < 0 {
        return Err(ApiError::bad_request(
            "INVALID_OFFSET",
            "Invalid offset parameter. Must be a non-negative integer.",
        ));
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_limit_defaults_and_clamps() {
        assert_eq!(clamped_limit(None), 10);
        assert_eq!(clamped_limit(Some("25")), 25);
        assert_eq!(clamped_limit(Some("500")), 100);
        assert_eq!(clamped_limit(Some("0")), 1);
        assert_eq!(clamped_limit(Some("-3")), 1);
        assert_eq!(clamped_limit(Some("abc")), 10);
    }

    #[test]
    fn clamped_offset_floors_at_zero() {
        assert_eq!(clamped_offset(None), 0);
        assert_eq!(clamped_offset(Some("7")), 7);
        assert_eq!(clamped_offset(Some("-1")), 0);
        assert_eq!(clamped_offset(Some("x")), 0);
    }

    #[test]
    fn strict_limit_rejects_out_of_range() {
        assert_eq!(strict_limit(None, 50).unwrap(), 10);
        assert_eq!(strict_limit(Some("50"), 50).unwrap(), 50);
        assert!(strict_limit(Some("51"), 50).is_err());
        assert!(strict_limit(Some("0"), 50).is_err());
        assert!(strict_limit(Some("nope"), 50).is_err());
    }

    #[test]
    fn strict_offset_rejects_negative() {
        assert_eq!(strict_offset(None).unwrap(), 0);
        assert_eq!(strict_offset(Some("5")).unwrap(), 5);
        assert!(strict_offset(Some("-5")).is_err());
        assert!(strict_offset(Some("abc")).is_err());
    }
}
