use crate::error::{AppError, AppResult};

/// A required text field: present and not blank. The value is kept verbatim.
pub fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{field} is required"))),
    }
}

/// An optional text field; blank counts as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a `since_id` cursor. Absent, non-integer and negative values are
/// all validation errors; `0` means "from the beginning".
pub fn since_id(raw: Option<&str>) -> AppResult<i64> {
    let raw = raw.ok_or_else(|| AppError::BadRequest("since_id is required".into()))?;
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("invalid since_id: {raw}"))),
    }
}
