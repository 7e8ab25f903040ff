use std::borrow::Cow;
use std::collections::HashSet;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Builds a single-field error for inputs that do not arrive through a `Validate` payload.
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

pub fn positive_round(field: &'static str, round: i32) -> Result<(), ValidationErrors> {
    if round < 1 {
        return Err(field_error(field, "range", "round numbers start at 1"));
    }
    Ok(())
}

/// Drops repeated ids while keeping the caller's order.
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
