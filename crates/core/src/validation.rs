//! Field validation messages and small reusable checks.
//!
//! The messages are part of the HTTP contract: clients match on them.

use crate::error::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";
pub const INVALID_BOOLEAN: &str = "Must be a valid boolean.";
pub const INVALID_DATE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const INVALID_STRING: &str = "Not a valid string.";

/// Upper bound for every `name` column.
pub const NAME_MAX_LEN: usize = 200;

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

pub fn incorrect_pk_type(json_type: &str) -> String {
    format!("Incorrect type. Expected pk value, received {json_type}.")
}

pub fn missing_pk(pk: i64) -> String {
    format!("Invalid pk \"{pk}\" - object does not exist.")
}

pub fn not_a_list(json_type: &str) -> String {
    format!("Expected a list of items but got type \"{json_type}\".")
}

pub fn not_a_dict(json_type: &str) -> String {
    format!("Expected a dictionary of items but got type \"{json_type}\".")
}

/// Record blank / over-long problems with a `name`-like field.
pub fn check_name(field: &str, value: &str, errors: &mut FieldErrors) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > NAME_MAX_LEN {
        errors.add(field, too_long(NAME_MAX_LEN));
    }
}
