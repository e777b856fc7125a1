use std::collections::HashMap;
use std::str::FromStr;

use axum::Router;

pub mod inventory;
pub mod orders;
pub mod system;

/// Every endpoint of the API.
pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(inventory::router())
        .merge(orders::router())
}

/// Parse a path id. Only plain ASCII digits form an id; anything else
/// (signs, spaces, empty segments) is treated as an unknown record.
pub(crate) fn path_id<T: FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub(crate) fn query_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}
