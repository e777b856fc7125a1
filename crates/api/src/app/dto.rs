//! Request body parsing.
//!
//! Bodies are read as raw JSON objects and checked field by field so that
//! every problem in a request is reported at once, keyed by field name.
//! Responses serialize the domain types directly (their serde names are the
//! wire names).

use chrono::NaiveDate;
use serde_json::{Map, Value};

use stockroom_core::{
    FieldErrors, InventoryId, InventoryLanguageId, InventoryTypeId, OrderTagId,
    parse_calendar_date, validation,
};
use stockroom_inventory::{InventoryDraft, InventoryTagDraft, LookupDraft};
use stockroom_orders::{OrderDraft, OrderTagDraft};

/// Why a request body could not be turned into a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    /// The body is not a JSON object at all.
    Malformed(String),
    /// The body is an object but some fields are invalid. The references
    /// that did parse ride along so they can still be checked for existence.
    Fields(FieldErrors, BodyRefs),
}

/// Record references read from a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyRefs {
    pub type_id: Option<InventoryTypeId>,
    pub language_id: Option<InventoryLanguageId>,
    pub inventory_id: Option<InventoryId>,
    pub tag_ids: Vec<OrderTagId>,
}

type Body = Map<String, Value>;

/// An empty body reads as `{}`.
pub fn parse_object(raw: &[u8]) -> Result<Body, BodyError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| BodyError::Malformed(format!("JSON parse error - {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BodyError::Malformed(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            json_type(&other)
        ))),
    }
}

/// Name of a JSON value's type as reported in validation messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field readers
// ─────────────────────────────────────────────────────────────────────────────

fn required<'a>(body: &'a Body, field: &str, errors: &mut FieldErrors) -> Option<&'a Value> {
    match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, validation::REQUIRED);
            None
        }
        Some(v) => Some(v),
    }
}

fn name(body: &Body, field: &str, errors: &mut FieldErrors) -> Option<String> {
    let raw = match required(body, field, errors)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(field, validation::INVALID_STRING);
            return None;
        }
    };
    let before = errors.get(field).map_or(0, <[String]>::len);
    validation::check_name(field, &raw, errors);
    (errors.get(field).map_or(0, <[String]>::len) == before).then_some(raw)
}

fn pk_value(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| validation::incorrect_pk_type(json_type(value))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| validation::incorrect_pk_type(json_type(value))),
        other => Err(validation::incorrect_pk_type(json_type(other))),
    }
}

fn pk(body: &Body, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    match pk_value(required(body, field, errors)?) {
        Ok(id) => Some(id),
        Err(msg) => {
            errors.add(field, msg);
            None
        }
    }
}

fn date(body: &Body, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let parsed = match required(body, field, errors)? {
        Value::String(s) => parse_calendar_date(s.trim()).ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, validation::INVALID_DATE);
    }
    parsed
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn flag(body: &Body, field: &str, default: bool, errors: &mut FieldErrors) -> bool {
    match body.get(field) {
        None => default,
        Some(Value::Null) => {
            errors.add(field, validation::NULL);
            default
        }
        Some(v) => parse_bool(v).unwrap_or_else(|| {
            errors.add(field, validation::INVALID_BOOLEAN);
            default
        }),
    }
}

fn pk_list(body: &Body, field: &str, errors: &mut FieldErrors) -> Vec<i64> {
    let items = match body.get(field) {
        None => return Vec::new(),
        Some(Value::Null) => {
            errors.add(field, validation::NULL);
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            errors.add(field, validation::not_a_list(json_type(other)));
            return Vec::new();
        }
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match pk_value(item) {
            Ok(id) => ids.push(id),
            Err(msg) => errors.add(field, msg),
        }
    }
    ids
}

fn object(body: &Body, field: &str, errors: &mut FieldErrors) -> Map<String, Value> {
    match body.get(field) {
        None => Map::new(),
        Some(Value::Null) => {
            errors.add(field, validation::NULL);
            Map::new()
        }
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            errors.add(field, validation::not_a_dict(json_type(other)));
            Map::new()
        }
    }
}

fn finish<T>(errors: FieldErrors, value: Option<T>, refs: BodyRefs) -> Result<T, BodyError> {
    match value {
        Some(v) if errors.is_empty() => Ok(v),
        _ => Err(BodyError::Fields(errors, refs)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Drafts
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /inventory/` and `PUT /inventory/{id}/`.
pub fn inventory_draft(raw: &[u8]) -> Result<InventoryDraft, BodyError> {
    let body = parse_object(raw)?;
    let mut errors = FieldErrors::new();

    let name = name(&body, "name", &mut errors);
    let refs = BodyRefs {
        type_id: pk(&body, "type", &mut errors).map(InventoryTypeId::new),
        language_id: pk(&body, "language", &mut errors).map(InventoryLanguageId::new),
        ..BodyRefs::default()
    };
    let metadata = object(&body, "metadata", &mut errors);
    let is_active = flag(&body, "is_active", true, &mut errors);

    let draft = match (name, refs.type_id, refs.language_id) {
        (Some(name), Some(type_id), Some(language_id)) => Some(InventoryDraft {
            name,
            type_id,
            language_id,
            metadata,
            is_active,
        }),
        _ => None,
    };
    finish(errors, draft, refs)
}

/// Body of the type / language create endpoints.
pub fn lookup_draft(raw: &[u8]) -> Result<LookupDraft, BodyError> {
    let body = parse_object(raw)?;
    let mut errors = FieldErrors::new();
    let name = name(&body, "name", &mut errors);
    finish(errors, name.map(LookupDraft::new), BodyRefs::default())
}

pub fn inventory_tag_draft(raw: &[u8]) -> Result<InventoryTagDraft, BodyError> {
    let body = parse_object(raw)?;
    let mut errors = FieldErrors::new();
    let name = name(&body, "name", &mut errors);
    let is_active = flag(&body, "is_active", true, &mut errors);
    let draft = name.map(|name| InventoryTagDraft { name, is_active });
    finish(errors, draft, BodyRefs::default())
}

pub fn order_tag_draft(raw: &[u8]) -> Result<OrderTagDraft, BodyError> {
    let body = parse_object(raw)?;
    let mut errors = FieldErrors::new();
    let name = name(&body, "name", &mut errors);
    let is_active = flag(&body, "is_active", true, &mut errors);
    let draft = name.map(|name| OrderTagDraft { name, is_active });
    finish(errors, draft, BodyRefs::default())
}

/// Body of `POST /orders/`.
pub fn order_draft(raw: &[u8]) -> Result<OrderDraft, BodyError> {
    let body = parse_object(raw)?;
    let mut errors = FieldErrors::new();

    let inventory_id = pk(&body, "inventory", &mut errors).map(InventoryId::new);
    let start_date = date(&body, "start_date", &mut errors);
    let embargo_date = date(&body, "embargo_date", &mut errors);
    let is_active = flag(&body, "is_active", true, &mut errors);
    let tag_ids: Vec<OrderTagId> = pk_list(&body, "tags", &mut errors)
        .into_iter()
        .map(OrderTagId::new)
        .collect();

    let draft = match (inventory_id, start_date, embargo_date) {
        (Some(inventory_id), Some(start_date), Some(embargo_date)) => Some(OrderDraft {
            inventory_id,
            start_date,
            embargo_date,
            is_active,
            tag_ids: tag_ids.clone(),
        }),
        _ => None,
    };
    let refs = BodyRefs {
        inventory_id,
        tag_ids,
        ..BodyRefs::default()
    };
    finish(errors, draft, refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    fn fields(err: BodyError) -> FieldErrors {
        match err {
            BodyError::Fields(errors, _) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn order_body_with_defaults() {
        let draft = order_draft(&bytes(json!({
            "inventory": 1,
            "start_date": "2024-01-01",
            "embargo_date": "2024-01-31",
        })))
        .unwrap();
        assert!(draft.is_active);
        assert!(draft.tag_ids.is_empty());
        assert_eq!(draft.inventory_id, InventoryId::new(1));
    }

    #[test]
    fn order_body_reports_every_bad_field() {
        let errors = fields(
            order_draft(&bytes(json!({
                "inventory": "abc",
                "start_date": "01/02/2024",
                "is_active": "maybe",
                "tags": 5,
            })))
            .unwrap_err(),
        );
        assert_eq!(errors.get("inventory").unwrap(), [validation::incorrect_pk_type("str")]);
        assert_eq!(errors.get("start_date").unwrap(), [validation::INVALID_DATE.to_string()]);
        assert_eq!(errors.get("embargo_date").unwrap(), [validation::REQUIRED.to_string()]);
        assert_eq!(errors.get("is_active").unwrap(), [validation::INVALID_BOOLEAN.to_string()]);
        assert_eq!(errors.get("tags").unwrap(), [validation::not_a_list("int")]);
    }

    #[test]
    fn tag_list_elements_must_be_pks() {
        let errors = fields(
            order_draft(&bytes(json!({
                "inventory": 1,
                "start_date": "2024-01-01",
                "embargo_date": "2024-01-02",
                "tags": [1, true, "2"],
            })))
            .unwrap_err(),
        );
        assert_eq!(errors.get("tags").unwrap(), [validation::incorrect_pk_type("bool")]);
    }

    #[test]
    fn inventory_body_checks_name_and_metadata() {
        let errors = fields(
            inventory_draft(&bytes(json!({
                "name": "   ",
                "type": 1,
                "language": null,
                "metadata": [1, 2],
            })))
            .unwrap_err(),
        );
        assert_eq!(errors.get("name").unwrap(), [validation::BLANK.to_string()]);
        assert_eq!(errors.get("language").unwrap(), [validation::REQUIRED.to_string()]);
        assert_eq!(errors.get("metadata").unwrap(), [validation::not_a_dict("list")]);
        assert!(errors.get("type").is_none());
    }

    #[test]
    fn inventory_body_trims_name_and_keeps_metadata() {
        let draft = inventory_draft(&bytes(json!({
            "name": "  The Matrix ",
            "type": "2",
            "language": 3,
            "metadata": {"year": 1999},
            "is_active": "false",
        })))
        .unwrap();
        assert_eq!(draft.name, "The Matrix");
        assert_eq!(draft.type_id, InventoryTypeId::new(2));
        assert_eq!(draft.metadata["year"], 1999);
        assert!(!draft.is_active);
    }

    #[test]
    fn rejected_bodies_keep_their_parsed_references() {
        let body = json!({"name": "", "type": 9, "language": "x"});
        let err = inventory_draft(&bytes(body)).unwrap_err();
        let BodyError::Fields(errors, refs) = err else {
            panic!("expected field errors, got {err:?}");
        };
        assert_eq!(errors.get("name").unwrap(), [validation::BLANK.to_string()]);
        assert_eq!(refs.type_id, Some(InventoryTypeId::new(9)));
        assert_eq!(refs.language_id, None);

        let err = order_draft(&bytes(json!({"inventory": 4, "tags": [7, "y"]}))).unwrap_err();
        let BodyError::Fields(_, refs) = err else {
            panic!("expected field errors, got {err:?}");
        };
        assert_eq!(refs.inventory_id, Some(InventoryId::new(4)));
        assert_eq!(refs.tag_ids, vec![OrderTagId::new(7)]);
    }

    #[test]
    fn empty_bodies_read_as_empty_objects() {
        assert_eq!(parse_object(b"").unwrap(), Map::new());
        assert_eq!(parse_object(b" \n").unwrap(), Map::new());

        let errors = fields(order_draft(b"").unwrap_err());
        for field in ["inventory", "start_date", "embargo_date"] {
            assert_eq!(errors.get(field).unwrap(), [validation::REQUIRED.to_string()]);
        }
        assert!(errors.get("tags").is_none());
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        let list = parse_object(b"[1,2]");
        assert!(matches!(list, Err(BodyError::Malformed(msg)) if msg.contains("list")));
        let broken = parse_object(b"{not json");
        assert!(
            matches!(broken, Err(BodyError::Malformed(msg)) if msg.starts_with("JSON parse error"))
        );
    }

    #[test]
    fn long_names_are_rejected() {
        let errors = fields(lookup_draft(&bytes(json!({"name": "x".repeat(201)}))).unwrap_err());
        assert_eq!(errors.get("name").unwrap(), [validation::too_long(200)]);
    }
}
