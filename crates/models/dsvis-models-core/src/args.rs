//! Payload argument extraction. A key that is absent or null counts as absent.

use serde_json::Value as JsonValue;

use crate::error::ModelError;
use crate::value::Scalar;
use crate::Payload;

fn present<'a>(payload: &'a Payload, key: &str) -> Option<&'a JsonValue> {
    payload.get(key).filter(|v| !v.is_null())
}

pub fn opt_index(payload: &Payload, op: &str) -> Result<Option<i64>, ModelError> {
    match present(payload, "index") {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| ModelError::invalid(op, "index", "index must be an integer")),
    }
}

pub fn req_index(payload: &Payload, op: &str) -> Result<i64, ModelError> {
    opt_index(payload, op)?.ok_or_else(|| ModelError::missing(op, "index"))
}

pub fn opt_scalar(payload: &Payload, key: &str, op: &str) -> Result<Option<Scalar>, ModelError> {
    match present(payload, key) {
        None => Ok(None),
        Some(v) => Scalar::from_json(v, op, key).map(Some),
    }
}

pub fn req_scalar(payload: &Payload, key: &str, op: &str) -> Result<Scalar, ModelError> {
    opt_scalar(payload, key, op)?.ok_or_else(|| ModelError::missing(op, key))
}

pub fn opt_str<'a>(payload: &'a Payload, key: &str, op: &str) -> Result<Option<&'a str>, ModelError> {
    match present(payload, key) {
        None => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ModelError::invalid(op, key, "expected a string")),
    }
}

/// `values` as a list of scalars; absent means empty.
pub fn values(payload: &Payload, op: &str) -> Result<Vec<Scalar>, ModelError> {
    match present(payload, "values") {
        None => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| Scalar::from_json(item, op, "values"))
            .collect(),
        Some(_) => Err(ModelError::invalid(op, "values", "values must be a list")),
    }
}

/// Bounds check for an existing slot: `0..len`.
pub fn slot(index: i64, len: usize, op: &str) -> Result<usize, ModelError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| ModelError::out_of_range(op, index, len))
}

/// Bounds check for an insertion point: `0..=len`.
pub fn insertion_point(index: i64, len: usize, op: &str) -> Result<usize, ModelError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i <= len)
        .ok_or_else(|| ModelError::out_of_range(op, index, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: JsonValue) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn null_counts_as_absent() {
        let p = payload(json!({"index": null, "value": null}));
        assert_eq!(opt_index(&p, "search").unwrap(), None);
        assert_eq!(opt_scalar(&p, "value", "search").unwrap(), None);
        assert!(matches!(
            req_scalar(&p, "value", "insert"),
            Err(ModelError::MissingArgument { .. })
        ));
    }

    #[test]
    fn index_must_be_integer() {
        let p = payload(json!({"index": "1"}));
        assert!(matches!(
            opt_index(&p, "delete_index"),
            Err(ModelError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn bounds_helpers() {
        assert_eq!(slot(1, 2, "x").unwrap(), 1);
        assert!(slot(2, 2, "x").is_err());
        assert!(slot(-1, 2, "x").is_err());
        assert_eq!(insertion_point(2, 2, "x").unwrap(), 2);
        assert!(insertion_point(3, 2, "x").is_err());
    }

    #[test]
    fn values_reject_non_lists() {
        let p = payload(json!({"values": "abc"}));
        assert!(values(&p, "create").is_err());
        let p = payload(json!({"values": [1, "a", 2.5]}));
        assert_eq!(values(&p, "create").unwrap().len(), 3);
        assert!(values(&Payload::new(), "create").unwrap().is_empty());
    }
}
