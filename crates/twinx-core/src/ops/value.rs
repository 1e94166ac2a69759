//! Value-only projection of elements
//!
//! The value-only form drops metadata and keeps just the payload of each
//! element as plain JSON: scalars for Properties, `{idShort: value}` objects
//! for Collections, arrays for Lists, and so on. Operations and events have no
//! value-only form.

use base64::Engine;
use serde_json::{Map, Number, Value};

use crate::errors::{Result, TwinError};
use crate::model::{
    DataTypeDefXsd, ElementContainer, ElementValue, EntityType, LangString, Reference,
    SubmodelElement,
};

fn unsupported(element: &SubmodelElement) -> TwinError {
    TwinError::Unsupported {
        feature: format!("value-only form of {}", element.model_type()),
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> TwinError {
    TwinError::InvalidValue {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn child_path(path: &str, id_short: &str) -> String {
    if path.is_empty() {
        id_short.to_string()
    } else {
        format!("{}.{}", path, id_short)
    }
}

/// Value-only JSON of one element
///
/// # Errors
/// * `Unsupported` - Operation and BasicEventElement (also when nested)
pub fn element_value(element: &SubmodelElement, path: &str) -> Result<Value> {
    let value = match &element.value {
        ElementValue::Property { value_type, value } => scalar_to_json(*value_type, value.as_deref()),
        ElementValue::MultiLanguageProperty { value } => Value::Array(
            value
                .iter()
                .map(|ls| {
                    let mut entry = Map::new();
                    entry.insert(ls.language.clone(), Value::String(ls.text.clone()));
                    Value::Object(entry)
                })
                .collect(),
        ),
        ElementValue::Range { value_type, min, max } => {
            let mut range = Map::new();
            range.insert("min".into(), scalar_to_json(*value_type, min.as_deref()));
            range.insert("max".into(), scalar_to_json(*value_type, max.as_deref()));
            Value::Object(range)
        }
        ElementValue::File {
            content_type,
            value,
        } => {
            let mut file = Map::new();
            file.insert("contentType".into(), Value::String(content_type.clone()));
            file.insert(
                "value".into(),
                value.clone().map(Value::String).unwrap_or(Value::Null),
            );
            Value::Object(file)
        }
        ElementValue::Blob {
            content_type,
            value,
        } => {
            let mut blob = Map::new();
            blob.insert("contentType".into(), Value::String(content_type.clone()));
            blob.insert(
                "value".into(),
                value
                    .as_ref()
                    .map(|bytes| {
                        Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
                    })
                    .unwrap_or(Value::Null),
            );
            Value::Object(blob)
        }
        ElementValue::ReferenceElement { value } => match value {
            Some(reference) => serde_json::to_value(reference)?,
            None => Value::Null,
        },
        ElementValue::RelationshipElement { first, second } => {
            let mut rel = Map::new();
            rel.insert("first".into(), serde_json::to_value(first)?);
            rel.insert("second".into(), serde_json::to_value(second)?);
            Value::Object(rel)
        }
        ElementValue::Collection { value } => container_to_object(value, path)?,
        ElementValue::List { value, .. } => Value::Array(
            value
                .iter()
                .enumerate()
                .map(|(i, child)| element_value(child, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?,
        ),
        ElementValue::Entity {
            entity_type,
            global_asset_id,
            statements,
        } => {
            let mut entity = Map::new();
            entity.insert("statements".into(), container_to_object(statements, path)?);
            entity.insert("entityType".into(), serde_json::to_value(entity_type)?);
            if let Some(asset_id) = global_asset_id {
                entity.insert("globalAssetId".into(), Value::String(asset_id.clone()));
            }
            Value::Object(entity)
        }
        ElementValue::Operation(_) | ElementValue::BasicEventElement { .. } => {
            return Err(unsupported(element));
        }
    };
    Ok(value)
}

fn container_to_object(container: &ElementContainer, path: &str) -> Result<Value> {
    let mut object = Map::new();
    for child in container.iter() {
        object.insert(
            child.id_short.clone(),
            element_value(child, &child_path(path, &child.id_short))?,
        );
    }
    Ok(Value::Object(object))
}

/// Typed JSON for a lexical scalar; falls back to a string when it does not parse
fn scalar_to_json(value_type: DataTypeDefXsd, lexical: Option<&str>) -> Value {
    let Some(raw) = lexical else {
        return Value::Null;
    };

    if value_type == DataTypeDefXsd::Boolean {
        match raw.trim() {
            "true" | "1" => return Value::Bool(true),
            "false" | "0" => return Value::Bool(false),
            _ => {}
        }
    } else if value_type.is_integral() {
        if let Ok(v) = raw.trim().parse::<i64>() {
            return Value::from(v);
        }
    } else if value_type.is_numeric() {
        if let Some(n) = raw.trim().parse::<f64>().ok().and_then(Number::from_f64) {
            // a decimal whose digits do not survive f64 stays a string
            let lossless = value_type != DataTypeDefXsd::Decimal
                || value_type.normalize("", &n.to_string()).ok()
                    == value_type.normalize("", raw).ok();
            if lossless {
                return Value::Number(n);
            }
        }
    }
    Value::String(raw.to_string())
}

/// Lexical scalar from JSON, normalized to the value type
fn scalar_from_json(value_type: DataTypeDefXsd, json: &Value, path: &str) -> Result<Option<String>> {
    let raw = match json {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(invalid(path, "expected a scalar value"));
        }
    };
    value_type.normalize(path, &raw).map(Some)
}

fn expect_object<'v>(json: &'v Value, path: &str) -> Result<&'v Map<String, Value>> {
    json.as_object()
        .ok_or_else(|| invalid(path, "expected a JSON object"))
}

fn parse_reference(json: &Value, path: &str) -> Result<Reference> {
    serde_json::from_value(json.clone()).map_err(|e| invalid(path, e.to_string()))
}

fn optional_string(json: &Value, path: &str) -> Result<Option<String>> {
    match json {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(invalid(path, "expected a string or null")),
    }
}

/// Apply a value-only JSON to an element
///
/// The update is all-or-nothing: on error the element is left untouched.
///
/// # Errors
/// * `InvalidValue` - the JSON shape does not fit the element
/// * `CoercionFailed` - a scalar does not parse as the declared value type
/// * `ElementNotFound` - a nested key names no child
/// * `Unsupported` - Operation and BasicEventElement
pub fn apply_value(element: &mut SubmodelElement, json: &Value, path: &str) -> Result<()> {
    let mut staged = element.clone();
    apply_in_place(&mut staged, json, path)?;
    *element = staged;
    Ok(())
}

fn apply_in_place(element: &mut SubmodelElement, json: &Value, path: &str) -> Result<()> {
    if matches!(
        element.value,
        ElementValue::Operation(_) | ElementValue::BasicEventElement { .. }
    ) {
        return Err(unsupported(element));
    }

    match &mut element.value {
        ElementValue::Property { value_type, value } => {
            *value = scalar_from_json(*value_type, json, path)?;
        }
        ElementValue::MultiLanguageProperty { value } => {
            let entries = json
                .as_array()
                .ok_or_else(|| invalid(path, "expected an array of {language: text}"))?;
            let mut strings = Vec::with_capacity(entries.len());
            for entry in entries {
                for (language, text) in expect_object(entry, path)? {
                    let text = text
                        .as_str()
                        .ok_or_else(|| invalid(path, "language text must be a string"))?;
                    strings.push(LangString::new(language.clone(), text));
                }
            }
            *value = strings;
        }
        ElementValue::Range { value_type, min, max } => {
            let range = expect_object(json, path)?;
            if let Some(v) = range.get("min") {
                *min = scalar_from_json(*value_type, v, path)?;
            }
            if let Some(v) = range.get("max") {
                *max = scalar_from_json(*value_type, v, path)?;
            }
        }
        ElementValue::File {
            content_type,
            value,
        } => {
            let file = expect_object(json, path)?;
            if let Some(ct) = file.get("contentType") {
                *content_type = ct
                    .as_str()
                    .ok_or_else(|| invalid(path, "contentType must be a string"))?
                    .to_string();
            }
            if let Some(v) = file.get("value") {
                *value = optional_string(v, path)?;
            }
        }
        ElementValue::Blob {
            content_type,
            value,
        } => {
            let blob = expect_object(json, path)?;
            if let Some(ct) = blob.get("contentType") {
                *content_type = ct
                    .as_str()
                    .ok_or_else(|| invalid(path, "contentType must be a string"))?
                    .to_string();
            }
            if let Some(v) = blob.get("value") {
                *value = optional_string(v, path)?
                    .map(|encoded| {
                        base64::engine::general_purpose::STANDARD
                            .decode(encoded.as_bytes())
                            .map_err(|e| invalid(path, format!("blob value is not base64: {}", e)))
                    })
                    .transpose()?;
            }
        }
        ElementValue::ReferenceElement { value } => {
            *value = match json {
                Value::Null => None,
                other => Some(parse_reference(other, path)?),
            };
        }
        ElementValue::RelationshipElement { first, second } => {
            let rel = expect_object(json, path)?;
            if let Some(v) = rel.get("first") {
                *first = parse_reference(v, path)?;
            }
            if let Some(v) = rel.get("second") {
                *second = parse_reference(v, path)?;
            }
        }
        ElementValue::Collection { value } => {
            apply_to_children(value, expect_object(json, path)?, path)?;
        }
        ElementValue::List { value, .. } => {
            let items = json
                .as_array()
                .ok_or_else(|| invalid(path, "expected an array"))?;
            if items.len() > value.len() {
                return Err(invalid(
                    path,
                    format!("{} values for a list of {} elements", items.len(), value.len()),
                ));
            }
            for (i, (child, item)) in value.iter_mut().zip(items).enumerate() {
                apply_in_place(child, item, &format!("{}[{}]", path, i))?;
            }
        }
        ElementValue::Entity {
            entity_type,
            global_asset_id,
            statements,
        } => {
            let entity = expect_object(json, path)?;
            if let Some(v) = entity.get("statements") {
                apply_to_children(statements, expect_object(v, path)?, path)?;
            }
            if let Some(v) = entity.get("entityType") {
                *entity_type = serde_json::from_value::<EntityType>(v.clone())
                    .map_err(|e| invalid(path, e.to_string()))?;
            }
            if let Some(v) = entity.get("globalAssetId") {
                *global_asset_id = optional_string(v, path)?;
            }
        }
        ElementValue::Operation(_) | ElementValue::BasicEventElement { .. } => {}
    }
    Ok(())
}

fn apply_to_children(
    container: &mut ElementContainer,
    values: &Map<String, Value>,
    path: &str,
) -> Result<()> {
    for (id_short, child_value) in values {
        let child_path = child_path(path, id_short);
        let child = container
            .get_mut(id_short)
            .ok_or_else(|| TwinError::ElementNotFound {
                path: child_path.clone(),
            })?;
        apply_in_place(child, child_value, &child_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelType, Operation};
    use serde_json::json;

    fn prop(id: &str, vt: DataTypeDefXsd, v: &str) -> SubmodelElement {
        SubmodelElement::property(id, vt, Some(v.to_string()))
    }

    #[test]
    fn test_property_value_is_typed() {
        let p = prop("t", DataTypeDefXsd::Double, "21.5");
        assert_eq!(element_value(&p, "t").unwrap(), json!(21.5));
        let i = prop("n", DataTypeDefXsd::Int, "42");
        assert_eq!(element_value(&i, "n").unwrap(), json!(42));
        let b = prop("b", DataTypeDefXsd::Boolean, "true");
        assert_eq!(element_value(&b, "b").unwrap(), json!(true));
    }

    #[test]
    fn test_long_decimal_round_trips_through_value_only_form() {
        let mut d = prop("d", DataTypeDefXsd::Decimal, "0");
        apply_value(&mut d, &json!("123456789012345678.9"), "d").unwrap();
        assert_eq!(d.as_str(), Some("123456789012345678.9"));
        assert_eq!(element_value(&d, "d").unwrap(), json!("123456789012345678.9"));

        apply_value(&mut d, &json!("2.50"), "d").unwrap();
        assert_eq!(element_value(&d, "d").unwrap(), json!(2.5));
    }

    #[test]
    fn test_collection_value_is_object() {
        let c = SubmodelElement::collection(
            "c",
            vec![
                prop("a", DataTypeDefXsd::String, "x"),
                prop("n", DataTypeDefXsd::Int, "1"),
            ],
        );
        assert_eq!(element_value(&c, "c").unwrap(), json!({"a": "x", "n": 1}));
    }

    #[test]
    fn test_apply_property_coerces() {
        let mut p = prop("n", DataTypeDefXsd::Int, "1");
        apply_value(&mut p, &json!("42"), "n").unwrap();
        assert_eq!(p.as_i64(), Some(42));
        apply_value(&mut p, &json!(7), "n").unwrap();
        assert_eq!(p.as_str(), Some("7"));
        let err = apply_value(&mut p, &json!("abc"), "n").unwrap_err();
        assert!(matches!(err, TwinError::CoercionFailed { .. }));
        assert_eq!(p.as_str(), Some("7"));
    }

    #[test]
    fn test_apply_collection_is_atomic() {
        let mut c = SubmodelElement::collection(
            "c",
            vec![
                prop("a", DataTypeDefXsd::Int, "1"),
                prop("b", DataTypeDefXsd::Int, "2"),
            ],
        );
        let err = apply_value(&mut c, &json!({"a": 5, "missing": 1}), "c").unwrap_err();
        assert!(matches!(err, TwinError::ElementNotFound { .. }));
        assert_eq!(c.children().unwrap().get("a").unwrap().as_i64(), Some(1));

        apply_value(&mut c, &json!({"a": 5}), "c").unwrap();
        assert_eq!(c.children().unwrap().get("a").unwrap().as_i64(), Some(5));
        assert_eq!(c.children().unwrap().get("b").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn test_list_value_by_position() {
        let mut l = SubmodelElement::list(
            "l",
            ModelType::Property,
            vec![
                prop("x0", DataTypeDefXsd::Int, "1"),
                prop("x1", DataTypeDefXsd::Int, "2"),
            ],
        );
        assert_eq!(element_value(&l, "l").unwrap(), json!([1, 2]));
        apply_value(&mut l, &json!([10, 20]), "l").unwrap();
        assert_eq!(element_value(&l, "l").unwrap(), json!([10, 20]));
        assert!(apply_value(&mut l, &json!([1, 2, 3]), "l").is_err());
    }

    #[test]
    fn test_multi_language_roundtrip() {
        let mut mlp = SubmodelElement::new(
            "title",
            ElementValue::MultiLanguageProperty { value: Vec::new() },
        );
        apply_value(&mut mlp, &json!([{"en": "Pump"}, {"de": "Pumpe"}]), "title").unwrap();
        assert_eq!(
            element_value(&mlp, "title").unwrap(),
            json!([{"en": "Pump"}, {"de": "Pumpe"}])
        );
    }

    #[test]
    fn test_operation_has_no_value_form() {
        let mut op = SubmodelElement::operation("op", Operation::new());
        assert!(matches!(
            element_value(&op, "op"),
            Err(TwinError::Unsupported { .. })
        ));
        assert!(matches!(
            apply_value(&mut op, &json!({}), "op"),
            Err(TwinError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_range_partial_update() {
        let mut r = SubmodelElement::new(
            "r",
            ElementValue::Range {
                value_type: DataTypeDefXsd::Int,
                min: Some("0".into()),
                max: Some("10".into()),
            },
        );
        apply_value(&mut r, &json!({"max": 20}), "r").unwrap();
        assert_eq!(element_value(&r, "r").unwrap(), json!({"min": 0, "max": 20}));
    }
}
