//! Parameter schemas and values.
//!
//! A schema maps parameter names to typed fields. Validation coerces loosely
//! typed JSON input (strings for numbers, "yes" for booleans, ...) into the
//! declared types, fills in defaults and reports every problem at once.

use std::fmt::{self, Display};

use displaydoc::Display;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "str"),
            ParamType::Integer => write!(f, "int"),
            ParamType::Boolean => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamField {
    typ: ParamType,
    required: bool,
    default: Option<Value>,
}

impl ParamField {
    pub const fn new(typ: ParamType) -> Self {
        Self {
            typ,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn typ(&self) -> &ParamType {
        &self.typ
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Parameter schema: field name -> field, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ParamTypes(IndexMap<String, ParamField>);

impl ParamTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: ParamField) -> Self {
        self.0.insert(name.into(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamField> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamField)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues(IndexMap<String, Value>);

#[derive(Debug, Clone, Error, Display)]
pub enum ParamValuesFromJsonError {
    /// Expected an object mapping parameter names to values
    NotAnObject,
}

impl ParamValues {
    pub fn from_json(value: Value) -> Result<Self, ParamValuesFromJsonError> {
        let Value::Object(object) = value else {
            return Err(ParamValuesFromJsonError::NotAnObject);
        };
        Ok(ParamValues(object.into_iter().collect()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Remove every entry whose key matches, returning them in order.
    pub fn extract_if<F>(&mut self, mut pred: F) -> Vec<(String, Value)>
    where
        F: FnMut(&str) -> bool,
    {
        let (taken, kept) = std::mem::take(&mut self.0)
            .into_iter()
            .partition::<Vec<_>, _>(|(key, _)| pred(key));
        self.0 = kept.into_iter().collect();
        taken
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect::<Map<String, Value>>())
    }

    pub fn into_type<T>(self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.into_json())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{value} cannot be converted to {expected_type}")]
pub struct CoerceError {
    pub expected_type: ParamType,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Error, Display)]
pub enum ParamValidationError {
    /// missing required argument: {key}
    MissingParam { key: String },
    /// unsupported parameter: {key}
    UnknownParam { key: String },
    /// invalid argument {key}: {error}
    InvalidParam { key: String, error: CoerceError },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub struct ParamValidationErrors {
    pub errors: Vec<ParamValidationError>,
}

impl ParamValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

// Ansible groups missing arguments into one sentence; follow that shape.
impl Display for ParamValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        let missing: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|error| match error {
                ParamValidationError::MissingParam { key } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            parts.push(format!("missing required arguments: {}", missing.join(", ")));
        }

        let unknown: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|error| match error {
                ParamValidationError::UnknownParam { key } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        if !unknown.is_empty() {
            parts.push(format!("Unsupported parameters: {}", unknown.join(", ")));
        }

        for error in &self.errors {
            if let ParamValidationError::InvalidParam { key, error } = error {
                parts.push(format!(
                    "argument {key} is of type {} and we were unable to convert to {}",
                    json_type_name(&error.value),
                    error.expected_type
                ));
            }
        }

        write!(f, "{}", parts.join("; "))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn mismatch(typ: ParamType, value: &Value) -> CoerceError {
    CoerceError {
        expected_type: typ,
        value: value.clone(),
    }
}

/// Convert a value to the given type, the way Ansible's argument spec does.
pub fn coerce(typ: ParamType, value: &Value) -> Result<Value, CoerceError> {
    match typ {
        ParamType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(true) => Ok(Value::String("True".to_string())),
            Value::Bool(false) => Ok(Value::String("False".to_string())),
            _ => Err(mismatch(typ, value)),
        },

        ParamType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Value::Number(Number::from(f as i64)))
                }
                _ => Err(mismatch(typ, value)),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(Number::from(i)))
                .map_err(|_| mismatch(typ, value)),
            _ => Err(mismatch(typ, value)),
        },

        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(mismatch(typ, value)),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "on" | "true" | "y" | "t" | "1" => Ok(Value::Bool(true)),
                "no" | "off" | "false" | "n" | "f" | "0" => Ok(Value::Bool(false)),
                _ => Err(mismatch(typ, value)),
            },
            _ => Err(mismatch(typ, value)),
        },
    }
}

/// Validate values against a schema.
///
/// Returns the coerced values with defaults applied. A `null` value counts as
/// absent. Every missing, unknown or invalid parameter is reported.
pub fn validate(
    param_types: &ParamTypes,
    param_values: ParamValues,
) -> Result<ParamValues, ParamValidationErrors> {
    let mut errors: Vec<ParamValidationError> = Vec::new();
    let mut out = ParamValues::default();

    // Requiredness, defaults and coercion, in schema order.
    for (key, field) in param_types.iter() {
        match param_values.get(key) {
            Some(value) if !value.is_null() => match coerce(field.typ, value) {
                Ok(coerced) => {
                    out.insert(key.clone(), coerced);
                }
                Err(error) => errors.push(ParamValidationError::InvalidParam {
                    key: key.clone(),
                    error,
                }),
            },
            _ => {
                if field.required {
                    errors.push(ParamValidationError::MissingParam { key: key.clone() });
                } else if let Some(default) = &field.default {
                    trace!(key = %key, default = %default, "applying default");
                    out.insert(key.clone(), default.clone());
                }
            }
        }
    }

    // Unknown keys.
    for key in param_values.0.keys() {
        if param_types.get(key).is_none() {
            errors.push(ParamValidationError::UnknownParam { key: key.clone() });
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(ParamValidationErrors { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn schema() -> ParamTypes {
        ParamTypes::new()
            .field("name", ParamField::new(ParamType::String).required())
            .field(
                "count",
                ParamField::new(ParamType::Integer).default_value(1),
            )
            .field("enabled", ParamField::new(ParamType::Boolean))
    }

    fn values(value: Value) -> ParamValues {
        ParamValues::from_json(value).unwrap()
    }

    #[test]
    fn applies_defaults() {
        let out = validate(&schema(), values(json!({ "name": "a" }))).unwrap();
        assert_eq!(out.get("name"), Some(&json!("a")));
        assert_eq!(out.get("count"), Some(&json!(1)));
        assert_eq!(out.get("enabled"), None);
    }

    #[test]
    fn null_counts_as_absent() {
        let out = validate(&schema(), values(json!({ "name": "a", "count": null }))).unwrap();
        assert_eq!(out.get("count"), Some(&json!(1)));

        let err = validate(&schema(), values(json!({ "name": null }))).unwrap_err();
        assert_eq!(
            err.errors,
            vec![ParamValidationError::MissingParam {
                key: "name".to_string()
            }]
        );
    }

    #[test]
    fn coerces_loose_input() {
        let out = validate(
            &schema(),
            values(json!({ "name": 42, "count": " 7 ", "enabled": "yes" })),
        )
        .unwrap();
        assert_eq!(out.get("name"), Some(&json!("42")));
        assert_eq!(out.get("count"), Some(&json!(7)));
        assert_eq!(out.get("enabled"), Some(&json!(true)));
    }

    #[test]
    fn passes_through_out_of_range_integers() {
        let out = validate(&schema(), values(json!({ "name": "a", "count": -3 }))).unwrap();
        assert_eq!(out.get("count"), Some(&json!(-3)));
    }

    #[test]
    fn integer_accepts_whole_floats_only() {
        assert_eq!(coerce(ParamType::Integer, &json!(4.0)), Ok(json!(4)));
        assert!(coerce(ParamType::Integer, &json!(4.5)).is_err());
        assert!(coerce(ParamType::Integer, &json!("four")).is_err());
        assert!(coerce(ParamType::Integer, &json!(true)).is_err());
    }

    #[test]
    fn string_from_bool_matches_ansible() {
        assert_eq!(coerce(ParamType::String, &json!(true)), Ok(json!("True")));
        assert!(coerce(ParamType::String, &json!([1])).is_err());
    }

    #[test]
    fn boolean_words() {
        assert_eq!(coerce(ParamType::Boolean, &json!("Off")), Ok(json!(false)));
        assert_eq!(coerce(ParamType::Boolean, &json!(1)), Ok(json!(true)));
        assert!(coerce(ParamType::Boolean, &json!(2)).is_err());
        assert!(coerce(ParamType::Boolean, &json!("maybe")).is_err());
    }

    #[test]
    fn collects_all_errors() {
        let err = validate(
            &schema(),
            values(json!({ "count": "many", "colour": "red" })),
        )
        .unwrap_err();

        assert_eq!(err.errors.len(), 3);
        assert_eq!(
            err.to_string(),
            "missing required arguments: name; \
             Unsupported parameters: colour; \
             argument count is of type str and we were unable to convert to int"
        );
    }

    #[test]
    fn not_an_object() {
        assert!(matches!(
            ParamValues::from_json(json!(["a"])),
            Err(ParamValuesFromJsonError::NotAnObject)
        ));
    }

    #[test]
    fn extract_if_removes_matching_keys() {
        let mut params = values(json!({ "_internal": true, "name": "a", "_other": 1 }));
        let taken = params.extract_if(|key| key.starts_with('_'));
        assert_eq!(taken.len(), 2);
        assert_eq!(params, values(json!({ "name": "a" })));
    }

    #[test]
    fn into_type_deserializes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Params {
            name: String,
            count: i64,
        }

        let out = validate(&schema(), values(json!({ "name": "a", "count": "2" }))).unwrap();
        let params: Params = out.into_type().unwrap();
        assert_eq!(
            params,
            Params {
                name: "a".to_string(),
                count: 2
            }
        );
    }
}
