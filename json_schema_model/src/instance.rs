//! Validated instances of a synthesized model.

use std::fmt;

use serde_json::{Map, Value};

use crate::Model;
use crate::model::{Additional, ModelDef, TypeKind, TypeRegistry, TypeSpec};

const MASK: &str = "**********";

/// An object that passed validation against a [`Model`].
///
/// Holds the normalized values: defaults applied, integral floats of
/// integer fields converted, ignored extras dropped.
#[derive(Debug, Clone)]
pub struct Instance {
    model: Model,
    values: Map<String, Value>,
}

impl Instance {
    pub(crate) fn new(model: Model, values: Map<String, Value>) -> Self {
        Self { model, values }
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The value of a field, if it was given or has a default.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// False for an omitted optional field without a `default`.
    #[must_use]
    pub fn is_set(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The instance as a JSON object. Unset optional fields are omitted.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Schema of the instance's model.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        self.model.json_schema()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.model.name() == other.model.name() && self.values == other.values
    }
}

/// `Person(age=30, name="John")`, with `password` strings masked at any depth.
impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry: &TypeRegistry = self.model.registry();
        let definition: &ModelDef = self.model.definition();
        write!(f, "{}(", definition.name)?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match field_type(definition, name) {
                Some(spec) if value.is_string() && registry.deref(spec).is_secret() => {
                    write!(f, "{name}={MASK}")?;
                }
                Some(spec) => write!(f, "{name}={}", masked(registry, spec, value))?,
                None => write!(f, "{name}={value}")?,
            }
        }
        write!(f, ")")
    }
}

/// Declared type of a key: its field, or the typed extras of the model.
fn field_type<'a>(model: &'a ModelDef, name: &str) -> Option<&'a TypeSpec> {
    match (model.fields.get(name), &model.additional) {
        (Some(field), _) => Some(&field.ty),
        (None, Additional::Schema(extra)) => Some(extra),
        (None, _) => None,
    }
}

/// Copy of `value` with every string typed as a secret replaced by the mask.
fn masked(registry: &TypeRegistry, spec: &TypeSpec, value: &Value) -> Value {
    let spec: &TypeSpec = registry.deref(spec);
    if value.is_string() && spec.is_secret() {
        return Value::String(MASK.to_string());
    }
    match (&spec.kind, value) {
        (TypeKind::Object(id) | TypeKind::RootRef(id), Value::Object(object)) => {
            let model: &ModelDef = registry.model(*id);
            Value::Object(
                object
                    .iter()
                    .map(|(name, item)| {
                        let item: Value = match field_type(model, name) {
                            Some(field) => masked(registry, field, item),
                            None => item.clone(),
                        };
                        (name.clone(), item)
                    })
                    .collect(),
            )
        }
        (TypeKind::Map(Additional::Schema(extra)), Value::Object(object)) => Value::Object(
            object
                .iter()
                .map(|(name, item)| (name.clone(), masked(registry, extra, item)))
                .collect(),
        ),
        (TypeKind::Array(Some(items)), Value::Array(values)) => Value::Array(
            values
                .iter()
                .map(|item| masked(registry, items, item))
                .collect(),
        ),
        (TypeKind::Tuple { items, .. }, Value::Array(values)) => Value::Array(
            values
                .iter()
                .enumerate()
                .map(|(i, item)| match items.get(i) {
                    Some(spec) => masked(registry, spec, item),
                    None => item.clone(),
                })
                .collect(),
        ),
        (TypeKind::Union { variants, .. }, _) => variants
            .iter()
            .fold(value.clone(), |current, variant| masked(registry, variant, &current)),
        (TypeKind::AllOf { branches, .. }, _) => branches
            .iter()
            .fold(value.clone(), |current, branch| masked(registry, branch, &current)),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{SynthesisOptions, create_model_from_schema};

    #[test]
    fn display_masks_passwords() {
        let model = create_model_from_schema(
            &json!({
                "title": "Login",
                "type": "object",
                "properties": {
                    "user": { "type": "string" },
                    "secret": { "type": "string", "format": "password" }
                }
            }),
            &SynthesisOptions::default(),
        )
        .expect("synthesizes");
        let instance = model
            .validate(&json!({ "user": "ada", "secret": "hunter2" }))
            .expect("valid");
        assert_eq!("Login(secret=**********, user=\"ada\")", instance.to_string());
        assert_eq!(Some(&json!("hunter2")), instance.get("secret"));
    }

    #[test]
    fn display_masks_nested_passwords() {
        let model = create_model_from_schema(
            &json!({
                "title": "Vault",
                "type": "object",
                "properties": {
                    "owner": { "$ref": "#/$defs/Account" },
                    "keys": { "type": "array", "items": { "type": "string", "format": "password" } }
                },
                "$defs": {
                    "Account": {
                        "type": "object",
                        "properties": {
                            "login": { "type": "string" },
                            "pin": { "type": "string", "format": "password" }
                        }
                    }
                }
            }),
            &SynthesisOptions::default(),
        )
        .expect("synthesizes");
        let instance = model
            .validate(&json!({
                "owner": { "login": "ada", "pin": "1234" },
                "keys": ["k1", "k2"]
            }))
            .expect("valid");
        let expected: &str = "Vault(keys=[\"**********\",\"**********\"], \
            owner={\"login\":\"ada\",\"pin\":\"**********\"})";
        let actual: String = instance.to_string();
        assert_eq!(expected, actual);
        assert!(!actual.contains("1234"));
        assert_eq!(Some(&json!({ "login": "ada", "pin": "1234" })), instance.get("owner"));
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let model = create_model_from_schema(
            &json!({
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer", "default": 2 }
                }
            }),
            &SynthesisOptions::default(),
        )
        .expect("synthesizes");
        let instance = model.validate(&json!({})).expect("valid");
        assert!(!instance.is_set("a"));
        assert!(instance.is_set("b"));
        assert_eq!(json!({ "b": 2 }), instance.to_value());
        assert_eq!("DynamicModel(b=2)", instance.to_string());
    }
}
