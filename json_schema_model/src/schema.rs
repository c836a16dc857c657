use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Wraps a keyword whose value may legitimately be JSON `null` (`default`, `const`).
/// Serde deserializes `Option<Value>` with JSON null as `None`; we need to
/// distinguish an absent key from `"default": null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KeywordValue {
    /// The keyword was absent from the schema.
    #[default]
    Absent,
    /// The keyword was present; the value may be `Value::Null`.
    Present(Value),
}

impl KeywordValue {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl<'de> Deserialize<'de> for KeywordValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v: Value = Deserialize::deserialize(deserializer)?;
        Ok(KeywordValue::Present(v))
    }
}

/// The `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeKeyword {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeKeyword {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(name) => Value::String(name.clone()),
            Self::Multiple(names) => {
                Value::Array(names.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Keywords that accept either a boolean schema or a subschema
/// (`additionalProperties`, `additionalItems`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrBool {
    Bool(bool),
    Schema(Box<JsonSchema>),
}

/// The `items` keyword: a boolean, a positional tuple list, or one schema for every item.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemsKeyword {
    Bool(bool),
    Tuple(Vec<JsonSchema>),
    Schema(Box<JsonSchema>),
}

/// One JSON Schema node: the root document, a property, an item schema or a definition.
///
/// Only the keywords the synthesizer understands are modeled. Every other key
/// lands in `unknown` so strict mode can report it and lenient mode can drop it.
/// Uses `BTreeMap` for deterministic property ordering (alphabetical by key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonSchema {
    #[serde(default, rename = "$schema")]
    pub schema_uri: Option<Value>,

    #[serde(default, rename = "$id")]
    pub id: Option<Value>,

    #[serde(default, rename = "$comment")]
    pub comment: Option<Value>,

    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default, rename = "$defs")]
    pub defs: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default)]
    pub definitions: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub examples: Option<Vec<Value>>,

    #[serde(default)]
    pub r#type: Option<TypeKeyword>,

    #[serde(default)]
    pub format: Option<String>,

    /// Allowed URI schemes for `format: "uri"`.
    #[serde(default)]
    pub scheme: Option<Vec<String>>,

    #[serde(default)]
    pub properties: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default)]
    pub required: Option<Vec<String>>,

    #[serde(default, rename = "additionalProperties")]
    pub additional_properties: Option<SchemaOrBool>,

    #[serde(default)]
    pub items: Option<ItemsKeyword>,

    #[serde(default, rename = "prefixItems")]
    pub prefix_items: Option<Vec<JsonSchema>>,

    #[serde(default, rename = "additionalItems")]
    pub additional_items: Option<SchemaOrBool>,

    #[serde(default, rename = "anyOf")]
    pub any_of: Option<Vec<JsonSchema>>,

    #[serde(default, rename = "oneOf")]
    pub one_of: Option<Vec<JsonSchema>>,

    #[serde(default, rename = "allOf")]
    pub all_of: Option<Vec<JsonSchema>>,

    #[serde(default)]
    pub r#enum: Option<Vec<Value>>,

    #[serde(default, rename = "const")]
    pub const_value: KeywordValue,

    #[serde(default)]
    pub default: KeywordValue,

    #[serde(default)]
    pub minimum: Option<Value>,

    #[serde(default)]
    pub maximum: Option<Value>,

    #[serde(default, rename = "exclusiveMinimum")]
    pub exclusive_minimum: Option<Value>,

    #[serde(default, rename = "exclusiveMaximum")]
    pub exclusive_maximum: Option<Value>,

    #[serde(default, rename = "multipleOf")]
    pub multiple_of: Option<Value>,

    #[serde(default, rename = "minLength")]
    pub min_length: Option<u64>,

    #[serde(default, rename = "maxLength")]
    pub max_length: Option<u64>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default, rename = "minItems")]
    pub min_items: Option<u64>,

    #[serde(default, rename = "maxItems")]
    pub max_items: Option<u64>,

    #[serde(default, rename = "uniqueItems")]
    pub unique_items: Option<bool>,

    #[serde(default, rename = "readOnly")]
    pub read_only: Option<bool>,

    #[serde(default, rename = "writeOnly")]
    pub write_only: Option<bool>,

    #[serde(default)]
    pub deprecated: Option<bool>,

    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

impl JsonSchema {
    /// Names listed in `required`, in source order.
    #[must_use]
    pub fn required_names(&self) -> &[String] {
        self.required.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_null_is_present() {
        let schema: JsonSchema =
            serde_json::from_value(serde_json::json!({ "type": "string", "default": null }))
                .expect("valid schema");
        assert_eq!(schema.default, KeywordValue::Present(Value::Null));
    }

    #[test]
    fn default_missing_is_absent() {
        let schema: JsonSchema =
            serde_json::from_value(serde_json::json!({ "type": "string" })).expect("valid schema");
        assert_eq!(schema.default, KeywordValue::Absent);
        assert_eq!(schema.const_value, KeywordValue::Absent);
    }

    #[test]
    fn type_list_deserializes() {
        let schema: JsonSchema =
            serde_json::from_value(serde_json::json!({ "type": ["string", "null"] }))
                .expect("valid schema");
        let expected = TypeKeyword::Multiple(vec!["string".to_string(), "null".to_string()]);
        assert_eq!(schema.r#type, Some(expected));
    }

    #[test]
    fn items_forms_deserialize() {
        let single: JsonSchema =
            serde_json::from_value(serde_json::json!({ "items": { "type": "integer" } }))
                .expect("valid schema");
        assert!(matches!(single.items, Some(ItemsKeyword::Schema(_))));

        let tuple: JsonSchema = serde_json::from_value(
            serde_json::json!({ "items": [{ "type": "integer" }, { "type": "string" }] }),
        )
        .expect("valid schema");
        assert!(matches!(tuple.items, Some(ItemsKeyword::Tuple(ref t)) if t.len() == 2));

        let closed: JsonSchema =
            serde_json::from_value(serde_json::json!({ "items": false })).expect("valid schema");
        assert!(matches!(closed.items, Some(ItemsKeyword::Bool(false))));
    }

    #[test]
    fn unknown_keywords_are_collected() {
        let schema: JsonSchema = serde_json::from_value(serde_json::json!({
            "type": "object",
            "patternProperties": { "^x-": {} },
            "$comment": "kept"
        }))
        .expect("valid schema");
        let keys: Vec<&str> = schema.unknown.keys().map(String::as_str).collect();
        assert_eq!(vec!["patternProperties"], keys);
    }
}
