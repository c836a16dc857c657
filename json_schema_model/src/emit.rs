//! Emits a JSON Schema back out of a synthesized model.
//!
//! The emitted document uses the keywords the synthesizer understands, so
//! feeding it back in yields an equivalent model. Keyword order follows
//! `serde_json::Map`, which keeps keys sorted.

use serde_json::{Map, Value};

use crate::format::FormatKind;
use crate::json_pointer;
use crate::model::{
    Additional, Constraints, Definition, ModelDef, TupleKeyword, TypeKind, TypeRegistry, TypeSpec,
    UnionKeyword,
};
use crate::schema::KeywordValue;

/// Schema of a whole model: the root type plus every definition.
pub(crate) fn root_schema(registry: &TypeRegistry, root: &TypeSpec) -> Value {
    let mut out: Map<String, Value> = type_schema(registry, root);
    for (_, definition) in registry.definitions() {
        let section: &mut Value = out
            .entry(definition.section.keyword())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(section) = section {
            section.insert(
                definition.name.clone(),
                Value::Object(type_schema(registry, &definition.ty)),
            );
        }
    }
    Value::Object(out)
}

/// `$ref` string of a definition: `#/$defs/Name`.
pub(crate) fn definition_ref(definition: &Definition) -> String {
    let section: String = json_pointer::format("", definition.section.keyword());
    format!("#{}", json_pointer::format(&section, &definition.name))
}

fn type_schema(registry: &TypeRegistry, spec: &TypeSpec) -> Map<String, Value> {
    let mut out: Map<String, Value> = Map::new();
    kind_parts(registry, &spec.kind, &mut out);
    constraint_parts(&spec.constraints, &mut out);

    let annotations = &spec.annotations;
    for (keyword, value) in &annotations.meta {
        out.insert(keyword.clone(), value.clone());
    }
    if let Some(declared) = &annotations.declared_type {
        out.insert("type".to_string(), declared.to_value());
    }
    if let Some(format) = &annotations.format {
        out.insert("format".to_string(), Value::String(format.clone()));
    }
    if let Some(title) = &annotations.title {
        out.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(description) = &annotations.description {
        out.insert("description".to_string(), Value::String(description.clone()));
    }
    if let Some(examples) = &annotations.examples {
        out.insert("examples".to_string(), Value::Array(examples.clone()));
    }
    if let KeywordValue::Present(default) = &annotations.default {
        out.insert("default".to_string(), default.clone());
    }
    for (keyword, flag) in [
        ("readOnly", annotations.read_only),
        ("writeOnly", annotations.write_only),
        ("deprecated", annotations.deprecated),
    ] {
        if let Some(flag) = flag {
            out.insert(keyword.to_string(), Value::Bool(flag));
        }
    }
    out
}

fn schemas(registry: &TypeRegistry, specs: &[TypeSpec]) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|spec| Value::Object(type_schema(registry, spec)))
            .collect(),
    )
}

fn kind_parts(registry: &TypeRegistry, kind: &TypeKind, out: &mut Map<String, Value>) {
    match kind {
        TypeKind::String(Some(FormatKind::Uri {
            schemes: Some(schemes),
        })) => {
            out.insert(
                "scheme".to_string(),
                Value::Array(schemes.iter().cloned().map(Value::String).collect()),
            );
        }
        TypeKind::Any
        | TypeKind::Null
        | TypeKind::Boolean
        | TypeKind::Integer
        | TypeKind::Number
        | TypeKind::String(_)
        | TypeKind::Array(None) => {}
        TypeKind::Array(Some(items)) => {
            out.insert("items".to_string(), Value::Object(type_schema(registry, items)));
        }
        TypeKind::Tuple {
            items,
            closed,
            keyword: TupleKeyword::PrefixItems,
        } => {
            if !items.is_empty() {
                out.insert("prefixItems".to_string(), schemas(registry, items));
            }
            if *closed {
                out.insert("items".to_string(), Value::Bool(false));
            }
        }
        TypeKind::Tuple {
            items,
            closed,
            keyword: TupleKeyword::Items,
        } => {
            out.insert("items".to_string(), schemas(registry, items));
            if *closed {
                out.insert("additionalItems".to_string(), Value::Bool(false));
            }
        }
        TypeKind::Object(id) => model_parts(registry, registry.model(*id), out),
        TypeKind::Map(additional) => additional_parts(registry, additional, out),
        TypeKind::Enum(values) => {
            out.insert("enum".to_string(), Value::Array(values.clone()));
        }
        TypeKind::Const(value) => {
            out.insert("const".to_string(), value.clone());
        }
        TypeKind::Union {
            variants, keyword, ..
        } => match keyword {
            // One node with a `type` list: the variants share its keywords.
            UnionKeyword::TypeList => {
                for variant in variants {
                    kind_parts(registry, &variant.kind, out);
                }
            }
            UnionKeyword::AnyOf => {
                out.insert("anyOf".to_string(), schemas(registry, variants));
            }
            UnionKeyword::OneOf => {
                out.insert("oneOf".to_string(), schemas(registry, variants));
            }
        },
        TypeKind::AllOf { branches, own, .. } => {
            out.insert("allOf".to_string(), schemas(registry, branches));
            if let Some(own) = own {
                model_parts(registry, registry.model(*own), out);
            }
        }
        TypeKind::Ref(id) => {
            out.insert(
                "$ref".to_string(),
                Value::String(definition_ref(registry.definition(*id))),
            );
        }
        TypeKind::RootRef(_) => {
            out.insert("$ref".to_string(), Value::String("#".to_string()));
        }
    }
}

fn model_parts(registry: &TypeRegistry, model: &ModelDef, out: &mut Map<String, Value>) {
    if !model.fields.is_empty() {
        let properties: Map<String, Value> = model
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), Value::Object(type_schema(registry, &field.ty))))
            .collect();
        out.insert("properties".to_string(), Value::Object(properties));
    }
    if !model.required.is_empty() {
        out.insert(
            "required".to_string(),
            Value::Array(model.required.iter().cloned().map(Value::String).collect()),
        );
    }
    additional_parts(registry, &model.additional, out);
}

fn additional_parts(
    registry: &TypeRegistry,
    additional: &Additional,
    out: &mut Map<String, Value>,
) {
    let value: Value = match additional {
        Additional::Unspecified => return,
        Additional::Allow => Value::Bool(true),
        Additional::Forbid => Value::Bool(false),
        Additional::Schema(spec) => Value::Object(type_schema(registry, spec)),
    };
    out.insert("additionalProperties".to_string(), value);
}

fn constraint_parts(constraints: &Constraints, out: &mut Map<String, Value>) {
    for (keyword, bound) in [
        ("minimum", &constraints.minimum),
        ("maximum", &constraints.maximum),
        ("exclusiveMinimum", &constraints.exclusive_minimum),
        ("exclusiveMaximum", &constraints.exclusive_maximum),
        ("multipleOf", &constraints.multiple_of),
    ] {
        if let Some(bound) = bound {
            out.insert(keyword.to_string(), Value::Number(bound.clone()));
        }
    }
    for (keyword, count) in [
        ("minLength", constraints.min_length),
        ("maxLength", constraints.max_length),
        ("minItems", constraints.min_items),
        ("maxItems", constraints.max_items),
    ] {
        if let Some(count) = count {
            out.insert(keyword.to_string(), Value::from(count));
        }
    }
    if let Some(pattern) = &constraints.pattern {
        out.insert("pattern".to_string(), Value::String(pattern.source.clone()));
    }
    if let Some(unique) = constraints.unique_items {
        out.insert("uniqueItems".to_string(), Value::Bool(unique));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonSchema;
    use crate::settings::SynthesisOptions;
    use crate::synth::synthesize;
    use serde_json::json;

    fn round_trip(input: &Value) -> Value {
        let schema: JsonSchema = serde_json::from_value(input.clone()).expect("valid schema");
        let synthesized = synthesize(&schema, &SynthesisOptions::default()).expect("synthesizes");
        root_schema(&synthesized.registry, &synthesized.root_spec)
    }

    #[test]
    fn emits_input_keywords_back() {
        let input = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Record",
            "description": "A record with an id.",
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string", "format": "uuid" },
                "count": { "type": "integer", "minimum": 0, "maximum": 255, "default": 0 },
                "tags": { "type": "array", "items": { "type": "string" }, "uniqueItems": true },
                "status": { "enum": ["active", "inactive"] },
                "nickname": { "type": ["string", "null"], "maxLength": 20 },
                "site": { "type": "string", "format": "uri", "scheme": ["https"] }
            },
            "additionalProperties": false
        });
        let actual: Value = round_trip(&input);
        assert_eq!(input, actual);
    }

    #[test]
    fn emits_definitions_and_references() {
        let input = json!({
            "type": "object",
            "properties": {
                "root": { "$ref": "#/$defs/Node" },
                "legacy": { "$ref": "#/definitions/Old" }
            },
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } }
                    }
                }
            },
            "definitions": {
                "Old": { "type": "string" }
            }
        });
        assert_eq!(input, round_trip(&input));
    }

    #[test]
    fn emits_combinators_and_tuples() {
        let input = json!({
            "type": "object",
            "properties": {
                "choice": { "oneOf": [{ "type": "integer" }, { "type": "string" }] },
                "either": { "anyOf": [{ "type": "null" }, { "const": 3 }] },
                "both": {
                    "allOf": [
                        { "type": "object", "properties": { "a": { "type": "string" } } },
                        { "type": "object", "required": ["b"], "properties": { "b": { "type": "number" } } }
                    ]
                },
                "point": { "type": "array", "prefixItems": [{ "type": "number" }, { "type": "number" }], "items": false },
                "pair": { "type": "array", "items": [{ "type": "string" }, { "type": "boolean" }], "additionalItems": false },
                "self": { "$ref": "#" }
            }
        });
        assert_eq!(input, round_trip(&input));
    }

    #[test]
    fn round_trip_is_stable() {
        let input = json!({
            "title": "Order",
            "type": "object",
            "properties": {
                "lines": {
                    "type": "array",
                    "items": { "title": "Line", "type": "object", "properties": { "sku": { "type": "string", "pattern": "^[A-Z]+$" } } }
                },
                "meta": { "type": "object", "additionalProperties": { "type": "integer" } }
            }
        });
        let first: Value = round_trip(&input);
        let second: Value = round_trip(&first);
        assert_eq!(first, second);
    }
}
