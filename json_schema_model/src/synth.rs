//! Recursive schema-to-model synthesis.
//!
//! One [`Synthesizer`] lives for exactly one top-level call. It owns the
//! registry being built and the `$ref` cache, so concurrent calls never share
//! mutable state. Each definition is synthesized once: its registry slot is
//! reserved and cached *before* its body is resolved, which is what lets a
//! self-referential definition resolve to its own (still filling) slot.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace, warn};

use crate::error::SynthesisError;
use crate::format;
use crate::json_pointer;
use crate::model::{
    Additional, Annotations, Constraints, DefinitionId, ExtraFields, FieldSpec, ModelDef, ModelId,
    Pattern, TupleKeyword, TypeKind, TypeRegistry, TypeSpec, UnionKeyword,
};
use crate::resolver::{self, DefinitionEntry, DefinitionsTable, LocalRef};
use crate::schema::{ItemsKeyword, JsonSchema, KeywordValue, SchemaOrBool, TypeKeyword};
use crate::settings::{OneOfMode, SynthesisOptions};
use crate::validate::json_type_name;

/// Root model name when neither the options nor the schema provide one.
pub const DEFAULT_ROOT_NAME: &str = "DynamicModel";

/// The output of one synthesis call.
#[derive(Debug)]
pub(crate) struct Synthesized {
    pub registry: TypeRegistry,
    pub root: ModelId,
    pub root_spec: TypeSpec,
}

/// Synthesizes the model for a root schema.
pub(crate) fn synthesize(
    root: &JsonSchema,
    options: &SynthesisOptions,
) -> Result<Synthesized, SynthesisError> {
    let registry: TypeRegistry = options
        .base
        .as_ref()
        .map(|base| base.registry().clone())
        .unwrap_or_default();
    let mut synthesizer = Synthesizer {
        table: DefinitionsTable::from_root(root),
        options,
        registry,
        cache: HashMap::new(),
        root_model: None,
    };

    let root_name: String = options
        .root_name
        .clone()
        .or_else(|| root.title.as_deref().and_then(type_name))
        .unwrap_or_else(|| DEFAULT_ROOT_NAME.to_string());
    debug!(
        model = root_name.as_str(),
        definitions = synthesizer.table.len(),
        "synthesizing root model"
    );

    let root_spec: TypeSpec = synthesizer.root(root, &root_name)?;
    let Some(root_id) = synthesizer.registry.model_of(&root_spec) else {
        return Err(SynthesisError::UnsupportedSchema {
            path: String::new(),
            detail: "the root schema must describe an object".to_string(),
        });
    };

    if let Some(base) = &options.base {
        synthesizer.inherit(root_id, base.definition());
    }

    // Unreferenced definitions are synthesized too, so they are checked and
    // survive the round trip.
    let entries: Vec<DefinitionEntry<'_>> = synthesizer.table.entries().collect();
    for entry in entries {
        synthesizer.definition(entry, 1)?;
    }

    let root_model: &ModelDef = synthesizer.registry.model(root_id);
    if let Some(field) = options
        .validators
        .keys()
        .find(|field| !root_model.fields.contains_key(*field))
    {
        return Err(SynthesisError::UnknownValidatorField {
            model: root_model.name.clone(),
            field: field.clone(),
        });
    }

    Ok(Synthesized {
        registry: synthesizer.registry,
        root: root_id,
        root_spec,
    })
}

/// Converts a title or definition name into a type name (`PascalCase`).
/// Splits on any non-alphanumeric character and capitalizes each word,
/// leaving the rest of the word as written: `"Creature Habitats"` -> `"CreatureHabitats"`,
/// `"SKU"` -> `"SKU"`. Returns `None` when nothing alphanumeric remains.
#[must_use]
pub fn type_name(s: &str) -> Option<String> {
    let name: String = s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

struct Synthesizer<'a> {
    table: DefinitionsTable<'a>,
    options: &'a SynthesisOptions,
    registry: TypeRegistry,
    /// Definition pointer (`/$defs/Node`) -> synthesized slot.
    cache: HashMap<String, DefinitionId>,
    /// Target of `$ref: "#"`.
    root_model: Option<ModelId>,
}

impl<'a> Synthesizer<'a> {
    fn root(&mut self, node: &'a JsonSchema, name: &str) -> Result<TypeSpec, SynthesisError> {
        let plain_object: bool = node.reference.is_none()
            && node.any_of.is_none()
            && node.one_of.is_none()
            && node.all_of.is_none()
            && node.r#enum.is_none()
            && !node.const_value.is_present()
            && match &node.r#type {
                None => true,
                Some(TypeKeyword::Single(t)) => t == "object",
                Some(TypeKeyword::Multiple(_)) => false,
            };
        if !plain_object {
            return self.resolve(node, "", name, 0);
        }

        self.check_keywords(node, "")?;
        let id: ModelId = self.registry.reserve_model(name);
        self.root_model = Some(id);
        self.fill_object(id, node, "", name, 0)?;
        Ok(TypeSpec {
            kind: TypeKind::Object(id),
            constraints: self.constraints(node, "")?,
            annotations: annotations(node),
        })
    }

    /// Resolves any schema node into a [`TypeSpec`].
    fn resolve(
        &mut self,
        node: &'a JsonSchema,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeSpec, SynthesisError> {
        if depth > self.options.max_depth {
            return Err(SynthesisError::SchemaDepth {
                path: path.to_string(),
                limit: self.options.max_depth,
            });
        }
        self.check_keywords(node, path)?;
        let kind: TypeKind = self.kind_of(node, path, hint, depth)?;
        Ok(TypeSpec {
            kind,
            constraints: self.constraints(node, path)?,
            annotations: annotations(node),
        })
    }

    fn kind_of(
        &mut self,
        node: &'a JsonSchema,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        if let Some(reference) = &node.reference {
            return self.reference(reference, path, depth);
        }
        if let KeywordValue::Present(value) = &node.const_value {
            return Ok(TypeKind::Const(value.clone()));
        }
        if let Some(values) = &node.r#enum {
            if !values.is_empty() {
                return Ok(TypeKind::Enum(values.clone()));
            }
            self.unsupported(
                &json_pointer::format(path, "enum"),
                "`enum` must list at least one value",
            )?;
        }

        let any_of: Option<&'a [JsonSchema]> = node.any_of.as_deref().filter(|b| !b.is_empty());
        let one_of: Option<&'a [JsonSchema]> = node.one_of.as_deref().filter(|b| !b.is_empty());
        match (any_of, one_of) {
            (Some(branches), Some(_)) => {
                self.unsupported(path, "`anyOf` and `oneOf` on the same node; `oneOf` dropped")?;
                return self.union(branches, UnionKeyword::AnyOf, path, hint, depth);
            }
            (Some(branches), None) => {
                return self.union(branches, UnionKeyword::AnyOf, path, hint, depth);
            }
            (None, Some(branches)) => {
                return self.union(branches, UnionKeyword::OneOf, path, hint, depth);
            }
            (None, None) => {}
        }

        if let Some(branches) = node.all_of.as_deref()
            && !branches.is_empty()
        {
            return self.all_of(node, branches, path, hint, depth);
        }

        match &node.r#type {
            Some(TypeKeyword::Single(name)) => self.kind_for_type(name, node, path, hint, depth),
            Some(TypeKeyword::Multiple(names)) => {
                if names.is_empty() {
                    self.unsupported(&json_pointer::format(path, "type"), "empty `type` list")?;
                    return Ok(TypeKind::Any);
                }
                let mut variants: Vec<TypeSpec> = Vec::with_capacity(names.len());
                for name in names {
                    variants.push(TypeSpec::new(
                        self.kind_for_type(name, node, path, hint, depth)?,
                    ));
                }
                Ok(TypeKind::Union {
                    variants,
                    keyword: UnionKeyword::TypeList,
                    exclusive: false,
                })
            }
            None if node.properties.is_some() || node.additional_properties.is_some() => {
                self.object(node, path, hint, depth)
            }
            None if node.items.is_some() || node.prefix_items.is_some() => {
                self.array(node, path, hint, depth)
            }
            None => Ok(TypeKind::Any),
        }
    }

    fn kind_for_type(
        &mut self,
        name: &str,
        node: &'a JsonSchema,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        if let Some(kind) = format::map_primitive(name, node) {
            return Ok(kind);
        }
        match name {
            "object" => self.object(node, path, hint, depth),
            "array" => self.array(node, path, hint, depth),
            other => {
                self.unsupported(
                    &json_pointer::format(path, "type"),
                    format!("unknown type `{other}`"),
                )?;
                Ok(TypeKind::Any)
            }
        }
    }

    fn reference(
        &mut self,
        reference: &str,
        path: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        let resolution_error = |reason: String| SynthesisError::Resolution {
            path: path.to_string(),
            reference: reference.to_string(),
            reason,
        };
        match resolver::parse_reference(reference).map_err(resolution_error)? {
            LocalRef::Root => self.root_model.map(TypeKind::RootRef).ok_or_else(|| {
                resolution_error(
                    "`#` can only refer to a root schema that is a plain object".to_string(),
                )
            }),
            LocalRef::Definition { section, name } => {
                let entry: DefinitionEntry<'a> =
                    self.table.get(section, &name).map_err(resolution_error)?;
                Ok(TypeKind::Ref(self.definition(entry, depth)?))
            }
        }
    }

    /// Synthesizes a definition once; later references get the cached slot.
    fn definition(
        &mut self,
        entry: DefinitionEntry<'a>,
        depth: usize,
    ) -> Result<DefinitionId, SynthesisError> {
        let pointer: String = entry.pointer();
        if let Some(id) = self.cache.get(&pointer) {
            trace!(definition = entry.name, "definition served from cache");
            return Ok(*id);
        }
        let id: DefinitionId = self.registry.reserve_definition(entry.name, entry.section);
        self.cache.insert(pointer.clone(), id);
        debug!(definition = entry.name, "synthesizing definition");

        let hint: String = type_name(entry.name).unwrap_or_else(|| "Definition".to_string());
        let ty: TypeSpec = self.resolve(entry.node, &pointer, &hint, depth + 1)?;
        self.registry.fill_definition(id, ty);
        Ok(id)
    }

    fn union(
        &mut self,
        branches: &'a [JsonSchema],
        keyword: UnionKeyword,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        let keyword_name: &str = match keyword {
            UnionKeyword::OneOf => "oneOf",
            UnionKeyword::AnyOf | UnionKeyword::TypeList => "anyOf",
        };
        let variants: Vec<TypeSpec> =
            self.resolve_list(branches, &json_pointer::format(path, keyword_name), hint, depth)?;
        Ok(TypeKind::Union {
            variants,
            keyword,
            exclusive: keyword == UnionKeyword::OneOf
                && self.options.one_of == OneOfMode::Exclusive,
        })
    }

    fn resolve_list(
        &mut self,
        nodes: &'a [JsonSchema],
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<Vec<TypeSpec>, SynthesisError> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                self.resolve(node, &json_pointer::format_index(path, i), hint, depth + 1)
            })
            .collect()
    }

    /// `allOf`: keeps the branches for the round trip and merges their object
    /// properties and `required` sets into one model for validation.
    fn all_of(
        &mut self,
        node: &'a JsonSchema,
        branches: &'a [JsonSchema],
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        let all_of_path: String = json_pointer::format(path, "allOf");
        let specs: Vec<TypeSpec> = self.resolve_list(branches, &all_of_path, hint, depth)?;
        let name: String = model_name(node, hint);

        let own: Option<ModelId> = if node.properties.is_some() {
            let id: ModelId = self.registry.reserve_model(&name);
            self.fill_object(id, node, path, &name, depth)?;
            Some(id)
        } else {
            None
        };

        if specs.len() == 1 && own.is_none() {
            let merged: TypeSpec = specs[0].clone();
            return Ok(TypeKind::AllOf {
                branches: specs,
                own,
                merged: Box::new(merged),
            });
        }

        let mut parts: Vec<(String, ModelDef)> = Vec::new();
        for (i, spec) in specs.iter().enumerate() {
            let branch_path: String = json_pointer::format_index(&all_of_path, i);
            match self.registry.model_of(spec) {
                Some(id) => parts.push((branch_path, self.registry.model(id).clone())),
                None if self.registry.deref(spec).kind == TypeKind::Any => {}
                None => self.unsupported(&branch_path, "`allOf` can only merge object schemas")?,
            }
        }
        if let Some(id) = own {
            parts.push((path.to_string(), self.registry.model(id).clone()));
        }
        if parts.is_empty() {
            let merged: TypeSpec = specs[0].clone();
            return Ok(TypeKind::AllOf {
                branches: specs,
                own,
                merged: Box::new(merged),
            });
        }

        let merged_model: ModelDef = self.merge_models(&name, parts)?;
        let merged_id: ModelId = self.registry.reserve_model(&name);
        self.registry.fill_model(merged_id, merged_model);
        Ok(TypeKind::AllOf {
            branches: specs,
            own,
            merged: Box::new(TypeSpec::new(TypeKind::Object(merged_id))),
        })
    }

    /// Shallow merge in branch order. A later branch may refine a property but
    /// not change the JSON type it admits.
    fn merge_models(
        &self,
        name: &str,
        parts: Vec<(String, ModelDef)>,
    ) -> Result<ModelDef, SynthesisError> {
        let mut merged = ModelDef::placeholder(name);
        let mut required: BTreeSet<String> = BTreeSet::new();
        for (part_path, part) in parts {
            for (property, field) in part.fields {
                if let Some(existing) = merged.fields.get(&property)
                    && !self.compatible(&existing.ty, &field.ty)
                {
                    return Err(SynthesisError::SchemaConflict {
                        path: part_path,
                        property,
                        detail: format!(
                            "{} cannot be merged with {}",
                            describe_types(self.json_types(&existing.ty)),
                            describe_types(self.json_types(&field.ty))
                        ),
                    });
                }
                merged.fields.insert(property, field);
            }
            for required_name in part.required {
                if required.insert(required_name.clone()) {
                    merged.required.push(required_name);
                }
            }
            if part.additional != Additional::Unspecified {
                merged.extra = part.extra;
                merged.additional = part.additional;
            }
        }
        if merged.additional == Additional::Unspecified {
            merged.extra = self.options.extra;
        }
        for field in merged.fields.values_mut() {
            field.required = required.contains(&field.name);
        }
        Ok(merged)
    }

    fn compatible(&self, a: &TypeSpec, b: &TypeSpec) -> bool {
        match (self.json_types(a), self.json_types(b)) {
            (Some(a), Some(b)) => !a.is_disjoint(&b),
            (None, _) | (_, None) => true,
        }
    }

    /// The JSON types a spec admits; `None` admits everything.
    fn json_types(&self, spec: &TypeSpec) -> Option<BTreeSet<&'static str>> {
        let spec: &TypeSpec = self.registry.deref(spec);
        let single = |name: &'static str| Some(BTreeSet::from([name]));
        match &spec.kind {
            TypeKind::Any | TypeKind::Ref(_) | TypeKind::AllOf { .. } => None,
            TypeKind::Null => single("null"),
            TypeKind::Boolean => single("boolean"),
            TypeKind::Integer | TypeKind::Number => single("number"),
            TypeKind::String(_) => single("string"),
            TypeKind::Array(_) | TypeKind::Tuple { .. } => single("array"),
            TypeKind::Object(_) | TypeKind::RootRef(_) | TypeKind::Map(_) => single("object"),
            TypeKind::Enum(values) => Some(values.iter().map(json_type_name).collect()),
            TypeKind::Const(value) => single(json_type_name(value)),
            TypeKind::Union { variants, .. } => {
                let mut all: BTreeSet<&'static str> = BTreeSet::new();
                for variant in variants {
                    all.extend(self.json_types(variant)?);
                }
                Some(all)
            }
        }
    }

    fn object(
        &mut self,
        node: &'a JsonSchema,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        let closed: bool = matches!(node.additional_properties, Some(SchemaOrBool::Bool(false)));
        if node.properties.is_none() && !closed {
            return Ok(TypeKind::Map(self.additional(node, path, hint, depth)?));
        }
        let name: String = model_name(node, hint);
        let id: ModelId = self.registry.reserve_model(&name);
        self.fill_object(id, node, path, &name, depth)?;
        Ok(TypeKind::Object(id))
    }

    fn fill_object(
        &mut self,
        id: ModelId,
        node: &'a JsonSchema,
        path: &str,
        name: &str,
        depth: usize,
    ) -> Result<(), SynthesisError> {
        let required: &[String] = node.required_names();
        let mut fields: BTreeMap<String, FieldSpec> = BTreeMap::new();
        if let Some(properties) = &node.properties {
            let properties_path: String = json_pointer::format(path, "properties");
            for (key, property) in properties {
                trace!(model = name, property = key.as_str(), "synthesizing property");
                let hint: String = self.options.naming.nested_name(name, key);
                let ty: TypeSpec = self.resolve(
                    property,
                    &json_pointer::format(&properties_path, key),
                    &hint,
                    depth + 1,
                )?;
                fields.insert(
                    key.clone(),
                    FieldSpec {
                        name: key.clone(),
                        ty,
                        required: required.contains(key),
                    },
                );
            }
        }
        for missing in required.iter().filter(|r| !fields.contains_key(*r)) {
            self.unsupported(
                &json_pointer::format(path, "required"),
                format!("required property `{missing}` is not declared in `properties`"),
            )?;
        }

        let additional: Additional = self.additional(node, path, name, depth)?;
        let extra: ExtraFields = match &additional {
            Additional::Unspecified => self.options.extra,
            Additional::Allow | Additional::Schema(_) => ExtraFields::Allow,
            Additional::Forbid => ExtraFields::Forbid,
        };
        self.registry.fill_model(
            id,
            ModelDef {
                name: name.to_string(),
                fields,
                required: required.to_vec(),
                additional,
                extra,
            },
        );
        Ok(())
    }

    fn additional(
        &mut self,
        node: &'a JsonSchema,
        path: &str,
        owner: &str,
        depth: usize,
    ) -> Result<Additional, SynthesisError> {
        let additional: Additional = match &node.additional_properties {
            None => Additional::Unspecified,
            Some(SchemaOrBool::Bool(true)) => Additional::Allow,
            Some(SchemaOrBool::Bool(false)) => Additional::Forbid,
            Some(SchemaOrBool::Schema(schema)) => Additional::Schema(Box::new(self.resolve(
                schema,
                &json_pointer::format(path, "additionalProperties"),
                &format!("{owner}Extra"),
                depth + 1,
            )?)),
        };
        Ok(additional)
    }

    fn array(
        &mut self,
        node: &'a JsonSchema,
        path: &str,
        hint: &str,
        depth: usize,
    ) -> Result<TypeKind, SynthesisError> {
        if let Some(prefix) = &node.prefix_items {
            let items: Vec<TypeSpec> =
                self.resolve_list(prefix, &json_pointer::format(path, "prefixItems"), hint, depth)?;
            if matches!(node.items, Some(ItemsKeyword::Schema(_) | ItemsKeyword::Tuple(_))) {
                self.unsupported(
                    &json_pointer::format(path, "items"),
                    "`items` next to `prefixItems` must be a boolean",
                )?;
            }
            return Ok(TypeKind::Tuple {
                items,
                closed: matches!(node.items, Some(ItemsKeyword::Bool(false))),
                keyword: TupleKeyword::PrefixItems,
            });
        }
        match &node.items {
            None | Some(ItemsKeyword::Bool(true)) => Ok(TypeKind::Array(None)),
            Some(ItemsKeyword::Bool(false)) => Ok(TypeKind::Tuple {
                items: Vec::new(),
                closed: true,
                keyword: TupleKeyword::PrefixItems,
            }),
            Some(ItemsKeyword::Schema(item)) => Ok(TypeKind::Array(Some(Box::new(self.resolve(
                item,
                &json_pointer::format(path, "items"),
                hint,
                depth + 1,
            )?)))),
            Some(ItemsKeyword::Tuple(list)) => {
                let items: Vec<TypeSpec> =
                    self.resolve_list(list, &json_pointer::format(path, "items"), hint, depth)?;
                if matches!(node.additional_items, Some(SchemaOrBool::Schema(_))) {
                    self.unsupported(
                        &json_pointer::format(path, "additionalItems"),
                        "only boolean `additionalItems` is supported",
                    )?;
                }
                Ok(TypeKind::Tuple {
                    items,
                    closed: matches!(node.additional_items, Some(SchemaOrBool::Bool(false))),
                    keyword: TupleKeyword::Items,
                })
            }
        }
    }

    fn constraints(
        &self,
        node: &JsonSchema,
        path: &str,
    ) -> Result<Constraints, SynthesisError> {
        let mut constraints = Constraints {
            minimum: self.number_keyword(node.minimum.as_ref(), path, "minimum")?,
            maximum: self.number_keyword(node.maximum.as_ref(), path, "maximum")?,
            exclusive_minimum: self.number_keyword(
                node.exclusive_minimum.as_ref(),
                path,
                "exclusiveMinimum",
            )?,
            exclusive_maximum: self.number_keyword(
                node.exclusive_maximum.as_ref(),
                path,
                "exclusiveMaximum",
            )?,
            multiple_of: self.number_keyword(node.multiple_of.as_ref(), path, "multipleOf")?,
            min_length: node.min_length,
            max_length: node.max_length,
            pattern: None,
            min_items: node.min_items,
            max_items: node.max_items,
            unique_items: node.unique_items,
        };
        if let Some(step) = &constraints.multiple_of
            && step.as_f64().is_none_or(|s| s <= 0.0)
        {
            self.unsupported(
                &json_pointer::format(path, "multipleOf"),
                "`multipleOf` must be greater than zero",
            )?;
            constraints.multiple_of = None;
        }
        if let Some(source) = &node.pattern {
            match Pattern::new(source) {
                Ok(pattern) => constraints.pattern = Some(pattern),
                Err(reason) => self.unsupported(
                    &json_pointer::format(path, "pattern"),
                    format!("invalid pattern: {reason}"),
                )?,
            }
        }
        Ok(constraints)
    }

    fn number_keyword(
        &self,
        value: Option<&serde_json::Value>,
        path: &str,
        keyword: &str,
    ) -> Result<Option<serde_json::Number>, SynthesisError> {
        match value {
            None => Ok(None),
            Some(serde_json::Value::Number(n)) => Ok(Some(n.clone())),
            Some(other) => {
                self.unsupported(
                    &json_pointer::format(path, keyword),
                    format!("`{keyword}` must be a number, found {other}"),
                )?;
                Ok(None)
            }
        }
    }

    fn check_keywords(&self, node: &JsonSchema, path: &str) -> Result<(), SynthesisError> {
        for keyword in node.unknown.keys() {
            self.unsupported(
                &json_pointer::format(path, keyword),
                format!("unsupported keyword `{keyword}`"),
            )?;
        }
        Ok(())
    }

    /// Fails in strict mode; logs and carries on in lenient mode.
    fn unsupported(&self, path: &str, detail: impl Into<String>) -> Result<(), SynthesisError> {
        let detail: String = detail.into();
        if self.options.is_strict() {
            return Err(SynthesisError::UnsupportedSchema {
                path: path.to_string(),
                detail,
            });
        }
        warn!(path = %json_pointer::display(path), "{detail}; ignored");
        Ok(())
    }

    /// Copies base-model fields the schema does not declare itself.
    fn inherit(&mut self, root: ModelId, base: &ModelDef) {
        let default_extra: ExtraFields = self.options.extra;
        let model: &mut ModelDef = self.registry.model_mut(root);
        for (name, field) in &base.fields {
            model
                .fields
                .entry(name.clone())
                .or_insert_with(|| field.clone());
        }
        let mut required: Vec<String> = base
            .required
            .iter()
            .filter(|name| !model.required.contains(*name))
            .cloned()
            .collect();
        required.append(&mut model.required);
        model.required = required;
        if model.additional == Additional::Unspecified && model.extra == default_extra {
            model.extra = base.extra;
        }
        debug!(model = model.name.as_str(), base = base.name.as_str(), "inherited base fields");
    }
}

fn model_name(node: &JsonSchema, hint: &str) -> String {
    node.title
        .as_deref()
        .and_then(type_name)
        .unwrap_or_else(|| hint.to_string())
}

fn annotations(node: &JsonSchema) -> Annotations {
    let mut meta: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for (keyword, value) in [
        ("$schema", &node.schema_uri),
        ("$id", &node.id),
        ("$comment", &node.comment),
    ] {
        if let Some(value) = value {
            meta.insert(keyword.to_string(), value.clone());
        }
    }
    Annotations {
        declared_type: node.r#type.clone(),
        format: node.format.clone(),
        title: node.title.clone(),
        description: node.description.clone(),
        examples: node.examples.clone(),
        default: node.default.clone(),
        read_only: node.read_only,
        write_only: node.write_only,
        deprecated: node.deprecated,
        meta,
    }
}

fn describe_types(types: Option<BTreeSet<&'static str>>) -> String {
    match types {
        None => "any".to_string(),
        Some(types) => types.into_iter().collect::<Vec<&str>>().join(" | "),
    }
}
