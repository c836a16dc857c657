//! The synthesized field tables.
//!
//! A schema compiles into a [`TypeRegistry`]: an arena of object models and
//! `$ref` definitions addressed by index. Recursive schemas are expressed by
//! indices pointing back into the arena, so the registry itself never contains
//! a reference cycle.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::format::FormatKind;
use crate::schema::{KeywordValue, TypeKeyword};

/// Index of an object model in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub(crate) usize);

/// Index of a `$ref` definition in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(pub(crate) usize);

/// Which root section a definition was declared in. Kept so the emitted
/// schema uses the same pointers as the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefinitionSection {
    Defs,
    Definitions,
}

impl DefinitionSection {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Defs => "$defs",
            Self::Definitions => "definitions",
        }
    }
}

/// How a model treats instance keys that are not declared in `properties`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtraFields {
    /// Accept and drop them.
    #[default]
    Ignore,
    /// Accept and keep them.
    Allow,
    /// Reject them.
    Forbid,
}

/// The `additionalProperties` keyword as synthesized.
#[derive(Debug, Clone, PartialEq)]
pub enum Additional {
    /// Not written in the schema; the model falls back to the configured [`ExtraFields`].
    Unspecified,
    /// `additionalProperties: true`
    Allow,
    /// `additionalProperties: false`
    Forbid,
    /// `additionalProperties: {schema}`: extras are kept and typed.
    Schema(Box<TypeSpec>),
}

/// Which keyword a union came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKeyword {
    /// `type: ["string", "null"]`
    TypeList,
    AnyOf,
    OneOf,
}

/// Which keyword a positional tuple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleKeyword {
    /// 2020-12 `prefixItems`, closed with `items: false`.
    PrefixItems,
    /// Pre-2020 `items: [..]`, closed with `additionalItems: false`.
    Items,
}

/// The semantic shape of one schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// No type restriction at all.
    Any,
    Null,
    Boolean,
    Integer,
    Number,
    /// A string, refined by a recognized `format` when there is one.
    String(Option<FormatKind>),
    /// Homogeneous array; `None` items accept anything.
    Array(Option<Box<TypeSpec>>),
    Tuple {
        items: Vec<TypeSpec>,
        closed: bool,
        keyword: TupleKeyword,
    },
    /// Object with declared properties.
    Object(ModelId),
    /// Free-form object: no `properties`, values typed by `additionalProperties` if given.
    Map(Additional),
    /// Closed set of literals; values keep their JSON types.
    Enum(Vec<Value>),
    Const(Value),
    Union {
        variants: Vec<TypeSpec>,
        keyword: UnionKeyword,
        /// Reject values accepted by more than one branch.
        exclusive: bool,
    },
    /// `allOf`: the branches as written plus the merged result used for validation.
    AllOf {
        branches: Vec<TypeSpec>,
        own: Option<ModelId>,
        merged: Box<TypeSpec>,
    },
    /// `$ref` into the definitions section.
    Ref(DefinitionId),
    /// `$ref: "#"`, the root model itself.
    RootRef(ModelId),
}

/// A compiled `pattern` keyword. Compared by source text.
#[derive(Clone)]
pub struct Pattern {
    pub source: String,
    pub(crate) regex: regress::Regex,
}

impl Pattern {
    /// Compiles an ECMA-262 pattern, the dialect JSON Schema prescribes.
    ///
    /// # Errors
    ///
    /// Returns the compiler's message when the pattern is not a valid regular expression.
    pub fn new(source: &str) -> Result<Self, String> {
        let regex: regress::Regex = regress::Regex::new(source).map_err(|e| e.to_string())?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// JSON Schema patterns are unanchored: any match inside the string counts.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find(text).is_some()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Constraint metadata carried through to the validator. Each constraint only
/// applies to instances of the matching JSON type, as in JSON Schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
}

/// Documentation and bookkeeping keywords of a node, kept for the round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// The node's `type` keyword exactly as written.
    pub declared_type: Option<TypeKeyword>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub examples: Option<Vec<Value>>,
    pub default: KeywordValue,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub deprecated: Option<bool>,
    /// `$schema`, `$id`, `$comment`
    pub meta: BTreeMap<String, Value>,
}

/// A synthesized type: its shape plus the constraints and annotations of the node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub kind: TypeKind,
    pub constraints: Constraints,
    pub annotations: Annotations,
}

impl TypeSpec {
    #[must_use]
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            constraints: Constraints::default(),
            annotations: Annotations::default(),
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }

    /// True for `password` strings, whose values are masked when displayed.
    #[must_use]
    pub fn is_secret(&self) -> bool {
        match &self.kind {
            TypeKind::String(Some(FormatKind::Password)) => true,
            TypeKind::Union { variants, .. } => variants.iter().any(Self::is_secret),
            _ => false,
        }
    }
}

/// One property of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeSpec,
    pub required: bool,
}

impl FieldSpec {
    /// The `default` keyword. `Absent` means an omitted optional field stays
    /// unset; `Present(Value::Null)` means it defaults to an explicit null.
    #[must_use]
    pub fn default(&self) -> &KeywordValue {
        &self.ty.annotations.default
    }
}

/// An object model: a name and its field table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    pub name: String,
    pub fields: BTreeMap<String, FieldSpec>,
    /// `required` in source order, for the emitted schema.
    pub required: Vec<String>,
    pub additional: Additional,
    /// The policy applied when validating.
    pub extra: ExtraFields,
}

impl ModelDef {
    pub(crate) fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: BTreeMap::new(),
            required: Vec::new(),
            additional: Additional::Unspecified,
            extra: ExtraFields::Ignore,
        }
    }
}

/// A `$ref` target, synthesized once per pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub section: DefinitionSection,
    pub ty: TypeSpec,
}

/// Arena of every model and definition produced by one synthesis call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    models: Vec<ModelDef>,
    definitions: Vec<Definition>,
}

impl TypeRegistry {
    #[must_use]
    pub fn model(&self, id: ModelId) -> &ModelDef {
        &self.models[id.0]
    }

    #[must_use]
    pub fn definition(&self, id: DefinitionId) -> &Definition {
        &self.definitions[id.0]
    }

    pub fn definitions(&self) -> impl Iterator<Item = (DefinitionId, &Definition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (DefinitionId(i), d))
    }

    /// Looks up a definition by the name it was declared under.
    #[must_use]
    pub fn definition_named(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Follows `$ref`s and single-branch wrappers to the type that shapes values.
    #[must_use]
    pub fn deref<'a>(&'a self, spec: &'a TypeSpec) -> &'a TypeSpec {
        let mut current: &TypeSpec = spec;
        // `merged` is owned, so only `$ref` hops can cycle. Each definition
        // is entered at most once.
        let mut visited: Vec<bool> = vec![false; self.definitions.len()];
        loop {
            match &current.kind {
                TypeKind::Ref(id) => {
                    if std::mem::replace(&mut visited[id.0], true) {
                        return current;
                    }
                    current = &self.definition(*id).ty;
                }
                TypeKind::AllOf { merged, .. } => current = &**merged,
                _ => return current,
            }
        }
    }

    /// The object model a type resolves to, if any.
    #[must_use]
    pub fn model_of(&self, spec: &TypeSpec) -> Option<ModelId> {
        if let TypeKind::Object(id) | TypeKind::RootRef(id) = &self.deref(spec).kind {
            Some(*id)
        } else {
            None
        }
    }

    pub(crate) fn reserve_model(&mut self, name: &str) -> ModelId {
        self.models.push(ModelDef::placeholder(name));
        ModelId(self.models.len() - 1)
    }

    pub(crate) fn fill_model(&mut self, id: ModelId, model: ModelDef) {
        self.models[id.0] = model;
    }

    pub(crate) fn model_mut(&mut self, id: ModelId) -> &mut ModelDef {
        &mut self.models[id.0]
    }

    pub(crate) fn reserve_definition(
        &mut self,
        name: &str,
        section: DefinitionSection,
    ) -> DefinitionId {
        self.definitions.push(Definition {
            name: name.to_string(),
            section,
            ty: TypeSpec::any(),
        });
        DefinitionId(self.definitions.len() - 1)
    }

    pub(crate) fn fill_definition(&mut self, id: DefinitionId, ty: TypeSpec) {
        self.definitions[id.0].ty = ty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_definition_is_any_until_filled() {
        let mut registry = TypeRegistry::default();
        let id: DefinitionId = registry.reserve_definition("Node", DefinitionSection::Defs);
        assert_eq!(TypeKind::Any, registry.definition(id).ty.kind);

        registry.fill_definition(id, TypeSpec::new(TypeKind::Integer));
        assert_eq!(TypeKind::Integer, registry.definition(id).ty.kind);
    }

    #[test]
    fn deref_follows_ref_chain() {
        let mut registry = TypeRegistry::default();
        let inner: DefinitionId = registry.reserve_definition("Inner", DefinitionSection::Defs);
        registry.fill_definition(inner, TypeSpec::new(TypeKind::Boolean));
        let outer: DefinitionId = registry.reserve_definition("Outer", DefinitionSection::Defs);
        registry.fill_definition(outer, TypeSpec::new(TypeKind::Ref(inner)));

        let spec = TypeSpec::new(TypeKind::Ref(outer));
        assert_eq!(TypeKind::Boolean, registry.deref(&spec).kind);
    }

    #[test]
    fn deref_stops_on_self_reference() {
        let mut registry = TypeRegistry::default();
        let id: DefinitionId = registry.reserve_definition("Loop", DefinitionSection::Defs);
        registry.fill_definition(id, TypeSpec::new(TypeKind::Ref(id)));
        let spec = TypeSpec::new(TypeKind::Ref(id));
        assert_eq!(TypeKind::Ref(id), registry.deref(&spec).kind);
    }

    #[test]
    fn deref_follows_mixed_ref_and_all_of_chain() {
        let mut registry = TypeRegistry::default();
        let model: ModelId = registry.reserve_model("Leaf");
        let leaf: DefinitionId = registry.reserve_definition("Leaf", DefinitionSection::Defs);
        registry.fill_definition(leaf, TypeSpec::new(TypeKind::Object(model)));

        let mut previous: DefinitionId = leaf;
        for name in ["Third", "Second", "First"] {
            let id: DefinitionId = registry.reserve_definition(name, DefinitionSection::Defs);
            let branch = TypeSpec::new(TypeKind::Ref(previous));
            registry.fill_definition(
                id,
                TypeSpec::new(TypeKind::AllOf {
                    branches: vec![branch.clone()],
                    own: None,
                    merged: Box::new(branch),
                }),
            );
            previous = id;
        }

        let spec = TypeSpec::new(TypeKind::Ref(previous));
        let expected = TypeKind::Object(model);
        let actual = &registry.deref(&spec).kind;
        assert_eq!(&expected, actual);
        assert_eq!(Some(model), registry.model_of(&spec));
    }

    #[test]
    fn deref_stops_on_cycle_through_all_of() {
        let mut registry = TypeRegistry::default();
        let a: DefinitionId = registry.reserve_definition("A", DefinitionSection::Defs);
        let b: DefinitionId = registry.reserve_definition("B", DefinitionSection::Defs);
        registry.fill_definition(a, TypeSpec::new(TypeKind::Ref(b)));
        let back = TypeSpec::new(TypeKind::Ref(a));
        registry.fill_definition(
            b,
            TypeSpec::new(TypeKind::AllOf {
                branches: vec![back.clone()],
                own: None,
                merged: Box::new(back),
            }),
        );

        let spec = TypeSpec::new(TypeKind::Ref(a));
        assert!(matches!(registry.deref(&spec).kind, TypeKind::Ref(_)));
        assert_eq!(None, registry.model_of(&spec));
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Pattern::new("^a+$").expect("valid pattern");
        let b = Pattern::new("^a+$").expect("valid pattern");
        assert_eq!(a, b);
        assert!(a.is_match("aaa"));
        assert!(!a.is_match("aab"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(Pattern::new("(unclosed").is_err());
    }
}
