//! Build validating data models from JSON Schema at runtime.
//!
//! A schema compiles into a [`Model`]: a named field table with types,
//! constraints, defaults and nested models. The model validates JSON
//! instances and emits an equivalent schema back out.
//!
//! ```
//! use json_schema_model::{SynthesisOptions, create_model_from_schema};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "Person",
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer", "minimum": 0 }
//!     }
//! });
//! let model = create_model_from_schema(&schema, &SynthesisOptions::default()).unwrap();
//! let person = model.validate(&json!({ "name": "John", "age": 30 })).unwrap();
//! assert_eq!("Person(age=30, name=\"John\")", person.to_string());
//! assert!(model.validate(&json!({ "age": -1 })).is_err());
//! ```

mod emit;
mod error;
mod format;
mod instance;
mod json_pointer;
mod model;
mod resolver;
mod schema;
mod settings;
mod synth;
mod validate;

pub use error::{IssueKind, SynthesisError, ValidationError, ValidationIssue};
pub use format::FormatKind;
pub use instance::Instance;
pub use model::{
    Additional, Annotations, Constraints, Definition, DefinitionId, DefinitionSection,
    ExtraFields, FieldSpec, ModelDef, ModelId, Pattern, TupleKeyword, TypeKind, TypeRegistry,
    TypeSpec, UnionKeyword,
};
pub use schema::{JsonSchema, KeywordValue, TypeKeyword};
pub use settings::{
    DEFAULT_MAX_DEPTH, FieldValidator, KeywordPolicy, NamingStrategy, OneOfMode,
    SynthesisOptions,
};
pub use synth::{DEFAULT_ROOT_NAME, type_name};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A model synthesized from a schema.
///
/// Immutable once built; cloning is cheap and clones share the field table.
#[derive(Clone)]
pub struct Model {
    registry: Arc<TypeRegistry>,
    root: ModelId,
    root_spec: Arc<TypeSpec>,
    validators: Arc<BTreeMap<String, Vec<FieldValidator>>>,
}

impl Model {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition().name
    }

    /// The root field table.
    #[must_use]
    pub fn definition(&self) -> &ModelDef {
        self.registry.model(self.root)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.definition().fields.values()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.definition().fields.get(name)
    }

    /// Every model and definition reachable from this one.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Validates an instance and returns it normalized.
    ///
    /// # Errors
    ///
    /// Returns every issue found when `value` does not conform.
    pub fn validate(&self, value: &Value) -> Result<Instance, ValidationError> {
        validate::validate_model(&self.registry, self.root, value, &self.validators)
            .map(|values| Instance::new(self.clone(), values))
            .map_err(|issues| ValidationError {
                model: self.name().to_string(),
                issues,
            })
    }

    /// Builds an instance from field/value pairs.
    ///
    /// # Errors
    ///
    /// Returns every issue found when the fields do not conform.
    pub fn instantiate<I, K>(&self, fields: I) -> Result<Instance, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let object: Map<String, Value> = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        self.validate(&Value::Object(object))
    }

    /// A JSON Schema describing this model, including every definition.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        emit::root_schema(&self.registry, &self.root_spec)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field(
                "fields",
                &self.definition().fields.keys().collect::<Vec<&String>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Synthesizes a model from a parsed schema.
///
/// # Errors
///
/// Returns `SynthesisError` if a `$ref` cannot be resolved, a keyword is
/// unsupported (strict mode), `allOf` branches conflict, nesting exceeds the
/// depth limit, or a validator names an unknown field.
pub fn create_model(
    schema: &JsonSchema,
    options: &SynthesisOptions,
) -> Result<Model, SynthesisError> {
    let synthesized = synth::synthesize(schema, options)?;

    let mut validators: BTreeMap<String, Vec<FieldValidator>> = options
        .base
        .as_ref()
        .map(|base| (*base.validators).clone())
        .unwrap_or_default();
    for (field, chain) in &options.validators {
        validators
            .entry(field.clone())
            .or_default()
            .extend(chain.iter().cloned());
    }

    let model = Model {
        registry: Arc::new(synthesized.registry),
        root: synthesized.root,
        root_spec: Arc::new(synthesized.root_spec),
        validators: Arc::new(validators),
    };
    tracing::debug!(
        model = model.name(),
        fields = model.definition().fields.len(),
        "model synthesized"
    );
    Ok(model)
}

/// Synthesizes a model from a schema given as a JSON value.
///
/// # Errors
///
/// Returns `SynthesisError::Json` if the value is not shaped like a schema,
/// or any error of [`create_model`].
pub fn create_model_from_schema(
    schema: &Value,
    options: &SynthesisOptions,
) -> Result<Model, SynthesisError> {
    let parsed: JsonSchema = JsonSchema::deserialize(schema)?;
    create_model(&parsed, options)
}

/// Synthesizes a model from schema JSON text.
///
/// # Errors
///
/// Returns `SynthesisError::Json` if the text is not valid JSON, or any error
/// of [`create_model`].
pub fn create_model_from_str(
    schema_json: &str,
    options: &SynthesisOptions,
) -> Result<Model, SynthesisError> {
    let parsed: JsonSchema = serde_json::from_str(schema_json)?;
    create_model(&parsed, options)
}

/// Synthesizes a model from a schema file.
///
/// # Errors
///
/// Returns `SynthesisError::Io` if reading the file fails, or any error of
/// [`create_model_from_str`].
pub fn create_model_from_file(
    path: impl AsRef<Path>,
    options: &SynthesisOptions,
) -> Result<Model, SynthesisError> {
    let schema_json: String = std::fs::read_to_string(path)?;
    create_model_from_str(&schema_json, options)
}
