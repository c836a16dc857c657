//! Settings for model synthesis.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use heck::ToUpperCamelCase;
use serde_json::Value;

use crate::Model;
use crate::model::ExtraFields;

/// Default nesting limit for [`SynthesisOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// What to do with keywords the synthesizer has no mapping for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeywordPolicy {
    /// Fail with `SynthesisError::UnsupportedSchema`.
    #[default]
    Error,
    /// Log a warning and drop the keyword. Dropped constraints are not enforced.
    Ignore,
}

/// How `oneOf` unions match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OneOfMode {
    /// The first branch that accepts the value wins, exactly like `anyOf`.
    #[default]
    AnyMatch,
    /// Exactly one branch must accept the value.
    Exclusive,
}

/// How anonymous nested objects (no `title`) are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingStrategy {
    /// The property name in upper camel case: `home_address` -> `HomeAddress`.
    #[default]
    PropertyName,
    /// The parent model name followed by the property name: `PersonHomeAddress`.
    Path,
}

impl NamingStrategy {
    /// Name for an anonymous object found under `property` of the model `parent`.
    #[must_use]
    pub fn nested_name(self, parent: &str, property: &str) -> String {
        let property_name: String = property.to_upper_camel_case();
        match self {
            Self::PropertyName if !property_name.is_empty() => property_name,
            _ => format!("{parent}{property_name}"),
        }
    }
}

type ValidatorFn = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

/// A custom per-field validator. It receives the type-checked value and
/// returns the value to store (possibly transformed) or a rejection message.
#[derive(Clone)]
pub struct FieldValidator(Arc<ValidatorFn>);

impl FieldValidator {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the validator.
    ///
    /// # Errors
    ///
    /// Returns the validator's rejection message.
    pub fn call(&self, value: &Value) -> Result<Value, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldValidator(..)")
    }
}

/// Settings that control synthesis behavior.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// A model whose root fields the new root model inherits. Fields declared
    /// by the schema replace inherited fields of the same name.
    pub base: Option<Model>,

    /// Name of the root model. Defaults to the schema `title`, then `DynamicModel`.
    pub root_name: Option<String>,

    /// Custom validators per root field, run in order after type checking.
    pub validators: BTreeMap<String, Vec<FieldValidator>>,

    /// **Default: `Error`.** Lenient handling must be opted into because
    /// dropped keywords silently weaken validation.
    pub unknown_keywords: KeywordPolicy,

    pub one_of: OneOfMode,

    /// Nesting deeper than this fails with `SynthesisError::SchemaDepth`.
    pub max_depth: usize,

    pub naming: NamingStrategy,

    /// Extra-key policy for models whose schema does not say `additionalProperties`.
    pub extra: ExtraFields,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            base: None,
            root_name: None,
            validators: BTreeMap::new(),
            unknown_keywords: KeywordPolicy::Error,
            one_of: OneOfMode::AnyMatch,
            max_depth: DEFAULT_MAX_DEPTH,
            naming: NamingStrategy::PropertyName,
            extra: ExtraFields::Ignore,
        }
    }
}

impl SynthesisOptions {
    #[must_use]
    pub fn with_base(mut self, base: Model) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_validator(mut self, field: impl Into<String>, validator: FieldValidator) -> Self {
        self.validators
            .entry(field.into())
            .or_default()
            .push(validator);
        self
    }

    #[must_use]
    pub fn with_unknown_keywords(mut self, policy: KeywordPolicy) -> Self {
        self.unknown_keywords = policy;
        self
    }

    #[must_use]
    pub fn with_one_of(mut self, mode: OneOfMode) -> Self {
        self.one_of = mode;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: ExtraFields) -> Self {
        self.extra = extra;
        self
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.unknown_keywords == KeywordPolicy::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let options = SynthesisOptions::default();
        assert!(options.is_strict());
        assert_eq!(DEFAULT_MAX_DEPTH, options.max_depth);
        assert_eq!(OneOfMode::AnyMatch, options.one_of);
    }

    #[test]
    fn property_naming() {
        assert_eq!(
            "HomeAddress",
            NamingStrategy::PropertyName.nested_name("Person", "home_address")
        );
        assert_eq!(
            "PersonHomeAddress",
            NamingStrategy::Path.nested_name("Person", "home-address")
        );
    }

    #[test]
    fn property_naming_falls_back_to_parent_for_symbol_keys() {
        assert_eq!("Person", NamingStrategy::PropertyName.nested_name("Person", "$"));
    }

    #[test]
    fn validators_accumulate_per_field() {
        let options = SynthesisOptions::default()
            .with_validator("price", FieldValidator::new(|v| Ok(v.clone())))
            .with_validator("price", FieldValidator::new(|_| Err("no".to_string())));
        assert_eq!(2, options.validators["price"].len());
        assert_eq!(
            Err("no".to_string()),
            options.validators["price"][1].call(&Value::Null)
        );
    }
}
