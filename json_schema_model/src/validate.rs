//! Instance validation against a synthesized model.
//!
//! Walks the instance alongside the field table and collects every issue
//! instead of stopping at the first one. Each check also returns the value to
//! store, so coercions (`3.0` for an integer field becomes `3`) and defaults
//! land in the validated instance.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::error::{IssueKind, ValidationIssue};
use crate::format;
use crate::json_pointer;
use crate::model::{
    Additional, Constraints, ExtraFields, ModelId, TypeKind, TypeRegistry, TypeSpec,
};
use crate::schema::KeywordValue;
use crate::settings::FieldValidator;

/// Validates `value` against the model `root`, running `validators` on the
/// matching root fields.
///
/// # Errors
///
/// Returns every issue found, in field order.
pub(crate) fn validate_model(
    registry: &TypeRegistry,
    root: ModelId,
    value: &Value,
    validators: &BTreeMap<String, Vec<FieldValidator>>,
) -> Result<Map<String, Value>, Vec<ValidationIssue>> {
    let mut issues: Vec<ValidationIssue> = Vec::new();
    let Value::Object(input) = value else {
        push_issue(
            &mut issues,
            "",
            IssueKind::WrongType {
                expected: "object".to_string(),
                found: json_type_name(value),
            },
        );
        return Err(issues);
    };

    let validator = Validator { registry };
    let output: Map<String, Value> =
        validator.fields(root, input, "", &mut issues, Some(validators));
    if issues.is_empty() {
        Ok(output)
    } else {
        Err(issues)
    }
}

/// JSON type name of a value, as used in issue messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Equality of JSON literals where `1` and `1.0` are the same number.
pub(crate) fn literal_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| literal_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, a)| y.get(key).is_some_and(|b| literal_eq(a, b)))
        }
        _ => a == b,
    }
}

fn push_issue(issues: &mut Vec<ValidationIssue>, path: &str, kind: IssueKind) {
    issues.push(ValidationIssue {
        path: path.to_string(),
        kind,
    });
}

fn wrong_type(issues: &mut Vec<ValidationIssue>, path: &str, expected: &str, value: &Value) {
    push_issue(
        issues,
        path,
        IssueKind::WrongType {
            expected: expected.to_string(),
            found: json_type_name(value),
        },
    );
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Integers, plus floats without a fractional part. Booleans never get here:
/// they are not `Value::Number`.
fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn normalize_integer(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    match n.as_f64() {
        Some(f) if f >= i64::MIN as f64 && f <= i64::MAX as f64 => Value::from(f as i64),
        _ => Value::Number(n.clone()),
    }
}

fn is_multiple_of(n: &Number, step: &Number) -> bool {
    if let (Some(n), Some(step)) = (n.as_i64(), step.as_i64())
        && step != 0
    {
        return n % step == 0;
    }
    match (n.as_f64(), step.as_f64()) {
        (Some(n), Some(step)) if step > 0.0 => {
            let quotient: f64 = n / step;
            (quotient - quotient.round()).abs() < 1e-9
        }
        _ => true,
    }
}

struct Validator<'a> {
    registry: &'a TypeRegistry,
}

impl Validator<'_> {
    /// Checks one value and returns its normalized form.
    fn check(
        &self,
        spec: &TypeSpec,
        value: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let before: usize = issues.len();
        let normalized: Value = self.check_kind(spec, value, path, issues);
        if issues.len() == before {
            check_constraints(&spec.constraints, &normalized, path, issues);
        }
        normalized
    }

    #[expect(clippy::too_many_lines)]
    fn check_kind(
        &self,
        spec: &TypeSpec,
        value: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        match &spec.kind {
            TypeKind::Any => value.clone(),
            TypeKind::Null => {
                if !value.is_null() {
                    wrong_type(issues, path, "null", value);
                }
                value.clone()
            }
            TypeKind::Boolean => {
                if !value.is_boolean() {
                    wrong_type(issues, path, "boolean", value);
                }
                value.clone()
            }
            TypeKind::Integer => match value {
                Value::Number(n) if is_integral(n) => normalize_integer(n),
                _ => {
                    wrong_type(issues, path, "integer", value);
                    value.clone()
                }
            },
            TypeKind::Number => {
                if !value.is_number() {
                    wrong_type(issues, path, "number", value);
                }
                value.clone()
            }
            TypeKind::String(format_kind) => {
                match (value, format_kind) {
                    (Value::String(text), Some(kind)) => {
                        if let Err(reason) = format::check(kind, text) {
                            push_issue(
                                issues,
                                path,
                                IssueKind::Format {
                                    format: spec
                                        .annotations
                                        .format
                                        .clone()
                                        .unwrap_or_else(|| "string".to_string()),
                                    reason,
                                },
                            );
                        }
                    }
                    (Value::String(_), None) => {}
                    _ => wrong_type(issues, path, "string", value),
                }
                value.clone()
            }
            TypeKind::Array(items) => {
                let Value::Array(elements) = value else {
                    wrong_type(issues, path, "array", value);
                    return value.clone();
                };
                let Some(items) = items else {
                    return value.clone();
                };
                Value::Array(
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| {
                            self.check(items, element, &json_pointer::format_index(path, i), issues)
                        })
                        .collect(),
                )
            }
            TypeKind::Tuple { items, closed, .. } => {
                let Value::Array(elements) = value else {
                    wrong_type(issues, path, "array", value);
                    return value.clone();
                };
                if *closed && elements.len() > items.len() {
                    push_issue(
                        issues,
                        path,
                        IssueKind::TupleLength {
                            max: items.len(),
                            found: elements.len(),
                        },
                    );
                }
                Value::Array(
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| match items.get(i) {
                            Some(item) => self.check(
                                item,
                                element,
                                &json_pointer::format_index(path, i),
                                issues,
                            ),
                            None => element.clone(),
                        })
                        .collect(),
                )
            }
            TypeKind::Object(id) | TypeKind::RootRef(id) => {
                let Value::Object(input) = value else {
                    wrong_type(issues, path, "object", value);
                    return value.clone();
                };
                Value::Object(self.fields(*id, input, path, issues, None))
            }
            TypeKind::Map(additional) => {
                let Value::Object(input) = value else {
                    wrong_type(issues, path, "object", value);
                    return value.clone();
                };
                let Additional::Schema(values) = additional else {
                    return value.clone();
                };
                Value::Object(
                    input
                        .iter()
                        .map(|(key, v)| {
                            let checked: Value =
                                self.check(values, v, &json_pointer::format(path, key), issues);
                            (key.clone(), checked)
                        })
                        .collect(),
                )
            }
            TypeKind::Enum(allowed) => {
                if !allowed.iter().any(|candidate| literal_eq(candidate, value)) {
                    push_issue(
                        issues,
                        path,
                        IssueKind::NotInEnum {
                            allowed: allowed.clone(),
                        },
                    );
                }
                value.clone()
            }
            TypeKind::Const(expected) => {
                if !literal_eq(expected, value) {
                    push_issue(
                        issues,
                        path,
                        IssueKind::NotConst {
                            expected: expected.clone(),
                        },
                    );
                }
                value.clone()
            }
            TypeKind::Union {
                variants,
                exclusive,
                ..
            } => self.check_union(variants, *exclusive, value, path, issues),
            TypeKind::AllOf {
                branches, merged, ..
            } => {
                if self.registry.model_of(merged).is_some() {
                    return self.check(merged, value, path, issues);
                }
                // Non-object intersections: every branch in turn.
                let mut current: Value = value.clone();
                for branch in branches {
                    let before: usize = issues.len();
                    current = self.check(branch, &current, path, issues);
                    if issues.len() > before {
                        break;
                    }
                }
                current
            }
            TypeKind::Ref(_) => {
                let target: &TypeSpec = self.registry.deref(spec);
                if matches!(target.kind, TypeKind::Ref(_)) {
                    // A cycle of definitions that never reaches a shape.
                    return value.clone();
                }
                self.check(target, value, path, issues)
            }
        }
    }

    fn check_union(
        &self,
        variants: &[TypeSpec],
        exclusive: bool,
        value: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let mut matched: Vec<(usize, Value)> = Vec::new();
        for (i, variant) in variants.iter().enumerate() {
            let mut trial: Vec<ValidationIssue> = Vec::new();
            let checked: Value = self.check(variant, value, path, &mut trial);
            if trial.is_empty() {
                matched.push((i, checked));
                if !exclusive {
                    break;
                }
            }
        }
        match matched.len() {
            0 => {
                push_issue(
                    issues,
                    path,
                    IssueKind::NoUnionMatch {
                        branches: variants.len(),
                    },
                );
                value.clone()
            }
            1 => matched.pop().map_or_else(|| value.clone(), |(_, checked)| checked),
            _ => {
                push_issue(
                    issues,
                    path,
                    IssueKind::AmbiguousUnion {
                        matched: matched.iter().map(|(i, _)| *i).collect(),
                    },
                );
                value.clone()
            }
        }
    }

    /// Validates an object against a model's field table.
    fn fields(
        &self,
        id: ModelId,
        input: &Map<String, Value>,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
        validators: Option<&BTreeMap<String, Vec<FieldValidator>>>,
    ) -> Map<String, Value> {
        let model = self.registry.model(id);
        let mut output: Map<String, Value> = Map::new();

        for (name, field) in &model.fields {
            let field_path: String = json_pointer::format(path, name);
            match input.get(name) {
                Some(value) => {
                    let before: usize = issues.len();
                    let mut checked: Value = self.check(&field.ty, value, &field_path, issues);
                    if issues.len() == before
                        && let Some(chain) = validators.and_then(|v| v.get(name))
                    {
                        for validator in chain {
                            match validator.call(&checked) {
                                Ok(next) => checked = next,
                                Err(message) => {
                                    push_issue(issues, &field_path, IssueKind::Custom(message));
                                    break;
                                }
                            }
                        }
                    }
                    output.insert(name.clone(), checked);
                }
                None if field.required => push_issue(issues, &field_path, IssueKind::Missing),
                None => {
                    if let KeywordValue::Present(default) = field.default() {
                        output.insert(name.clone(), default.clone());
                    }
                }
            }
        }

        for (key, value) in input {
            if model.fields.contains_key(key) {
                continue;
            }
            let key_path: String = json_pointer::format(path, key);
            match model.extra {
                ExtraFields::Ignore => {}
                ExtraFields::Forbid => push_issue(issues, &key_path, IssueKind::ExtraForbidden),
                ExtraFields::Allow => {
                    let kept: Value = if let Additional::Schema(spec) = &model.additional {
                        self.check(spec, value, &key_path, issues)
                    } else {
                        value.clone()
                    };
                    output.insert(key.clone(), kept);
                }
            }
        }
        output
    }
}

fn check_constraints(
    constraints: &Constraints,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut violated = |keyword: &'static str, detail: String| {
        push_issue(issues, path, IssueKind::Constraint { keyword, detail });
    };
    match value {
        Value::Number(n) => {
            let bounds: [(&'static str, &Option<Number>, &[Ordering], &str); 4] = [
                ("minimum", &constraints.minimum, &[Ordering::Greater, Ordering::Equal], ">="),
                ("maximum", &constraints.maximum, &[Ordering::Less, Ordering::Equal], "<="),
                ("exclusiveMinimum", &constraints.exclusive_minimum, &[Ordering::Greater], ">"),
                ("exclusiveMaximum", &constraints.exclusive_maximum, &[Ordering::Less], "<"),
            ];
            for (keyword, bound, accepted, operator) in bounds {
                if let Some(bound) = bound
                    && !compare_numbers(n, bound).is_some_and(|o| accepted.contains(&o))
                {
                    violated(keyword, format!("must be {operator} {bound}"));
                }
            }
            if let Some(step) = &constraints.multiple_of
                && !is_multiple_of(n, step)
            {
                violated("multipleOf", format!("must be a multiple of {step}"));
            }
        }
        Value::String(text) => {
            let length: u64 = text.chars().count() as u64;
            if let Some(min) = constraints.min_length
                && length < min
            {
                violated("minLength", format!("must have at least {min} characters"));
            }
            if let Some(max) = constraints.max_length
                && length > max
            {
                violated("maxLength", format!("must have at most {max} characters"));
            }
            if let Some(pattern) = &constraints.pattern
                && !pattern.is_match(text)
            {
                violated("pattern", format!("must match `{}`", pattern.source));
            }
        }
        Value::Array(elements) => {
            let length: u64 = elements.len() as u64;
            if let Some(min) = constraints.min_items
                && length < min
            {
                violated("minItems", format!("must have at least {min} items"));
            }
            if let Some(max) = constraints.max_items
                && length > max
            {
                violated("maxItems", format!("must have at most {max} items"));
            }
            if constraints.unique_items == Some(true)
                && elements
                    .iter()
                    .enumerate()
                    .any(|(i, a)| elements[i + 1..].iter().any(|b| literal_eq(a, b)))
            {
                violated("uniqueItems", "items must be unique".to_string());
            }
        }
        _ => {}
    }
}
