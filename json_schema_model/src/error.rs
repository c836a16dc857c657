use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::json_pointer;

/// Error raised while turning a JSON Schema into a model.
///
/// Schema paths are JSON Pointers into the input document. Synthesis is
/// all-or-nothing: when any of these is returned no model exists.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A `$ref` is dangling, remote, or not one of the supported local forms.
    #[error("cannot resolve `{reference}` at {}: {reason}", json_pointer::display(.path))]
    Resolution {
        path: String,
        reference: String,
        reason: String,
    },

    /// A keyword or type combination has no mapping (strict mode only, except
    /// for structural problems such as a non-object root).
    #[error("unsupported schema at {}: {detail}", json_pointer::display(.path))]
    UnsupportedSchema { path: String, detail: String },

    /// Two `allOf` branches define the same property with incompatible types.
    #[error(
        "conflicting definitions of property `{property}` at {}: {detail}",
        json_pointer::display(.path)
    )]
    SchemaConflict {
        path: String,
        property: String,
        detail: String,
    },

    /// Nesting went deeper than the configured limit.
    #[error(
        "schema nesting exceeds the depth limit of {limit} at {}",
        json_pointer::display(.path)
    )]
    SchemaDepth { path: String, limit: usize },

    /// A custom validator names a field the root model does not have.
    #[error("validator registered for unknown field `{field}` of model `{model}`")]
    UnknownValidatorField { model: String, field: String },

    /// I/O error (e.g. reading a schema file).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input is not JSON, or not shaped like a JSON Schema.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// What went wrong at one location of a validated instance.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// A required field is absent.
    Missing,
    /// The JSON type does not match.
    WrongType {
        expected: String,
        found: &'static str,
    },
    /// The value is not one of the `enum` literals.
    NotInEnum { allowed: Vec<Value> },
    /// The value differs from the `const` literal.
    NotConst { expected: Value },
    /// A string does not conform to its `format`.
    Format { format: String, reason: String },
    /// A numeric, string or array constraint is violated.
    Constraint { keyword: &'static str, detail: String },
    /// An undeclared field on a model that forbids extras.
    ExtraForbidden,
    /// A closed tuple received more items than it declares.
    TupleLength { max: usize, found: usize },
    /// No union branch accepted the value.
    NoUnionMatch { branches: usize },
    /// More than one `oneOf` branch accepted the value under exclusive matching.
    AmbiguousUnion { matched: Vec<usize> },
    /// A custom field validator rejected the value.
    Custom(String),
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "field required"),
            Self::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::NotInEnum { allowed } => {
                let rendered: Vec<String> = allowed.iter().map(Value::to_string).collect();
                write!(f, "value is not one of [{}]", rendered.join(", "))
            }
            Self::NotConst { expected } => write!(f, "value must be {expected}"),
            Self::Format { format, reason } => {
                write!(f, "invalid {format}: {reason}")
            }
            Self::Constraint { keyword, detail } => write!(f, "{keyword}: {detail}"),
            Self::ExtraForbidden => write!(f, "extra fields not permitted"),
            Self::TupleLength { max, found } => {
                write!(f, "tuple allows at most {max} items, found {found}")
            }
            Self::NoUnionMatch { branches } => {
                write!(f, "value matches none of the {branches} union branches")
            }
            Self::AmbiguousUnion { matched } => {
                let rendered: Vec<String> = matched.iter().map(usize::to_string).collect();
                write!(
                    f,
                    "value matches more than one oneOf branch ({})",
                    rendered.join(", ")
                )
            }
            Self::Custom(message) => write!(f, "{message}"),
        }
    }
}

/// One validation problem, located by a JSON Pointer into the instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: String,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location: String = if self.path.is_empty() {
            "(root)".to_string()
        } else {
            self.path.trim_start_matches('/').replace('/', ".")
        };
        write!(f, "{location}\n  {}", self.kind)
    }
}

/// Every problem found while validating one instance against a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub model: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Issues located exactly at `path`.
    pub fn issues_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.path == path)
    }
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count: usize = self.issues.len();
        let noun: &str = if count == 1 { "error" } else { "errors" };
        write!(f, "{count} validation {noun} for {}", self.model)?;
        for issue in &self.issues {
            write!(f, "\n{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_counts_issues() {
        let error = ValidationError {
            model: "Project".to_string(),
            issues: vec![
                ValidationIssue {
                    path: "/end_date".to_string(),
                    kind: IssueKind::Format {
                        format: "date-time".to_string(),
                        reason: "input contains invalid characters".to_string(),
                    },
                },
                ValidationIssue {
                    path: "/tasks/0/task_id".to_string(),
                    kind: IssueKind::Missing,
                },
            ],
        };
        let expected: &str = "2 validation errors for Project\n\
            end_date\n  invalid date-time: input contains invalid characters\n\
            tasks.0.task_id\n  field required";
        assert_eq!(expected, error.to_string());
    }

    #[test]
    fn single_issue_uses_singular_noun() {
        let error = ValidationError {
            model: "Item".to_string(),
            issues: vec![ValidationIssue {
                path: String::new(),
                kind: IssueKind::ExtraForbidden,
            }],
        };
        assert!(error.to_string().starts_with("1 validation error for Item\n(root)"));
    }

    #[test]
    fn synthesis_error_shows_schema_pointer() {
        let error = SynthesisError::Resolution {
            path: "/properties/school".to_string(),
            reference: "#/$defs/Missing".to_string(),
            reason: "no definition named `Missing`".to_string(),
        };
        assert_eq!(
            "cannot resolve `#/$defs/Missing` at #/properties/school: no definition named `Missing`",
            error.to_string()
        );
    }
}
