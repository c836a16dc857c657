//! `$ref` resolution against the root schema's definitions.
//!
//! Only local pointers are supported: `#`, `#/$defs/<name>` and
//! `#/definitions/<name>`. Remote references are never fetched.

use std::collections::BTreeMap;

use crate::json_pointer;
use crate::model::DefinitionSection;
use crate::schema::JsonSchema;

/// A resolved reference: where the definition lives and its raw node.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionEntry<'a> {
    pub name: &'a str,
    pub section: DefinitionSection,
    pub node: &'a JsonSchema,
}

impl DefinitionEntry<'_> {
    /// Pointer of the definition inside the root document (`/$defs/Node`).
    #[must_use]
    pub fn pointer(&self) -> String {
        json_pointer::format(&json_pointer::format("", self.section.keyword()), self.name)
    }
}

/// What a `$ref` string points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalRef {
    /// `#`: the root schema.
    Root,
    Definition {
        section: DefinitionSection,
        name: String,
    },
}

/// Parses a `$ref` string into one of the supported local forms.
///
/// # Errors
///
/// Returns a reason when the reference is remote, malformed, or points
/// somewhere other than the root or a top-level definition.
pub fn parse_reference(reference: &str) -> Result<LocalRef, String> {
    let Some(fragment) = reference.strip_prefix('#') else {
        return Err("only local references starting with `#` are supported".to_string());
    };
    let Some(segments) = json_pointer::segments(fragment) else {
        return Err("malformed JSON pointer".to_string());
    };
    match segments.as_slice() {
        [] => Ok(LocalRef::Root),
        [section, name] => {
            let section: DefinitionSection = match section.as_str() {
                "$defs" => DefinitionSection::Defs,
                "definitions" => DefinitionSection::Definitions,
                other => {
                    return Err(format!(
                        "`{other}` is not a definitions section (expected `$defs` or `definitions`)"
                    ));
                }
            };
            Ok(LocalRef::Definition {
                section,
                name: name.clone(),
            })
        }
        _ => Err(
            "only `#/$defs/<name>` and `#/definitions/<name>` pointers are supported".to_string(),
        ),
    }
}

/// The definitions of one root schema, shared read-only by every recursive call.
#[derive(Debug, Default)]
pub struct DefinitionsTable<'a> {
    defs: BTreeMap<&'a str, &'a JsonSchema>,
    definitions: BTreeMap<&'a str, &'a JsonSchema>,
}

impl<'a> DefinitionsTable<'a> {
    /// Extracts `$defs` and `definitions` from the root schema.
    #[must_use]
    pub fn from_root(root: &'a JsonSchema) -> Self {
        let collect = |section: Option<&'a BTreeMap<String, JsonSchema>>| {
            section
                .into_iter()
                .flatten()
                .map(|(name, node)| (name.as_str(), node))
                .collect::<BTreeMap<&'a str, &'a JsonSchema>>()
        };
        Self {
            defs: collect(root.defs.as_ref()),
            definitions: collect(root.definitions.as_ref()),
        }
    }

    /// Looks up a definition by section and name.
    ///
    /// # Errors
    ///
    /// Returns a reason naming the missing definition.
    pub fn get(
        &self,
        section: DefinitionSection,
        name: &str,
    ) -> Result<DefinitionEntry<'a>, String> {
        let table: &BTreeMap<&'a str, &'a JsonSchema> = match section {
            DefinitionSection::Defs => &self.defs,
            DefinitionSection::Definitions => &self.definitions,
        };
        table
            .get_key_value(name)
            .map(|(key, node)| DefinitionEntry {
                name: *key,
                section,
                node: *node,
            })
            .ok_or_else(|| format!("no definition named `{name}` in `{}`", section.keyword()))
    }

    /// Every definition, `$defs` first, each section in name order.
    pub fn entries(&self) -> impl Iterator<Item = DefinitionEntry<'a>> + '_ {
        let defs = self.defs.iter().map(|(name, node)| DefinitionEntry {
            name: *name,
            section: DefinitionSection::Defs,
            node: *node,
        });
        let definitions = self.definitions.iter().map(|(name, node)| DefinitionEntry {
            name: *name,
            section: DefinitionSection::Definitions,
            node: *node,
        });
        defs.chain(definitions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len() + self.definitions.len()
    }
}
