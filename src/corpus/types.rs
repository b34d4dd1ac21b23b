//! Declaration corpus records and the immutable values built from them.
//!
//! - [`RawModule`] and friends mirror the JSON corpus one-to-one.
//! - [`Module`] is the parsed, read-only form used by the resolver.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::signature::{extract_name, extract_signature, split_declaration};

/// One module record of the declaration corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModule {
    pub name: String,
    #[serde(default, alias = "comment")]
    pub document: String,
    #[serde(default)]
    pub values: Vec<RawValue>,
    #[serde(default)]
    pub datatypes: Vec<RawDatatype>,
    #[serde(default)]
    pub aliases: Vec<RawAlias>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawValue {
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDatatype {
    pub name: String,
    #[serde(default)]
    pub constructors: Vec<RawConstructor>,
    /// Full `data Name a = A | B` text, when the corpus provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConstructor {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlias {
    pub name: String,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Value,
    Datatype,
    Alias,
}

/// One named, typed entity of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub signature: String,
    pub kind: DeclarationKind,
    /// Constructor names; empty unless `kind` is [`DeclarationKind::Datatype`].
    pub constructors: Vec<String>,
    /// The declaration text this was parsed from, kept for datatypes and aliases.
    pub raw: Option<String>,
}

impl Declaration {
    /// The name as written in the declaration head, type parameters included.
    ///
    /// `data Maybe a = ...` gives `Maybe a`; values and records without raw
    /// text give the bare name.
    pub fn display_name(&self) -> String {
        self.raw
            .as_deref()
            .and_then(|raw| extract_name(raw).ok())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// A parsed module. Built once by [`Module::from_raw`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub document: String,
    pub values: Vec<Declaration>,
    pub datatypes: Vec<Declaration>,
    pub aliases: Vec<Declaration>,
    name_to_signature: HashMap<String, String>,
}

impl Module {
    /// Parse every declaration of `raw`.
    ///
    /// Malformed declarations are skipped and logged. When a value name is
    /// declared twice the later signature wins the lookup table, while both
    /// stay in `values`.
    pub fn from_raw(raw: RawModule) -> Module {
        let values = raw
            .values
            .iter()
            .filter_map(|value| match split_declaration(&value.raw) {
                Ok((name, signature)) => Some(Declaration {
                    name,
                    signature,
                    kind: DeclarationKind::Value,
                    constructors: vec![],
                    raw: None,
                }),
                Err(err) => {
                    warn!(module = %raw.name, "skipping value: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();

        let name_to_signature = values
            .iter()
            .map(|value| (value.name.clone(), value.signature.clone()))
            .collect::<HashMap<_, _>>();

        let datatypes = raw
            .datatypes
            .into_iter()
            .map(|datatype| {
                let constructors = datatype
                    .constructors
                    .into_iter()
                    .map(|constructor| constructor.name)
                    .collect::<Vec<_>>();

                let signature = datatype
                    .raw
                    .as_deref()
                    .and_then(|text| match extract_signature(text) {
                        Ok(signature) => Some(signature),
                        Err(err) => {
                            warn!(module = %raw.name, "datatype body unavailable: {err}");
                            None
                        }
                    })
                    .unwrap_or_else(|| constructors.join(" | "));

                Declaration {
                    name: datatype.name,
                    signature,
                    kind: DeclarationKind::Datatype,
                    constructors,
                    raw: datatype.raw,
                }
            })
            .collect();

        let aliases = raw
            .aliases
            .into_iter()
            .filter_map(|alias| match extract_signature(&alias.raw) {
                Ok(signature) => Some(Declaration {
                    name: alias.name,
                    signature,
                    kind: DeclarationKind::Alias,
                    constructors: vec![],
                    raw: Some(alias.raw),
                }),
                Err(err) => {
                    warn!(module = %raw.name, "skipping alias: {err}");
                    None
                }
            })
            .collect();

        Module {
            name: raw.name,
            document: raw.document,
            values,
            datatypes,
            aliases,
            name_to_signature,
        }
    }

    pub fn signature_of(&self, value: &str) -> Option<&str> {
        self.name_to_signature.get(value).map(String::as_str)
    }

    pub fn datatype(&self, name: &str) -> Option<&Declaration> {
        self.datatypes.iter().find(|datatype| datatype.name == name)
    }

    pub fn alias(&self, name: &str) -> Option<&Declaration> {
        self.aliases.iter().find(|alias| alias.name == name)
    }

    pub fn value_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|value| value.name.as_str())
    }
}
