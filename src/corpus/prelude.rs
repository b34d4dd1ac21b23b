//! Implicitly imported modules, read from the `Basics` module's documentation.
//!
//! The documentation contains a sentence like
//!
//! ```text
//! The following modules are imported by default: List, Maybe,
//! Signal, Text.
//! ```
//!
//! which is the only machine-readable record of the prelude.

use tracing::warn;

use crate::error::CorpusError;

use super::types::Module;

pub const BASICS: &str = "Basics";
pub const PRELUDE: &str = "Prelude";

const MARKER: &str = "imported by default: ";

/// Names of the modules open in every file, `Basics` and `Prelude` last.
pub fn resolve_prelude(modules: &[Module]) -> Result<Vec<String>, CorpusError> {
    let basics = modules
        .iter()
        .find(|module| module.name == BASICS)
        .ok_or(CorpusError::PreludeNotFound)?;

    let mut prelude = parse_default_imports(&basics.document);
    prelude.push(BASICS.to_string());
    prelude.push(PRELUDE.to_string());
    Ok(prelude)
}

/// The module list following the marker, up to the next blank line.
fn parse_default_imports(document: &str) -> Vec<String> {
    let Some((_, rest)) = document.split_once(MARKER) else {
        warn!("`{BASICS}` documentation has no default import list");
        return vec![];
    };

    let paragraph = rest.split("\n\n").next().unwrap_or_default().replace('\n', " ");
    let paragraph = paragraph.trim_end();
    // the sentence ends with a period; anything else is left alone
    let paragraph = paragraph.strip_suffix('.').unwrap_or(paragraph);

    paragraph
        .split(", ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
