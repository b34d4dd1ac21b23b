//! Scope model built from the import statements of a buffer.
//!
//! Every module referenced by an import, every prelude module and the
//! buffer's own module gets one [`ScopeEntry`]. Imports of the same module
//! merge: flags are OR-ed and name sets are unioned, so the resulting
//! [`Scope`] does not depend on statement order.
//!
//! | Statement | Entry |
//! |-----------|-------|
//! | `import open Foo` | `open` |
//! | `import Dict as D` | `aliases = {D}` |
//! | `import List (map, foldl)` | `names = {map, foldl}` |
//! | `import Maybe (..)` | `open` |
//! | `import Dict` | `qualified` |

use std::collections::{btree_map, BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeEntry {
    pub open: bool,
    pub qualified: bool,
    /// Names exposed unqualified by a selective import.
    pub names: BTreeSet<String>,
    pub aliases: BTreeSet<String>,
}

impl ScopeEntry {
    pub fn open() -> ScopeEntry {
        ScopeEntry {
            open: true,
            ..Default::default()
        }
    }

    pub fn qualified() -> ScopeEntry {
        ScopeEntry {
            qualified: true,
            ..Default::default()
        }
    }

    pub fn merge(&mut self, other: ScopeEntry) {
        self.open |= other.open;
        self.qualified |= other.qualified;
        self.names.extend(other.names);
        self.aliases.extend(other.aliases);
    }
}

/// One classified import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub module: String,
    pub entry: ScopeEntry,
}

impl ImportStatement {
    /// Classify the text following the `import` keyword.
    ///
    /// Returns `None` when no module name can be found.
    pub fn classify(raw: &str) -> Option<ImportStatement> {
        let raw = raw.trim();

        let legacy_open = raw
            .strip_prefix("open")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));

        let (module, entry) = if let Some(rest) = legacy_open {
            (rest.trim(), ScopeEntry::open())
        } else if let Some((module, rest)) = raw.split_once(" as ") {
            let rest = rest.trim();
            let alias_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (alias, exposing) = rest.split_at(alias_end);

            let mut entry = ScopeEntry::default();
            entry.aliases.insert(alias.to_string());
            if let Some(exposed) = exposure_list(exposing) {
                entry.merge(exposed);
            }
            (module.trim(), entry)
        } else if let Some(paren) = raw.find('(') {
            let module = raw[..paren].trim();
            let module = module.strip_suffix("exposing").unwrap_or(module).trim();
            (module, exposure_list(&raw[paren..]).unwrap_or_default())
        } else {
            (raw, ScopeEntry::qualified())
        };

        if module.is_empty() {
            return None;
        }

        Some(ImportStatement {
            module: module.to_string(),
            entry,
        })
    }
}

/// Scope entry for a parenthesised exposure list such as `(map, Maybe(..))`.
fn exposure_list(text: &str) -> Option<ScopeEntry> {
    let start = text.find('(')?;
    let end = text.rfind(')').filter(|end| *end > start).unwrap_or(text.len());
    let content = text[start + 1..end].trim();

    if content == ".." {
        return Some(ScopeEntry::open());
    }

    let mut entry = ScopeEntry::default();
    for item in split_top_level(content) {
        match item.split_once('(') {
            // `Maybe(Just, Nothing)` exposes the type and the listed constructors
            Some((type_name, constructors)) => {
                entry.names.insert(type_name.trim().to_string());
                let constructors = constructors.trim_end_matches(')').trim();
                if constructors != ".." {
                    entry.names.extend(
                        constructors
                            .split(',')
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(String::from),
                    );
                }
            }
            None => {
                entry.names.insert(item.to_string());
            }
        }
    }
    Some(entry)
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(content: &str) -> Vec<&str> {
    let mut items = vec![];
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in content.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(content[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    items.push(content[start..].trim());

    items.into_iter().filter(|item| !item.is_empty()).collect()
}

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^import\s+(?:open\s+)?[A-Za-z0-9._']+(?:\s+as\s+[A-Za-z0-9._']+)?(?:\s+(?:exposing\s*)?\(.*\))?").unwrap()
});

static MODULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:port\s+|effect\s+)?module\s+(?<name>[A-Za-z0-9._']+)").unwrap()
});

/// The text after `import` of every import statement in `text`, in order.
pub fn find_imports(text: &str) -> Vec<String> {
    IMPORT_RE
        .find_iter(text)
        .map(|found| found.as_str()["import".len()..].trim().to_string())
        .collect()
}

/// The name declared by the buffer's `module X exposing (..)` header.
pub fn module_name(text: &str) -> Option<String> {
    MODULE_RE
        .captures(text)
        .and_then(|captures| captures.name("name"))
        .map(|name| name.as_str().to_string())
}

/// Module name → [`ScopeEntry`] for one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(BTreeMap<String, ScopeEntry>);

impl Scope {
    /// Build the scope from raw import strings, the prelude and the buffer's own module.
    pub fn build<I, S>(imports: I, prelude: &[String], own_module: Option<&str>) -> Scope
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Scope::default();

        for import in imports {
            if let Some(statement) = ImportStatement::classify(import.as_ref()) {
                scope.insert(statement.module, statement.entry);
            }
        }

        for module in prelude {
            scope.insert(module.clone(), ScopeEntry::open());
        }

        if let Some(own) = own_module {
            scope.insert(own.to_string(), ScopeEntry::open());
        }

        scope
    }

    /// Scan `text` for imports and the module header, then [`Scope::build`].
    pub fn from_buffer(text: &str, prelude: &[String]) -> Scope {
        let own = module_name(text);
        Scope::build(find_imports(text), prelude, own.as_deref())
    }

    pub fn insert(&mut self, module: String, entry: ScopeEntry) {
        match self.0.entry(module) {
            btree_map::Entry::Occupied(mut existing) => existing.get_mut().merge(entry),
            btree_map::Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }
    }

    pub fn get(&self, module: &str) -> Option<&ScopeEntry> {
        self.0.get(module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeEntry)> {
        self.0.iter().map(|(module, entry)| (module.as_str(), entry))
    }

    pub fn is_open(&self, module: &str) -> bool {
        self.get(module).is_some_and(|entry| entry.open)
    }

    pub fn is_qualified(&self, module: &str) -> bool {
        self.get(module).is_some_and(|entry| entry.qualified)
    }

    pub fn has_alias(&self, module: &str, alias: &str) -> bool {
        self.get(module).is_some_and(|entry| entry.aliases.contains(alias))
    }

    pub fn exposes(&self, module: &str, name: &str) -> bool {
        self.get(module).is_some_and(|entry| entry.names.contains(name))
    }
}
