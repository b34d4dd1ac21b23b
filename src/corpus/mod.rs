//! The declaration corpus: every documented module the resolver can see.
//!
//! A [`Corpus`] is built once from one or more `docs.json`-style files and is
//! never mutated afterwards. Reloading builds a fresh corpus and swaps it into
//! the [`CorpusHandle`], so a query holding the previous snapshot keeps a
//! consistent view until it finishes.

mod prelude;
mod signature;
mod types;

pub use prelude::{resolve_prelude, BASICS, PRELUDE};
pub use signature::{extract_name, extract_signature, head_name, split_declaration};
pub use types::{
    Declaration, DeclarationKind, Module, RawAlias, RawConstructor, RawDatatype, RawModule,
    RawValue,
};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use itertools::Itertools;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::CorpusError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    modules: Vec<Module>,
    prelude: Vec<String>,
}

impl Corpus {
    /// Build a corpus from already-deserialized module records.
    ///
    /// Records without a name are dropped. If a module name occurs twice the
    /// later record replaces the earlier one.
    pub fn from_raw_modules(raw_modules: Vec<RawModule>) -> Result<Corpus, CorpusError> {
        let raw_modules = raw_modules
            .into_iter()
            .filter(|raw| {
                let keep = !raw.name.trim().is_empty();
                if !keep {
                    warn!("skipping module record without a name");
                }
                keep
            })
            .rev()
            .unique_by(|raw| raw.name.clone())
            .collect::<Vec<_>>();

        let mut modules: Vec<Module> = raw_modules.into_par_iter().map(Module::from_raw).collect();
        modules.reverse();

        let prelude = resolve_prelude(&modules)?;
        debug!(?prelude, "resolved prelude");

        Ok(Corpus { modules, prelude })
    }

    /// Read and merge the corpus files at `paths`, in order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Corpus, CorpusError> {
        let raw_modules = paths
            .iter()
            .map(|path| read_corpus_file(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let corpus = Corpus::from_raw_modules(raw_modules)?;
        info!(
            modules = corpus.modules.len(),
            files = paths.len(),
            "loaded declaration corpus"
        );
        Ok(corpus)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn prelude(&self) -> &[String] {
        &self.prelude
    }
}

fn read_corpus_file(path: &Path) -> Result<Vec<RawModule>, CorpusError> {
    let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: PathBuf::from(path),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| CorpusError::Json {
        path: PathBuf::from(path),
        source,
    })
}

/// Shared, swappable pointer to the current [`Corpus`].
///
/// Single writer, many readers: [`CorpusHandle::snapshot`] hands out an
/// `Arc` that stays valid across a later [`CorpusHandle::replace`].
#[derive(Debug)]
pub struct CorpusHandle(RwLock<Arc<Corpus>>);

impl CorpusHandle {
    pub fn new(corpus: Corpus) -> CorpusHandle {
        CorpusHandle(RwLock::new(Arc::new(corpus)))
    }

    pub fn snapshot(&self) -> Arc<Corpus> {
        Arc::clone(&self.0.read())
    }

    /// Install `corpus`, returning the snapshot it replaced.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let next = Arc::new(corpus);
        let previous = std::mem::replace(&mut *self.0.write(), next);
        info!(
            modules = self.0.read().modules.len(),
            "swapped declaration corpus"
        );
        previous
    }

    /// Re-read `paths` and swap in the result. On failure the current corpus stays.
    pub fn reload<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(), CorpusError> {
        let corpus = Corpus::load(paths)?;
        self.replace(corpus);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_utils::{basics_raw, stdlib_raw_modules, write_corpus};

    #[test]
    fn test_from_raw_modules_keeps_order_and_prelude() {
        let corpus = Corpus::from_raw_modules(stdlib_raw_modules()).unwrap();
        let names = corpus.modules().iter().map(|m| m.name.as_str()).collect_vec();
        assert_eq!(names, vec!["Basics", "List", "Maybe", "Dict", "Graphics.Input"]);
        assert_eq!(corpus.prelude(), ["List", "Maybe", "Basics", "Prelude"]);
    }

    #[test]
    fn test_later_module_record_shadows_earlier() {
        let mut raw = stdlib_raw_modules();
        raw.push(RawModule {
            name: "Dict".to_string(),
            values: vec![RawValue {
                raw: "size : Dict k v -> Int".to_string(),
            }],
            ..Default::default()
        });

        let corpus = Corpus::from_raw_modules(raw).unwrap();
        let dict = corpus.module("Dict").unwrap();
        assert_eq!(dict.signature_of("size"), Some("Dict k v -> Int"));
        assert_eq!(dict.signature_of("map"), None);
        assert_eq!(corpus.modules().iter().filter(|m| m.name == "Dict").count(), 1);
    }

    #[test]
    fn test_unnamed_records_are_dropped() {
        let corpus = Corpus::from_raw_modules(vec![basics_raw(), RawModule::default()]).unwrap();
        assert_eq!(corpus.modules().len(), 1);
    }

    #[test]
    fn test_missing_basics_fails() {
        let raw = stdlib_raw_modules()
            .into_iter()
            .filter(|m| m.name != BASICS)
            .collect();
        assert!(matches!(
            Corpus::from_raw_modules(raw),
            Err(CorpusError::PreludeNotFound)
        ));
    }

    #[test]
    fn test_load_merges_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let stdlib = write_corpus(dir.path(), "stdlib.json", &stdlib_raw_modules());
        let deps = write_corpus(
            dir.path(),
            "deps.json",
            &[RawModule {
                name: "Json.Decode".to_string(),
                values: vec![RawValue {
                    raw: "string : Decoder String".to_string(),
                }],
                ..Default::default()
            }],
        );

        let corpus = Corpus::load(&[stdlib, deps]).unwrap();
        assert!(corpus.module("Json.Decode").is_some());
        assert!(corpus.module("Dict").is_some());
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Corpus::load(&[&path]),
            Err(CorpusError::Json { .. })
        ));
        assert!(matches!(
            Corpus::load(&[dir.path().join("missing.json")]),
            Err(CorpusError::Io { .. })
        ));
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = CorpusHandle::new(Corpus::from_raw_modules(stdlib_raw_modules()).unwrap());
        let before = handle.snapshot();

        handle.replace(Corpus::from_raw_modules(vec![basics_raw()]).unwrap());

        assert!(before.module("Dict").is_some());
        assert!(handle.snapshot().module("Dict").is_none());
    }

    #[test]
    fn test_failed_reload_keeps_current_corpus() {
        let handle = CorpusHandle::new(Corpus::from_raw_modules(stdlib_raw_modules()).unwrap());
        assert!(handle.reload(&["/nonexistent/docs.json"]).is_err());
        assert!(handle.snapshot().module("Dict").is_some());
    }
}
