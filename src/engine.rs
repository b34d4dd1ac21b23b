//! The query surface an editor shell talks to.
//!
//! [`Engine::resolve_type_at_cursor`] is the hot path: it runs on every cursor
//! move, touches only the in-memory corpus snapshot and never waits. Anything
//! that shells out goes through the [`BackgroundIndexer`] or a blocking task.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use ropey::Rope;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    completion::{completions_from_entry, Completion},
    config::Settings,
    corpus::{Corpus, CorpusHandle},
    error::CorpusError,
    indexer::BackgroundIndexer,
    report::{compile_errors, run_make, ErrorHighlighter, NoopHighlighter},
    resolve::Resolver,
    scope::Scope,
    token::{in_string_or_comment, token_at},
};

pub struct Engine {
    settings: Settings,
    corpus: CorpusHandle,
    indexer: BackgroundIndexer,
    highlighter: RwLock<Arc<dyn ErrorHighlighter>>,
}

impl Engine {
    pub fn new(settings: Settings, corpus: Corpus, indexer: BackgroundIndexer) -> Engine {
        Engine {
            settings,
            corpus: CorpusHandle::new(corpus),
            indexer,
            highlighter: RwLock::new(Arc::new(NoopHighlighter)),
        }
    }

    /// Load the corpus named by `settings` (relative to `root_dir`) and start an oracle-backed indexer.
    pub fn load(settings: Settings, root_dir: &Path) -> Result<Engine, CorpusError> {
        let corpus = Corpus::load(&settings.corpus_paths(root_dir))?;
        let indexer = BackgroundIndexer::from_settings(&settings);
        Ok(Engine::new(settings, corpus, indexer))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn corpus(&self) -> Arc<Corpus> {
        self.corpus.snapshot()
    }

    pub fn indexer(&self) -> &BackgroundIndexer {
        &self.indexer
    }

    pub fn set_highlighter(&self, highlighter: Arc<dyn ErrorHighlighter>) {
        *self.highlighter.write() = highlighter;
    }

    /// The corpus signature(s) of the token under the cursor, or `""`.
    ///
    /// `offset` is a char offset into `buffer`. The whole buffer is scanned for
    /// imports on every call; one corpus snapshot serves the whole query.
    pub fn resolve_type_at_cursor(&self, buffer: &Rope, offset: usize) -> String {
        if !self.settings.enabled {
            return String::new();
        }
        let Some((_, token)) = token_at(buffer, offset) else {
            return String::new();
        };
        if in_string_or_comment(buffer, offset) {
            return String::new();
        }

        let corpus = self.corpus.snapshot();
        let scope = Scope::from_buffer(&buffer.to_string(), corpus.prelude());
        let resolved = Resolver::new(&scope, corpus.modules()).resolve(&token);
        debug!(token, resolved, "resolved type at cursor");
        resolved
    }

    /// Hover text: the corpus resolution, else the oracle's record for the token.
    pub async fn hover(&self, path: &Path, buffer: &Rope, offset: usize) -> Option<String> {
        if !self.settings.hover {
            return None;
        }
        let resolved = self.resolve_type_at_cursor(buffer, offset);
        if !resolved.is_empty() {
            return Some(resolved);
        }
        if !self.settings.enabled || in_string_or_comment(buffer, offset) {
            return None;
        }

        let (_, token) = token_at(buffer, offset)?;
        let tries = self.indexer.retry_policy().tries;
        self.indexer
            .lookup(path, &token, tries)
            .await
            .map(|record| record.render())
    }

    /// Completions for `prefix` from the file's current inference snapshot.
    pub fn completions_for_prefix(&self, path: &Path, prefix: &str) -> Vec<Completion> {
        let entry = self.indexer.entry(path);
        completions_from_entry(entry.as_deref(), prefix, self.settings.completion_limit)
    }

    pub fn request_reindex(&self, path: impl Into<PathBuf>) -> JoinHandle<()> {
        self.indexer.request_index(path)
    }

    /// Queue every `.elm` source under `root`, skipping hidden directories and `elm-stuff`.
    pub fn index_workspace(&self, root: &Path) -> Vec<JoinHandle<()>> {
        let jobs = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry))
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "elm"))
            .map(|entry| self.indexer.request_index(entry.into_path()))
            .collect::<Vec<_>>();

        info!(root = %root.display(), files = jobs.len(), "queued workspace indexing");
        jobs
    }

    /// Re-read the corpus files. On failure the current corpus stays in place.
    pub fn reload_corpus(&self, root_dir: &Path) -> Result<(), CorpusError> {
        self.corpus
            .reload(&self.settings.corpus_paths(root_dir))
            .inspect_err(|err| warn!("corpus reload failed, keeping the current one: {err}"))
    }

    pub fn is_corpus_file(&self, root_dir: &Path, path: &Path) -> bool {
        self.settings
            .corpus_paths(root_dir)
            .iter()
            .any(|corpus_path| corpus_path == path)
    }

    /// Run the compiler report for `file` when `check_on_save` is set.
    ///
    /// Failures are logged only.
    pub fn check_on_save(&self, file: &Path) -> Option<JoinHandle<()>> {
        if !self.settings.check_on_save {
            return None;
        }

        let make_command = self.settings.make_command.clone();
        let file = file.to_path_buf();
        let highlighter = Arc::clone(&self.highlighter.read());
        Some(tokio::task::spawn_blocking(move || {
            match run_make(&make_command, &file) {
                Ok(entries) => {
                    let errors = compile_errors(&entries);
                    info!(file = %file.display(), errors = errors.len(), "compiler report");
                    let working_dir = file.parent().unwrap_or(Path::new(""));
                    highlighter.highlight(&file, working_dir, &errors);
                }
                Err(err) => warn!(file = %file.display(), "compiler report failed: {err}"),
            }
        }))
    }
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "elm-stuff")
}
