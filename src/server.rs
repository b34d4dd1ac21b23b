//! LSP adapter over [`Engine`].

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use ropey::Rope;
use tokio::{runtime::Handle, sync::RwLock};
use tower_lsp::{
    jsonrpc::{Error, ErrorCode, Result},
    lsp_types::*,
    Client, LanguageServer,
};
use tracing::{debug, error, info, warn};

use crate::{
    completion::Completion,
    config::Settings,
    engine::Engine,
    hover::{self, position_to_offset},
    report::{CompileError, ErrorHighlighter},
    token::prefix_before,
};

pub struct Backend {
    client: Client,
    engine: Arc<RwLock<Option<Arc<Engine>>>>,
    documents: DashMap<PathBuf, Rope>,
    root_dir: Arc<RwLock<Option<PathBuf>>>,
}

impl Backend {
    pub fn new(client: Client) -> Backend {
        Backend {
            client,
            engine: Default::default(),
            documents: DashMap::new(),
            root_dir: Default::default(),
        }
    }

    async fn engine(&self) -> Option<Arc<Engine>> {
        self.engine.read().await.clone()
    }

    fn document(&self, path: &Path) -> Option<Rope> {
        self.documents.get(path).map(|rope| rope.clone())
    }

    /// Swap in a fresh corpus when `path` is one of its files.
    async fn reload_if_corpus(&self, path: &Path) {
        let (Some(engine), Some(root_dir)) = (self.engine().await, self.root_dir.read().await.clone())
        else {
            return;
        };
        if !engine.is_corpus_file(&root_dir, path) {
            return;
        }

        info!(file = %path.display(), "corpus file changed, reloading");
        if let Err(err) = engine.reload_corpus(&root_dir) {
            self.client
                .show_message(MessageType::WARNING, format!("elm-lens: corpus not reloaded: {err}"))
                .await;
        }
    }

    async fn watch_corpus(&self, engine: &Engine, root_dir: &Path) {
        let watchers = engine
            .settings()
            .corpus_paths(root_dir)
            .into_iter()
            .map(|path| FileSystemWatcher {
                glob_pattern: path.to_string_lossy().into_owned().into(),
                kind: Some(WatchKind::Create | WatchKind::Change),
            })
            .collect::<Vec<_>>();
        let options = DidChangeWatchedFilesRegistrationOptions { watchers };

        let registration = Registration {
            id: "elm-lens-corpus-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(err) = self.client.register_capability(vec![registration]).await {
            warn!("could not watch corpus files: {err}");
        }
    }

    /// Index a file after it was opened or saved.
    async fn reindex(&self, uri: &Url) {
        let (Some(engine), Ok(path)) = (self.engine().await, uri.to_file_path()) else {
            return;
        };
        debug!(file = %path.display(), "reindex requested");
        engine.request_reindex(&path);
    }
}

fn completion_item(completion: Completion) -> CompletionItem {
    let label = completion.display_label;
    CompletionItem {
        filter_text: label.split(" : ").next().map(str::to_string),
        label,
        kind: Some(CompletionItemKind::FUNCTION),
        insert_text: Some(completion.insert_text),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        documentation: (!completion.documentation.is_empty()).then(|| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: completion.documentation,
            })
        }),
        ..Default::default()
    }
}

fn supports_diagnostics(capabilities: &ClientCapabilities) -> bool {
    capabilities
        .text_document
        .as_ref()
        .is_some_and(|text_document| text_document.publish_diagnostics.is_some())
}

/// Publishes compiler errors as LSP diagnostics.
pub struct DiagnosticsHighlighter {
    client: Client,
    runtime: Handle,
}

impl DiagnosticsHighlighter {
    pub fn new(client: Client, runtime: Handle) -> DiagnosticsHighlighter {
        DiagnosticsHighlighter { client, runtime }
    }
}

fn diagnostic(error: &CompileError) -> Diagnostic {
    let start = Position::new(
        error.line().saturating_sub(1),
        error.column().saturating_sub(1),
    );
    let end = error
        .region
        .end
        .map(|end| Position::new(end.line.saturating_sub(1), end.column.saturating_sub(1)))
        .unwrap_or(start);

    Diagnostic {
        range: Range { start, end },
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(error.kind.clone())),
        source: Some("elm-make".to_string()),
        message: error.message(),
        ..Default::default()
    }
}

impl ErrorHighlighter for DiagnosticsHighlighter {
    fn highlight(&self, file: &Path, working_dir: &Path, errors: &[CompileError]) {
        // an error-free file still gets an empty publish so old marks go away
        let mut by_file = HashMap::from([(file.to_path_buf(), Vec::<Diagnostic>::new())]);
        for error in errors {
            by_file
                .entry(error.path(working_dir))
                .or_default()
                .push(diagnostic(error));
        }

        for (path, diagnostics) in by_file {
            let Ok(uri) = Url::from_file_path(&path) else {
                continue;
            };
            let client = self.client.clone();
            self.runtime.spawn(async move {
                client.publish_diagnostics(uri, diagnostics, None).await;
            });
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root_dir = match params.root_uri.as_ref().map(Url::to_file_path) {
            Some(Ok(dir)) => dir,
            _ => std::env::current_dir().map_err(|_| Error::invalid_params("no workspace root"))?,
        };

        let settings = Settings::new(&root_dir).unwrap_or_else(|err| {
            error!("failed to read settings, using defaults: {err}");
            Settings::default()
        });

        let engine = Engine::load(settings, &root_dir).map_err(|err| {
            error!("cannot start: {err}");
            Error {
                code: ErrorCode::InternalError,
                message: err.to_string().into(),
                data: None,
            }
        })?;

        if supports_diagnostics(&params.capabilities) {
            engine.set_highlighter(Arc::new(DiagnosticsHighlighter::new(
                self.client.clone(),
                Handle::current(),
            )));
        }

        *self.engine.write().await = Some(Arc::new(engine));
        *self.root_dir.write().await = Some(root_dir);

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "elm-lens".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let (Some(engine), Some(root_dir)) = (self.engine().await, self.root_dir.read().await.clone())
        else {
            return;
        };
        self.watch_corpus(&engine, &root_dir).await;
        let jobs = engine.index_workspace(&root_dir);

        self.client
            .log_message(
                MessageType::INFO,
                format!("elm-lens: indexing {} files", jobs.len()),
            )
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if let Ok(path) = params.text_document.uri.to_file_path() {
            self.documents
                .insert(path, Rope::from_str(&params.text_document.text));
        }
        self.reindex(&params.text_document.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        // full sync: the last change holds the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.insert(path, Rope::from_str(&change.text));
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        if let Some(text) = params.text {
            self.documents.insert(path.clone(), Rope::from_str(&text));
        }
        self.reindex(&params.text_document.uri).await;

        if let Some(engine) = self.engine().await {
            engine.check_on_save(&path);
        }
        self.reload_if_corpus(&path).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            if change.typ == FileChangeType::DELETED {
                continue;
            }
            if let Ok(path) = change.uri.to_file_path() {
                debug!(file = %path.display(), "watched file changed");
                self.reload_if_corpus(&path).await;
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Ok(path) = params.text_document.uri.to_file_path() {
            self.documents.remove(&path);
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let (Some(engine), Ok(path)) = (self.engine().await, uri.to_file_path()) else {
            return Ok(None);
        };
        let Some(rope) = self.document(&path) else {
            return Ok(None);
        };

        Ok(hover::hover(&engine, &params, &rope, &path).await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let (Some(engine), Ok(path)) = (self.engine().await, uri.to_file_path()) else {
            return Ok(None);
        };
        let Some(rope) = self.document(&path) else {
            return Ok(None);
        };
        let Some(offset) = position_to_offset(&rope, params.text_document_position.position) else {
            return Ok(None);
        };

        let prefix = prefix_before(&rope, offset);
        let items = engine
            .completions_for_prefix(&path, &prefix)
            .into_iter()
            .map(completion_item)
            .collect::<Vec<_>>();

        Ok(Some(CompletionResponse::List(CompletionList {
            is_incomplete: true,
            items,
        })))
    }
}
