//! Command-line interface for elm-lens.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ropey::Rope;

use crate::{config::Settings, corpus::Corpus, engine::Engine, indexer::BackgroundIndexer};

#[derive(Parser, Debug)]
#[command(name = "elm-lens", version)]
#[command(about = "Type-at-cursor resolution for Elm sources", long_about = None)]
pub struct Cli {
    /// Declaration corpus file; repeat to merge several. Overrides `docs_paths`.
    #[arg(long, global = true)]
    pub docs: Vec<PathBuf>,

    /// Log filter, e.g. `debug` or `elm_lens=trace`. Defaults to `RUST_LOG`, then `info`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project root for settings and relative corpus paths
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the Language Server Protocol (LSP) server on stdio
    #[command(alias = "lsp")]
    Serve,
    /// Print the resolved type of the token at a char offset
    ShowType { file: PathBuf, offset: usize },
    /// Print the modules every file imports implicitly
    Prelude,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }

    fn root_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("no current directory"),
        }
    }

    fn settings(&self, root_dir: &Path) -> anyhow::Result<Settings> {
        Settings::new(root_dir)
    }

    fn corpus(&self, settings: &Settings, root_dir: &Path) -> anyhow::Result<Corpus> {
        let paths = match self.docs.is_empty() {
            true => settings.corpus_paths(root_dir),
            false => self.docs.clone(),
        };
        Ok(Corpus::load(&paths)?)
    }
}

/// `show-type`: the resolution the editor would show at `offset`.
pub fn show_type(cli: &Cli, file: &Path, offset: usize) -> anyhow::Result<String> {
    let root_dir = cli.root_dir()?;
    let settings = cli.settings(&root_dir)?;
    let corpus = cli.corpus(&settings, &root_dir)?;

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    let indexer = BackgroundIndexer::from_settings(&settings);
    let engine = Engine::new(settings, corpus, indexer);

    Ok(engine.resolve_type_at_cursor(&Rope::from_str(&text), offset))
}

/// `prelude`: the implicit imports, one per line.
pub fn prelude(cli: &Cli) -> anyhow::Result<String> {
    let root_dir = cli.root_dir()?;
    let settings = cli.settings(&root_dir)?;
    let corpus = cli.corpus(&settings, &root_dir)?;
    Ok(corpus.prelude().join("\n"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::{stdlib_raw_modules, write_corpus};

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::parse_from(["elm-lens"]);
        assert_eq!(cli.command(), &Command::Serve);

        let cli = Cli::parse_from(["elm-lens", "--log-level", "debug", "show-type", "Main.elm", "42"]);
        assert_eq!(
            cli.command(),
            &Command::ShowType {
                file: PathBuf::from("Main.elm"),
                offset: 42
            }
        );
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_show_type_and_prelude() {
        let dir = TempDir::new().unwrap();
        let docs = write_corpus(dir.path(), "docs.json", &stdlib_raw_modules());
        let file = dir.path().join("Main.elm");
        fs::write(&file, "module Main exposing (..)\n\nimport Dict\n\nx = Dict.insert 1\n").unwrap();

        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["elm-lens", "--root", root, "prelude"]);
        assert_eq!(prelude(&cli).unwrap(), "List\nMaybe\nBasics\nPrelude");

        let cli = Cli::parse_from([
            "elm-lens",
            "--root",
            root,
            "--docs",
            docs.to_str().unwrap(),
            "prelude",
        ]);
        // "x = Dict.in|sert"
        assert_eq!(
            show_type(&cli, &file, 50).unwrap(),
            "Dict.insert : comparable -> v -> Dict comparable v -> Dict comparable v"
        );
    }

    #[test]
    fn test_missing_corpus_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from(["elm-lens", "--root", dir.path().to_str().unwrap(), "prelude"]);
        assert!(prelude(&cli).is_err());
    }
}
