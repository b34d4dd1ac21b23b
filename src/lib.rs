//! elm-lens: type-at-cursor resolution for Elm sources
//!
//! This crate answers "what is the type of the identifier under the cursor?"
//! for an editor, using two sources of knowledge:
//!
//! - a static **declaration corpus** (`docs.json` files) resolved against the
//!   buffer's import statements, synchronously and without I/O
//! - an external **inference oracle** run per file in the background, whose
//!   output backs hover fallbacks and completions
//!
//! # Architecture
//!
//! - [`corpus`]: declaration parsing, per-module indexes, the prelude, and the swappable corpus snapshot
//! - [`scope`]: import statements to a per-buffer module scope
//! - [`token`]: the dotted identifier under the cursor
//! - [`resolve`]: the four lookup strategies and output formatting
//! - [`indexer`]: the background oracle pool and per-file cache
//! - [`completion`]: fuzzy-ranked completions with argument snippets
//! - [`report`]: compiler report parsing and the error highlighter capability
//! - [`engine`]: the query surface tying the above together
//! - [`server`]: the LSP adapter
//!
//! # Usage
//!
//! ```ignore
//! use elm_lens::{config::Settings, engine::Engine};
//!
//! let engine = Engine::load(Settings::default(), &project_root)?;
//! let signature = engine.resolve_type_at_cursor(&rope, offset);
//! ```

// Resolution core
pub mod corpus;
pub mod resolve;
pub mod scope;
pub mod token;

// Background inference
pub mod completion;
pub mod indexer;
pub mod matcher;

// Editor surfaces
pub mod engine;
pub mod hover;
pub mod report;
pub mod server;

// Configuration and utilities
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
