//! Hover provider for Elm sources.
//!
//! Shows the signature of the token under the cursor: the declaration corpus
//! first, the file's inference snapshot second.
//!
//! # Configuration
//!
//! Hover can be disabled via [`Settings::hover`](crate::config::Settings::hover):
//!
//! ```json
//! { "hover": false }
//! ```

use std::path::Path;

use ropey::Rope;
use tower_lsp::lsp_types::{
    Hover, HoverContents, HoverParams, MarkupContent, MarkupKind, Position,
};

use crate::engine::Engine;

/// Char offset of an LSP position, clamped to the buffer.
pub fn position_to_offset(rope: &Rope, position: Position) -> Option<usize> {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return None;
    }
    let line_start = rope.line_to_char(line);
    let line_len = rope.line(line).len_chars();
    Some(line_start + (position.character as usize).min(line_len))
}

/// Generate hover content for the token at the cursor position.
///
/// Ambiguous tokens show every match, one per line.
pub async fn hover(engine: &Engine, params: &HoverParams, rope: &Rope, path: &Path) -> Option<Hover> {
    let offset = position_to_offset(rope, params.text_document_position_params.position)?;
    let signature = engine.hover(path, rope, offset).await?;

    let value = signature
        .split("; ")
        .map(|line| format!("```elm\n{line}\n```"))
        .collect::<Vec<_>>()
        .join("\n");

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    })
}
