//! Recovering the dotted identifier under the cursor.
//!
//! Word detection stops at punctuation, so the word under the cursor in
//! `Dict.map` is either `Dict` or `map`. [`expand_qualified`] grows such a
//! span across `.` separators until it covers the whole path.

use std::ops::Range;

use ropey::Rope;

/// Char-offset span into a buffer.
pub type Span = Range<usize>;

pub const QUALIFIER: char = '.';

/// Character and word-boundary access over buffer text.
pub trait WordSource {
    fn char_at(&self, offset: usize) -> Option<char>;

    /// The word containing the character at `offset`, if that character is a word character.
    fn word_containing(&self, offset: usize) -> Option<Span> {
        if !self.char_at(offset).is_some_and(is_word_char) {
            return None;
        }

        let mut start = offset;
        while start > 0 && self.char_at(start - 1).is_some_and(is_word_char) {
            start -= 1;
        }
        let mut end = offset + 1;
        while self.char_at(end).is_some_and(is_word_char) {
            end += 1;
        }
        Some(start..end)
    }

    /// The word a cursor at `offset` touches; a cursor right after a word counts.
    fn word_at_cursor(&self, offset: usize) -> Option<Span> {
        self.word_containing(offset).or_else(|| {
            offset
                .checked_sub(1)
                .and_then(|before| self.word_containing(before))
        })
    }
}

impl WordSource for Rope {
    fn char_at(&self, offset: usize) -> Option<char> {
        self.get_char(offset)
    }
}

impl WordSource for str {
    fn char_at(&self, offset: usize) -> Option<char> {
        self.chars().nth(offset)
    }
}

pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

/// Grow `span` across adjacent `.`-separated words until nothing changes.
///
/// Every pass either strictly grows the span or stops, so this runs at most
/// once per path segment. The result is a fixed point: expanding it again
/// returns it unchanged.
pub fn expand_qualified<S: WordSource + ?Sized>(source: &S, span: Span) -> Span {
    let mut span = span;
    loop {
        let mut next = span.clone();

        if next.start >= 2 && source.char_at(next.start - 1) == Some(QUALIFIER) {
            if let Some(word) = source.word_containing(next.start - 2) {
                next.start = next.start.min(word.start);
            }
        }

        if source.char_at(next.end) == Some(QUALIFIER) {
            if let Some(word) = source.word_containing(next.end + 1) {
                next.end = next.end.max(word.end);
            }
        }

        if next == span {
            return span;
        }
        span = next;
    }
}

/// The fully qualified token at a cursor offset, with its span.
pub fn token_at(rope: &Rope, offset: usize) -> Option<(Span, String)> {
    let word = rope.word_at_cursor(offset)?;
    let span = expand_qualified(rope, word);
    let text = rope.slice(span.clone()).to_string();
    Some((span, text))
}

/// The dotted text typed just before `offset`, used as a completion prefix.
///
/// `List.fo|` gives `List.fo`; `List.|` gives `List.`.
pub fn prefix_before(rope: &Rope, offset: usize) -> String {
    let offset = offset.min(rope.len_chars());
    let mut start = offset;
    while start > 0 && rope.get_char(start - 1).is_some_and(|ch| is_word_char(ch) || ch == QUALIFIER) {
        start -= 1;
    }
    rope.slice(start..offset).to_string()
}

/// Whether `offset` sits inside a string literal or a comment.
///
/// Line comments and strings end at the newline. `{- -}` block comments nest
/// and are tracked from the start of the buffer.
pub fn in_string_or_comment(rope: &Rope, offset: usize) -> bool {
    if offset > rope.len_chars() {
        return false;
    }

    let mut block_depth = 0usize;
    let mut line_comment = false;
    let mut in_string = false;
    let mut escaped = false;
    let mut previous = None;

    for ch in rope.slice(..offset).chars() {
        if ch == '\n' {
            line_comment = false;
            in_string = false;
            escaped = false;
            previous = None;
            continue;
        }

        match ch {
            _ if line_comment => {}
            '-' if !in_string && previous == Some('{') => {
                block_depth += 1;
                previous = None;
                continue;
            }
            '}' if block_depth > 0 && previous == Some('-') => {
                block_depth -= 1;
                previous = None;
                continue;
            }
            _ if block_depth > 0 => {}
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '-' if !in_string && previous == Some('-') => line_comment = true,
            _ => {}
        }
        previous = Some(ch);
    }

    line_comment || in_string || block_depth > 0
}
