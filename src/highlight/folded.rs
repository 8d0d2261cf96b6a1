//! Parallel accent-folded view of a string with offset mapping
//!
//! Matching runs on the folded string, but the output must be cut from the
//! original. Each folded character remembers the byte range of the original
//! character it came from, so any folded match maps back to whole original
//! characters.

use crate::text::push_stripped;

#[derive(Debug, Clone, Copy)]
struct Span {
    folded_start: usize,
    original_start: usize,
    original_end: usize,
}

/// Accent-folded copy of a text plus a map back into the original bytes
#[derive(Debug)]
pub(crate) struct FoldedText {
    folded: String,
    spans: Vec<Span>,
}

impl FoldedText {
    pub(crate) fn new(original: &str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut spans: Vec<Span> = Vec::with_capacity(original.len());

        for (original_start, c) in original.char_indices() {
            let original_end = original_start + c.len_utf8();
            let before = folded.len();
            let emitted = push_stripped(c, &mut folded);

            if emitted == 0 {
                // A bare combining mark belongs to the character before it
                if let Some(prev) = spans.last_mut() {
                    prev.original_end = original_end;
                }
                continue;
            }

            let mut folded_start = before;
            for folded_char in folded[before..].chars() {
                spans.push(Span {
                    folded_start,
                    original_start,
                    original_end,
                });
                folded_start += folded_char.len_utf8();
            }
        }

        Self { folded, spans }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.folded
    }

    /// Map a non-empty folded byte range onto original byte offsets.
    ///
    /// Ranges that start or end inside a multi-character expansion widen to
    /// the whole original character.
    pub(crate) fn original_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end {
            return None;
        }
        let first = self.spans.partition_point(|span| span.folded_start < start);
        let last = self
            .spans
            .partition_point(|span| span.folded_start < end)
            .checked_sub(1)?;
        let first_span = self.spans.get(first)?;
        let last_span = self.spans.get(last)?;
        if last < first {
            return None;
        }
        Some((first_span.original_start, last_span.original_end))
    }
}
