//! Accent-insensitive highlighter
//!
//! Terms are folded with [`strip_diacritics`] and compiled into one
//! case-insensitive alternation. Input text is folded the same way, matched,
//! and every match is copied back from the original text wrapped in the
//! configured marker. Removing the markers from the output always yields the
//! input unchanged.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::folded::FoldedText;
use crate::text::strip_diacritics;
use crate::utils::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN, MIN_HIGHLIGHT_TERM_CHARS};

/// Delimiters inserted around every highlighted span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMarker {
    pub open: String,
    pub close: String,
}

impl HighlightMarker {
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Remove every marker occurrence from `text`.
    #[must_use]
    pub fn strip(&self, text: &str) -> String {
        text.replace(&self.open, "").replace(&self.close, "")
    }
}

impl Default for HighlightMarker {
    fn default() -> Self {
        Self::new(HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
    }
}

/// Compiled highlighter for one set of terms
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
    marker: HighlightMarker,
}

impl Highlighter {
    /// Highlighter that never marks anything
    #[must_use]
    pub fn identity(marker: HighlightMarker) -> Self {
        Self {
            pattern: None,
            marker,
        }
    }

    /// Build from explicit terms, typically the backend's `highlightTerms`.
    ///
    /// Terms are folded, escaped, and deduplicated; terms of one character or
    /// less are dropped. Earlier terms win when two alternatives match at the
    /// same position.
    #[must_use]
    pub fn from_terms<I, S>(terms: I, marker: HighlightMarker) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let folded = terms
            .into_iter()
            .map(|term| strip_diacritics(term.as_ref().trim()));
        Self::compile(folded, marker)
    }

    /// Build from a raw query by splitting it on whitespace.
    #[must_use]
    pub fn from_query(query: &str, marker: HighlightMarker) -> Self {
        let folded = strip_diacritics(query);
        let terms = folded.split_whitespace().map(str::to_string);
        Self::compile(terms, marker)
    }

    /// Prefer backend-chosen terms, falling back to the user's query.
    #[must_use]
    pub fn for_batch(
        highlight_terms: Option<&[String]>,
        query: &str,
        marker: HighlightMarker,
    ) -> Self {
        match highlight_terms {
            Some(terms) if !terms.is_empty() => Self::from_terms(terms, marker),
            _ => Self::from_query(query, marker),
        }
    }

    fn compile(folded_terms: impl Iterator<Item = String>, marker: HighlightMarker) -> Self {
        let mut alternatives: Vec<String> = Vec::new();
        for term in folded_terms {
            if term.chars().count() <= MIN_HIGHLIGHT_TERM_CHARS {
                continue;
            }
            let escaped = regex::escape(&term);
            if !alternatives.contains(&escaped) {
                alternatives.push(escaped);
            }
        }

        if alternatives.is_empty() {
            return Self::identity(marker);
        }

        match RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => Self {
                pattern: Some(pattern),
                marker,
            },
            Err(e) => {
                warn!(error = %e, terms = alternatives.len(), "Highlight pattern rejected, highlighting disabled");
                Self::identity(marker)
            }
        }
    }

    /// Whether this highlighter returns every input unchanged
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.pattern.is_none()
    }

    #[must_use]
    pub fn marker(&self) -> &HighlightMarker {
        &self.marker
    }

    /// Wrap every accent-insensitive match in `text` with the marker.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        if text.is_empty() {
            return String::new();
        }

        let folded = FoldedText::new(text);
        let mut out = String::with_capacity(text.len() + 2 * self.marker.open.len());
        let mut last = 0;

        for found in pattern.find_iter(folded.as_str()) {
            let Some((start, end)) = folded.original_range(found.start(), found.end()) else {
                continue;
            };
            // Two matches inside one expanded character share an original range
            let start = start.max(last);
            if start >= end {
                continue;
            }
            out.push_str(&text[last..start]);
            out.push_str(&self.marker.open);
            out.push_str(&text[start..end]);
            out.push_str(&self.marker.close);
            last = end;
        }

        out.push_str(&text[last..]);
        out
    }
}
