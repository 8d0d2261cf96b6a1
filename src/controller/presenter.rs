//! Presentation boundary
//!
//! The controller pushes fully prepared output through [`Presenter`] and never
//! asks it anything back. Rendered counts and chip counts are tracked on the
//! controller side.

use serde::Serialize;

use crate::filters::AppliedFilters;
use crate::highlight::Highlighter;
use crate::stream::ResultItem;
use crate::utils::{DEFAULT_ITEM_KIND, KEYWORD_SEPARATOR, UNKNOWN_AUTHOR};

/// What the loading indicator should say
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadingPhase {
    /// Request sent, nothing back yet
    Searching,
    /// Exact matches shown, semantic matches still coming
    SemanticPending,
}

impl LoadingPhase {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LoadingPhase::Searching => "Buscando...",
            LoadingPhase::SemanticPending => "Buscando resultados semânticos...",
        }
    }
}

/// A result ready for display, with highlighting already applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedItem {
    /// 1-based position across all loaded pages
    pub position: usize,
    pub id: Option<i64>,
    pub heading: String,
    pub author: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub pdf_link: Option<String>,
    pub portal_link: Option<String>,
    pub legislative_link: Option<String>,
}

impl RenderedItem {
    /// Project a backend item into display text.
    #[must_use]
    pub fn project(item: &ResultItem, position: usize, highlighter: &Highlighter) -> Self {
        let kind = non_blank(item.kind.as_deref()).unwrap_or(DEFAULT_ITEM_KIND);
        let number = item.number.map(|n| n.to_string()).unwrap_or_default();
        let year = item.year.map(|y| y.to_string()).unwrap_or_default();
        let heading = format!("{position}. {kind} {number}/{year}");
        let author = non_blank(item.author.as_deref()).unwrap_or(UNKNOWN_AUTHOR);

        let keywords = item
            .keywords
            .as_deref()
            .map(|raw| {
                raw.split(KEYWORD_SEPARATOR)
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .map(|k| highlighter.apply(&k))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            position,
            id: item.id,
            heading: highlighter.apply(&heading),
            author: highlighter.apply(author),
            summary: highlighter.apply(item.summary.as_deref().unwrap_or_default()),
            keywords,
            pdf_link: item.pdf_link.clone(),
            portal_link: item.portal_link.clone(),
            legislative_link: item.legislative_link.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Sink for everything the controller wants shown
pub trait Presenter {
    /// Drop rendered results beyond the first `keep`.
    fn truncate_results(&mut self, keep: usize);

    /// Append results after those already rendered.
    fn render_results(&mut self, items: &[RenderedItem]);

    /// Replace the chip groups. An empty value hides the chip area.
    fn render_filters(&mut self, filters: &AppliedFilters);

    /// `None` hides the indicator.
    fn set_loading(&mut self, phase: Option<LoadingPhase>);

    fn show_error(&mut self, message: &str);

    fn hide_error(&mut self);

    fn set_load_more(&mut self, enabled: bool);

    fn set_end_of_results(&mut self, visible: bool);

    /// Called after each terminal batch.
    fn show_summary(&mut self, _shown: usize, _total: Option<u64>) {}
}
