//! Result batch wire types
//!
//! One JSON object per stream message. Field names follow the backend's
//! camelCase DTOs; item fields keep the backend's Portuguese names on the
//! wire and English names in Rust.

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::{SearchError, SearchResult};
use crate::filters::AppliedFilters;

/// Phase tag carried in `resultType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Fast literal matches, provisional
    Exact,
    /// Final set including semantic matches
    Complete,
    /// Backend gave up on the request
    Error,
}

impl ResultKind {
    /// Whether this batch ends the request
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, ResultKind::Exact)
    }
}

/// One search hit
///
/// The controller only reads these fields to build rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "numero", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(rename = "ano", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "autor", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "ementa", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Keywords joined with `|`
    #[serde(rename = "palavrasChave", default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(rename = "linkPdf", default, skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,
    #[serde(rename = "linkPortal", default, skip_serializing_if = "Option::is_none")]
    pub portal_link: Option<String>,
    #[serde(rename = "linkSpLegis", default, skip_serializing_if = "Option::is_none")]
    pub legislative_link: Option<String>,
}

/// One message of a search response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBatch {
    /// Absent on the one-shot endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultKind>,
    #[serde(rename = "projetos", default, deserialize_with = "null_as_empty")]
    pub items: Vec<ResultItem>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<AppliedFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_terms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    /// Optional detail on `error` batches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResultBatch {
    /// Parse one stream message.
    ///
    /// A message without `resultType` cannot be classified and is rejected
    /// as malformed.
    pub fn parse_stream_message(data: &str) -> SearchResult<(ResultKind, ResultBatch)> {
        let batch: ResultBatch = serde_json::from_str(data)?;
        match batch.result_type {
            Some(kind) => Ok((kind, batch)),
            None => Err(SearchError::MalformedPayload(
                "stream message has no resultType".to_string(),
            )),
        }
    }

    /// Highlight terms, if the backend chose any
    #[must_use]
    pub fn highlight_terms(&self) -> Option<&[String]> {
        self.highlight_terms.as_deref()
    }
}
