//! Filter categories and the backend-reported applied filter map

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Categories the user can exclude values from
///
/// Wire names are the backend's (Portuguese) category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterCategory {
    #[serde(rename = "Autor")]
    Author,
    #[serde(rename = "Ano")]
    Year,
    #[serde(rename = "Tipo")]
    Kind,
    #[serde(rename = "Número")]
    Number,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 4] = [
        FilterCategory::Author,
        FilterCategory::Year,
        FilterCategory::Kind,
        FilterCategory::Number,
    ];

    /// Label used on the wire and in chip groups
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::Author => "Autor",
            FilterCategory::Year => "Ano",
            FilterCategory::Kind => "Tipo",
            FilterCategory::Number => "Número",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label names no known category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown filter category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for FilterCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = crate::text::strip_diacritics(s.trim()).to_lowercase();
        match key.as_str() {
            "autor" | "author" => Ok(FilterCategory::Author),
            "ano" | "year" => Ok(FilterCategory::Year),
            "tipo" | "type" | "kind" => Ok(FilterCategory::Kind),
            "numero" | "number" => Ok(FilterCategory::Number),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// One category of applied filters with its values in backend order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    pub category: String,
    pub values: Vec<String>,
}

impl FilterGroup {
    #[must_use]
    pub fn new(category: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            category: category.into(),
            values,
        }
    }

    /// Known category for this group, if the backend label is one
    #[must_use]
    pub fn known_category(&self) -> Option<FilterCategory> {
        self.category.parse().ok()
    }
}

/// Available filter values per category, as reported for the current query
///
/// Serialized as a JSON object. Category order follows the wire order rather
/// than being sorted, so chip groups render the way the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedFilters {
    groups: Vec<FilterGroup>,
}

impl AppliedFilters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group, merging into an existing group with the same label.
    pub fn push(&mut self, group: FilterGroup) {
        if let Some(existing) = self
            .groups
            .iter_mut()
            .find(|existing| existing.category == group.category)
        {
            existing.values.extend(group.values);
        } else {
            self.groups.push(group);
        }
    }

    #[must_use]
    pub fn with_group(mut self, category: impl Into<String>, values: &[&str]) -> Self {
        self.push(FilterGroup::new(
            category,
            values.iter().map(|v| (*v).to_string()).collect(),
        ));
        self
    }

    #[must_use]
    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    #[must_use]
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.category == category)
            .map(|group| group.values.as_slice())
    }

    /// True when no group has any value left to show
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.values.is_empty())
    }

    /// Total number of values across groups
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.groups.iter().map(|group| group.values.len()).sum()
    }
}

impl FromIterator<FilterGroup> for AppliedFilters {
    fn from_iter<T: IntoIterator<Item = FilterGroup>>(iter: T) -> Self {
        let mut filters = AppliedFilters::new();
        for group in iter {
            filters.push(group);
        }
        filters
    }
}

impl Serialize for AppliedFilters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.category, &group.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AppliedFilters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AppliedFiltersVisitor;

        impl<'de> Visitor<'de> for AppliedFiltersVisitor {
            type Value = AppliedFilters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter category to a list of values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut filters = AppliedFilters::new();
                while let Some((category, values)) =
                    access.next_entry::<String, Option<Vec<String>>>()?
                {
                    filters.push(FilterGroup::new(category, values.unwrap_or_default()));
                }
                Ok(filters)
            }
        }

        deserializer.deserialize_map(AppliedFiltersVisitor)
    }
}
