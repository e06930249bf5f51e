//! Filter state and option derivation
//!
//! Pure functions only: a selection is a value, applying it borrows rows
//! from the dataset and never copies or mutates them.

use crate::dataset::{Dataset, EngagementRecord};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Rows of the dataset matching the current selection, in original order
pub type FilteredView<'a> = Vec<&'a EngagementRecord>;

/// Allowed values per dimension. An empty list means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub platforms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content_types: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actions: Vec<String>,
}

/// Dropdowns send `null` once every value is cleared
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query-string form: `?platforms=FB,IG&actions=like`
#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    platforms: Option<String>,
    content_types: Option<String>,
    actions: Option<String>,
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn allows(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a == value)
}

impl FilterSelection {
    pub fn with_platforms<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_types = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_actions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = values.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a selection from a URL query string (without the leading `?`)
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let q: FilterQuery = serde_urlencoded::from_str(query)?;
        Ok(Self {
            platforms: split_list(q.platforms),
            content_types: split_list(q.content_types),
            actions: split_list(q.actions),
        })
    }

    /// True when no dimension is restricted
    pub fn is_unrestricted(&self) -> bool {
        self.platforms.is_empty() && self.content_types.is_empty() && self.actions.is_empty()
    }

    /// AND across dimensions, OR within a dimension
    pub fn matches(&self, record: &EngagementRecord) -> bool {
        allows(&self.platforms, &record.platform)
            && allows(&self.content_types, &record.content_type)
            && allows(&self.actions, &record.action)
    }

    /// Keep the rows this selection matches, preserving order
    pub fn apply<'a, I>(&self, records: I) -> FilteredView<'a>
    where
        I: IntoIterator<Item = &'a EngagementRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Filtered view of a whole dataset
    pub fn filter<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        self.apply(dataset.records())
    }
}

/// Selectable values per dimension, derived once from the dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub platforms: Vec<String>,
    pub content_types: Vec<String>,
    pub actions: Vec<String>,
}

impl FilterOptions {
    /// Distinct values of each categorical column, first-seen order
    pub fn derive(dataset: &Dataset) -> Self {
        let records = dataset.records();
        Self {
            platforms: distinct(records.iter().map(|r| r.platform.as_str())),
            content_types: distinct(records.iter().map(|r| r.content_type.as_str())),
            actions: distinct(records.iter().map(|r| r.action.as_str())),
        }
    }
}

/// Distinct values in first-seen order
pub(crate) fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(|v| v.to_string())
        .collect()
}
