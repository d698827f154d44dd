//! Category labels offered by the project list filter.

use manufacture_core::{CategoryTag, ProjectRule};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Label id of the synthetic "every project" filter.
pub const ALL_ITEMS: &str = "STR_ALL_ITEMS";
/// Label id of the synthetic "positive profit score" filter.
pub const PROFITABLE_ITEMS: &str = "STR_PROFITABLE_ITEMS";

/// One entry of the category drop-down.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CategoryLabel {
    /// Every available project, source order.
    All,
    /// Projects whose category tag matches, source order.
    Tag(CategoryTag),
    /// Projects with a positive score, best first.
    Profitable,
}

impl CategoryLabel {
    /// Label id, also the localization key shown to the player.
    pub fn id(&self) -> &str {
        match self {
            CategoryLabel::All => ALL_ITEMS,
            CategoryLabel::Tag(tag) => tag.as_str(),
            CategoryLabel::Profitable => PROFITABLE_ITEMS,
        }
    }

    /// Label for an id, mapping the synthetic ids back to their variants.
    pub fn from_id(id: &str) -> Self {
        match id {
            ALL_ITEMS => CategoryLabel::All,
            PROFITABLE_ITEMS => CategoryLabel::Profitable,
            other => CategoryLabel::Tag(CategoryTag::new(other)),
        }
    }

    /// True when a project with this category tag passes the filter,
    /// ignoring the profit test of [`CategoryLabel::Profitable`].
    pub fn admits(&self, category: &CategoryTag) -> bool {
        match self {
            CategoryLabel::All | CategoryLabel::Profitable => true,
            CategoryLabel::Tag(tag) => tag == category,
        }
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for CategoryLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// Ordered, duplicate-free category labels.
///
/// "All" comes first, then every category tag in first-seen order, then
/// "Profitable" when it was requested at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySet {
    labels: Vec<CategoryLabel>,
}

impl CategorySet {
    /// Build the set from projects in source order.
    ///
    /// A tag spelled like a synthetic label id folds into that label, so the
    /// drop-down never shows the same id twice.
    pub fn build<'a, I>(projects: I, has_profitable: bool) -> Self
    where
        I: IntoIterator<Item = &'a ProjectRule>,
    {
        let mut labels = vec![CategoryLabel::All];
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        seen.insert(ALL_ITEMS);
        seen.insert(PROFITABLE_ITEMS);
        for p in projects {
            if seen.insert(p.category.as_str()) {
                labels.push(CategoryLabel::Tag(p.category.clone()));
            }
        }
        if has_profitable {
            labels.push(CategoryLabel::Profitable);
        }
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Never true: "All" is always present.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CategoryLabel> {
        self.labels.get(index)
    }

    pub fn position(&self, label: &CategoryLabel) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn contains(&self, label: &CategoryLabel) -> bool {
        self.position(label).is_some()
    }

    /// Whether the "Profitable" filter is offered.
    pub fn has_profitable(&self) -> bool {
        self.labels.last() == Some(&CategoryLabel::Profitable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryLabel> {
        self.labels.iter()
    }

    pub fn as_slice(&self) -> &[CategoryLabel] {
        &self.labels
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a CategoryLabel;
    type IntoIter = std::slice::Iter<'a, CategoryLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
