#![deny(warnings)]

//! Core rule models and invariants for base manufacturing.
//!
//! This crate defines the serializable project rules shared by the catalog,
//! the economy helpers and the ruleset loader, with validation helpers that
//! reject malformed content before anything scores or lists it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Category tag that routes price lookups to the craft namespace.
pub const CRAFT_CATEGORY: &str = "STR_CRAFT";

/// Unique identifier for a manufacture project, e.g. "STR_LASER_RIFLE".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

/// Identifier of an item or craft produced or consumed by a project.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

/// Category tag a project is grouped under, e.g. "STR_AMMO".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTag(pub String);

macro_rules! string_id {
    ($($ty:ident),*) => {$(
        impl $ty {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    )*};
}

string_id!(ProjectId, ItemId, CategoryTag);

/// Which sell-price table an identifier lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceNamespace {
    /// Craft hulls sold from the hangar.
    Craft,
    /// Everything stored in base stores.
    Item,
}

impl PriceNamespace {
    /// Namespace for the outputs of a project in `category`.
    pub fn for_category(category: &CategoryTag, craft_category: &str) -> Self {
        if category.as_str() == craft_category {
            PriceNamespace::Craft
        } else {
            PriceNamespace::Item
        }
    }
}

impl fmt::Display for PriceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceNamespace::Craft => f.write_str("craft"),
            PriceNamespace::Item => f.write_str("item"),
        }
    }
}

/// A manufacturable item or craft definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRule {
    /// Project identifier, also the localization key of its name.
    pub id: ProjectId,
    /// Grouping tag used by the category filter.
    pub category: CategoryTag,
    /// Money spent per unit produced (>= 0).
    #[serde(rename = "cost")]
    pub manufacture_cost: i64,
    /// Engineer hours per unit produced (> 0 for valid content).
    #[serde(rename = "time")]
    pub manufacture_time: i32,
    /// Items consumed per unit produced.
    #[serde(default)]
    pub required_items: BTreeMap<ItemId, u32>,
    /// Items or crafts delivered per unit produced.
    #[serde(default)]
    pub produced_items: BTreeMap<ItemId, u32>,
    /// Research topics that must be discovered before the project is offered.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Base facilities (facility id -> count) the base must have built.
    #[serde(default)]
    pub required_facilities: BTreeMap<String, u32>,
}

impl ProjectRule {
    /// Project with no inputs, no prerequisites and no outputs yet.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        manufacture_cost: i64,
        manufacture_time: i32,
    ) -> Self {
        Self {
            id: ProjectId::new(id),
            category: CategoryTag::new(category),
            manufacture_cost,
            manufacture_time,
            required_items: BTreeMap::new(),
            produced_items: BTreeMap::new(),
            requires: Vec::new(),
            required_facilities: BTreeMap::new(),
        }
    }

    /// Builder helper adding a consumed item.
    pub fn requiring(mut self, item: impl Into<String>, quantity: u32) -> Self {
        self.required_items.insert(ItemId::new(item), quantity);
        self
    }

    /// Builder helper adding a produced item.
    pub fn producing(mut self, item: impl Into<String>, quantity: u32) -> Self {
        self.produced_items.insert(ItemId::new(item), quantity);
        self
    }

    /// True when the project consumes other items.
    pub fn has_required_items(&self) -> bool {
        !self.required_items.is_empty()
    }

    /// Namespace its outputs are priced in.
    pub fn price_namespace(&self, craft_category: &str) -> PriceNamespace {
        PriceNamespace::for_category(&self.category, craft_category)
    }
}

/// Validation errors for rule invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifiers and category tags must not be blank.
    #[error("blank identifier in {0}")]
    BlankId(String),
    /// Manufacture time must be strictly positive.
    #[error("project {project}: manufacture time must be > 0, got {time}")]
    NonPositiveTime { project: String, time: i32 },
    /// Cost or price must be non-negative.
    #[error("{0}: negative monetary value is invalid")]
    NegativeMoney(String),
    /// Item quantities must be strictly positive.
    #[error("project {project}: quantity of {item} must be > 0")]
    ZeroQuantity { project: String, item: String },
    /// The same identifier appears twice in one rule list.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// A produced or required item has no rule.
    #[error("project {project}: unknown {namespace} id {item}")]
    UnknownItem {
        project: String,
        namespace: PriceNamespace,
        item: String,
    },
}

/// Validate a single project, independent of any other rule.
pub fn validate_project(p: &ProjectRule) -> Result<(), ValidationError> {
    if p.id.as_str().trim().is_empty() {
        return Err(ValidationError::BlankId("project".to_string()));
    }
    if p.category.as_str().trim().is_empty() {
        return Err(ValidationError::BlankId(format!("category of {}", p.id)));
    }
    if p.manufacture_time <= 0 {
        return Err(ValidationError::NonPositiveTime {
            project: p.id.0.clone(),
            time: p.manufacture_time,
        });
    }
    if p.manufacture_cost < 0 {
        return Err(ValidationError::NegativeMoney(p.id.0.clone()));
    }
    for (item, &qty) in p.required_items.iter().chain(&p.produced_items) {
        if qty == 0 {
            return Err(ValidationError::ZeroQuantity {
                project: p.id.0.clone(),
                item: item.0.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a project list, including duplicate ids and that every produced or
/// required id resolves in the given namespaces.
///
/// Produced ids of craft-category projects are checked against `crafts`;
/// all other ids are checked against `items`.
pub fn validate_projects(
    projects: &[ProjectRule],
    items: &BTreeSet<&str>,
    crafts: &BTreeSet<&str>,
    craft_category: &str,
) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&ProjectId> = BTreeSet::new();
    for p in projects {
        validate_project(p)?;
        if !ids.insert(&p.id) {
            return Err(ValidationError::DuplicateId(p.id.0.clone()));
        }
        for item in p.required_items.keys() {
            if !items.contains(item.as_str()) {
                return Err(ValidationError::UnknownItem {
                    project: p.id.0.clone(),
                    namespace: PriceNamespace::Item,
                    item: item.0.clone(),
                });
            }
        }
        let namespace = p.price_namespace(craft_category);
        let known = match namespace {
            PriceNamespace::Craft => crafts,
            PriceNamespace::Item => items,
        };
        for item in p.produced_items.keys() {
            if !known.contains(item.as_str()) {
                return Err(ValidationError::UnknownItem {
                    project: p.id.0.clone(),
                    namespace,
                    item: item.0.clone(),
                });
            }
        }
    }
    Ok(())
}
