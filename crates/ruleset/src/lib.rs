#![deny(warnings)]

//! YAML rulesets and save state feeding the production catalog.
//!
//! A ruleset lists sellable items and crafts, manufacture projects and a
//! string table. A save lists discovered research and the facilities of each
//! base. Together they answer which projects a base may start.

use manufacture_catalog::{Localizer, ProjectSource};
use manufacture_core::{validate_projects, PriceNamespace, ProjectRule, ValidationError};
use manufacture_econ::{PriceLookup, PriceTable, ScoringConfig};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("io error: {0}")]
    Io(String),
    #[error("yaml error: {0}")]
    Yaml(String),
    #[error("invalid ruleset: {0}")]
    Invalid(#[from] ValidationError),
    #[error("unknown base: {0}")]
    UnknownBase(String),
    #[error("save has no bases")]
    NoBases,
}

impl From<std::io::Error> for RulesetError {
    fn from(e: std::io::Error) -> Self {
        RulesetError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for RulesetError {
    fn from(e: serde_yaml::Error) -> Self {
        RulesetError::Yaml(e.to_string())
    }
}

/// A sellable item or craft.
#[derive(Debug, Clone, Deserialize)]
pub struct SellableRule {
    pub id: String,
    #[serde(default)]
    pub sell_cost: i64,
}

#[derive(Debug, Deserialize)]
struct RulesetFile {
    #[serde(default)]
    scoring: Option<ScoringConfig>,
    #[serde(default)]
    items: Vec<SellableRule>,
    #[serde(default)]
    crafts: Vec<SellableRule>,
    #[serde(default)]
    manufacture: Vec<ProjectRule>,
    #[serde(default)]
    strings: BTreeMap<String, String>,
}

/// Display strings keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable(BTreeMap<String, String>);

impl StringTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }
}

impl Localizer for StringTable {
    /// Falls back to the id itself when no translation exists.
    fn localize(&self, id: &str) -> String {
        self.get(id).unwrap_or(id).to_string()
    }
}

/// Validated rule content.
#[derive(Debug, Clone)]
pub struct Ruleset {
    scoring: ScoringConfig,
    projects: Vec<ProjectRule>,
    prices: PriceTable,
    strings: StringTable,
}

impl Ruleset {
    /// Read and validate a ruleset file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RulesetError> {
        let text = fs::read_to_string(path.as_ref())?;
        let ruleset = Self::from_yaml_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            projects = ruleset.projects.len(),
            "loaded ruleset"
        );
        Ok(ruleset)
    }

    /// Parse and validate ruleset YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, RulesetError> {
        let file: RulesetFile = serde_yaml::from_str(text)?;
        let scoring = file.scoring.unwrap_or_default();

        let items = sellable_ids(&file.items)?;
        let crafts = sellable_ids(&file.crafts)?;
        validate_projects(&file.manufacture, &items, &crafts, &scoring.craft_category)?;

        let mut prices = PriceTable::new();
        for r in &file.items {
            prices.set(PriceNamespace::Item, r.id.clone(), r.sell_cost);
        }
        for r in &file.crafts {
            prices.set(PriceNamespace::Craft, r.id.clone(), r.sell_cost);
        }
        Ok(Self {
            scoring,
            projects: file.manufacture,
            prices,
            strings: StringTable::new(file.strings),
        })
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// All projects in ruleset order.
    pub fn projects(&self) -> &[ProjectRule] {
        &self.projects
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Projects `base` may start given the research discovered in `save`.
    pub fn available_for<'a>(&'a self, save: &'a SaveGame, base: &'a BaseState) -> BaseProjects<'a> {
        BaseProjects {
            ruleset: self,
            research: &save.research,
            base,
        }
    }
}

fn sellable_ids(rules: &[SellableRule]) -> Result<BTreeSet<&str>, ValidationError> {
    let mut ids = BTreeSet::new();
    for r in rules {
        if r.id.trim().is_empty() {
            return Err(ValidationError::BlankId("sellable".to_string()));
        }
        if r.sell_cost < 0 {
            return Err(ValidationError::NegativeMoney(r.id.clone()));
        }
        if !ids.insert(r.id.as_str()) {
            return Err(ValidationError::DuplicateId(r.id.clone()));
        }
    }
    Ok(ids)
}

impl PriceLookup for Ruleset {
    fn sell_price(&self, namespace: PriceNamespace, id: &str) -> Option<i64> {
        self.prices.sell_price(namespace, id)
    }
}

/// Every project of the ruleset, regardless of research or facilities.
impl ProjectSource for Ruleset {
    fn available_projects(&self) -> Vec<&ProjectRule> {
        self.projects.iter().collect()
    }
}

/// One player base.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BaseState {
    pub name: String,
    /// Built facility ids, one entry per facility.
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl BaseState {
    pub fn facility_count(&self, id: &str) -> u32 {
        let n = self.facilities.iter().filter(|f| f.as_str() == id).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

/// Save-game state relevant to manufacturing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveGame {
    #[serde(default)]
    pub research: BTreeSet<String>,
    #[serde(default)]
    pub bases: Vec<BaseState>,
}

impl SaveGame {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RulesetError> {
        let text = fs::read_to_string(path.as_ref())?;
        let save: SaveGame = serde_yaml::from_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            bases = save.bases.len(),
            research = save.research.len(),
            "loaded save"
        );
        Ok(save)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, RulesetError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Base by name, or the first base when `name` is `None`.
    pub fn base(&self, name: Option<&str>) -> Result<&BaseState, RulesetError> {
        match name {
            Some(name) => self
                .bases
                .iter()
                .find(|b| b.name == name)
                .ok_or_else(|| RulesetError::UnknownBase(name.to_string())),
            None => self.bases.first().ok_or(RulesetError::NoBases),
        }
    }
}

/// Projects one base may start right now, in ruleset order.
#[derive(Debug, Clone, Copy)]
pub struct BaseProjects<'a> {
    ruleset: &'a Ruleset,
    research: &'a BTreeSet<String>,
    base: &'a BaseState,
}

impl BaseProjects<'_> {
    fn is_available(&self, p: &ProjectRule) -> bool {
        p.requires.iter().all(|r| self.research.contains(r))
            && p
                .required_facilities
                .iter()
                .all(|(id, &n)| self.base.facility_count(id) >= n)
    }
}

impl ProjectSource for BaseProjects<'_> {
    fn available_projects(&self) -> Vec<&ProjectRule> {
        self.ruleset
            .projects
            .iter()
            .filter(|p| self.is_available(p))
            .collect()
    }
}
