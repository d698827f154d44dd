#![deny(warnings)]

//! Economic helpers for base manufacturing: sell-price lookup and the
//! profit-per-capacity heuristic used to rank projects.
//!
//! The heuristic is a cheap ranking aid for the project list, not a balancing
//! tool. It only looks at projects that consume nothing, because the value of
//! consumed items is not captured by the manufacture cost.

use manufacture_core::{PriceNamespace, ProjectRule, CRAFT_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Engineer hours standing in for one unit of shared production capacity.
pub const DEFAULT_MAN_HOURS: u32 = 10_000;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// A produced id has no sell price; the content is malformed.
    #[error("project {project}: no {namespace} sell price for {id}")]
    MissingPrice {
        project: String,
        namespace: PriceNamespace,
        id: String,
    },
    /// Produced value or score does not fit in 64 bits.
    #[error("project {0}: value overflows")]
    Overflow(String),
}

/// Source of sell prices, split by namespace.
pub trait PriceLookup {
    /// Sell price of `id`, or `None` when the namespace has no such id.
    fn sell_price(&self, namespace: PriceNamespace, id: &str) -> Option<i64>;
}

impl<T: PriceLookup + ?Sized> PriceLookup for &T {
    fn sell_price(&self, namespace: PriceNamespace, id: &str) -> Option<i64> {
        (**self).sell_price(namespace, id)
    }
}

/// In-memory sell prices for crafts and items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(default)]
    pub crafts: BTreeMap<String, i64>,
    #[serde(default)]
    pub items: BTreeMap<String, i64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder helper setting an item price.
    pub fn with_item(mut self, id: impl Into<String>, price: i64) -> Self {
        self.items.insert(id.into(), price);
        self
    }

    /// Builder helper setting a craft price.
    pub fn with_craft(mut self, id: impl Into<String>, price: i64) -> Self {
        self.crafts.insert(id.into(), price);
        self
    }

    pub fn set(&mut self, namespace: PriceNamespace, id: impl Into<String>, price: i64) {
        match namespace {
            PriceNamespace::Craft => self.crafts.insert(id.into(), price),
            PriceNamespace::Item => self.items.insert(id.into(), price),
        };
    }
}

impl PriceLookup for PriceTable {
    fn sell_price(&self, namespace: PriceNamespace, id: &str) -> Option<i64> {
        match namespace {
            PriceNamespace::Craft => self.crafts.get(id).copied(),
            PriceNamespace::Item => self.items.get(id).copied(),
        }
    }
}

/// Scoring parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Notional engineer hours in one unit of production capacity.
    pub man_hours: u32,
    /// Category whose outputs are priced as crafts.
    pub craft_category: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            man_hours: DEFAULT_MAN_HOURS,
            craft_category: CRAFT_CATEGORY.to_string(),
        }
    }
}

/// Sum of sell price times quantity over everything `rule` produces.
///
/// Example:
/// let rule = ProjectRule::new("A", "STR_AMMO", 10, 10).producing("A", 3);
/// let prices = PriceTable::new().with_item("A", 50);
/// assert_eq!(produced_value(&ScoringConfig::default(), &rule, &prices).unwrap(), 150);
pub fn produced_value<P: PriceLookup + ?Sized>(
    cfg: &ScoringConfig,
    rule: &ProjectRule,
    pricing: &P,
) -> Result<i64, EconError> {
    let namespace = rule.price_namespace(&cfg.craft_category);
    let mut total: i64 = 0;
    for (id, &qty) in &rule.produced_items {
        let price = pricing
            .sell_price(namespace, id.as_str())
            .ok_or_else(|| EconError::MissingPrice {
                project: rule.id.0.clone(),
                namespace,
                id: id.0.clone(),
            })?;
        total = price
            .checked_mul(i64::from(qty))
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| EconError::Overflow(rule.id.0.clone()))?;
    }
    Ok(total)
}

/// Profit per unit of production capacity with the default configuration.
pub fn profit_score<P: PriceLookup + ?Sized>(
    rule: &ProjectRule,
    pricing: &P,
) -> Result<i64, EconError> {
    profit_score_with(&ScoringConfig::default(), rule, pricing)
}

/// Profit per unit of production capacity.
///
/// `(produced_value - cost) * (man_hours / time)` in integer arithmetic; the
/// throughput factor truncates toward zero before the multiplication, so a
/// time above `man_hours` scores 0. Projects that consume items score 0, as
/// do projects with a non-positive manufacture time.
///
/// Example:
/// let rule = ProjectRule::new("R", "STR_WEAPONS", 100, 100).producing("R", 1);
/// let prices = PriceTable::new().with_item("R", 500);
/// assert_eq!(profit_score(&rule, &prices).unwrap(), 40_000);
pub fn profit_score_with<P: PriceLookup + ?Sized>(
    cfg: &ScoringConfig,
    rule: &ProjectRule,
    pricing: &P,
) -> Result<i64, EconError> {
    if rule.has_required_items() {
        return Ok(0);
    }
    if rule.manufacture_time <= 0 {
        warn!(
            project = %rule.id,
            time = rule.manufacture_time,
            "non-positive manufacture time, scoring as 0"
        );
        return Ok(0);
    }
    let value = produced_value(cfg, rule, pricing)?;
    let per_quantum = i64::from(cfg.man_hours) / i64::from(rule.manufacture_time);
    value
        .checked_sub(rule.manufacture_cost)
        .and_then(|margin| margin.checked_mul(per_quantum))
        .ok_or_else(|| EconError::Overflow(rule.id.0.clone()))
}
