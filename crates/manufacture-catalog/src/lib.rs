#![deny(warnings)]

//! Production catalog for the base manufacturing screen.
//!
//! [`ProductionCatalog`] keeps the category drop-down and the identifiers of
//! the rows last shown. Everything else is borrowed per call: the available
//! projects come from a [`ProjectSource`] bound to one base, sell prices from
//! a [`PriceLookup`]. Rule data may be reloaded between calls, so entries
//! borrow from the source only for as long as the caller holds them.

pub mod category;

pub use category::{CategoryLabel, CategorySet, ALL_ITEMS, PROFITABLE_ITEMS};

use manufacture_core::{ProjectId, ProjectRule};
use manufacture_econ::{profit_score_with, EconError, PriceLookup, ScoringConfig};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Projects a base can currently start, in a stable enumeration order.
pub trait ProjectSource {
    fn available_projects(&self) -> Vec<&ProjectRule>;
}

impl ProjectSource for [ProjectRule] {
    fn available_projects(&self) -> Vec<&ProjectRule> {
        self.iter().collect()
    }
}

impl ProjectSource for Vec<ProjectRule> {
    fn available_projects(&self) -> Vec<&ProjectRule> {
        self.iter().collect()
    }
}

impl<T: ProjectSource + ?Sized> ProjectSource for &T {
    fn available_projects(&self) -> Vec<&ProjectRule> {
        (**self).available_projects()
    }
}

/// Translates label and project ids into display text.
pub trait Localizer {
    fn localize(&self, id: &str) -> String;
}

/// Errors that abort building or refreshing the catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Rule content is inconsistent, e.g. a produced item has no price.
    #[error("data integrity: {0}")]
    DataIntegrity(#[from] EconError),
    /// The requested label is not in the category set.
    #[error("category {0} is not offered")]
    UnknownCategory(String),
}

/// A row index that no longer maps to a project. The caller ignores the click.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("row {index} is out of range, {shown} rows shown")]
    NotFound { index: usize, shown: usize },
    #[error("row {index}: project {project} is no longer available")]
    Withdrawn { index: usize, project: ProjectId },
}

/// One scored row of the list.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CatalogEntry<'a> {
    pub score: i64,
    pub rule: &'a ProjectRule,
}

/// A row as the list widget shows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub name: String,
    pub category: String,
    pub score: i64,
}

impl ListRow {
    pub fn localized<L: Localizer + ?Sized>(entry: &CatalogEntry<'_>, localizer: &L) -> Self {
        Self {
            name: localizer.localize(entry.rule.id.as_str()),
            category: localizer.localize(entry.rule.category.as_str()),
            score: entry.score,
        }
    }
}

/// Filterable, profit-ranked view over the projects of one base.
#[derive(Clone, Debug)]
pub struct ProductionCatalog {
    config: ScoringConfig,
    categories: CategorySet,
    selected: usize,
    displayed: Vec<ProjectId>,
}

impl ProductionCatalog {
    /// Build the category set with the default scoring configuration.
    pub fn new<S, P>(source: &S, pricing: &P) -> Result<Self, CatalogError>
    where
        S: ProjectSource + ?Sized,
        P: PriceLookup + ?Sized,
    {
        Self::with_config(ScoringConfig::default(), source, pricing)
    }

    /// Build the category set.
    ///
    /// Every available project is scored; "Profitable" is offered when any
    /// score is positive. The set is fixed from here on, even if later
    /// refreshes see different projects or prices.
    pub fn with_config<S, P>(
        config: ScoringConfig,
        source: &S,
        pricing: &P,
    ) -> Result<Self, CatalogError>
    where
        S: ProjectSource + ?Sized,
        P: PriceLookup + ?Sized,
    {
        let projects = source.available_projects();
        let mut has_profitable = false;
        for p in &projects {
            if profit_score_with(&config, p, pricing)? > 0 {
                has_profitable = true;
            }
        }
        let categories = CategorySet::build(projects.iter().copied(), has_profitable);
        debug!(
            projects = projects.len(),
            categories = categories.len(),
            has_profitable,
            "built production catalog"
        );
        Ok(Self {
            config,
            categories,
            selected: 0,
            displayed: Vec::new(),
        })
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Label of the current selection; "All" until a refresh picks another.
    pub fn selected_category(&self) -> &CategoryLabel {
        // only ever set from a position inside the set
        &self.categories.as_slice()[self.selected]
    }

    /// Project ids of the rows last shown, in display order.
    pub fn displayed(&self) -> &[ProjectId] {
        &self.displayed
    }

    /// Label at a drop-down position.
    pub fn category_at(&self, index: usize) -> Result<&CategoryLabel, CatalogError> {
        self.categories
            .get(index)
            .ok_or_else(|| CatalogError::UnknownCategory(format!("#{index}")))
    }

    /// Rebuild the rows for `label` from the current projects and prices.
    ///
    /// "Profitable" keeps projects scoring above zero, best first, ties in
    /// source order. Other labels keep source order. On error the previous
    /// rows and selection stay in place.
    pub fn refresh<'s, S, P>(
        &mut self,
        source: &'s S,
        pricing: &P,
        label: &CategoryLabel,
    ) -> Result<Vec<CatalogEntry<'s>>, CatalogError>
    where
        S: ProjectSource + ?Sized,
        P: PriceLookup + ?Sized,
    {
        let selected = self
            .categories
            .position(label)
            .ok_or_else(|| CatalogError::UnknownCategory(label.id().to_string()))?;

        let profitable_only = *label == CategoryLabel::Profitable;
        let mut entries = Vec::new();
        for rule in source.available_projects() {
            let score = profit_score_with(&self.config, rule, pricing)?;
            if profitable_only && score <= 0 {
                continue;
            }
            if label.admits(&rule.category) {
                entries.push(CatalogEntry { score, rule });
            }
        }
        if profitable_only {
            // stable: equal scores keep source order
            entries.sort_by(|a, b| b.score.cmp(&a.score));
        }

        self.selected = selected;
        self.displayed = entries.iter().map(|e| e.rule.id.clone()).collect();
        debug!(category = %label, rows = entries.len(), "refreshed project list");
        Ok(entries)
    }

    /// Refresh with the currently selected label.
    pub fn refresh_selected<'s, S, P>(
        &mut self,
        source: &'s S,
        pricing: &P,
    ) -> Result<Vec<CatalogEntry<'s>>, CatalogError>
    where
        S: ProjectSource + ?Sized,
        P: PriceLookup + ?Sized,
    {
        let label = self.selected_category().clone();
        self.refresh(source, pricing, &label)
    }

    /// Project behind a row of the last refresh.
    ///
    /// The id is looked up again in `source`, so a project withdrawn since
    /// the refresh is reported instead of returned.
    pub fn resolve_selection<'s, S>(
        &self,
        source: &'s S,
        index: usize,
    ) -> Result<&'s ProjectRule, SelectionError>
    where
        S: ProjectSource + ?Sized,
    {
        let result = match self.displayed.get(index) {
            None => Err(SelectionError::NotFound {
                index,
                shown: self.displayed.len(),
            }),
            Some(id) => source
                .available_projects()
                .into_iter()
                .find(|p| &p.id == id)
                .ok_or_else(|| SelectionError::Withdrawn {
                    index,
                    project: id.clone(),
                }),
        };
        if let Err(e) = &result {
            debug!(error = %e, "ignoring stale selection");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manufacture_core::PriceNamespace;
    use manufacture_econ::PriceTable;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn scenario() -> (Vec<ProjectRule>, PriceTable) {
        let projects = vec![
            ProjectRule::new("Laser Rifle", "STR_PERSONAL_ARMOR", 100, 100)
                .producing("Laser Rifle", 1),
            ProjectRule::new("Ammo", "STR_AMMO", 10, 10)
                .requiring("Elerium", 1)
                .producing("Ammo", 1),
        ];
        let prices = PriceTable::new()
            .with_item("Laser Rifle", 500)
            .with_item("Ammo", 1_000)
            .with_item("Elerium", 5);
        (projects, prices)
    }

    fn ids(entries: &[CatalogEntry<'_>]) -> Vec<String> {
        entries.iter().map(|e| e.rule.id.0.clone()).collect()
    }

    fn tag(t: &str) -> CategoryLabel {
        CategoryLabel::from_id(t)
    }

    #[test]
    fn scenario_categories_and_profitable_list() {
        let (projects, prices) = scenario();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        let labels: Vec<&str> = catalog.categories().iter().map(CategoryLabel::id).collect();
        assert_eq!(
            labels,
            [ALL_ITEMS, "STR_PERSONAL_ARMOR", "STR_AMMO", PROFITABLE_ITEMS]
        );

        let all = catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();
        let scores: Vec<i64> = all.iter().map(|e| e.score).collect();
        assert_eq!(scores, [40_000, 0]);

        let profitable = catalog
            .refresh(&projects, &prices, &CategoryLabel::Profitable)
            .unwrap();
        assert_eq!(ids(&profitable), ["Laser Rifle"]);
        assert_eq!(catalog.selected_category(), &CategoryLabel::Profitable);
    }

    #[test]
    fn empty_catalog_offers_only_all() {
        let projects: Vec<ProjectRule> = Vec::new();
        let prices = PriceTable::new();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        assert_eq!(catalog.categories().as_slice(), &[CategoryLabel::All]);
        assert!(catalog.refresh_selected(&projects, &prices).unwrap().is_empty());
        assert_eq!(
            catalog.refresh(&projects, &prices, &CategoryLabel::Profitable),
            Err(CatalogError::UnknownCategory(PROFITABLE_ITEMS.to_string()))
        );
    }

    #[test]
    fn category_filter_keeps_source_order() {
        let projects = vec![
            ProjectRule::new("a", "STR_AMMO", 0, 10).producing("a", 1),
            ProjectRule::new("b", "STR_WEAPONS", 0, 10).producing("b", 1),
            ProjectRule::new("c", "STR_AMMO", 0, 10).producing("c", 1),
        ];
        let prices = PriceTable::new()
            .with_item("a", 1)
            .with_item("b", 100)
            .with_item("c", 50);
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();

        let ammo = catalog.refresh(&projects, &prices, &tag("STR_AMMO")).unwrap();
        assert_eq!(ids(&ammo), ["a", "c"]);
        let all = catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();
        assert_eq!(ids(&all), ["a", "b", "c"]);
        let best = catalog
            .refresh(&projects, &prices, &CategoryLabel::Profitable)
            .unwrap();
        assert_eq!(ids(&best), ["b", "c", "a"]);
    }

    #[test]
    fn profitable_ties_keep_source_order() {
        let projects = vec![
            ProjectRule::new("x", "STR_AMMO", 0, 100).producing("p", 1),
            ProjectRule::new("y", "STR_AMMO", 0, 100).producing("q", 2),
            ProjectRule::new("z", "STR_WEAPONS", 0, 100).producing("p", 1),
        ];
        let prices = PriceTable::new().with_item("p", 10).with_item("q", 5);
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        let first = catalog
            .refresh(&projects, &prices, &CategoryLabel::Profitable)
            .unwrap();
        assert_eq!(ids(&first), ["x", "y", "z"]);
        let again = catalog
            .refresh(&projects, &prices, &CategoryLabel::Profitable)
            .unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn profitable_label_is_frozen_at_construction() {
        let (projects, mut prices) = scenario();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        prices.set(PriceNamespace::Item, "Laser Rifle", 0);
        assert!(catalog.categories().has_profitable());
        let rows = catalog
            .refresh(&projects, &prices, &CategoryLabel::Profitable)
            .unwrap();
        assert!(rows.is_empty());

        let catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        assert!(!catalog.categories().has_profitable());
    }

    #[test]
    fn profitable_label_stays_absent_when_prices_rise() {
        let (projects, mut prices) = scenario();
        prices.set(PriceNamespace::Item, "Laser Rifle", 100);
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        assert!(!catalog.categories().has_profitable());

        prices.set(PriceNamespace::Item, "Laser Rifle", 500);
        let all = catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();
        assert_eq!(all[0].score, 40_000);
        assert!(!catalog.categories().has_profitable());
        assert_eq!(
            catalog.refresh(&projects, &prices, &CategoryLabel::Profitable),
            Err(CatalogError::UnknownCategory(PROFITABLE_ITEMS.to_string()))
        );
        assert_eq!(catalog.selected_category(), &CategoryLabel::All);
    }

    #[test]
    fn missing_price_aborts_refresh_and_keeps_rows() {
        let (projects, prices) = scenario();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();

        let mut grown = projects.clone();
        grown.push(ProjectRule::new("Mystery", "STR_AMMO", 1, 1).producing("Unobtainium", 1));
        let err = catalog
            .refresh(&grown, &prices, &tag("STR_AMMO"))
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DataIntegrity(EconError::MissingPrice { .. })
        ));
        assert_eq!(catalog.displayed().len(), 2);
        assert_eq!(catalog.selected_category(), &CategoryLabel::All);

        assert!(ProductionCatalog::new(&grown, &prices).is_err());
    }

    #[test]
    fn resolve_selection_handles_stale_rows() {
        let (projects, prices) = scenario();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        assert_eq!(
            catalog.resolve_selection(&projects, 0),
            Err(SelectionError::NotFound { index: 0, shown: 0 })
        );

        catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();
        let rule = catalog.resolve_selection(&projects, 1).unwrap();
        assert_eq!(rule.id.as_str(), "Ammo");
        assert!(matches!(
            catalog.resolve_selection(&projects, 2),
            Err(SelectionError::NotFound { index: 2, shown: 2 })
        ));

        let shrunk = vec![projects[1].clone()];
        assert_eq!(
            catalog.resolve_selection(&shrunk, 0),
            Err(SelectionError::Withdrawn {
                index: 0,
                project: ProjectId::new("Laser Rifle"),
            })
        );
    }

    #[test]
    fn unknown_category_index_is_rejected() {
        let (projects, prices) = scenario();
        let catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        assert_eq!(catalog.category_at(1).unwrap().id(), "STR_PERSONAL_ARMOR");
        assert!(catalog.category_at(9).is_err());
    }

    struct Lower;

    impl Localizer for Lower {
        fn localize(&self, id: &str) -> String {
            id.to_lowercase()
        }
    }

    #[test]
    fn rows_are_localized() {
        let (projects, prices) = scenario();
        let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();
        let entries = catalog.refresh_selected(&projects, &prices).unwrap();
        let row = ListRow::localized(&entries[0], &Lower);
        assert_eq!(row.name, "laser rifle");
        assert_eq!(row.category, "str_personal_armor");
        assert_eq!(row.score, 40_000);
    }

    fn arb_projects() -> impl Strategy<Value = Vec<(u8, i64, i64, i32, bool)>> {
        prop::collection::vec(
            (0u8..4, 0i64..1_000, 0i64..1_000, 1i32..500, any::<bool>()),
            0..24,
        )
    }

    fn build(shape: &[(u8, i64, i64, i32, bool)]) -> (Vec<ProjectRule>, PriceTable) {
        let mut prices = PriceTable::new().with_item("input", 1);
        let projects = shape
            .iter()
            .enumerate()
            .map(|(i, &(cat, price, cost, time, consumes))| {
                let id = format!("p{i}");
                prices.set(PriceNamespace::Item, id.clone(), price);
                let rule = ProjectRule::new(id.clone(), format!("CAT_{cat}"), cost, time)
                    .producing(id, 1);
                if consumes {
                    rule.requiring("input", 1)
                } else {
                    rule
                }
            })
            .collect();
        (projects, prices)
    }

    proptest! {
        #[test]
        fn category_set_invariants(shape in arb_projects()) {
            let (projects, prices) = build(&shape);
            let catalog = ProductionCatalog::new(&projects, &prices).unwrap();
            let labels = catalog.categories().as_slice();
            prop_assert_eq!(&labels[0], &CategoryLabel::All);

            let mut first_seen: Vec<CategoryLabel> = Vec::new();
            for p in &projects {
                let label = CategoryLabel::Tag(p.category.clone());
                if !first_seen.contains(&label) {
                    first_seen.push(label);
                }
            }
            let tags: Vec<CategoryLabel> = labels
                .iter()
                .filter(|l| matches!(l, CategoryLabel::Tag(_)))
                .cloned()
                .collect();
            prop_assert_eq!(tags, first_seen);

            let any_positive = projects
                .iter()
                .any(|p| manufacture_econ::profit_score(p, &prices).unwrap() > 0);
            prop_assert_eq!(catalog.categories().has_profitable(), any_positive);
        }

        #[test]
        fn refresh_orders_are_stable(shape in arb_projects()) {
            let (projects, prices) = build(&shape);
            let position: BTreeMap<&str, usize> = projects
                .iter()
                .enumerate()
                .map(|(i, p)| (p.id.as_str(), i))
                .collect();
            let mut catalog = ProductionCatalog::new(&projects, &prices).unwrap();

            let all = catalog.refresh(&projects, &prices, &CategoryLabel::All).unwrap();
            let source: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
            let shown: Vec<&str> = all.iter().map(|e| e.rule.id.as_str()).collect();
            prop_assert_eq!(shown, source);

            if catalog.categories().has_profitable() {
                let best = catalog
                    .refresh(&projects, &prices, &CategoryLabel::Profitable)
                    .unwrap();
                prop_assert!(!best.is_empty());
                for pair in best.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                    if pair[0].score == pair[1].score {
                        prop_assert!(
                            position[pair[0].rule.id.as_str()] < position[pair[1].rule.id.as_str()]
                        );
                    }
                }
                prop_assert!(best.iter().all(|e| e.score > 0));
                let again = catalog
                    .refresh(&projects, &prices, &CategoryLabel::Profitable)
                    .unwrap();
                prop_assert_eq!(best, again);
            }
        }
    }
}
