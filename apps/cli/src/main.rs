#![deny(warnings)]

//! Headless manufacture project list: loads a ruleset and optional save,
//! lists the projects one base can start and shows a selected project.

use anyhow::{bail, Context, Result};
use manufacture_catalog::{
    CatalogEntry, CategoryLabel, CategorySet, ListRow, Localizer, ProductionCatalog,
    ProjectSource, ALL_ITEMS,
};
use manufacture_core::ProjectRule;
use manufacture_econ::{profit_score_with, PriceLookup, ScoringConfig};
use ruleset::{Ruleset, SaveGame};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    rules: String,
    save: Option<String>,
    base: Option<String>,
    category: Option<String>,
    select: Option<usize>,
    json: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut rules: Option<String> = None;
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--rules" => rules = it.next(),
            "--save" => out.save = it.next(),
            "--base" => out.base = it.next(),
            "--category" => out.category = it.next(),
            "--select" => {
                let raw = it.next().context("--select needs a row index")?;
                out.select = Some(raw.parse().with_context(|| format!("bad row index {raw}"))?);
            }
            "--json" => out.json = true,
            other => bail!("unknown argument {other}"),
        }
    }
    out.rules = rules.context("usage: manufacture --rules <file> [--save <file>] [--base <name>] [--category <id>] [--select <row>] [--json]")?;
    Ok(out)
}

/// What the detail screen shows for one project.
#[derive(Debug, Serialize)]
struct ProjectDetail {
    id: String,
    name: String,
    category: String,
    cost: i64,
    time: i32,
    required: Vec<(String, u32)>,
    produced: Vec<(String, u32)>,
    score: i64,
}

impl ProjectDetail {
    fn new<P, L>(cfg: &ScoringConfig, rule: &ProjectRule, pricing: &P, strings: &L) -> Result<Self>
    where
        P: PriceLookup + ?Sized,
        L: Localizer + ?Sized,
    {
        Ok(Self {
            id: rule.id.0.clone(),
            name: strings.localize(rule.id.as_str()),
            category: strings.localize(rule.category.as_str()),
            cost: rule.manufacture_cost,
            time: rule.manufacture_time,
            required: rule
                .required_items
                .iter()
                .map(|(id, &n)| (strings.localize(id.as_str()), n))
                .collect(),
            produced: rule
                .produced_items
                .iter()
                .map(|(id, &n)| (strings.localize(id.as_str()), n))
                .collect(),
            score: profit_score_with(cfg, rule, pricing)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    base: Option<&'a str>,
    categories: &'a CategorySet,
    category: &'a CategoryLabel,
    rows: Vec<ListRow>,
    selected: Option<ProjectDetail>,
}

fn print_text<L: Localizer + ?Sized>(report: &Report<'_>, strings: &L) {
    println!(
        "Production Items | base: {}",
        report.base.unwrap_or("(all projects)")
    );
    let labels: Vec<String> = report
        .categories
        .iter()
        .map(|l| {
            let mark = if l == report.category { "*" } else { "" };
            format!("{mark}{}", strings.localize(l.id()))
        })
        .collect();
    println!("Categories: {}", labels.join(" | "));
    println!("{:>3}  {:<28} {:<20} {:>12}", "#", "ITEM", "CATEGORY", "SCORE");
    for (i, row) in report.rows.iter().enumerate() {
        println!(
            "{:>3}  {:<28} {:<20} {:>12}",
            i, row.name, row.category, row.score
        );
    }
    if let Some(d) = &report.selected {
        println!();
        println!("{} ({})", d.name, d.category);
        println!("  cost: ${} | time: {} engineer hours", d.cost, d.time);
        for (name, n) in &d.required {
            println!("  requires: {n} x {name}");
        }
        for (name, n) in &d.produced {
            println!("  produces: {n} x {name}");
        }
        println!("  profit score: {}", d.score);
    }
}

fn main() -> Result<()> {
    // Logging setup; stdout carries the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(?args, "starting manufacture list");

    let rules = Ruleset::load(&args.rules)?;
    let save = args.save.as_deref().map(SaveGame::load).transpose()?;

    let base = save
        .as_ref()
        .map(|s| s.base(args.base.as_deref()))
        .transpose()?;
    let base_projects = match (&save, base) {
        (Some(save), Some(base)) => Some(rules.available_for(save, base)),
        _ => None,
    };
    let source: &dyn ProjectSource = match &base_projects {
        Some(projects) => projects,
        None => &rules,
    };

    let mut catalog = ProductionCatalog::with_config(rules.scoring().clone(), source, &rules)?;
    let label = CategoryLabel::from_id(args.category.as_deref().unwrap_or(ALL_ITEMS));
    let entries: Vec<CatalogEntry<'_>> = catalog.refresh(source, &rules, &label)?;
    let rows = entries
        .iter()
        .map(|e| ListRow::localized(e, rules.strings()))
        .collect();

    let selected = match args.select {
        Some(index) => match catalog.resolve_selection(source, index) {
            Ok(rule) => Some(ProjectDetail::new(
                catalog.config(),
                rule,
                &rules,
                rules.strings(),
            )?),
            Err(e) => {
                warn!(error = %e, "selection ignored");
                None
            }
        },
        None => None,
    };

    let report = Report {
        base: base.map(|b| b.name.as_str()),
        categories: catalog.categories(),
        category: catalog.selected_category(),
        rows,
        selected,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report, rules.strings());
    }
    Ok(())
}
