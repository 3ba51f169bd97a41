//! Hospital accessibility of selected regions, for an age bracket and a set of diseases.
use clap::Parser;
use itertools::Itertools;
use medical_accessibility::{
    access::{canonical_region, Choropleth, Period, ScoreRequest, Scorer, ScoringMethod},
    config::DEFAULT_CONFIG,
    export::write_json,
    header, AgeBracket, ArcStr, Config, Datasets,
};
use qu::ick_use::*;
use serde::Serialize;
use std::{collections::BTreeSet, path::PathBuf};
use term_data_table::{Cell, Row, Table};

#[derive(Debug, Parser)]
struct Opt {
    /// Regions to compare (short or full names). All regions if none are given.
    #[clap(long = "region", short)]
    regions: Vec<String>,
    /// Age bracket, e.g. `0~9세` or `20-29`.
    #[clap(long, short, default_value = "0~9세")]
    age: AgeBracket,
    /// Diseases whose specialties count for the weighted method.
    #[clap(long = "disease", short)]
    diseases: Vec<String>,
    /// unweighted or specialty-weighted. Both if not given.
    #[clap(long, short)]
    method: Option<ScoringMethod>,
    /// Reporting period, e.g. `2023.06`. Defaults to the earliest configured one.
    #[clap(long, short)]
    period: Option<Period>,
    /// List the diseases matching this term and exit.
    #[clap(long)]
    search: Option<String>,
    #[clap(long, short, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Write the choropleth data here (JSON).
    #[clap(long, short)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessibilityDocument {
    period: Option<Period>,
    age_bracket: AgeBracket,
    diseases: Vec<String>,
    specialties: BTreeSet<ArcStr>,
    maps: Vec<MethodMap>,
}

#[derive(Serialize)]
struct MethodMap {
    method: ScoringMethod,
    choropleth: Choropleth,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load(&opt.config)?;
    let datasets = Datasets::load_all(&config);

    if let Some(term) = &opt.search {
        let Some(specialties) = datasets.specialties() else {
            bail!("the disease specialty table isn't available");
        };
        header(&format!("Diseases matching \"{}\"", term));
        for disease in specialties.search(term) {
            println!("{}", disease);
        }
        return Ok(());
    }

    let period = opt
        .period
        .or_else(|| config.default_period())
        .or_else(|| datasets.periods().next());
    let specialties = match datasets.specialties() {
        Some(table) => table.specialties_for(&opt.diseases),
        None => {
            if !opt.diseases.is_empty() {
                event!(
                    Level::WARN,
                    "no disease specialty table loaded; no hospitals will match"
                );
            }
            BTreeSet::new()
        }
    };
    let selected: BTreeSet<ArcStr> = if opt.regions.is_empty() {
        datasets.region_names().into_iter().collect()
    } else {
        opt.regions
            .iter()
            .map(|r| ArcStr::from(canonical_region(r)))
            .collect()
    };
    let methods = match opt.method {
        Some(method) => vec![method],
        None => ScoringMethod::ALL.to_vec(),
    };

    let scorer = match period {
        Some(period) => datasets.scorer(period, config.scale),
        None => {
            event!(Level::WARN, "no hospital listing period available");
            Scorer::new(None, datasets.population(), config.scale)
        }
    };

    header(&format!(
        "Accessibility per {} residents, {}, {}",
        config.scale,
        opt.age,
        period.map(|p| p.to_string()).unwrap_or_else(|| "no period".into())
    ));
    if !specialties.is_empty() {
        println!("specialties: {}", specialties.iter().join(", "));
    }

    let mut maps = vec![];
    for method in methods {
        let request = ScoreRequest {
            method,
            bracket: opt.age,
            specialties: specialties.clone(),
        };
        let scores = scorer.scores(&selected, &request);
        let choropleth = Choropleth::new(datasets.region_names(), &scores, &selected);

        let mut table = Table::new().with_row(
            Row::new()
                .with_cell(Cell::from("Region"))
                .with_cell(Cell::from(format!("Score ({})", method)))
                .with_cell(Cell::from("Band"))
                .with_cell(Cell::from("Colour")),
        );
        for cell in choropleth.cells.iter().filter(|c| c.selected) {
            table.add_row(
                Row::new()
                    .with_cell(Cell::from(cell.region.to_string()))
                    .with_cell(Cell::from(format!("{:.2}", cell.score.unwrap_or(0.))))
                    .with_cell(Cell::from(
                        cell.band.map(|b| b.to_string()).unwrap_or_default(),
                    ))
                    .with_cell(Cell::from(cell.color.to_string())),
            );
        }
        println!("{}", table);
        maps.push(MethodMap { method, choropleth });
    }

    if let Some(out) = &opt.out {
        let doc = AccessibilityDocument {
            period,
            age_bracket: opt.age,
            diseases: opt.diseases.clone(),
            specialties,
            maps,
        };
        write_json(out, &doc)?;
        event!(Level::INFO, "wrote \"{}\"", out.display());
    }
    Ok(())
}
