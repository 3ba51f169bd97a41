//! The most common diseases in one age bucket, with rank changes against another bucket.
use clap::Parser;
use medical_accessibility::{
    config::DEFAULT_CONFIG,
    export::write_json,
    header,
    ranking::{BucketSelection, PieBreakdown, RankChange, StackedBars},
    AgeBucket, ArcStr, Config, Datasets, RankedRow, SortKey,
};
use qu::ick_use::*;
use serde::Serialize;
use std::path::PathBuf;
use term_data_table::{Cell, Row, Table};

#[derive(Debug, Parser)]
struct Opt {
    /// infants, adolescents, young, middle or seniors.
    #[clap(long, short, default_value = "infants")]
    bucket: AgeBucket,
    /// male-first or female-first.
    #[clap(long = "sort", short = 's', default_value = "male-first")]
    key: SortKey,
    /// Rows to keep. Defaults to the configured bar chart size.
    #[clap(long, short = 'k')]
    top: Option<usize>,
    /// Compare ranks against this bucket.
    #[clap(long, short)]
    previous: Option<AgeBucket>,
    #[clap(long, short, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Write the chart data here (JSON).
    #[clap(long, short)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankingDocument<'a> {
    bucket: AgeBucket,
    sort_key: SortKey,
    rows: &'a [RankedRow],
    changes: Vec<(ArcStr, RankChange)>,
    stacked: StackedBars,
    pie: Option<PieBreakdown>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load(&opt.config)?;
    let k = opt.top.unwrap_or(config.top_k.bar_chart);
    ensure!(k > 0, "--top must be at least 1");

    let mut datasets = Datasets::default();
    for bucket in [Some(opt.bucket), opt.previous].into_iter().flatten() {
        datasets.load_disease_table(&config, bucket);
    }

    let mut selection = BucketSelection::new(opt.previous.unwrap_or(opt.bucket), opt.key, k);
    selection.initialize(&datasets);
    if opt.previous.is_some() {
        selection.select(opt.bucket, &datasets);
    }
    let rows = selection.current().to_vec();
    let changes = selection.changes();

    header(&format!("Top {} in {} ({})", k, opt.bucket, opt.key));
    if rows.is_empty() {
        println!("no data for {}", opt.bucket);
    }
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("#"))
            .with_cell(Cell::from("Disease"))
            .with_cell(Cell::from("Male"))
            .with_cell(Cell::from("Female"))
            .with_cell(Cell::from("Total"))
            .with_cell(Cell::from("%"))
            .with_cell(Cell::from("Change")),
    );
    for (row, (_, change)) in rows.iter().zip(changes.iter()) {
        table.add_row(
            Row::new()
                .with_cell(Cell::from((row.rank + 1).to_string()))
                .with_cell(Cell::from(row.name.to_string()))
                .with_cell(Cell::from(row.male_count.to_string()))
                .with_cell(Cell::from(row.female_count.to_string()))
                .with_cell(Cell::from(row.total.to_string()))
                .with_cell(Cell::from(format!("{:.2}", row.percentage)))
                .with_cell(Cell::from(if opt.previous.is_some() {
                    change.to_string()
                } else {
                    String::new()
                })),
        );
    }
    println!("{}", table);

    let pie = rows.first().map(|top| PieBreakdown::new(top));
    if let (Some(top), Some(pie)) = (rows.first(), &pie) {
        println!("{}", top.describe());
        println!("  {}: {}%, other: {}%", pie.name, pie.share, pie.other);
    }

    if let Some(out) = &opt.out {
        let doc = RankingDocument {
            bucket: opt.bucket,
            sort_key: opt.key,
            rows: &rows,
            changes: if opt.previous.is_some() {
                changes
            } else {
                vec![]
            },
            stacked: StackedBars::new(&rows, opt.key),
            pie,
        };
        write_json(out, &doc)?;
        event!(Level::INFO, "wrote \"{}\"", out.display());
    }
    Ok(())
}
