//! Sankey data linking age buckets to their most common diseases.
use clap::Parser;
use itertools::Itertools;
use medical_accessibility::{
    config::DEFAULT_CONFIG,
    export::write_json,
    flow::{FlowDocument, FlowGraph, FlowVariant, Hover, LinkGroups, HIGHLIGHTED},
    header, AgeBucket, Config, Datasets, Palette, SortKey,
};
use qu::ick_use::*;
use std::path::PathBuf;
use term_data_table::{Cell, Row, Table};

#[derive(Debug, Parser)]
struct Opt {
    /// bucket-to-disease (weighted by rank) or bucket-scoped (weighted by count).
    #[clap(long, short, default_value = "bucket-to-disease")]
    variant: FlowVariant,
    /// male-first or female-first.
    #[clap(long = "sort", short = 's', default_value = "male-first")]
    key: SortKey,
    /// Diseases per bucket. Defaults to the configured Sankey size.
    #[clap(long, short = 'k')]
    top: Option<usize>,
    /// Add the 10-year bracket links in front of the buckets.
    #[clap(long)]
    bracket_shares: bool,
    /// category10 or warm. Defaults to the configured palette.
    #[clap(long)]
    palette: Option<Palette>,
    /// Use a prebuilt graph instead of the disease tables.
    #[clap(long)]
    graph: Option<PathBuf>,
    /// Print what hovering over this node would highlight.
    #[clap(long)]
    hover: Option<String>,
    #[clap(long, short, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Write the Sankey document here (JSON).
    #[clap(long, short)]
    out: Option<PathBuf>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let config = Config::load(&opt.config)?;
    let palette = opt.palette.unwrap_or(config.palette);

    let graph = match &opt.graph {
        Some(path) => FlowGraph::load(path)?,
        None => {
            let k = opt.top.unwrap_or(config.top_k.flow);
            ensure!(k > 0, "--top must be at least 1");
            let mut datasets = Datasets::default();
            for bucket in AgeBucket::ALL {
                datasets.load_disease_table(&config, bucket);
            }
            let rankings = datasets.rankings(opt.key, k);
            opt.variant
                .build(&rankings, opt.bracket_shares || config.bracket_shares)
        }
    };
    let (graph, dangling) = graph.validated();

    header("Sankey");
    println!("{}", graph);
    if !dangling.is_empty() {
        println!("{} dangling links excluded", dangling.len());
    }
    if graph.is_empty() {
        println!("nothing to draw");
    }

    let groups = LinkGroups::compute(&graph);
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Group"))
            .with_cell(Cell::from("Colour"))
            .with_cell(Cell::from("Links"))
            .with_cell(Cell::from("Total"))
            .with_cell(Cell::from("Flows")),
    );
    for summary in groups.summaries(&graph, palette) {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(summary.id.to_string()))
                .with_cell(Cell::from(summary.color.to_string()))
                .with_cell(Cell::from(summary.links.len().to_string()))
                .with_cell(Cell::from(format!("{:.2}", summary.total)))
                .with_cell(Cell::from(summary.links.iter().take(5).join(", "))),
        );
    }
    println!("{}", table);

    if let Some(name) = &opt.hover {
        match graph.nodes.iter().find(|n| &*n.name == name.as_str()) {
            Some(node) => {
                let highlight = groups.highlight(&graph, Some(Hover::Node(node.id)));
                let lit = graph
                    .nodes
                    .iter()
                    .zip(&highlight.nodes)
                    .filter(|(_, opacity)| **opacity == HIGHLIGHTED)
                    .map(|(n, _)| &n.name)
                    .join(", ");
                header(&format!("Hovering \"{}\"", name));
                println!("group: {:?}", highlight.group);
                println!("highlighted: {}", lit);
            }
            None => event!(Level::WARN, "no node called \"{}\"", name),
        }
    }

    if let Some(out) = &opt.out {
        write_json(out, &FlowDocument::new(graph, palette))?;
        event!(Level::INFO, "wrote \"{}\"", out.display());
    }
    Ok(())
}
