//! Sankey graphs from ranked disease tables.
//!
//! Nodes are keyed by name: a disease that is ranked under several buckets becomes a single sink
//! node with one incoming link per bucket. Links between the same pair of nodes are merged by
//! adding their values.
use crate::{color::Rgb, AgeBucket, ArcStr, Palette, Ranking};
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt, fs, io,
    path::Path,
};

mod groups;

pub use groups::{
    DisjointSet, GroupSummary, Highlight, Hover, LinkGroups, DIMMED, HIGHLIGHTED, LINK_AT_REST,
};

pub type NodeId = usize;

pub const CATEGORY_BRACKET: &str = "bracket";
pub const CATEGORY_BUCKET: &str = "bucket";
pub const CATEGORY_DISEASE: &str = "disease";

/// Share of each 10-year bracket in its life stage, drawn in front of the bucket nodes.
const BRACKET_SHARES: [(&str, AgeBucket, f64); 9] = [
    ("0-9세", AgeBucket::Infants, 15.29),
    ("10-19세", AgeBucket::Adolescents, 10.18),
    ("20-29세", AgeBucket::YoungAdults, 10.79),
    ("30-39세", AgeBucket::YoungAdults, 14.62),
    ("40-49세", AgeBucket::MiddleAged, 21.87),
    ("50-59세", AgeBucket::MiddleAged, 33.29),
    ("60-69세", AgeBucket::Seniors, 43.93),
    ("70-79세", AgeBucket::Seniors, 31.12),
    ("80세 이상", AgeBucket::Seniors, 18.91),
];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A demographic group (bracket, bucket, or bucket-scoped disease).
    Source,
    /// A disease.
    Sink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    pub name: ArcStr,
    pub category: ArcStr,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    /// Nothing to draw (usually because nothing has loaded yet).
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Split off links whose endpoints aren't in the node list.
    ///
    /// Each dropped link is logged; the returned graph only has links that can be laid out.
    pub fn validated(mut self) -> (FlowGraph, Vec<FlowLink>) {
        let ids = self.nodes.iter().map(|n| n.id).collect::<BTreeSet<_>>();
        let (kept, dangling): (Vec<_>, Vec<_>) = self
            .links
            .into_iter()
            .partition(|l| ids.contains(&l.source) && ids.contains(&l.target));
        for link in &dangling {
            event!(
                Level::ERROR,
                "link {} -> {} (value {}) references a missing node; excluded from layout",
                link.source,
                link.target,
                link.value
            );
        }
        self.links = kept;
        (self, dangling)
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<FlowGraph> {
            FlowGraph::from_reader(io::BufReader::new(fs::File::open(path)?))
        }
        let path = path.as_ref();
        inner(path).with_context(|| format!("loading flow graph from \"{}\"", path.display()))
    }
}

impl fmt::Display for FlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} nodes, {} links", self.nodes.len(), self.links.len())
    }
}

/// Accumulates nodes and links, de-duplicating both.
#[derive(Debug, Default)]
pub struct FlowBuilder {
    nodes: Vec<FlowNode>,
    by_name: BTreeMap<ArcStr, NodeId>,
    links: Vec<FlowLink>,
    by_pair: HashMap<(NodeId, NodeId), usize>,
    collisions: BTreeSet<ArcStr>,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of the node called `name`, adding it if it's new.
    ///
    /// Names are global keys. If the name already exists under another category, the existing
    /// node is returned (and the collision logged the first time it's seen).
    pub fn node(&mut self, name: &str, category: &str, kind: NodeKind) -> NodeId {
        if let Some(&id) = self.by_name.get(name) {
            let existing = &self.nodes[id];
            if &*existing.category != category && !self.collisions.contains(name) {
                event!(
                    Level::WARN,
                    "node \"{}\" is used as both {} and {}; treating them as one node",
                    name,
                    existing.category,
                    category
                );
                self.collisions.insert(name.into());
            }
            return id;
        }
        let id = self.nodes.len();
        let name: ArcStr = name.into();
        self.nodes.push(FlowNode {
            id,
            name: name.clone(),
            category: category.into(),
            kind,
        });
        self.by_name.insert(name, id);
        id
    }

    /// Add `value` to the flow from `source` to `target`.
    pub fn link(&mut self, source: NodeId, target: NodeId, value: f64) {
        match self.by_pair.get(&(source, target)) {
            Some(&idx) => self.links[idx].value += value,
            None => {
                self.by_pair.insert((source, target), self.links.len());
                self.links.push(FlowLink {
                    source,
                    target,
                    value,
                });
            }
        }
    }

    /// Prefix the graph with the 10-year bracket share of each ranked life stage.
    ///
    /// Stages without a ranking are left out, as their bracket links would lead nowhere.
    pub fn bracket_shares(mut self, rankings: &[Ranking]) -> Self {
        let ranked = rankings.iter().map(Ranking::bucket).collect::<BTreeSet<_>>();
        for (bracket, bucket, share) in BRACKET_SHARES {
            if !ranked.contains(&bucket) {
                continue;
            }
            let source = self.node(bracket, CATEGORY_BRACKET, NodeKind::Source);
            let target = self.node(bucket.korean_label(), CATEGORY_BUCKET, NodeKind::Source);
            self.link(source, target, share);
        }
        self
    }

    /// Bucket nodes linked to disease nodes, weighted by inverse rank (`k - rank`).
    ///
    /// Raw counts aren't comparable between buckets of different size, rank position is.
    pub fn bucket_to_disease(mut self, rankings: &[Ranking]) -> Self {
        for ranking in rankings {
            let bucket =
                self.node(ranking.bucket().korean_label(), CATEGORY_BUCKET, NodeKind::Source);
            for row in ranking.iter() {
                let disease = self.node(&row.name, CATEGORY_DISEASE, NodeKind::Sink);
                self.link(bucket, disease, ranking.weight(row));
            }
        }
        self
    }

    /// One `"bucket - disease"` node per ranked row, each linked to the shared disease node and
    /// weighted by the row's total.
    ///
    /// If the bucket already has a node (from the bracket prefix) it feeds its scoped nodes.
    pub fn bucket_scoped(mut self, rankings: &[Ranking]) -> Self {
        for ranking in rankings {
            let bucket = ranking.bucket().korean_label();
            let bucket_node = self.by_name.get(bucket).copied();
            for row in ranking.iter() {
                let scoped_name = format!("{} - {}", bucket, row.name);
                let scoped = self.node(&scoped_name, bucket, NodeKind::Source);
                let disease = self.node(&row.name, CATEGORY_DISEASE, NodeKind::Sink);
                let total = row.total as f64;
                if let Some(bucket_node) = bucket_node {
                    self.link(bucket_node, scoped, total);
                }
                self.link(scoped, disease, total);
            }
        }
        self
    }

    pub fn build(self) -> FlowGraph {
        FlowGraph {
            nodes: self.nodes,
            links: self.links,
        }
    }
}

/// Which of the two Sankey layouts to build.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowVariant {
    BucketToDisease,
    BucketScoped,
}

impl FlowVariant {
    pub fn build(self, rankings: &[Ranking], bracket_shares: bool) -> FlowGraph {
        let mut builder = FlowBuilder::new();
        if bracket_shares {
            builder = builder.bracket_shares(rankings);
        }
        let builder = match self {
            FlowVariant::BucketToDisease => builder.bucket_to_disease(rankings),
            FlowVariant::BucketScoped => builder.bucket_scoped(rankings),
        };
        builder.build()
    }
}

impl std::str::FromStr for FlowVariant {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bucket-to-disease" | "rank" => Ok(FlowVariant::BucketToDisease),
            "bucket-scoped" | "total" => Ok(FlowVariant::BucketScoped),
            _ => bail!(
                "unknown flow variant \"{}\" (expected bucket-to-disease or bucket-scoped)",
                s
            ),
        }
    }
}

/// Node with its resolved colour, as handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDoc {
    #[serde(flatten)]
    pub node: FlowNode,
    pub color: Rgb,
    pub groups: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkDoc {
    #[serde(flatten)]
    pub link: FlowLink,
    pub group: usize,
    pub color: Rgb,
}

/// Everything the Sankey renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct FlowDocument {
    pub nodes: Vec<NodeDoc>,
    pub links: Vec<LinkDoc>,
    pub groups: Vec<GroupSummary>,
}

impl FlowDocument {
    /// Validates `graph` first, so every link in the document can be laid out.
    pub fn new(graph: FlowGraph, palette: Palette) -> Self {
        let (graph, _) = graph.validated();
        let groups = LinkGroups::compute(&graph);
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDoc {
                node: node.clone(),
                color: groups.node_color(node.id, palette),
                groups: groups.groups_of_node(node.id).to_vec(),
            })
            .collect();
        let links = graph
            .links
            .iter()
            .enumerate()
            .filter_map(|(idx, link)| {
                let group = groups.group_of_link(idx)?;
                Some(LinkDoc {
                    link: link.clone(),
                    group,
                    color: palette.color(group),
                })
            })
            .collect();
        Self {
            nodes,
            links,
            groups: groups.summaries(&graph, palette),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AgeBucket, DiseaseTable, Ranking, SortKey};

    fn ranking(bucket: AgeBucket, csv: &str, k: usize) -> Ranking {
        let table = DiseaseTable::from_reader(csv.as_bytes(), bucket, "t").unwrap();
        Ranking::new(&table, SortKey::MaleFirst, k)
    }

    fn rankings() -> Vec<Ranking> {
        vec![
            ranking(
                AgeBucket::Infants,
                "name,male,female,total\n감기,30,20,50\n비염,20,20,40\n",
                12,
            ),
            ranking(
                AgeBucket::Seniors,
                "name,male,female,total\n고혈압,90,80,170\n감기,10,5,15\n",
                12,
            ),
        ]
    }

    #[test]
    fn diseases_shared_between_buckets() {
        let graph = FlowBuilder::new().bucket_to_disease(&rankings()).build();
        let names = graph.nodes.iter().map(|n| &*n.name).collect::<Vec<_>>();
        assert_eq!(names, ["유아", "감기", "비염", "노년", "고혈압"]);
        assert_eq!(graph.links.len(), 4);
        // 유아 -> 감기 at rank 0 with k = 12
        assert_eq!(graph.links[0].value, 12.);
        // 노년 -> 감기 at rank 1
        let last = &graph.links[3];
        assert_eq!((last.source, last.target, last.value), (3, 1, 11.));
    }

    #[test]
    fn scoped_nodes() {
        let graph = FlowBuilder::new().bucket_scoped(&rankings()).build();
        assert!(graph.nodes.iter().any(|n| &*n.name == "유아 - 감기"));
        assert!(graph.nodes.iter().any(|n| &*n.name == "노년 - 감기"));
        let cold = graph
            .nodes
            .iter()
            .filter(|n| &*n.name == "감기")
            .collect::<Vec<_>>();
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].kind, NodeKind::Sink);
        let into_cold = graph
            .links
            .iter()
            .filter(|l| l.target == cold[0].id)
            .map(|l| l.value)
            .sum::<f64>();
        assert_eq!(into_cold, 65.);
    }

    #[test]
    fn repeated_pairs_add_up() {
        let mut builder = FlowBuilder::new();
        let a = builder.node("a", "x", NodeKind::Source);
        let b = builder.node("b", "y", NodeKind::Sink);
        builder.link(a, b, 1.5);
        builder.link(a, b, 2.);
        // same name, other category: collapses onto the first node
        assert_eq!(builder.node("a", "y", NodeKind::Sink), a);
        let graph = builder.build();
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].value, 3.5);
    }

    #[test]
    fn bracket_prefix() {
        let graph = FlowBuilder::new()
            .bracket_shares(&rankings())
            .bucket_to_disease(&rankings())
            .build();
        let seniors = graph.nodes.iter().find(|n| &*n.name == "노년").unwrap();
        let into_seniors = graph
            .links
            .iter()
            .filter(|l| l.target == seniors.id)
            .count();
        assert_eq!(into_seniors, 3);
        // only the two ranked stages get a prefix
        assert!(graph.nodes.iter().all(|n| &*n.name != "10-19세"));
    }

    #[test]
    fn bracket_prefix_feeds_scoped_nodes() {
        let infants = vec![ranking(
            AgeBucket::Infants,
            "name,male,female,total\n감기,30,20,50\n",
            12,
        )];
        let graph = FlowVariant::BucketScoped.build(&infants, true);
        let names = graph.nodes.iter().map(|n| &*n.name).collect::<Vec<_>>();
        assert_eq!(names, ["0-9세", "유아", "유아 - 감기", "감기"]);
        let out_of_infants = graph.links.iter().filter(|l| l.source == 1).collect::<Vec<_>>();
        assert_eq!(out_of_infants.len(), 1);
        assert_eq!((out_of_infants[0].target, out_of_infants[0].value), (2, 50.));
        assert_eq!(LinkGroups::compute(&graph).len(), 1);

        let graph = FlowVariant::BucketScoped.build(&rankings(), true);
        assert_eq!(LinkGroups::compute(&graph).len(), 1);
    }

    #[test]
    fn empty_and_dangling() {
        let graph = FlowBuilder::new().bucket_to_disease(&[]).build();
        assert!(graph.is_empty());
        let doc = FlowDocument::new(graph, Palette::Category10);
        assert!(doc.nodes.is_empty() && doc.links.is_empty() && doc.groups.is_empty());

        let mut graph = FlowBuilder::new().bucket_to_disease(&rankings()).build();
        graph.links.push(FlowLink {
            source: 0,
            target: 99,
            value: 1.,
        });
        let (graph, dangling) = graph.validated();
        assert_eq!(graph.links.len(), 4);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, 99);
    }

    #[test]
    fn document() {
        let graph = FlowVariant::BucketToDisease.build(&rankings(), false);
        let doc = FlowDocument::new(graph, Palette::Warm);
        // everything is connected through 감기
        assert_eq!(doc.groups.len(), 1);
        assert!(doc.links.iter().all(|l| l.group == 0));
        assert_eq!(doc.nodes[0].color, Palette::Warm.color(0));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["nodes"][1]["name"], "감기");
        assert_eq!(json["links"][0]["color"], "#f39821");
    }
}
