//! Partitioning a flow graph's links into connected groups.
//!
//! Two links are in the same group if there is a chain of links between them where each
//! consecutive pair shares a node. Groups are numbered in the order their first link appears.
use super::{FlowGraph, NodeId};
use crate::{color::Rgb, color::NEUTRAL, Palette};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Opacity of the hovered group.
pub const HIGHLIGHTED: f64 = 1.0;
/// Opacity of everything outside the hovered group.
pub const DIMMED: f64 = 0.3;
/// Link opacity when nothing is hovered.
pub const LINK_AT_REST: f64 = 0.5;

/// Union-find over dense indices, with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
    }
}

/// The group of every link in a graph.
#[derive(Debug, Clone, Default)]
pub struct LinkGroups {
    /// Indexed like `FlowGraph::links`.
    link_group: Vec<usize>,
    /// Link indices in each group, in link order.
    members: Vec<Vec<usize>>,
    /// Groups touching each node, ascending.
    node_groups: BTreeMap<NodeId, Vec<usize>>,
}

impl LinkGroups {
    pub fn compute(graph: &FlowGraph) -> Self {
        // node ids needn't be dense, so map them first
        let mut dense = HashMap::new();
        for link in &graph.links {
            for id in [link.source, link.target] {
                let next = dense.len();
                dense.entry(id).or_insert(next);
            }
        }
        let mut set = DisjointSet::new(dense.len());
        for link in &graph.links {
            set.union(dense[&link.source], dense[&link.target]);
        }

        let mut root_group = HashMap::new();
        let mut groups = LinkGroups::default();
        for (idx, link) in graph.links.iter().enumerate() {
            let root = set.find(dense[&link.source]);
            let next = root_group.len();
            let group = *root_group.entry(root).or_insert(next);
            if group == groups.members.len() {
                groups.members.push(vec![]);
            }
            groups.members[group].push(idx);
            groups.link_group.push(group);
            for id in [link.source, link.target] {
                let touching = groups.node_groups.entry(id).or_default();
                if !touching.contains(&group) {
                    touching.push(group);
                }
            }
        }
        for touching in groups.node_groups.values_mut() {
            touching.sort_unstable();
        }
        groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn group_of_link(&self, link: usize) -> Option<usize> {
        self.link_group.get(link).copied()
    }

    /// Indices of the links in `group`.
    pub fn links_in(&self, group: usize) -> &[usize] {
        self.members.get(group).map(|m| &m[..]).unwrap_or(&[])
    }

    pub fn groups_of_node(&self, node: NodeId) -> &[usize] {
        self.node_groups
            .get(&node)
            .map(|g| &g[..])
            .unwrap_or(&[])
    }

    /// The mean of the colours of every group touching the node, or neutral gray if it has no
    /// links.
    pub fn node_color(&self, node: NodeId, palette: Palette) -> Rgb {
        let colors = self
            .groups_of_node(node)
            .iter()
            .map(|g| palette.color(*g))
            .collect::<Vec<_>>();
        Rgb::blend(&colors).unwrap_or(NEUTRAL)
    }

    pub fn summary(&self, graph: &FlowGraph, group: usize, palette: Palette) -> GroupSummary {
        let name = |id| {
            graph
                .node(id)
                .map(|n| n.name.to_string())
                .unwrap_or_else(|| format!("#{}", id))
        };
        let mut links = vec![];
        let mut total = 0.;
        for &idx in self.links_in(group) {
            let link = &graph.links[idx];
            links.push(format!("{} → {}", name(link.source), name(link.target)));
            total += link.value;
        }
        let escaped = links
            .iter()
            .map(|l| html_escape::encode_text(l).into_owned())
            .collect::<Vec<_>>();
        let tooltip = format!("그룹 정보: {}<br>총 값: {}", escaped.join(", "), total);
        GroupSummary {
            id: group,
            color: palette.color(group),
            links,
            total,
            tooltip,
        }
    }

    pub fn summaries(&self, graph: &FlowGraph, palette: Palette) -> Vec<GroupSummary> {
        (0..self.len())
            .map(|group| self.summary(graph, group, palette))
            .collect()
    }

    /// Opacities for every node and link when `hover` is under the pointer.
    ///
    /// A node in several groups highlights the first of them.
    pub fn highlight(&self, graph: &FlowGraph, hover: Option<Hover>) -> Highlight {
        let group = match hover {
            Some(Hover::Node(id)) => self.groups_of_node(id).first().copied(),
            Some(Hover::Link(idx)) => self.group_of_link(idx),
            None => None,
        };
        let Some(group) = group else {
            return Highlight {
                group: None,
                nodes: vec![HIGHLIGHTED; graph.nodes.len()],
                links: vec![LINK_AT_REST; graph.links.len()],
            };
        };
        let pick = |hit: bool| if hit { HIGHLIGHTED } else { DIMMED };
        Highlight {
            group: Some(group),
            nodes: graph
                .nodes
                .iter()
                .map(|n| pick(self.groups_of_node(n.id).contains(&group)))
                .collect(),
            links: (0..graph.links.len())
                .map(|idx| pick(self.group_of_link(idx) == Some(group)))
                .collect(),
        }
    }
}

/// What the pointer is over.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Hover {
    Node(NodeId),
    /// Index into the graph's links.
    Link(usize),
}

/// Opacity per node and per link, indexed like the graph's `nodes` and `links`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub group: Option<usize>,
    pub nodes: Vec<f64>,
    pub links: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub id: usize,
    pub color: Rgb,
    /// `source → target` for each member link.
    pub links: Vec<String>,
    pub total: f64,
    /// HTML for the hover tooltip. Names are escaped.
    pub tooltip: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flow::{FlowBuilder, NodeKind};

    /// Builds a graph from `(source, target)` name pairs, each with value 1.
    fn graph(pairs: &[(&str, &str)]) -> FlowGraph {
        let mut b = FlowBuilder::new();
        for (s, t) in pairs {
            let s = b.node(s, "source", NodeKind::Source);
            let t = b.node(t, "sink", NodeKind::Sink);
            b.link(s, t, 1.);
        }
        b.build()
    }

    #[test]
    fn chain_and_island() {
        let g = graph(&[("A", "B"), ("B", "C"), ("D", "E")]);
        let groups = LinkGroups::compute(&g);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.links_in(0), &[0, 1]);
        assert_eq!(groups.links_in(1), &[2]);
    }

    #[test]
    fn shared_target_joins_groups() {
        // the link order doesn't reveal the connection until the last link
        let g = graph(&[("A", "X"), ("B", "Y"), ("C", "Z"), ("B", "X")]);
        let groups = LinkGroups::compute(&g);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.group_of_link(0), groups.group_of_link(1));
        assert_eq!(groups.group_of_link(0), groups.group_of_link(3));
        assert_ne!(groups.group_of_link(0), groups.group_of_link(2));
    }

    #[test]
    fn sharing_an_endpoint_means_same_group() {
        let g = graph(&[
            ("a", "x"),
            ("b", "y"),
            ("a", "y"),
            ("c", "z"),
            ("d", "w"),
            ("d", "z"),
        ]);
        let groups = LinkGroups::compute(&g);
        for (i, l) in g.links.iter().enumerate() {
            for (j, m) in g.links.iter().enumerate() {
                let shares = l.source == m.source
                    || l.source == m.target
                    || l.target == m.source
                    || l.target == m.target;
                if shares {
                    assert_eq!(groups.group_of_link(i), groups.group_of_link(j));
                }
            }
        }
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn empty_graph() {
        let groups = LinkGroups::compute(&FlowGraph::default());
        assert!(groups.is_empty());
        assert_eq!(groups.node_color(0, Palette::Warm), NEUTRAL);
    }

    #[test]
    fn colours() {
        let mut g = graph(&[("A", "B"), ("C", "D")]);
        // a node bridging nothing, and one outside every link
        g.nodes.push(crate::flow::FlowNode {
            id: 10,
            name: "lonely".into(),
            category: "sink".into(),
            kind: NodeKind::Sink,
        });
        let groups = LinkGroups::compute(&g);
        let palette = Palette::Warm;
        assert_eq!(groups.node_color(0, palette), palette.color(0));
        assert_eq!(groups.node_color(2, palette), palette.color(1));
        assert_eq!(groups.node_color(10, palette), NEUTRAL);

        // a node touched by two groups, built by hand since the builder would merge them
        let mut groups = groups;
        groups.node_groups.insert(7, vec![0, 1]);
        let blended = Rgb::blend(&[palette.color(0), palette.color(1)]).unwrap();
        assert_eq!(groups.node_color(7, palette), blended);
        // (0xf3 + 0xd9) / 2, (0x98 + 0xb6) / 2, (0x21 + 0x43) / 2
        assert_eq!(blended, Rgb::new(0xe6, 0xa7, 0x32));
    }

    #[test]
    fn summary_escapes_names() {
        let g = graph(&[("<b>", "B"), ("B", "C")]);
        let groups = LinkGroups::compute(&g);
        let summary = groups.summary(&g, 0, Palette::Category10);
        assert_eq!(summary.links, ["<b> → B", "B → C"]);
        assert_eq!(summary.total, 2.);
        assert_eq!(summary.tooltip, "그룹 정보: &lt;b&gt; → B, B → C<br>총 값: 2");
    }

    #[test]
    fn highlighting() {
        let g = graph(&[("A", "B"), ("B", "C"), ("D", "E")]);
        let groups = LinkGroups::compute(&g);
        let h = groups.highlight(&g, Some(Hover::Node(0)));
        assert_eq!(h.group, Some(0));
        assert_eq!(h.links, [HIGHLIGHTED, HIGHLIGHTED, DIMMED]);
        assert_eq!(h.nodes, [HIGHLIGHTED, HIGHLIGHTED, HIGHLIGHTED, DIMMED, DIMMED]);
        let h = groups.highlight(&g, Some(Hover::Link(2)));
        assert_eq!(h.links, [DIMMED, DIMMED, HIGHLIGHTED]);
        let rest = groups.highlight(&g, None);
        assert_eq!(rest.links, [LINK_AT_REST; 3]);
        assert_eq!(rest.nodes, [HIGHLIGHTED; 5]);
    }
}
