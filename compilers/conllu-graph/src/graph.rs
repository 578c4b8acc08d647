use std::collections::{BTreeMap, BTreeSet, HashMap};

use conllu_protocol::{Category, Finding, HeadRef, Row};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// IDs or DEPS that cannot be read; reported by the row checks already.
    #[error("rows are not well-formed enough to build an enhanced graph")]
    Malformed,
    #[error("Enhanced graph is not connected. Nodes {} are not reachable from any root", id_list(.0))]
    Unconnected(Vec<HeadRef>),
}

fn id_list(ids: &[HeadRef]) -> String {
    let items: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", items.join(", "))
}

impl GraphError {
    /// Finding to record, if this failure has not been reported elsewhere.
    pub fn finding(&self) -> Option<Finding> {
        match self {
            GraphError::Malformed => None,
            GraphError::Unconnected(_) => Some(Finding::new(
                2,
                Category::Enhanced,
                "unconnected-egraph",
                self.to_string(),
            )),
        }
    }
}

/// Enhanced dependencies of one sentence. Edges point from head to dependent
/// and carry the enhanced relation.
pub struct EnhancedGraph<'s> {
    graph: DiGraph<HeadRef, &'s str>,
    index_map: HashMap<HeadRef, NodeIndex>,
    rows: BTreeMap<HeadRef, &'s Row>,
}

impl<'s> EnhancedGraph<'s> {
    fn new() -> Self {
        let mut graph = DiGraph::new();
        let mut index_map = HashMap::new();
        index_map.insert(HeadRef::ROOT, graph.add_node(HeadRef::ROOT));
        Self {
            graph,
            index_map,
            rows: BTreeMap::new(),
        }
    }

    fn index(&mut self, id: HeadRef) -> NodeIndex {
        let graph = &mut self.graph;
        *self.index_map.entry(id).or_insert_with(|| graph.add_node(id))
    }

    /// Builds the graph, or `Ok(None)` when the sentence has no enhanced layer.
    ///
    /// Multiword token rows are skipped. The layer exists as soon as one row
    /// is an empty node or has a non-empty DEPS.
    pub fn build(rows: &'s [Row]) -> Result<Option<Self>, GraphError> {
        let mut egraph = Self::new();
        let mut exists = false;

        // 1. Nodes and edges
        for row in rows {
            if row.is_range() {
                continue;
            }
            let id = row
                .id()
                .and_then(|id| id.as_head_ref())
                .ok_or(GraphError::Malformed)?;
            let deps = row.enhanced_heads().map_err(|_| GraphError::Malformed)?;

            exists |= row.is_empty_node() || !deps.is_empty();
            let node = egraph.index(id);
            egraph.rows.insert(id, row);
            for (head, rel) in deps {
                let parent = egraph.index(head);
                egraph.graph.add_edge(parent, node, rel);
            }
        }
        if !exists {
            return Ok(None);
        }

        // 2. Connectivity: every row must be reachable from the root
        let reachable = egraph.projection(HeadRef::ROOT);
        let unreachable: Vec<HeadRef> = egraph
            .rows
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        if !unreachable.is_empty() {
            return Err(GraphError::Unconnected(unreachable));
        }
        Ok(Some(egraph))
    }

    /// Rows of the graph in numeric id order.
    pub fn nodes(&self) -> impl Iterator<Item = (HeadRef, &'s Row)> + '_ {
        self.rows.iter().map(|(id, row)| (*id, *row))
    }

    pub fn row(&self, id: HeadRef) -> Option<&'s Row> {
        self.rows.get(&id).copied()
    }

    /// Incoming `(head, relation)` edges.
    pub fn parents(&self, id: HeadRef) -> Vec<(HeadRef, &'s str)> {
        let Some(&idx) = self.index_map.get(&id) else {
            return Vec::new();
        };
        let mut parents: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (self.graph[e.source()], *e.weight()))
            .collect();
        parents.sort();
        parents
    }

    pub fn children(&self, id: HeadRef) -> BTreeSet<HeadRef> {
        self.index_map
            .get(&id)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| self.graph[n])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes reachable from `id`, excluding `id` itself unless it lies on a cycle.
    pub fn projection(&self, id: HeadRef) -> BTreeSet<HeadRef> {
        let mut projection = BTreeSet::new();
        let Some(&start) = self.index_map.get(&id) else {
            return projection;
        };
        for child in self.graph.neighbors_directed(start, Direction::Outgoing) {
            let mut dfs = Dfs::new(&self.graph, child);
            while let Some(nx) = dfs.next(&self.graph) {
                projection.insert(self.graph[nx]);
            }
        }
        projection
    }
}
