//! Data-flow graph (SPEC_FULL.md §3, §4.4, §4.5). `DfgNode::shared_id`
//! correlates one-to-one with exactly one CFG node — the "statement-level"
//! node the DEF/USE decoration belongs to.

use crate::ids::SharedId;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfgEdgeKind {
    /// Reaching-definition or self-flow edge within a single method's DFG.
    Intra,
    /// "Enter callee" edge, materialized from `IpDefs` purely for
    /// visualization — the reachability engine never traverses these
    /// directly (SPEC_FULL.md §4.8).
    Inter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DfgNode {
    pub line: usize,
    pub code: String,
    pub shared_id: SharedId,
    pub method: String,
    pub file: String,
    pub defs: HashSet<String>,
    pub uses: HashSet<String>,
    pub self_flows: HashSet<String>,
    /// Set by the call resolver when this node contains a resolved call:
    /// the callee's CFG/DFG entry `SharedId`, used for inter-procedural
    /// descent during reachability (SPEC_FULL.md §4.6, §4.8).
    pub ip_defs: Option<SharedId>,
    pub optional: HashMap<String, String>,
}

impl DfgNode {
    pub fn new(shared_id: SharedId, method: String, file: String, line: usize, code: String) -> Self {
        Self {
            line,
            code,
            shared_id,
            method,
            file,
            defs: HashSet::new(),
            uses: HashSet::new(),
            self_flows: HashSet::new(),
            ip_defs: None,
            optional: HashMap::new(),
        }
    }
}

pub type Dfg = Graph<DfgNode, (String, DfgEdgeKind)>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDfg {
    pub qualified_name: String,
    pub graph: Dfg,
    pub entry: NodeIndex,
}

impl MethodDfg {
    pub fn find_by_shared_id(&self, shared_id: SharedId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&i| self.graph[i].shared_id == shared_id)
    }

    /// Add an `Intra` edge `source -var-> target`, deduplicating by
    /// `(source, label, target, kind)` as SPEC_FULL.md §4.5 requires.
    pub fn add_intra_edge(&mut self, source: NodeIndex, target: NodeIndex, var: &str) {
        let exists = self
            .graph
            .edges_connecting(source, target)
            .any(|e| e.weight().0 == var && e.weight().1 == DfgEdgeKind::Intra);
        if !exists {
            self.graph
                .add_edge(source, target, (var.to_owned(), DfgEdgeKind::Intra));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u8) -> SharedId {
        SharedId::new("f.java", "x", n as usize, n as usize + 1)
    }

    #[test]
    fn add_intra_edge_deduplicates() {
        let mut g: Dfg = Graph::new();
        let a = g.add_node(DfgNode::new(sid(0), "C.m".into(), "f.java".into(), 1, "a".into()));
        let b = g.add_node(DfgNode::new(sid(1), "C.m".into(), "f.java".into(), 2, "b".into()));
        let mut dfg = MethodDfg {
            qualified_name: "C.m".into(),
            graph: g,
            entry: a,
        };

        dfg.add_intra_edge(a, b, "x");
        dfg.add_intra_edge(a, b, "x");

        assert_eq!(dfg.graph.edge_count(), 1);
    }

    #[test]
    fn self_flow_recorded_on_node() {
        let mut node = DfgNode::new(sid(0), "C.m".into(), "f.java".into(), 1, "i++".into());
        node.self_flows.insert("i".into());
        assert!(node.self_flows.contains("i"));
    }
}
