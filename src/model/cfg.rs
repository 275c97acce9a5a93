//! Control-flow graph (SPEC_FULL.md §3, §4.3). One `Cfg` per method or
//! constructor, built on `petgraph::Graph` the same way the teacher's
//! AST-to-CFG pass does (`Graph<NodeInfo, EdgeKind>` in `cfg.rs`).

use crate::ids::SharedId;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CfgKind {
    Entry,
    Assign,
    If,
    IfEnd,
    Expr,
    ForExpr,
    ForInit,
    ForUpdate,
    ForEnd,
    While,
    WhileEnd,
    DoWhile,
    DoWhileEnd,
    Switch,
    SwitchEnd,
    CaseStmt,
    Break,
    Continue,
    Return,
    Try,
    TryEnd,
    Catch,
    CatchEnd,
    Finally,
    FinallyEnd,
    Resource,
    Throw,
    Sync,
    SyncEnd,
    Label,
    LabelEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfgEdgeKind {
    Eps,
    True,
    False,
    Throws,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgNode {
    pub kind: CfgKind,
    pub line: usize,
    pub code: String,
    pub shared_id: SharedId,
    pub method: String,
    pub file: String,
    pub optional: HashMap<String, String>,
}

pub type Cfg = Graph<CfgNode, CfgEdgeKind>;

/// One loop/labeled/try block's start and end node, used by the CFG builder
/// to resolve `break`/`continue`/`throw` jump targets (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct BlockBounds {
    pub start: NodeIndex,
    pub end: NodeIndex,
}

/// A built CFG plus the entry node, keyed per method so the reachability
/// engine (§4.8) and call resolver (§4.6) can find an `entry` by
/// `SharedId` without re-walking the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCfg {
    pub qualified_name: String,
    pub graph: Cfg,
    pub entry: NodeIndex,
}

impl MethodCfg {
    pub fn entry_shared_id(&self) -> SharedId {
        self.graph[self.entry].shared_id
    }

    pub fn find_by_shared_id(&self, shared_id: SharedId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&i| self.graph[i].shared_id == shared_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: CfgKind, sid: u8) -> CfgNode {
        CfgNode {
            kind,
            line: 1,
            code: String::new(),
            shared_id: SharedId::new("f.java", "x", sid as usize, sid as usize + 1),
            method: "C.m".into(),
            file: "f.java".into(),
            optional: HashMap::new(),
        }
    }

    #[test]
    fn entry_shared_id_matches_entry_node() {
        let mut g: Cfg = Graph::new();
        let entry = g.add_node(node(CfgKind::Entry, 0));
        let ret = g.add_node(node(CfgKind::Return, 1));
        g.add_edge(entry, ret, CfgEdgeKind::Eps);

        let cfg = MethodCfg {
            qualified_name: "C.m".into(),
            graph: g,
            entry,
        };

        assert_eq!(cfg.entry_shared_id(), cfg.graph[entry].shared_id);
        assert!(cfg.find_by_shared_id(cfg.graph[ret].shared_id).is_some());
    }
}
