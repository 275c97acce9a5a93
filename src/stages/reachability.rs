//! Reachability engine (SPEC_FULL.md §4.8). BFS over `Intra` DFG edges,
//! descending into a callee's DFG via `ip_defs` whenever a node carries one.
//! `Inter` edges exist only for visualization and are never traversed here.

use crate::ids::SharedId;
use crate::model::ast::Ast;
use crate::model::dfg::{DfgEdgeKind, MethodDfg};
use crate::model::taint::{TaintFlow, TaintSite};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Everything the reachability engine needs a view over: every file's AST
/// (for lifting a source/sink AST node up to its owning DFG node) and every
/// method's DFG, plus an index from a method's CFG/DFG entry `SharedId` to
/// its qualified name (so a call site's `ip_defs` can be turned back into a
/// `MethodDfg` lookup).
pub struct World<'a> {
    pub asts: &'a HashMap<String, Ast>,
    pub dfgs: &'a HashMap<String, MethodDfg>,
    pub entry_index: &'a HashMap<SharedId, String>,
}

fn find_owning_dfg<'a>(world: &World<'a>, shared_id: SharedId) -> Option<(&'a MethodDfg, NodeIndex)> {
    world
        .dfgs
        .values()
        .find_map(|dfg| dfg.find_by_shared_id(shared_id).map(|idx| (dfg, idx)))
}

/// Walk up parent links from the AST node matching `shared_id` until one
/// whose `SharedId` is present in some DFG is found (SPEC_FULL.md §4.8).
fn lift<'a>(world: &World<'a>, shared_id: SharedId) -> Option<(&'a MethodDfg, NodeIndex)> {
    if let Some(found) = find_owning_dfg(world, shared_id) {
        return Some(found);
    }
    for ast in world.asts.values() {
        let Some(node) = ast.find_by_shared_id(shared_id) else {
            continue;
        };
        for ancestor in ast.ancestors(node.id) {
            if let Some(found) = find_owning_dfg(world, ancestor.shared_id) {
                return Some(found);
            }
        }
    }
    None
}

fn bfs(
    world: &World,
    dfg: &MethodDfg,
    start: NodeIndex,
    target: SharedId,
    visited_methods: &mut HashSet<String>,
) -> bool {
    if !visited_methods.insert(dfg.qualified_name.clone()) {
        return false;
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);
    seen.insert(start);

    while let Some(idx) = queue.pop_front() {
        if dfg.graph[idx].shared_id == target {
            return true;
        }

        if let Some(callee_entry) = dfg.graph[idx].ip_defs {
            if let Some(callee_qn) = world.entry_index.get(&callee_entry) {
                if let Some(callee_dfg) = world.dfgs.get(callee_qn) {
                    if bfs(world, callee_dfg, callee_dfg.entry, target, visited_methods) {
                        return true;
                    }
                }
            }
        }

        for edge in dfg.graph.edges(idx) {
            if edge.weight().1 != DfgEdgeKind::Intra {
                continue;
            }
            let next = edge.target();
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// Run BFS from every source to every sink, deduping by `(source, sink,
/// vulnerability)` (SPEC_FULL.md §8 invariant 6).
pub fn find_flows(world: &World, sources: &[TaintSite], sinks: &[TaintSite]) -> Vec<TaintFlow> {
    let lifted_sinks: Vec<(&TaintSite, SharedId)> = sinks
        .iter()
        .filter_map(|s| lift(world, s.shared_id).map(|(dfg, idx)| (s, dfg.graph[idx].shared_id)))
        .collect();

    let mut flows = Vec::new();
    let mut seen_triples = HashSet::new();

    for source in sources {
        let Some((dfg, idx)) = lift(world, source.shared_id) else {
            continue;
        };

        for &(sink, target_shared_id) in &lifted_sinks {
            let mut visited = HashSet::new();
            if !bfs(world, dfg, idx, target_shared_id, &mut visited) {
                continue;
            }
            let triple = (source.shared_id, sink.shared_id, sink.kind);
            if !seen_triples.insert(triple) {
                continue;
            }
            flows.push(TaintFlow {
                source_df_node: source.shared_id,
                sink_df_node: sink.shared_id,
                vulnerability_kind: sink.kind,
                source_description: source.description.clone(),
                sink_description: sink.description.clone(),
                file: sink.file.clone(),
            });
        }
    }
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dfg::Dfg;
    use crate::sinks::VulnKind;

    fn dfg_node(shared: SharedId, code: &str) -> crate::model::dfg::DfgNode {
        crate::model::dfg::DfgNode::new(shared, "C.m".into(), "C.java".into(), 1, code.into())
    }

    fn sid(n: u8) -> SharedId {
        SharedId::new("C.java", "x", n as usize, n as usize + 1)
    }

    #[test]
    fn direct_intra_chain_is_reachable() {
        let mut graph: Dfg = Dfg::new();
        let a = graph.add_node(dfg_node(sid(0), "x = src()"));
        let b = graph.add_node(dfg_node(sid(1), "sink(x)"));
        graph.add_edge(a, b, ("x".to_string(), DfgEdgeKind::Intra));

        let mut dfgs = HashMap::new();
        dfgs.insert(
            "C.m".to_string(),
            MethodDfg {
                qualified_name: "C.m".into(),
                graph,
                entry: a,
            },
        );
        let asts = HashMap::new();
        let entry_index = HashMap::new();
        let world = World {
            asts: &asts,
            dfgs: &dfgs,
            entry_index: &entry_index,
        };

        let source = TaintSite {
            shared_id: sid(0),
            description: "src()".into(),
            kind: VulnKind::empty(),
            file: "C.java".into(),
            line: 1,
            argument: None,
        };
        let sink = TaintSite {
            shared_id: sid(1),
            description: "sink(x)".into(),
            kind: VulnKind::SQL,
            file: "C.java".into(),
            line: 2,
            argument: Some("x".into()),
        };

        let flows = find_flows(&world, &[source], &[sink]);
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].vulnerability_kind, VulnKind::SQL);
    }

    #[test]
    fn reachability_is_not_symmetric() {
        let mut graph: Dfg = Dfg::new();
        let a = graph.add_node(dfg_node(sid(0), "x = src()"));
        let b = graph.add_node(dfg_node(sid(1), "sink(x)"));
        graph.add_edge(a, b, ("x".to_string(), DfgEdgeKind::Intra));

        let mut dfgs = HashMap::new();
        dfgs.insert(
            "C.m".to_string(),
            MethodDfg {
                qualified_name: "C.m".into(),
                graph,
                entry: a,
            },
        );
        let asts = HashMap::new();
        let entry_index = HashMap::new();
        let world = World {
            asts: &asts,
            dfgs: &dfgs,
            entry_index: &entry_index,
        };

        let forward = TaintSite {
            shared_id: sid(0),
            description: "src".into(),
            kind: VulnKind::empty(),
            file: "C.java".into(),
            line: 1,
            argument: None,
        };
        let backward = TaintSite {
            shared_id: sid(1),
            description: "sink".into(),
            kind: VulnKind::SQL,
            file: "C.java".into(),
            line: 2,
            argument: None,
        };

        assert_eq!(find_flows(&world, &[forward.clone()], &[backward.clone()]).len(), 1);
        assert!(find_flows(&world, &[backward], &[forward]).is_empty());
    }
}
