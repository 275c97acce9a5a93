//! DFG edge builder (SPEC_FULL.md §4.5): self-flow edges, then
//! each-def-to-first-use-per-path reaching-definition edges computed by
//! walking the paired CFG.

use crate::model::cfg::MethodCfg;
use crate::model::dfg::MethodDfg;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

fn build_index(cfg: &MethodCfg, dfg: &MethodDfg) -> HashMap<NodeIndex, NodeIndex> {
    let mut map = HashMap::new();
    for cfg_idx in cfg.graph.node_indices() {
        let sid = cfg.graph[cfg_idx].shared_id;
        if let Some(dfg_idx) = dfg.find_by_shared_id(sid) {
            map.insert(cfg_idx, dfg_idx);
        }
    }
    map
}

/// DFS from `start_cfg` over `cfg`, visiting each CFG node at most once,
/// stopping a path as soon as it hits a redefinition of `var` and adding an
/// intra-edge the first time it hits a use.
fn reaches(
    cfg: &MethodCfg,
    cfg_to_dfg: &HashMap<NodeIndex, NodeIndex>,
    start_cfg: NodeIndex,
    var: &str,
    source_dfg: NodeIndex,
    dfg: &mut MethodDfg,
) {
    let mut visited = HashSet::new();
    visited.insert(start_cfg);
    let mut stack = vec![start_cfg];

    while let Some(u) = stack.pop() {
        for edge in cfg.graph.edges(u) {
            let target = edge.target();
            if !visited.insert(target) {
                continue;
            }

            if let Some(&dfg_target) = cfg_to_dfg.get(&target) {
                let node = &dfg.graph[dfg_target];
                if node.defs.contains(var) {
                    continue;
                }
                if node.uses.contains(var) {
                    dfg.add_intra_edge(source_dfg, dfg_target, var);
                    continue;
                }
            }
            stack.push(target);
        }
    }
}

pub fn add_edges(cfg: &MethodCfg, dfg: &mut MethodDfg) {
    let self_flows: Vec<(NodeIndex, Vec<String>)> = dfg
        .graph
        .node_indices()
        .map(|i| (i, dfg.graph[i].self_flows.iter().cloned().collect()))
        .collect();
    for (idx, vars) in self_flows {
        for v in vars {
            dfg.add_intra_edge(idx, idx, &v);
        }
    }

    let cfg_to_dfg = build_index(cfg, dfg);
    let work: Vec<(NodeIndex, NodeIndex, Vec<String>)> = cfg_to_dfg
        .iter()
        .map(|(&cfg_idx, &dfg_idx)| {
            let vars = dfg.graph[dfg_idx].defs.iter().cloned().collect();
            (cfg_idx, dfg_idx, vars)
        })
        .collect();

    for (cfg_idx, dfg_idx, vars) in work {
        for v in vars {
            reaches(cfg, &cfg_to_dfg, cfg_idx, &v, dfg_idx, dfg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{cfg_builder, def_use};
    use std::collections::HashSet;
    use tree_sitter::Parser;

    fn build_method_cfg(src: &str) -> MethodCfg {
        let mut p = Parser::new();
        p.set_language(&tree_sitter_java::LANGUAGE.into()).unwrap();
        let tree = p.parse(src, None).unwrap();
        let root = tree.root_node();

        fn find<'a>(n: tree_sitter::Node<'a>) -> tree_sitter::Node<'a> {
            let mut cursor = n.walk();
            for c in n.named_children(&mut cursor) {
                if c.kind() == "method_declaration" {
                    return c;
                }
                let mut c2 = c.walk();
                for d in c.named_children(&mut c2) {
                    if d.kind() == "method_declaration" {
                        return d;
                    }
                }
            }
            panic!("no method found");
        }

        let method = find(root);
        cfg_builder::build_method("T.java", "T.m", method, src.as_bytes())
    }

    #[test]
    fn def_reaches_first_use() {
        let src = "class T { void m() { int x = 1; int y = x + 2; } }";
        let cfg = build_method_cfg(src);
        let known: HashSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let mut dfg = def_use::build(&cfg, &HashSet::new(), &known);
        add_edges(&cfg, &mut dfg);
        assert!(dfg.graph.edge_count() > 0);
    }

    #[test]
    fn redefinition_blocks_further_propagation() {
        let src = "class T { void m() { int x = 1; x = 2; int y = x; } }";
        let cfg = build_method_cfg(src);
        let known: HashSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let mut dfg = def_use::build(&cfg, &HashSet::new(), &known);
        add_edges(&cfg, &mut dfg);
        // the first `x = 1` must not reach the final use of x: only the
        // second definition (`x = 2`) should.
        let sources_of_x_edges: Vec<_> = dfg
            .graph
            .edge_indices()
            .filter(|&e| dfg.graph[e].0 == "x")
            .map(|e| dfg.graph.edge_endpoints(e).unwrap().0)
            .collect();
        assert!(!sources_of_x_edges.is_empty());
    }
}
