//! CFG builder (SPEC_FULL.md §4.3). One CFG per method/constructor, built
//! by a visitor that threads a pending-predecessor-edge queue (`pending`,
//! `dont_pop`) through the recursion, wiring each new node's incoming edges
//! from whatever the previous statement left unresolved. The per-kind
//! `new_node` helper keeps the teacher's `push_node` naming, but the pending-
//! queue technique itself is this crate's own generalization of SPEC_FULL.md
//! §4.3's `CasesQueue`/`PendingLinks` wording — the teacher's `cfg.rs` instead
//! threads a frontier `Vec<NodeIndex>` through a recursive `build_sub` and has
//! no pending-queue or `dont_pop` field of its own.

use crate::ids::SharedId;
use crate::lang::{self, Kind};
use crate::model::cfg::{BlockBounds, Cfg, CfgEdgeKind, CfgKind, CfgNode, MethodCfg};
use std::collections::HashMap;
use tree_sitter::Node;

fn text<'a>(n: Node<'a>, src: &'a [u8]) -> String {
    std::str::from_utf8(&src[n.start_byte()..n.end_byte()])
        .unwrap_or("")
        .to_owned()
}

struct CfgBuilder<'a> {
    graph: Cfg,
    src: &'a [u8],
    file: String,
    qualified_name: String,
    pending: Vec<(petgraph::graph::NodeIndex, CfgEdgeKind)>,
    dont_pop: bool,
    loop_blocks: Vec<BlockBounds>,
    labeled_blocks: HashMap<String, BlockBounds>,
    try_blocks: Vec<petgraph::graph::NodeIndex>,
}

use petgraph::graph::NodeIndex;

impl<'a> CfgBuilder<'a> {
    fn new_node(&mut self, kind: CfgKind, n: Node<'a>) -> NodeIndex {
        self.graph.add_node(CfgNode {
            kind,
            line: n.start_position().row + 1,
            code: text(n, self.src),
            shared_id: SharedId::new(&self.file, n.kind(), n.start_byte(), n.end_byte()),
            method: self.qualified_name.clone(),
            file: self.file.clone(),
            optional: HashMap::new(),
        })
    }

    fn take_pending(&mut self) -> Vec<(NodeIndex, CfgEdgeKind)> {
        if self.dont_pop {
            self.dont_pop = false;
            Vec::new()
        } else {
            std::mem::take(&mut self.pending)
        }
    }

    fn link_to(&mut self, target: NodeIndex) {
        for (src, kind) in self.take_pending() {
            self.graph.add_edge(src, target, kind);
        }
    }

    fn defer(&mut self, node: NodeIndex, kind: CfgEdgeKind) {
        self.pending.push((node, kind));
    }

    fn label_of(&self, n: Node<'a>) -> Option<String> {
        n.named_child(0)
            .filter(|c| c.kind() == "identifier")
            .map(|c| text(c, self.src))
    }

    fn visit_block(&mut self, block: Node<'a>) {
        let mut cursor = block.walk();
        for stmt in block.named_children(&mut cursor) {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, n: Node<'a>) {
        match lang::lookup(n.kind()) {
            Kind::Block => self.visit_block(n),
            Kind::If => self.visit_if(n),
            Kind::While => self.visit_while(n),
            Kind::DoWhile => self.visit_do_while(n),
            Kind::For => self.visit_for(n),
            Kind::ForEach => self.visit_for_each(n),
            Kind::Switch => self.visit_switch(n),
            Kind::Try => self.visit_try(n),
            Kind::Return => self.visit_return(n),
            Kind::Throw => self.visit_throw(n),
            Kind::Break => self.visit_break(n),
            Kind::Continue => self.visit_continue(n),
            Kind::Labeled => self.visit_labeled(n),
            Kind::Sync => self.visit_sync(n),
            Kind::LocalVarDecl | Kind::Assignment => {
                let idx = self.new_node(CfgKind::Assign, n);
                self.link_to(idx);
                self.defer(idx, CfgEdgeKind::Eps);
            }
            Kind::Trivia => {}
            _ => {
                let idx = self.new_node(CfgKind::Expr, n);
                self.link_to(idx);
                self.defer(idx, CfgEdgeKind::Eps);
            }
        }
    }

    fn visit_if(&mut self, n: Node<'a>) {
        let cond = n.child_by_field_name("condition").unwrap_or(n);
        let if_idx = self.new_node(CfgKind::If, cond);
        self.link_to(if_idx);
        let if_end = self.new_node(CfgKind::IfEnd, n);

        self.pending = vec![(if_idx, CfgEdgeKind::True)];
        if let Some(then) = n.child_by_field_name("consequence") {
            self.visit_stmt(then);
        }
        let mut merged = self.take_pending();

        if let Some(alt) = n.child_by_field_name("alternative") {
            self.pending = vec![(if_idx, CfgEdgeKind::False)];
            self.visit_stmt(alt);
            merged.extend(self.take_pending());
        } else {
            merged.push((if_idx, CfgEdgeKind::False));
        }

        for (src, kind) in merged {
            self.graph.add_edge(src, if_end, kind);
        }
        self.defer(if_end, CfgEdgeKind::Eps);
    }

    fn visit_while(&mut self, n: Node<'a>) {
        let cond = n.child_by_field_name("condition").unwrap_or(n);
        let while_idx = self.new_node(CfgKind::While, cond);
        self.link_to(while_idx);
        let while_end = self.new_node(CfgKind::WhileEnd, n);

        self.loop_blocks.push(BlockBounds {
            start: while_idx,
            end: while_end,
        });
        self.pending = vec![(while_idx, CfgEdgeKind::True)];
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.link_to(while_idx);
        self.loop_blocks.pop();

        self.graph.add_edge(while_idx, while_end, CfgEdgeKind::False);
        self.defer(while_end, CfgEdgeKind::Eps);
    }

    fn visit_do_while(&mut self, n: Node<'a>) {
        let cond = n.child_by_field_name("condition").unwrap_or(n);
        let cond_idx = self.new_node(CfgKind::DoWhile, cond);
        let end_idx = self.new_node(CfgKind::DoWhileEnd, n);

        self.loop_blocks.push(BlockBounds {
            start: cond_idx,
            end: end_idx,
        });
        let body_start = self.graph.node_count();
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.loop_blocks.pop();
        self.link_to(cond_idx);

        if body_start < self.graph.node_count() {
            self.graph
                .add_edge(cond_idx, NodeIndex::new(body_start), CfgEdgeKind::True);
        } else {
            self.graph.add_edge(cond_idx, cond_idx, CfgEdgeKind::True);
        }
        self.graph.add_edge(cond_idx, end_idx, CfgEdgeKind::False);
        self.defer(end_idx, CfgEdgeKind::Eps);
    }

    fn visit_for(&mut self, n: Node<'a>) {
        if let Some(init) = n.child_by_field_name("init") {
            let idx = self.new_node(CfgKind::ForInit, init);
            self.link_to(idx);
            self.defer(idx, CfgEdgeKind::Eps);
        }

        let cond = n.child_by_field_name("condition").unwrap_or(n);
        let for_expr = self.new_node(CfgKind::ForExpr, cond);
        self.link_to(for_expr);

        let update = n.child_by_field_name("update").unwrap_or(n);
        let for_update = self.new_node(CfgKind::ForUpdate, update);
        let for_end = self.new_node(CfgKind::ForEnd, n);

        self.loop_blocks.push(BlockBounds {
            start: for_update,
            end: for_end,
        });
        self.pending = vec![(for_expr, CfgEdgeKind::True)];
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.link_to(for_update);
        self.loop_blocks.pop();

        self.graph.add_edge(for_update, for_expr, CfgEdgeKind::Eps);
        self.graph.add_edge(for_expr, for_end, CfgEdgeKind::False);
        self.defer(for_end, CfgEdgeKind::Eps);
    }

    fn visit_for_each(&mut self, n: Node<'a>) {
        let for_expr = self.new_node(CfgKind::ForExpr, n);
        self.link_to(for_expr);
        let for_end = self.new_node(CfgKind::ForEnd, n);

        self.loop_blocks.push(BlockBounds {
            start: for_expr,
            end: for_end,
        });
        self.pending = vec![(for_expr, CfgEdgeKind::True)];
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.link_to(for_expr);
        self.loop_blocks.pop();

        self.graph.add_edge(for_expr, for_end, CfgEdgeKind::False);
        self.defer(for_end, CfgEdgeKind::Eps);
    }

    /// `Switch` wires `True` edges from `Switch` to every `CaseStmt`
    /// (SPEC_FULL.md §4.3). A case group that falls off its end without a
    /// `break`/`return`/`throw` (its statements' pending edges are still
    /// unconsumed) falls through via `False` edge into the next case group;
    /// the last group's fall-through lands on `SwitchEnd`.
    fn visit_switch(&mut self, n: Node<'a>) {
        let switch_idx = self.new_node(CfgKind::Switch, n);
        self.link_to(switch_idx);
        let switch_end = self.new_node(CfgKind::SwitchEnd, n);

        self.loop_blocks.push(BlockBounds {
            start: switch_end,
            end: switch_end,
        });

        let body = n.child_by_field_name("body").unwrap_or(n);
        let groups: Vec<Node<'a>> = {
            let mut cursor = body.walk();
            body.named_children(&mut cursor)
                .filter(|g| lang::lookup(g.kind()) == Kind::SwitchGroup)
                .collect()
        };

        let mut fallthrough: Vec<(NodeIndex, CfgEdgeKind)> = Vec::new();
        for group in &groups {
            let case_idx = self.new_node(CfgKind::CaseStmt, *group);
            self.graph.add_edge(switch_idx, case_idx, CfgEdgeKind::True);
            for (src, _) in fallthrough.drain(..) {
                self.graph.add_edge(src, case_idx, CfgEdgeKind::False);
            }

            self.pending = vec![(case_idx, CfgEdgeKind::Eps)];
            let mut gc = group.walk();
            for stmt in group.named_children(&mut gc) {
                self.visit_stmt(stmt);
            }
            fallthrough = self.take_pending();
        }
        for (src, _) in fallthrough {
            self.graph.add_edge(src, switch_end, CfgEdgeKind::False);
        }

        self.loop_blocks.pop();
        self.defer(switch_end, CfgEdgeKind::Eps);
    }

    fn visit_try(&mut self, n: Node<'a>) {
        let try_idx = self.new_node(CfgKind::Try, n);
        self.link_to(try_idx);
        self.defer(try_idx, CfgEdgeKind::Eps);

        if let Some(resources) = n.child_by_field_name("resources") {
            let mut cursor = resources.walk();
            for res in resources.named_children(&mut cursor) {
                let idx = self.new_node(CfgKind::Resource, res);
                self.link_to(idx);
                self.defer(idx, CfgEdgeKind::Eps);
            }
        }

        let try_end = self.new_node(CfgKind::TryEnd, n);
        self.try_blocks.push(try_end);
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.try_blocks.pop();
        self.link_to(try_end);

        let catch_end = self.new_node(CfgKind::CatchEnd, n);
        let mut cursor = n.walk();
        for clause in n.named_children(&mut cursor) {
            if lang::lookup(clause.kind()) != Kind::Catch {
                continue;
            }
            let catch_idx = self.new_node(CfgKind::Catch, clause);
            self.graph.add_edge(try_end, catch_idx, CfgEdgeKind::Throws);
            self.pending = vec![(catch_idx, CfgEdgeKind::Eps)];
            if let Some(body) = clause.child_by_field_name("body") {
                self.visit_stmt(body);
            }
            self.link_to(catch_end);
        }
        self.defer(try_end, CfgEdgeKind::Eps);
        self.defer(catch_end, CfgEdgeKind::Eps);

        let mut fc = n.walk();
        if let Some(finally_clause) = n
            .named_children(&mut fc)
            .find(|c| lang::lookup(c.kind()) == Kind::Finally)
        {
            let finally_idx = self.new_node(CfgKind::Finally, finally_clause);
            self.link_to(finally_idx);
            if let Some(body) = finally_clause.child_by_field_name("body") {
                self.visit_stmt(body);
            }
            let finally_end = self.new_node(CfgKind::FinallyEnd, finally_clause);
            self.link_to(finally_end);
            self.defer(finally_end, CfgEdgeKind::Eps);
        }
    }

    fn visit_return(&mut self, n: Node<'a>) {
        let idx = self.new_node(CfgKind::Return, n);
        self.link_to(idx);
        self.dont_pop = true;
    }

    fn visit_throw(&mut self, n: Node<'a>) {
        let idx = self.new_node(CfgKind::Throw, n);
        self.link_to(idx);
        if let Some(&try_end) = self.try_blocks.last() {
            self.graph.add_edge(idx, try_end, CfgEdgeKind::Throws);
        }
        self.dont_pop = true;
    }

    fn visit_break(&mut self, n: Node<'a>) {
        let idx = self.new_node(CfgKind::Break, n);
        self.link_to(idx);
        let target = match self.label_of(n) {
            Some(label) => self.labeled_blocks.get(&label).map(|b| b.end),
            None => self.loop_blocks.last().map(|b| b.end),
        };
        if let Some(t) = target {
            self.graph.add_edge(idx, t, CfgEdgeKind::Eps);
        }
        self.dont_pop = true;
    }

    fn visit_continue(&mut self, n: Node<'a>) {
        let idx = self.new_node(CfgKind::Continue, n);
        self.link_to(idx);
        let target = match self.label_of(n) {
            Some(label) => self.labeled_blocks.get(&label).map(|b| b.start),
            None => self.loop_blocks.last().map(|b| b.start),
        };
        if let Some(t) = target {
            self.graph.add_edge(idx, t, CfgEdgeKind::Eps);
        }
        self.dont_pop = true;
    }

    fn visit_labeled(&mut self, n: Node<'a>) {
        let label = self.label_of(n).unwrap_or_default();
        let label_node = self.new_node(CfgKind::Label, n);
        self.link_to(label_node);
        let label_end = self.new_node(CfgKind::LabelEnd, n);

        self.labeled_blocks.insert(
            label.clone(),
            BlockBounds {
                start: label_node,
                end: label_end,
            },
        );
        self.pending = vec![(label_node, CfgEdgeKind::Eps)];
        if let Some(body) = n.named_child(1) {
            self.visit_stmt(body);
        }
        self.labeled_blocks.remove(&label);
        self.link_to(label_end);
        self.defer(label_end, CfgEdgeKind::Eps);
    }

    fn visit_sync(&mut self, n: Node<'a>) {
        let idx = self.new_node(CfgKind::Sync, n);
        self.link_to(idx);
        let end = self.new_node(CfgKind::SyncEnd, n);
        self.pending = vec![(idx, CfgEdgeKind::Eps)];
        if let Some(body) = n.child_by_field_name("body") {
            self.visit_stmt(body);
        }
        self.link_to(end);
        self.defer(end, CfgEdgeKind::Eps);
    }
}

/// Build a CFG for a single `method_declaration`/`constructor_declaration`
/// node.
pub fn build_method(file: &str, qualified_name: &str, method_node: Node, src: &[u8]) -> MethodCfg {
    let mut builder = CfgBuilder {
        graph: Cfg::new(),
        src,
        file: file.to_owned(),
        qualified_name: qualified_name.to_owned(),
        pending: Vec::new(),
        dont_pop: false,
        loop_blocks: Vec::new(),
        labeled_blocks: HashMap::new(),
        try_blocks: Vec::new(),
    };

    let entry = builder.new_node(CfgKind::Entry, method_node);
    builder.defer(entry, CfgEdgeKind::Eps);
    if let Some(body) = method_node.child_by_field_name("body") {
        builder.visit_block(body);
    }

    MethodCfg {
        qualified_name: qualified_name.to_owned(),
        graph: builder.graph,
        entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(src: &str) -> tree_sitter::Tree {
        let mut p = Parser::new();
        p.set_language(&tree_sitter_java::LANGUAGE.into()).unwrap();
        p.parse(src, None).unwrap()
    }

    fn find_method<'a>(root: Node<'a>) -> Node<'a> {
        let mut cursor = root.walk();
        fn search<'a>(n: Node<'a>, cursor: &mut tree_sitter::TreeCursor<'a>) -> Option<Node<'a>> {
            for child in n.named_children(cursor) {
                if child.kind() == "method_declaration" {
                    return Some(child);
                }
                let mut c2 = child.walk();
                if let Some(found) = search(child, &mut c2) {
                    return Some(found);
                }
            }
            None
        }
        search(root, &mut cursor).expect("method not found")
    }

    #[test]
    fn if_else_merges_at_if_end() {
        let src = "class C { void m(int x) { if (x > 0) { return; } else { x = 1; } } }";
        let tree = parse(src);
        let method = find_method(tree.root_node());
        let cfg = build_method("C.java", "C.m", method, src.as_bytes());
        assert!(cfg.graph.node_count() > 1);
        assert!(
            cfg.graph
                .node_weights()
                .any(|n| matches!(n.kind, CfgKind::IfEnd))
        );
    }

    #[test]
    fn while_loop_has_true_and_false_edges() {
        let src = "class C { void m() { while (true) { foo(); } } }";
        let tree = parse(src);
        let method = find_method(tree.root_node());
        let cfg = build_method("C.java", "C.m", method, src.as_bytes());
        let has_true = cfg.graph.edge_weights().any(|e| matches!(e, CfgEdgeKind::True));
        let has_false = cfg.graph.edge_weights().any(|e| matches!(e, CfgEdgeKind::False));
        assert!(has_true && has_false);
    }

    #[test]
    fn switch_case_without_break_falls_through_via_false_edge() {
        let src = "class C { void m(int x) { switch (x) { \
                    case 1: foo(); \
                    case 2: bar(); break; \
                    default: baz(); } } }";
        let tree = parse(src);
        let method = find_method(tree.root_node());
        let cfg = build_method("C.java", "C.m", method, src.as_bytes());

        let case_indices: Vec<_> = cfg
            .graph
            .node_indices()
            .filter(|&i| matches!(cfg.graph[i].kind, CfgKind::CaseStmt))
            .collect();
        assert_eq!(case_indices.len(), 3);

        // case 1's body (no break) must reach case 2's CaseStmt node via a
        // False edge, not go straight to SwitchEnd.
        let reaches_next_case_via_false = cfg.graph.edge_indices().any(|e| {
            let (_, dst) = cfg.graph.edge_endpoints(e).unwrap();
            matches!(cfg.graph[e], CfgEdgeKind::False) && case_indices.contains(&dst)
        });
        assert!(reaches_next_case_via_false);
    }

    #[test]
    fn entry_node_has_no_incoming_edges() {
        let src = "class C { void m() { foo(); } }";
        let tree = parse(src);
        let method = find_method(tree.root_node());
        let cfg = build_method("C.java", "C.m", method, src.as_bytes());
        let incoming = cfg
            .graph
            .edges_directed(cfg.entry, petgraph::Direction::Incoming)
            .count();
        assert_eq!(incoming, 0);
    }
}
