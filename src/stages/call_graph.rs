//! Call graph builder (SPEC_FULL.md §4.9). A structural pass independent of
//! the reachability engine: for each method, collect the textual callee
//! names reachable from its own AST subtree without descending into any
//! callee's body (trivially true since a caller's AST never contains a
//! callee's statements). Exposed only via the `callgraph` CLI target and the
//! store query layer.

use crate::model::ast::{Ast, AstId, AstKind};
use crate::model::class::ClassRecord;
use std::collections::HashMap;

fn collect_calls(ast: &Ast, id: AstId, out: &mut Vec<String>) {
    let node = ast.get(id);
    if node.kind == AstKind::Call {
        if let Some(name) = node
            .children
            .iter()
            .map(|&c| ast.get(c))
            .find(|c| c.kind == AstKind::Name)
        {
            out.push(name.code.clone());
        }
    }
    for &child in &node.children {
        collect_calls(ast, child, out);
    }
}

/// Method overloads collapse onto one call-graph entry keyed by name only
/// (SPEC_FULL.md §9), matching the call resolver's own overload handling.
pub fn build(ast: &Ast, classes: &[ClassRecord]) -> HashMap<String, Vec<String>> {
    let mut graph: HashMap<String, Vec<String>> = HashMap::new();

    for class in classes {
        for method in &class.methods {
            let qn = format!("{}.{}", class.qualified_name, method.name);
            let Some(method_node) = ast.find_by_shared_id(method.shared_id) else {
                continue;
            };

            let mut callees = Vec::new();
            collect_calls(ast, method_node.id, &mut callees);
            callees.sort();
            callees.dedup();

            graph.entry(qn).or_default().extend(callees);
        }
    }

    for callees in graph.values_mut() {
        callees.sort();
        callees.dedup();
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{ast_builder, class_extractor};

    #[test]
    fn records_direct_callees() {
        let src = "class C { void a() { b(); c(); } void b() {} void c() {} }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let graph = build(&ast, &classes);

        let callees = graph.get("C.a").unwrap();
        assert!(callees.contains(&"b".to_string()));
        assert!(callees.contains(&"c".to_string()));
    }

    #[test]
    fn leaf_method_has_no_callees() {
        let src = "class C { void b() { int x = 1; } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let graph = build(&ast, &classes);

        assert!(graph.get("C.b").unwrap().is_empty());
    }
}
