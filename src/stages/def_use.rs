//! DEF/USE analyzer (SPEC_FULL.md §4.4). Builds one DFG node per
//! statement-level CFG node (sharing its `SharedId`) and decorates it with
//! the DEFs/USEs/SelfFlows sets the DFG edge builder (§4.5) consumes.
//!
//! Each CFG node's source text is re-parsed as a standalone statement
//! (wrapped in a throwaway method body) rather than carrying the original
//! file's parse tree across stage boundaries — the same independent-reparse
//! approach the AST builder and class extractor use.

use crate::model::cfg::{CfgKind, MethodCfg};
use crate::model::dfg::{Dfg, DfgNode, MethodDfg};
use std::collections::HashSet;
use tree_sitter::{Node, Parser};

const MUTATOR_PREFIXES: &[&str] = &["set", "put", "add", "insert", "push", "append"];

#[derive(Debug, Default, Clone)]
struct DefUseInfo {
    defs: HashSet<String>,
    uses: HashSet<String>,
    self_flows: HashSet<String>,
}

fn text<'a>(n: Node<'a>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[n.start_byte()..n.end_byte()]).unwrap_or("")
}

fn simple_name(n: Node, src: &[u8]) -> Option<String> {
    match n.kind() {
        "identifier" => Some(text(n, src).to_owned()),
        "field_access" => n
            .child_by_field_name("object")
            .filter(|o| o.kind() == "this")
            .and(n.child_by_field_name("field"))
            .map(|f| text(f, src).to_owned()),
        _ => None,
    }
}

fn collect_uses(n: Node, src: &[u8], out: &mut HashSet<String>) {
    match n.kind() {
        "identifier" => {
            out.insert(text(n, src).to_owned());
        }
        "field_access" => {
            if let Some(name) = simple_name(n, src) {
                out.insert(name);
            } else if let Some(obj) = n.child_by_field_name("object") {
                collect_uses(obj, src, out);
            }
        }
        // Array index positions and literals are excluded from USEs
        // (SPEC_FULL.md §4.4); method_invocation's callee name is not a
        // use, only its receiver and arguments are.
        "decimal_integer_literal" | "string_literal" | "character_literal" | "true" | "false"
        | "null_literal" => {}
        "method_invocation" => {
            let mut cursor = n.walk();
            if let Some(obj) = n.child_by_field_name("object") {
                collect_uses(obj, src, out);
            }
            if let Some(args) = n.child_by_field_name("arguments") {
                for c in args.named_children(&mut cursor) {
                    collect_uses(c, src, out);
                }
            }
        }
        _ => {
            let mut cursor = n.walk();
            for c in n.named_children(&mut cursor) {
                collect_uses(c, src, out);
            }
        }
    }
}

fn analyze(n: Node, src: &[u8]) -> DefUseInfo {
    let mut info = DefUseInfo::default();

    match n.kind() {
        "local_variable_declaration" => {
            let mut cursor = n.walk();
            for declarator in n.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    info.defs.insert(text(name, src).to_owned());
                }
                if let Some(value) = declarator.child_by_field_name("value") {
                    collect_uses(value, src, &mut info.uses);
                }
            }
        }
        "assignment_expression" => {
            let op = n.child_by_field_name("operator").map(|o| text(o, src));
            if let Some(left) = n.child_by_field_name("left") {
                if let Some(name) = simple_name(left, src) {
                    info.defs.insert(name.clone());
                    if op.is_some_and(|o| o != "=") {
                        info.self_flows.insert(name.clone());
                        info.uses.insert(name);
                    }
                }
            }
            if let Some(right) = n.child_by_field_name("right") {
                collect_uses(right, src, &mut info.uses);
            }
        }
        "update_expression" => {
            let operand = n.named_child(0);
            if let Some(name) = operand.and_then(|o| simple_name(o, src)) {
                info.defs.insert(name.clone());
                info.self_flows.insert(name.clone());
                info.uses.insert(name);
            }
        }
        "method_invocation" => {
            if let Some(method_name) = n.child_by_field_name("name").map(|m| text(m, src)) {
                if MUTATOR_PREFIXES.iter().any(|p| method_name.starts_with(p)) {
                    if let Some(obj) = n.child_by_field_name("object") {
                        if let Some(name) = simple_name(obj, src) {
                            info.defs.insert(name);
                        }
                    }
                }
            }
            collect_uses(n, src, &mut info.uses);
        }
        _ => {
            collect_uses(n, src, &mut info.uses);
        }
    }

    info
}

fn analyze_code(code: &str) -> DefUseInfo {
    let wrapped = format!("class __Z{{ void __m(){{ {code} }} }}");
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_java::LANGUAGE.into()).is_err() {
        return DefUseInfo::default();
    }
    let Some(tree) = parser.parse(&wrapped, None) else {
        return DefUseInfo::default();
    };

    let src = wrapped.as_bytes();
    let root = tree.root_node();
    let Some(stmt) = find_first_statement(root) else {
        return DefUseInfo::default();
    };
    analyze(stmt, src)
}

fn find_first_statement(n: Node) -> Option<Node> {
    if n.kind() == "block" {
        let mut cursor = n.walk();
        return n.named_children(&mut cursor).next();
    }
    let mut cursor = n.walk();
    for child in n.named_children(&mut cursor) {
        if let Some(found) = find_first_statement(child) {
            return Some(found);
        }
    }
    None
}

fn is_statement_level(kind: CfgKind) -> bool {
    matches!(
        kind,
        CfgKind::Assign
            | CfgKind::Expr
            | CfgKind::If
            | CfgKind::While
            | CfgKind::DoWhile
            | CfgKind::ForExpr
            | CfgKind::Switch
            | CfgKind::Throw
            | CfgKind::Return
            | CfgKind::Catch
            | CfgKind::Resource
    )
}

/// Build the DFG skeleton for `cfg`: one node per statement-level CFG node
/// plus a leading node for `Entry` itself (so a method parameter source has
/// somewhere to lift to — SPEC_FULL.md §4.8's "walk up parent links until a
/// SharedId present in a DFG is found" otherwise never terminates for a bare
/// parameter reference). The `Entry` node's DEFs are `params` filtered by
/// `known`, standing in for "this method's parameters are defined on entry".
pub fn build(cfg: &MethodCfg, params: &HashSet<String>, known: &HashSet<String>) -> MethodDfg {
    let mut graph: Dfg = Dfg::new();
    let mut entry = None;

    for idx in cfg.graph.node_indices() {
        let node = &cfg.graph[idx];
        let is_entry = matches!(node.kind, CfgKind::Entry);
        if !is_entry && !is_statement_level(node.kind) {
            continue;
        }

        let mut dfg_node = DfgNode::new(
            node.shared_id,
            node.method.clone(),
            node.file.clone(),
            node.line,
            node.code.clone(),
        );

        if is_entry {
            dfg_node.defs = params.intersection(known).cloned().collect();
        } else {
            let info = analyze_code(&node.code);
            dfg_node.defs = info.defs.intersection(known).cloned().collect();
            dfg_node.uses = info.uses.intersection(known).cloned().collect();
            dfg_node.self_flows = info.self_flows.intersection(known).cloned().collect();
        }

        let dfg_idx = graph.add_node(dfg_node);
        if entry.is_none() {
            entry = Some(dfg_idx);
        }
    }

    let entry = entry.expect("CFG always has at least an Entry node");

    MethodDfg {
        qualified_name: cfg.qualified_name.clone(),
        graph,
        entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn assignment_records_def_and_use() {
        let info = analyze_code("x = y + 1;");
        assert!(info.defs.contains("x"));
        assert!(info.uses.contains("y"));
    }

    #[test]
    fn compound_assignment_is_self_flow() {
        let info = analyze_code("x += 1;");
        assert!(info.self_flows.contains("x"));
        assert!(info.uses.contains("x"));
    }

    #[test]
    fn increment_is_def_use_and_self_flow() {
        let info = analyze_code("i++;");
        assert!(info.defs.contains("i"));
        assert!(info.self_flows.contains("i"));
    }

    #[test]
    fn setter_call_marks_receiver_as_def() {
        let info = analyze_code("form.setName(userInput);");
        assert!(info.defs.contains("form"));
        assert!(info.uses.contains("userInput"));
    }

    #[test]
    fn unresolved_symbols_are_dropped_by_known_filter() {
        let info = analyze_code("x = y + 1;");
        let k = known(&["x"]);
        let filtered: HashSet<String> = info.uses.intersection(&k).cloned().collect();
        assert!(filtered.is_empty());
    }
}
