//! Source/sink finder (SPEC_FULL.md §4.7). Structural AST queries keyed by
//! the configured web-framework family, plus a framework-independent sink
//! pass over every `Call` node's method name.

use crate::config::WebFramework;
use crate::model::ast::{Ast, AstId, AstNode, AstKind};
use crate::model::class::ClassRecord;
use crate::model::taint::TaintSite;
use crate::sinks::{
    self, SPRINGMVC_CONTROLLER_ANNOTATIONS, SPRINGMVC_MAPPING_ANNOTATIONS,
    SPRINGMVC_PARAM_ANNOTATIONS, STRUTS2_ACTION_BASE, VulnKind,
};
use std::collections::{HashMap, HashSet};

/// Bounds the `extends` chain walk below so a corrupt/cyclic class table
/// (never produced by the extractor, but not guaranteed by the type) can't
/// loop forever.
const MAX_SUPERCLASS_DEPTH: usize = 32;

/// Walks `class`'s `extends` chain through `classes`, matching by simple or
/// qualified name (SPEC_FULL.md §4.7: "any class whose transitive parent is
/// the framework base class"). Mirrors the original's `hasSuperClass`.
fn has_transitive_superclass(
    class: &ClassRecord,
    target: &str,
    classes: &HashMap<String, ClassRecord>,
) -> bool {
    let mut current = class.extends.clone();
    for _ in 0..MAX_SUPERCLASS_DEPTH {
        let Some(super_name) = current else {
            return false;
        };
        if super_name == target {
            return true;
        }
        let Some(parent) = classes
            .values()
            .find(|c| c.name == super_name || c.qualified_name == super_name)
        else {
            return false;
        };
        current = parent.extends.clone();
    }
    false
}

fn name_child<'a>(ast: &'a Ast, node: &AstNode) -> Option<&'a AstNode> {
    node.children
        .iter()
        .map(|&c| ast.get(c))
        .find(|c| c.kind == AstKind::Name)
}

fn args_child<'a>(ast: &'a Ast, node: &AstNode) -> Option<&'a AstNode> {
    node.children
        .iter()
        .map(|&c| ast.get(c))
        .find(|c| c.kind == AstKind::Args)
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Sinks are discovered independent of framework: any `Call` node whose
/// method name matches [`sinks::SINKS`].
pub fn find_sinks(ast: &Ast) -> Vec<TaintSite> {
    let mut sites = Vec::new();
    for node in ast.iter() {
        if node.kind != AstKind::Call {
            continue;
        }
        let Some(name_node) = name_child(ast, node) else {
            continue;
        };
        let Some(kind) = sinks::classify_sink(&name_node.code) else {
            continue;
        };
        let argument = args_child(ast, node).map(|a| a.code.clone());
        sites.push(TaintSite {
            shared_id: node.shared_id,
            description: format!("{}(...)", name_node.code),
            kind,
            file: node.file.clone(),
            line: node.line,
            argument,
        });
    }
    sites
}

/// Struts2 sources (SPEC_FULL.md §4.7): for classes transitively extending
/// `ActionSupport`, two categories of node are taint sources (the framework
/// implicitly binds HTTP parameters to matching fields):
/// (a) getter calls and form-field method parameters named after a declared
///     field, and
/// (b) setter invocations and direct assignments to a declared field.
fn find_struts2_sources(
    ast: &Ast,
    class: &ClassRecord,
    classes: &HashMap<String, ClassRecord>,
) -> Vec<TaintSite> {
    if !has_transitive_superclass(class, STRUTS2_ACTION_BASE, classes) {
        return Vec::new();
    }
    let field_names: HashSet<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
    let mut sites = Vec::new();

    for node in ast.iter() {
        match node.kind {
            AstKind::Call => {
                let Some(name_node) = name_child(ast, node) else {
                    continue;
                };
                if let Some(suffix) = name_node.code.strip_prefix("get") {
                    let candidate = decapitalize(suffix);
                    if field_names.contains(candidate.as_str()) {
                        sites.push(TaintSite {
                            shared_id: node.shared_id,
                            description: format!("{}(...) on {}", name_node.code, class.qualified_name),
                            kind: VulnKind::empty(),
                            file: node.file.clone(),
                            line: node.line,
                            argument: None,
                        });
                        continue;
                    }
                }
                let Some(suffix) = name_node.code.strip_prefix("set") else {
                    continue;
                };
                let candidate = decapitalize(suffix);
                if field_names.contains(candidate.as_str()) {
                    sites.push(TaintSite {
                        shared_id: node.shared_id,
                        description: format!("{}(...) on {}", name_node.code, class.qualified_name),
                        kind: VulnKind::empty(),
                        file: node.file.clone(),
                        line: node.line,
                        argument: None,
                    });
                }
            }
            AstKind::Assign => {
                let Some(left) = node
                    .children
                    .iter()
                    .map(|&c| ast.get(c))
                    .find(|c| c.kind == AstKind::AssignLeft)
                else {
                    continue;
                };
                let name = left.code.trim().strip_prefix("this.").unwrap_or(left.code.trim());
                if field_names.contains(name) {
                    sites.push(TaintSite {
                        shared_id: node.shared_id,
                        description: format!("assignment to {name} on {}", class.qualified_name),
                        kind: VulnKind::empty(),
                        file: node.file.clone(),
                        line: node.line,
                        argument: None,
                    });
                }
            }
            AstKind::Parameter => {
                let Some(name) = node.code.split_whitespace().next_back() else {
                    continue;
                };
                if field_names.contains(name) {
                    sites.push(TaintSite {
                        shared_id: node.shared_id,
                        description: format!("parameter \"{name}\" of {}", class.qualified_name),
                        kind: VulnKind::empty(),
                        file: node.file.clone(),
                        line: node.line,
                        argument: None,
                    });
                }
            }
            _ => {}
        }
    }
    sites
}

fn find_descendant_parameter<'a>(ast: &'a Ast, root: AstId, param_name: &str) -> Option<&'a AstNode> {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = ast.get(id);
        if node.kind == AstKind::Parameter
            && node.code.split_whitespace().next_back() == Some(param_name)
        {
            return Some(node);
        }
        stack.extend(node.children.iter().copied());
    }
    None
}

/// SpringMVC sources (SPEC_FULL.md §4.7): parameters annotated with one of
/// [`SPRINGMVC_PARAM_ANNOTATIONS`] on a method annotated with one of
/// [`SPRINGMVC_MAPPING_ANNOTATIONS`], declared on a `@Controller`/
/// `@RestController` class.
fn find_springmvc_sources(ast: &Ast, class: &ClassRecord) -> Vec<TaintSite> {
    let is_controller = SPRINGMVC_CONTROLLER_ANNOTATIONS
        .iter()
        .any(|a| class.has_annotation(a));
    if !is_controller {
        return Vec::new();
    }

    let mut sites = Vec::new();
    for method in &class.methods {
        let is_endpoint = method
            .annotations
            .iter()
            .any(|a| SPRINGMVC_MAPPING_ANNOTATIONS.contains(&a.as_str()));
        if !is_endpoint {
            continue;
        }

        let Some(method_ast) = ast.find_by_shared_id(method.shared_id) else {
            continue;
        };
        let method_ast_id = method_ast.id;

        for param in &method.params {
            let tainted = param
                .annotations
                .iter()
                .any(|a| SPRINGMVC_PARAM_ANNOTATIONS.contains(&a.as_str()));
            if !tainted {
                continue;
            }
            let Some(param_node) = find_descendant_parameter(ast, method_ast_id, &param.name)
            else {
                continue;
            };
            sites.push(TaintSite {
                shared_id: param_node.shared_id,
                description: format!("{}({})", method.name, param.name),
                kind: VulnKind::empty(),
                file: param_node.file.clone(),
                line: param_node.line,
                argument: None,
            });
        }
    }
    sites
}

pub fn find_sources(
    ast: &Ast,
    class: &ClassRecord,
    framework: WebFramework,
    classes: &HashMap<String, ClassRecord>,
) -> Vec<TaintSite> {
    match framework {
        WebFramework::Struts2 => find_struts2_sources(ast, class, classes),
        WebFramework::SpringMvc => find_springmvc_sources(ast, class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{ast_builder, class_extractor};

    #[test]
    fn finds_sql_sink_call() {
        let src = "class C { void m() { db.executeQuery(sql); } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let sinks = find_sinks(&ast);
        assert!(sinks.iter().any(|s| s.kind == VulnKind::SQL));
    }

    fn class_map(classes: &[ClassRecord]) -> HashMap<String, ClassRecord> {
        classes
            .iter()
            .cloned()
            .map(|c| (c.qualified_name.clone(), c))
            .collect()
    }

    #[test]
    fn struts2_setter_invocation_is_a_source() {
        let src = "class C extends ActionSupport { private String q; void handle() { this.setQ(req); } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let sources = find_sources(&ast, &classes[0], WebFramework::Struts2, &class_map(&classes));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn struts2_getter_call_is_a_source() {
        let src = "class C extends ActionSupport { private String q; void handle() { log(this.getQ()); } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let sources = find_sources(&ast, &classes[0], WebFramework::Struts2, &class_map(&classes));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn struts2_form_field_parameter_is_a_source() {
        let src = "class C extends ActionSupport { private String q; String handle(String q) { return q; } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let sources = find_sources(&ast, &classes[0], WebFramework::Struts2, &class_map(&classes));
        assert!(sources.iter().any(|s| s.description.contains("parameter")));
    }

    #[test]
    fn transitive_action_subclass_has_struts2_sources() {
        let src = "class Base extends ActionSupport {} \
                    class C extends Base { private String q; void handle() { this.setQ(req); } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let c = classes.iter().find(|c| c.name == "C").unwrap();
        let sources = find_sources(&ast, c, WebFramework::Struts2, &class_map(&classes));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn non_action_class_has_no_struts2_sources() {
        let src = "class C { private String q; void handle() { this.setQ(req); } }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let sources = find_sources(&ast, &classes[0], WebFramework::Struts2, &class_map(&classes));
        assert!(sources.is_empty());
    }

    #[test]
    fn springmvc_request_param_is_a_source() {
        let src = "@Controller class C { @PostMapping(\"/u\") void h(@RequestParam String name) {} }";
        let ast = ast_builder::build("C.java", src).unwrap();
        let classes = class_extractor::extract("C.java", src).unwrap();
        let sources = find_sources(&ast, &classes[0], WebFramework::SpringMvc, &class_map(&classes));
        assert_eq!(sources.len(), 1);
    }
}
