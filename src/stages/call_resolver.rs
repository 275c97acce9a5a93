//! Call resolver (SPEC_FULL.md §4.6). Resolves a call site's callee
//! qualified name via receiver-type lookup (method parameters, then locals,
//! then fields of the enclosing class) or, for unqualified calls, the
//! enclosing class itself.
//! On success the containing DFG node's `ip_defs` is set to the callee's
//! CFG/DFG entry `SharedId` so the reachability engine (§4.8) can descend
//! into it.
//!
//! Like the DEF/USE analyzer, call sites are found by re-parsing each DFG
//! node's source text as a standalone statement rather than sharing a parse
//! tree with the AST builder.

use crate::ids::SharedId;
use crate::model::class::{ClassRecord, ParamRecord};
use crate::model::dfg::MethodDfg;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

const BUILTIN_TYPES: &[&str] = &[
    "String",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Boolean",
    "Character",
    "Byte",
    "Short",
    "Object",
    "List",
    "ArrayList",
    "Map",
    "HashMap",
    "Set",
    "HashSet",
    "StringBuilder",
    "StringBuffer",
    "int",
    "long",
    "double",
    "float",
    "boolean",
    "char",
    "byte",
    "short",
    "void",
];

struct CallSite {
    method_name: String,
    receiver: Option<String>,
}

fn text<'a>(n: Node<'a>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[n.start_byte()..n.end_byte()]).unwrap_or("")
}

fn find_method_invocation(n: Node, src: &[u8]) -> Option<CallSite> {
    if n.kind() == "method_invocation" {
        let method_name = n.child_by_field_name("name")?;
        let receiver = n
            .child_by_field_name("object")
            .map(|o| text(o, src).to_owned());
        return Some(CallSite {
            method_name: text(method_name, src).to_owned(),
            receiver,
        });
    }
    let mut cursor = n.walk();
    for child in n.named_children(&mut cursor) {
        if let Some(found) = find_method_invocation(child, src) {
            return Some(found);
        }
    }
    None
}

fn find_call_in_code(code: &str) -> Option<CallSite> {
    let wrapped = format!("class __Z{{ void __m(){{ {code} }} }}");
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_java::LANGUAGE.into()).ok()?;
    let tree = parser.parse(&wrapped, None)?;
    find_method_invocation(tree.root_node(), wrapped.as_bytes())
}

fn is_builtin_type(ty: &str) -> bool {
    let simple = ty.trim_end_matches("[]").trim();
    BUILTIN_TYPES.contains(&simple)
}

fn simple_type_name(ty: &str) -> &str {
    ty.split(['<', '[']).next().unwrap_or(ty).trim()
}

/// Lookup order per SPEC_FULL.md §4.6: method parameters, then locals, then
/// fields of the enclosing class. `this.method(...)` and unqualified calls
/// both resolve to the enclosing class directly.
fn resolve_callee(
    call: &CallSite,
    owning_class: &ClassRecord,
    owning_params: &[ParamRecord],
    locals: &HashMap<String, String>,
    classes: &HashMap<String, ClassRecord>,
) -> Option<String> {
    match &call.receiver {
        None => Some(format!("{}.{}", owning_class.qualified_name, call.method_name)),
        Some(r) if r == "this" => {
            Some(format!("{}.{}", owning_class.qualified_name, call.method_name))
        }
        Some(r) => {
            let ty = owning_params
                .iter()
                .find(|p| &p.name == r)
                .map(|p| p.ty.clone())
                .or_else(|| locals.get(r).cloned())
                .or_else(|| {
                    owning_class
                        .fields
                        .iter()
                        .find(|f| &f.name == r)
                        .map(|f| f.ty.clone())
                })?;

            let simple_ty = simple_type_name(&ty);
            if is_builtin_type(simple_ty) {
                return None;
            }

            classes
                .values()
                .find(|c| c.name == simple_ty || c.qualified_name == simple_ty)
                .map(|c| format!("{}.{}", c.qualified_name, call.method_name))
        }
    }
}

/// Walk every DFG node, resolve any call site it contains, and set `ip_defs`
/// to the callee's entry `SharedId` when resolution succeeds and the callee
/// has a known CFG entry. `method_entries` maps `{qualifiedClass}.{method}`
/// (overloads collapsed onto one target by name only, per SPEC_FULL.md §9)
/// to that method's CFG entry `SharedId`.
pub fn resolve(
    dfg: &mut MethodDfg,
    owning_class: &ClassRecord,
    owning_params: &[ParamRecord],
    locals: &HashMap<String, String>,
    classes: &HashMap<String, ClassRecord>,
    method_entries: &HashMap<String, SharedId>,
) {
    let indices: Vec<_> = dfg.graph.node_indices().collect();
    for idx in indices {
        let code = dfg.graph[idx].code.clone();
        let Some(call) = find_call_in_code(&code) else {
            continue;
        };
        let Some(callee_qn) = resolve_callee(&call, owning_class, owning_params, locals, classes)
        else {
            continue;
        };
        if let Some(&entry) = method_entries.get(&callee_qn) {
            dfg.graph[idx].ip_defs = Some(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class::{FieldRecord, MethodRecord};
    use crate::model::dfg::{Dfg, DfgNode};

    fn class(qn: &str, name: &str, fields: Vec<FieldRecord>) -> ClassRecord {
        ClassRecord {
            qualified_name: qn.into(),
            package: qn.rsplit_once('.').map(|(p, _)| p.to_owned()).unwrap_or_default(),
            name: name.into(),
            extends: None,
            implements: vec![],
            imports: vec![],
            modifiers: vec![],
            annotations: vec![],
            fields,
            methods: vec![],
        }
    }

    fn method_record(name: &str) -> MethodRecord {
        MethodRecord {
            modifier: Some("public".into()),
            is_static: false,
            is_abstract: false,
            ret_type: Some("void".into()),
            name: name.into(),
            params: vec![],
            line: 1,
            shared_id: SharedId::new("T.java", "method_declaration", 0, 1),
            annotations: vec![],
        }
    }

    #[test]
    fn unqualified_call_resolves_to_enclosing_class() {
        let owner = class("a.b.C", "C", vec![]);
        let call = CallSite {
            method_name: "helper".into(),
            receiver: None,
        };
        let classes = HashMap::new();
        let qn = resolve_callee(&call, &owner, &[], &HashMap::new(), &classes).unwrap();
        assert_eq!(qn, "a.b.C.helper");
    }

    #[test]
    fn field_receiver_resolves_through_user_class() {
        let owner = class(
            "a.b.C",
            "C",
            vec![FieldRecord {
                modifier: Some("private".into()),
                is_static: false,
                ty: "Dao".into(),
                name: "dao".into(),
            }],
        );
        let mut classes = HashMap::new();
        classes.insert("a.b.Dao".to_string(), class("a.b.Dao", "Dao", vec![]));

        let call = CallSite {
            method_name: "save".into(),
            receiver: Some("dao".into()),
        };
        let qn = resolve_callee(&call, &owner, &[], &HashMap::new(), &classes).unwrap();
        assert_eq!(qn, "a.b.Dao.save");
    }

    #[test]
    fn local_variable_receiver_resolves_through_user_class() {
        let owner = class("a.b.C", "C", vec![]);
        let mut classes = HashMap::new();
        classes.insert("a.b.Foo".to_string(), class("a.b.Foo", "Foo", vec![]));
        let mut locals = HashMap::new();
        locals.insert("f".to_string(), "Foo".to_string());

        let call = CallSite {
            method_name: "bar".into(),
            receiver: Some("f".into()),
        };
        let qn = resolve_callee(&call, &owner, &[], &locals, &classes).unwrap();
        assert_eq!(qn, "a.b.Foo.bar");
    }

    #[test]
    fn builtin_receiver_type_does_not_resolve() {
        let owner = class("a.b.C", "C", vec![]);
        let params = vec![ParamRecord {
            is_final: false,
            annotations: vec![],
            ty: "String".into(),
            name: "name".into(),
        }];
        let call = CallSite {
            method_name: "length".into(),
            receiver: Some("name".into()),
        };
        let classes = HashMap::new();
        assert!(resolve_callee(&call, &owner, &params, &HashMap::new(), &classes).is_none());
    }

    #[test]
    fn resolve_sets_ip_defs_for_known_callee() {
        let owner = class("a.b.C", "C", vec![]);
        let mut graph: Dfg = Dfg::new();
        let sid = SharedId::new("C.java", "expression_statement", 0, 10);
        let idx = graph.add_node(DfgNode::new(
            sid,
            "a.b.C.m".into(),
            "C.java".into(),
            1,
            "helper();".into(),
        ));
        let mut dfg = MethodDfg {
            qualified_name: "a.b.C.m".into(),
            graph,
            entry: idx,
        };

        let entry_sid = SharedId::new("C.java", "method_declaration", 50, 90);
        let mut entries = HashMap::new();
        entries.insert("a.b.C.helper".to_string(), entry_sid);
        let classes = HashMap::new();

        resolve(
            &mut dfg,
            &owner,
            &method_record("m").params,
            &HashMap::new(),
            &classes,
            &entries,
        );
        assert_eq!(dfg.graph[idx].ip_defs, Some(entry_sid));
    }
}
