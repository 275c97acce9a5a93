//! Class extractor (SPEC_FULL.md §4.2). A second visitor over the same
//! parse tree the AST builder walks, producing the class table the call
//! resolver and source/sink finder key off of.

use crate::errors::{CpgError, CpgResult};
use crate::ids::SharedId;
use crate::model::class::{ClassRecord, FieldRecord, MethodRecord, ParamRecord};
use tree_sitter::{Node, Parser};

fn text<'a>(n: Node<'a>, src: &'a [u8]) -> String {
    std::str::from_utf8(&src[n.start_byte()..n.end_byte()])
        .unwrap_or("")
        .to_owned()
}

fn modifiers_of<'a>(n: Node<'a>, src: &'a [u8]) -> Vec<String> {
    n.child_by_field_name("modifiers")
        .map(|m| {
            let mut cursor = m.walk();
            m.named_children(&mut cursor)
                .map(|c| text(c, src))
                .collect()
        })
        .unwrap_or_default()
}

fn annotations_of(modifiers: &[String]) -> Vec<String> {
    modifiers
        .iter()
        .filter(|m| m.starts_with('@'))
        .map(|m| m.trim_start_matches('@').to_owned())
        .collect()
}

fn params_of<'a>(n: Node<'a>, src: &'a [u8]) -> Vec<ParamRecord> {
    let Some(params) = n.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for p in params.named_children(&mut cursor) {
        if p.kind() != "formal_parameter" && p.kind() != "spread_parameter" {
            continue;
        }
        let mods = modifiers_of(p, src);
        out.push(ParamRecord {
            is_final: mods.iter().any(|m| m == "final"),
            annotations: annotations_of(&mods),
            ty: p
                .child_by_field_name("type")
                .map(|t| text(t, src))
                .unwrap_or_default(),
            name: p
                .child_by_field_name("name")
                .map(|t| text(t, src))
                .unwrap_or_default(),
        });
    }
    out
}

fn extract_fields<'a>(body: Node<'a>, src: &'a [u8]) -> Vec<FieldRecord> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "field_declaration" {
            continue;
        }
        let mods = modifiers_of(member, src);
        let modifier = mods
            .iter()
            .find(|m| matches!(m.as_str(), "public" | "private" | "protected"))
            .cloned();
        let is_static = mods.iter().any(|m| m == "static");
        let ty = member
            .child_by_field_name("type")
            .map(|t| text(t, src))
            .unwrap_or_default();

        let mut dc = member.walk();
        for declarator in member.named_children(&mut dc) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name = declarator
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default();
            fields.push(FieldRecord {
                modifier: modifier.clone(),
                is_static,
                ty: ty.clone(),
                name,
            });
        }
    }
    fields
}

fn extract_methods<'a>(body: Node<'a>, file: &str, src: &'a [u8]) -> Vec<MethodRecord> {
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let is_ctor = member.kind() == "constructor_declaration";
        let is_method = member.kind() == "method_declaration";
        if !is_ctor && !is_method {
            continue;
        }

        let mods = modifiers_of(member, src);
        let modifier = mods
            .iter()
            .find(|m| matches!(m.as_str(), "public" | "private" | "protected"))
            .cloned();

        methods.push(MethodRecord {
            modifier,
            is_static: mods.iter().any(|m| m == "static"),
            is_abstract: mods.iter().any(|m| m == "abstract"),
            ret_type: if is_ctor {
                None
            } else {
                member.child_by_field_name("type").map(|t| text(t, src))
            },
            name: member
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default(),
            params: params_of(member, src),
            line: member.start_position().row + 1,
            shared_id: SharedId::new(file, member.kind(), member.start_byte(), member.end_byte()),
            annotations: annotations_of(&mods),
        });
    }
    methods
}

fn visit_class<'a>(
    n: Node<'a>,
    file: &str,
    package: &str,
    src: &'a [u8],
    out: &mut Vec<ClassRecord>,
) {
    let name = n
        .child_by_field_name("name")
        .map(|x| text(x, src))
        .unwrap_or_default();
    let qualified_name = if package.is_empty() {
        name.clone()
    } else {
        format!("{package}.{name}")
    };
    let mods = modifiers_of(n, src);

    let Some(body) = n.child_by_field_name("body") else {
        return;
    };

    let record = ClassRecord {
        qualified_name,
        package: package.to_owned(),
        name,
        extends: n.child_by_field_name("superclass").map(|x| text(x, src)),
        implements: n
            .child_by_field_name("interfaces")
            .map(|x| text(x, src))
            .into_iter()
            .collect(),
        imports: Vec::new(),
        modifiers: mods
            .iter()
            .filter(|m| !m.starts_with('@'))
            .cloned()
            .collect(),
        annotations: annotations_of(&mods),
        fields: extract_fields(body, src),
        methods: extract_methods(body, file, src),
    };
    out.push(record);

    // Nested classes (SPEC_FULL.md §4.2 "top-level and nested class
    // declarations"); enums and interfaces are not recorded but may still
    // contain nested classes worth visiting.
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() == "class_declaration" {
            visit_class(member, file, package, src, out);
        }
    }
}

pub fn extract(file: &str, source: &str) -> CpgResult<Vec<ClassRecord>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(CpgError::TreeSitter)?;

    let tree = parser.parse(source, None).ok_or_else(|| CpgError::Parse {
        file: file.to_owned(),
        reason: "tree-sitter returned no tree".into(),
    })?;

    let src = source.as_bytes();
    let root = tree.root_node();

    let package = {
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .find(|c| c.kind() == "package_declaration")
            .and_then(|pkg| pkg.named_child(0))
            .map(|n| text(n, src))
            .unwrap_or_default()
    };

    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "class_declaration" {
            visit_class(child, file, &package, src, &mut out);
        }
    }

    let imports: Vec<String> = {
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .filter(|c| c.kind() == "import_declaration")
            .filter_map(|imp| imp.named_child(0))
            .map(|n| text(n, src))
            .collect()
    };
    for class in &mut out {
        class.imports = imports.clone();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_qualified_name_with_package() {
        let src = "package com.acme;\nclass Foo { private int x; void bar() {} }";
        let classes = extract("Foo.java", src).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].qualified_name, "com.acme.Foo");
        assert_eq!(classes[0].fields.len(), 1);
        assert_eq!(classes[0].methods.len(), 1);
    }

    #[test]
    fn constructor_recorded_with_no_return_type() {
        let src = "class Foo { Foo(int x) {} }";
        let classes = extract("Foo.java", src).unwrap();
        let ctor = classes[0].find_method("Foo").unwrap();
        assert!(ctor.is_constructor());
        assert_eq!(ctor.params.len(), 1);
    }

    #[test]
    fn records_class_annotations() {
        let src = "@Controller\nclass Foo { void bar() {} }";
        let classes = extract("Foo.java", src).unwrap();
        assert!(classes[0].has_annotation("Controller"));
    }
}
