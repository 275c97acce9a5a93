//! AST builder (SPEC_FULL.md §4.1). A visitor over the Tree-sitter parse
//! tree that threads a parent stack implicitly through recursion — each call
//! pushes the node it just created as the parent for its children, the same
//! shape as the teacher's `push_node`/CFG visitor, generalized from a flat
//! `Graph<NodeInfo, _>` to the arena-tree `Ast`.

use crate::errors::{CpgError, CpgResult};
use crate::ids::SharedId;
use crate::lang::{self, Kind};
use crate::model::ast::{Ast, AstId, AstKind};
use tree_sitter::{Node, Parser};

fn text_of<'a>(n: Node<'a>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[n.start_byte()..n.end_byte()]).unwrap_or("")
}

struct Builder<'a> {
    ast: Ast,
    src: &'a [u8],
    file: String,
}

impl<'a> Builder<'a> {
    fn shared_id(&self, n: Node<'a>) -> SharedId {
        SharedId::new(&self.file, n.kind(), n.start_byte(), n.end_byte())
    }

    fn push(&mut self, parent: Option<AstId>, kind: AstKind, n: Node<'a>) -> AstId {
        self.ast.push(
            parent,
            kind,
            n.start_position().row + 1,
            text_of(n, self.src).to_owned(),
            self.shared_id(n),
            self.file.clone(),
        )
    }

    /// Visit `n`'s named children generically, attaching any node whose
    /// `Kind` is AST-worthy directly under `parent`. Used for subtrees the
    /// builder does not special-case.
    fn visit_children(&mut self, parent: AstId, n: Node<'a>) {
        let mut cursor = n.walk();
        for child in n.named_children(&mut cursor) {
            self.visit(Some(parent), child);
        }
    }

    fn visit(&mut self, parent: Option<AstId>, n: Node<'a>) -> Option<AstId> {
        match lang::lookup(n.kind()) {
            Kind::Trivia => None,

            Kind::Program => {
                let id = self.push(parent, AstKind::Root, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::PackageDecl => {
                let id = self.push(parent, AstKind::Package, n);
                Some(id)
            }

            Kind::ImportDecl => {
                let id = self.push(parent, AstKind::Import, n);
                Some(id)
            }

            Kind::ClassDecl => {
                let id = self.push(parent, AstKind::Class, n);
                if let Some(name) = n.child_by_field_name("name") {
                    self.push(Some(id), AstKind::Name, name);
                }
                if let Some(sup) = n.child_by_field_name("superclass") {
                    self.push(Some(id), AstKind::Extends, sup);
                }
                if let Some(ifaces) = n.child_by_field_name("interfaces") {
                    self.push(Some(id), AstKind::Implements, ifaces);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit_children(id, body);
                }
                Some(id)
            }

            Kind::InterfaceDecl => {
                let id = self.push(parent, AstKind::Interface, n);
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit_children(id, body);
                }
                Some(id)
            }

            Kind::EnumDecl => {
                let id = self.push(parent, AstKind::Class, n);
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit_children(id, body);
                }
                Some(id)
            }

            Kind::FieldDecl => {
                let id = self.push(parent, AstKind::Field, n);
                if let Some(ty) = n.child_by_field_name("type") {
                    self.push(Some(id), AstKind::Type, ty);
                }
                Some(id)
            }

            Kind::MethodDecl | Kind::ConstructorDecl => {
                let kind = if matches!(lang::lookup(n.kind()), Kind::ConstructorDecl) {
                    AstKind::Constructor
                } else {
                    AstKind::Method
                };
                let id = self.push(parent, kind, n);
                if let Some(modifiers) = n.child_by_field_name("modifiers") {
                    self.push(Some(id), AstKind::Modifier, modifiers);
                }
                if let Some(ty) = n.child_by_field_name("type") {
                    self.push(Some(id), AstKind::RetValType, ty);
                }
                if let Some(name) = n.child_by_field_name("name") {
                    self.push(Some(id), AstKind::Name, name);
                }
                if let Some(params) = n.child_by_field_name("parameters") {
                    let params_id = self.push(Some(id), AstKind::Parameter, params);
                    self.visit_children(params_id, params);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    let block_id = self.push(Some(id), AstKind::Block, body);
                    self.visit_children(block_id, body);
                }
                Some(id)
            }

            Kind::Param => {
                let id = self.push(parent, AstKind::Parameter, n);
                Some(id)
            }

            Kind::Block => {
                let id = self.push(parent, AstKind::Block, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::If => {
                let id = self.push(parent, AstKind::If, n);
                if let Some(cond) = n.child_by_field_name("condition") {
                    let cond_id = self.push(Some(id), AstKind::Condition, cond);
                    self.visit_children(cond_id, cond);
                }
                if let Some(then) = n.child_by_field_name("consequence") {
                    let then_id = self.push(Some(id), AstKind::Then, then);
                    self.visit(Some(then_id), then);
                }
                if let Some(alt) = n.child_by_field_name("alternative") {
                    let else_id = self.push(Some(id), AstKind::Else, alt);
                    self.visit(Some(else_id), alt);
                }
                Some(id)
            }

            Kind::While => {
                let id = self.push(parent, AstKind::While, n);
                if let Some(cond) = n.child_by_field_name("condition") {
                    self.push(Some(id), AstKind::Condition, cond);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                Some(id)
            }

            Kind::DoWhile => {
                let id = self.push(parent, AstKind::DoWhile, n);
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                if let Some(cond) = n.child_by_field_name("condition") {
                    self.push(Some(id), AstKind::Condition, cond);
                }
                Some(id)
            }

            Kind::For => {
                let id = self.push(parent, AstKind::For, n);
                if let Some(init) = n.child_by_field_name("init") {
                    let init_id = self.push(Some(id), AstKind::ForInit, init);
                    self.visit_children(init_id, init);
                }
                if let Some(cond) = n.child_by_field_name("condition") {
                    self.push(Some(id), AstKind::Condition, cond);
                }
                if let Some(update) = n.child_by_field_name("update") {
                    let upd_id = self.push(Some(id), AstKind::ForUpdate, update);
                    self.visit_children(upd_id, update);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                Some(id)
            }

            Kind::ForEach => {
                let id = self.push(parent, AstKind::ForEach, n);
                if let Some(value) = n.child_by_field_name("value") {
                    self.push(Some(id), AstKind::InitValue, value);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                Some(id)
            }

            Kind::Switch => {
                let id = self.push(parent, AstKind::Switch, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::SwitchGroup => {
                let id = self.push(parent, AstKind::Case, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::Try => {
                let id = self.push(parent, AstKind::Try, n);
                if let Some(resources) = n.child_by_field_name("resources") {
                    let res_id = self.push(Some(id), AstKind::Resources, resources);
                    self.visit_children(res_id, resources);
                }
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                let mut cursor = n.walk();
                for child in n.named_children(&mut cursor) {
                    if lang::lookup(child.kind()) == Kind::Catch {
                        self.visit(Some(id), child);
                    }
                    if lang::lookup(child.kind()) == Kind::Finally {
                        self.visit(Some(id), child);
                    }
                }
                Some(id)
            }

            Kind::Catch => {
                let id = self.push(parent, AstKind::Catch, n);
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                Some(id)
            }

            Kind::Finally => {
                let id = self.push(parent, AstKind::Finally, n);
                if let Some(body) = n.child_by_field_name("body") {
                    self.visit(Some(id), body);
                }
                Some(id)
            }

            Kind::Resource => {
                let id = self.push(parent, AstKind::Resources, n);
                Some(id)
            }

            Kind::Return => {
                let id = self.push(parent, AstKind::Return, n);
                Some(id)
            }

            Kind::Throw => {
                let id = self.push(parent, AstKind::Throw, n);
                Some(id)
            }

            Kind::Break => Some(self.push(parent, AstKind::Break, n)),
            Kind::Continue => Some(self.push(parent, AstKind::Continue, n)),

            Kind::Labeled => {
                let id = self.push(parent, AstKind::Labeled, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::Sync => {
                let id = self.push(parent, AstKind::Sync, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::LocalVarDecl => {
                let id = self.push(parent, AstKind::Variable, n);
                if let Some(ty) = n.child_by_field_name("type") {
                    self.push(Some(id), AstKind::Type, ty);
                }
                Some(id)
            }

            Kind::ExprStmt => {
                let id = self.push(parent, AstKind::Statement, n);
                let mut cursor = n.walk();
                for child in n.named_children(&mut cursor) {
                    self.visit(Some(id), child);
                }
                Some(id)
            }

            Kind::Assignment => {
                let id = self.push(parent, AstKind::Assign, n);
                if let Some(left) = n.child_by_field_name("left") {
                    self.push(Some(id), AstKind::AssignLeft, left);
                }
                if let Some(right) = n.child_by_field_name("right") {
                    let right_id = self.push(Some(id), AstKind::AssignRight, right);
                    self.visit(Some(right_id), right);
                }
                Some(id)
            }

            Kind::BinaryExpr => {
                let id = self.push(parent, AstKind::BinOp, n);
                self.visit_children(id, n);
                Some(id)
            }

            Kind::UnaryExpr => Some(self.push(parent, AstKind::UnaryOp, n)),
            Kind::UpdateExpr => Some(self.push(parent, AstKind::UpdateExpr, n)),
            Kind::CastExpr => Some(self.push(parent, AstKind::Cast, n)),

            Kind::MethodCall => {
                let id = self.push(parent, AstKind::Call, n);
                if let Some(name) = n.child_by_field_name("name") {
                    self.push(Some(id), AstKind::Name, name);
                }
                if let Some(object) = n.child_by_field_name("object") {
                    self.push(Some(id), AstKind::Dot, object);
                }
                if let Some(args) = n.child_by_field_name("arguments") {
                    let args_id = self.push(Some(id), AstKind::Args, args);
                    self.visit_children(args_id, args);
                }
                Some(id)
            }

            Kind::ObjectCreation => {
                let id = self.push(parent, AstKind::Call, n);
                if let Some(args) = n.child_by_field_name("arguments") {
                    let args_id = self.push(Some(id), AstKind::Args, args);
                    self.visit_children(args_id, args);
                }
                Some(id)
            }

            Kind::FieldAccess => Some(self.push(parent, AstKind::Dot, n)),
            Kind::ArrayAccess => Some(self.push(parent, AstKind::Array, n)),
            Kind::ArrayCreation | Kind::ArrayInit => Some(self.push(parent, AstKind::ArrayInit, n)),

            Kind::Ternary => {
                let id = self.push(parent, AstKind::Ternary, n);
                if let Some(cond) = n.child_by_field_name("condition") {
                    self.push(Some(id), AstKind::TernaryPredicate, cond);
                }
                if let Some(t) = n.child_by_field_name("consequence") {
                    self.push(Some(id), AstKind::TernaryTrue, t);
                }
                if let Some(f) = n.child_by_field_name("alternative") {
                    self.push(Some(id), AstKind::TernaryFalse, f);
                }
                Some(id)
            }

            Kind::Literal => Some(self.push(parent, AstKind::Literal, n)),
            Kind::Identifier => Some(self.push(parent, AstKind::Name, n)),
            Kind::TypeNode => Some(self.push(parent, AstKind::Type, n)),
            Kind::Modifiers => Some(self.push(parent, AstKind::Modifier, n)),
            Kind::Annotation => Some(self.push(parent, AstKind::Annotation, n)),

            Kind::Other => {
                let mut cursor = n.walk();
                let mut last = None;
                for child in n.named_children(&mut cursor) {
                    last = self.visit(parent, child).or(last);
                }
                last
            }
        }
    }
}

/// Parse `source` and build its AST. Returns `Err` without emitting a
/// partial tree if the file fails to parse (SPEC_FULL.md §4.1 "Failure").
pub fn build(file: &str, source: &str) -> CpgResult<Ast> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(CpgError::TreeSitter)?;

    let tree = parser.parse(source, None).ok_or_else(|| CpgError::Parse {
        file: file.to_owned(),
        reason: "tree-sitter returned no tree".into(),
    })?;

    if tree.root_node().has_error() {
        return Err(CpgError::Parse {
            file: file.to_owned(),
            reason: "syntax error in source file".into(),
        });
    }

    let mut builder = Builder {
        ast: Ast::new(),
        src: source.as_bytes(),
        file: file.to_owned(),
    };
    builder.visit(None, tree.root_node());
    Ok(builder.ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::AstKind;

    #[test]
    fn builds_root_for_trivial_class() {
        let src = "class Foo { void bar() { int x = 1; } }";
        let ast = build("Foo.java", src).unwrap();
        assert!(!ast.is_empty());
        assert_eq!(ast.get(ast.root.unwrap()).kind, AstKind::Root);
    }

    #[test]
    fn finds_method_and_variable_nodes() {
        let src = "class Foo { void bar() { int x = 1; } }";
        let ast = build("Foo.java", src).unwrap();
        assert!(ast.iter().any(|n| n.kind == AstKind::Method));
        assert!(ast.iter().any(|n| n.kind == AstKind::Variable));
    }

    #[test]
    fn rejects_file_with_syntax_error() {
        let src = "class Foo { void bar( { } }";
        assert!(build("Foo.java", src).is_err());
    }
}
