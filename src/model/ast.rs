//! The semantic AST (SPEC_FULL.md §3, §4.1). A plain arena rather than a
//! `petgraph` graph: the AST is a tree (parent→child only), so there is
//! nothing to gain from a general graph representation, and arena indices
//! are cheap to carry around the visitor's parent stack.

use crate::ids::SharedId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type AstId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstKind {
    Root,
    Package,
    Import,
    Class,
    Interface,
    Method,
    Constructor,
    Field,
    Parameter,
    Block,
    If,
    Condition,
    Then,
    Else,
    While,
    DoWhile,
    For,
    ForInit,
    ForUpdate,
    ForEach,
    Switch,
    Case,
    Default,
    Try,
    Resources,
    Catch,
    Finally,
    Return,
    Throw,
    Sync,
    Labeled,
    Break,
    Continue,
    Statement,
    Variable,
    InitValue,
    AssignLeft,
    AssignRight,
    Assign,
    BinOp,
    UnaryOp,
    UpdateExpr,
    Cast,
    Call,
    Args,
    Dot,
    Array,
    ArrayInit,
    Literal,
    Name,
    Type,
    RetValType,
    Modifier,
    Annotation,
    Ternary,
    TernaryPredicate,
    TernaryTrue,
    TernaryFalse,
    Extends,
    Implements,
    StaticBlock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub id: AstId,
    pub kind: AstKind,
    pub line: usize,
    pub code: String,
    pub shared_id: SharedId,
    pub file: String,
    pub parent: Option<AstId>,
    pub children: Vec<AstId>,
    pub optional: HashMap<String, String>,
}

/// A single file's AST. Produced once by [`crate::stages::ast_builder`] and
/// never mutated afterward (SPEC_FULL.md §3 "Lifecycles").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
    pub root: Option<AstId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node as a child of `parent` (or as the root if `parent` is
    /// `None`). Returns the new node's arena id.
    pub fn push(
        &mut self,
        parent: Option<AstId>,
        kind: AstKind,
        line: usize,
        code: String,
        shared_id: SharedId,
        file: String,
    ) -> AstId {
        let id = self.nodes.len();
        self.nodes.push(AstNode {
            id,
            kind,
            line,
            code,
            shared_id,
            file,
            parent,
            children: Vec::new(),
            optional: HashMap::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.root = Some(id),
        }
        id
    }

    pub fn get(&self, id: AstId) -> &AstNode {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: AstId) -> &mut AstNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AstNode> {
        self.nodes.iter()
    }

    /// Walk upward from `id`, returning the first ancestor (inclusive) whose
    /// `SharedId` the caller can look up in a DFG. Used by the reachability
    /// engine (SPEC_FULL.md §4.8) to lift a source/sink AST node to its
    /// owning DFG node.
    pub fn ancestors(&self, id: AstId) -> impl Iterator<Item = &AstNode> {
        let mut cur = Some(id);
        std::iter::from_fn(move || {
            let node = cur.map(|i| &self.nodes[i])?;
            cur = node.parent;
            Some(node)
        })
    }

    pub fn find_by_shared_id(&self, shared_id: SharedId) -> Option<&AstNode> {
        self.nodes.iter().find(|n| n.shared_id == shared_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u8) -> SharedId {
        SharedId::new("f.java", "x", n as usize, n as usize + 1)
    }

    #[test]
    fn push_sets_root_and_child_links() {
        let mut ast = Ast::new();
        let root = ast.push(None, AstKind::Root, 1, String::new(), sid(0), "f.java".into());
        let m = ast.push(
            Some(root),
            AstKind::Method,
            2,
            "foo".into(),
            sid(1),
            "f.java".into(),
        );

        assert_eq!(ast.root, Some(root));
        assert_eq!(ast.get(root).children, vec![m]);
        assert_eq!(ast.get(m).parent, Some(root));
    }

    #[test]
    fn ancestors_walks_to_root() {
        let mut ast = Ast::new();
        let root = ast.push(None, AstKind::Root, 1, String::new(), sid(0), "f.java".into());
        let class = ast.push(Some(root), AstKind::Class, 1, "C".into(), sid(1), "f.java".into());
        let method = ast.push(
            Some(class),
            AstKind::Method,
            2,
            "m".into(),
            sid(2),
            "f.java".into(),
        );

        let kinds: Vec<_> = ast.ancestors(method).map(|n| n.kind).collect();
        assert_eq!(kinds, vec![AstKind::Method, AstKind::Class, AstKind::Root]);
    }

    #[test]
    fn find_by_shared_id_locates_node() {
        let mut ast = Ast::new();
        let root = ast.push(None, AstKind::Root, 1, String::new(), sid(0), "f.java".into());
        let target = sid(9);
        let m = ast.push(Some(root), AstKind::Method, 2, "m".into(), target, "f.java".into());

        assert_eq!(ast.find_by_shared_id(target).unwrap().id, m);
    }
}
