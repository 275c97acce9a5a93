//! `SharedId` — the content-derived fingerprint that lets an AST node, a CFG
//! node, and a DFG node produced from the same parse-tree region agree on
//! identity without ever sharing a pointer (see SPEC_FULL.md §3, §9).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable fingerprint of a parse-tree region: the grammar production kind
/// plus its byte range in a specific file. Two nodes built from the same
/// region of the same file always hash to the same `SharedId`, regardless of
/// which pass (AST, CFG, DFG) produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedId(u128);

impl SharedId {
    pub fn new(file: &str, production_kind: &str, start_byte: usize, end_byte: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(file.as_bytes());
        hasher.update(&[0]);
        hasher.update(production_kind.as_bytes());
        hasher.update(&[0]);
        hasher.update(&start_byte.to_le_bytes());
        hasher.update(&end_byte.to_le_bytes());
        let digest = hasher.finalize();
        let bytes = digest.as_bytes();
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes[..16]);
        SharedId(u128::from_le_bytes(buf))
    }
}

impl fmt::Display for SharedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[test]
fn same_region_same_id() {
    let a = SharedId::new("a.java", "method_declaration", 10, 120);
    let b = SharedId::new("a.java", "method_declaration", 10, 120);
    assert_eq!(a, b);
}

#[test]
fn different_file_different_id() {
    let a = SharedId::new("a.java", "method_declaration", 10, 120);
    let b = SharedId::new("b.java", "method_declaration", 10, 120);
    assert_ne!(a, b);
}

#[test]
fn different_range_different_id() {
    let a = SharedId::new("a.java", "method_declaration", 10, 120);
    let b = SharedId::new("a.java", "method_declaration", 10, 121);
    assert_ne!(a, b);
}
