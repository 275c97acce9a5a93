//! Class table (SPEC_FULL.md §3, §4.2). Produced once per file by the class
//! extractor and never mutated; the call resolver (§4.6) and source/sink
//! finder (§4.7) both key off `ClassRecord::qualified_name` and
//! `MethodRecord::name`.

use crate::ids::SharedId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamRecord {
    pub is_final: bool,
    pub annotations: Vec<String>,
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub modifier: Option<String>,
    pub is_static: bool,
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecord {
    pub modifier: Option<String>,
    pub is_static: bool,
    pub is_abstract: bool,
    /// `None` for constructors (SPEC_FULL.md §4.2: "constructors are stored
    /// as methods with null return type").
    pub ret_type: Option<String>,
    pub name: String,
    pub params: Vec<ParamRecord>,
    pub line: usize,
    pub shared_id: SharedId,
    pub annotations: Vec<String>,
}

impl MethodRecord {
    pub fn is_constructor(&self) -> bool {
        self.ret_type.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub qualified_name: String,
    pub package: String,
    pub name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub imports: Vec<String>,
    pub modifiers: Vec<String>,
    pub annotations: Vec<String>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
}

impl ClassRecord {
    pub fn find_method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> SharedId {
        SharedId::new("f.java", "method_declaration", 0, 10)
    }

    #[test]
    fn constructor_has_no_return_type() {
        let m = MethodRecord {
            modifier: Some("public".into()),
            is_static: false,
            is_abstract: false,
            ret_type: None,
            name: "Foo".into(),
            params: vec![],
            line: 1,
            shared_id: sid(),
            annotations: vec![],
        };
        assert!(m.is_constructor());
    }

    #[test]
    fn find_method_and_annotation_lookup() {
        let class = ClassRecord {
            qualified_name: "com.acme.Foo".into(),
            package: "com.acme".into(),
            name: "Foo".into(),
            extends: None,
            implements: vec![],
            imports: vec![],
            modifiers: vec!["public".into()],
            annotations: vec!["Controller".into()],
            fields: vec![],
            methods: vec![MethodRecord {
                modifier: Some("public".into()),
                is_static: false,
                is_abstract: false,
                ret_type: Some("void".into()),
                name: "handle".into(),
                params: vec![],
                line: 4,
                shared_id: sid(),
                annotations: vec![],
            }],
        };

        assert!(class.find_method("handle").is_some());
        assert!(class.has_annotation("Controller"));
        assert!(!class.has_annotation("Service"));
    }
}
