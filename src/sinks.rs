//! Source/sink name rules for the two supported web-framework families
//! (SPEC_FULL.md §4.7). Mirrors the teacher's `labels::{DataLabel, LabelRule}`
//! matcher-table idiom, but there is no `Sanitizer` variant: the reachability
//! engine does not model taint-kill (SPEC_FULL.md §4.8, S3).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct VulnKind: u8 {
        const SQL = 0b001;
        const XSS = 0b010;
        const CMD = 0b100;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SinkRule {
    pub matchers: &'static [&'static str],
    pub kind: VulnKind,
}

/// Method names (last segment of a method-invocation's callee, e.g. the
/// `executeQuery` in `stmt.executeQuery(sql)`) that mark a CALL node as a
/// sink for one or more vulnerability kinds.
pub static SINKS: &[SinkRule] = &[
    SinkRule {
        matchers: &[
            "executeQuery",
            "executeUpdate",
            "execute",
            "createQuery",
            "createSQLQuery",
            "createNativeQuery",
            "prepareStatement",
        ],
        kind: VulnKind::SQL,
    },
    SinkRule {
        matchers: &["print", "println", "write", "append"],
        kind: VulnKind::XSS,
    },
    SinkRule {
        matchers: &["exec", "start"],
        kind: VulnKind::CMD,
    },
];

/// Struts2 base class whose fields are implicitly bound from request
/// parameters via `set`-prefixed setters (SPEC_FULL.md §4.7).
pub static STRUTS2_ACTION_BASE: &str = "ActionSupport";

/// SpringMVC class-level annotations that mark a class as holding endpoint
/// handler methods.
pub static SPRINGMVC_CONTROLLER_ANNOTATIONS: &[&str] = &["Controller", "RestController"];

/// SpringMVC parameter-level annotations that mark a formal parameter as a
/// taint source, independent of any getter call inside the method body.
pub static SPRINGMVC_PARAM_ANNOTATIONS: &[&str] = &["RequestParam", "PathVariable", "RequestBody"];

/// SpringMVC method-level annotations that mark a method as an HTTP
/// endpoint entry point.
pub static SPRINGMVC_MAPPING_ANNOTATIONS: &[&str] = &[
    "RequestMapping",
    "GetMapping",
    "PostMapping",
    "PutMapping",
    "DeleteMapping",
    "PatchMapping",
];

pub fn classify_sink(method_name: &str) -> Option<VulnKind> {
    SINKS
        .iter()
        .find(|rule| rule.matchers.contains(&method_name))
        .map(|rule| rule.kind)
}

#[test]
fn classifies_sql_sink() {
    assert_eq!(classify_sink("executeQuery"), Some(VulnKind::SQL));
}

#[test]
fn classifies_cmd_sink() {
    assert_eq!(classify_sink("exec"), Some(VulnKind::CMD));
}

#[test]
fn unknown_method_is_not_a_sink() {
    assert_eq!(classify_sink("toString"), None);
}
