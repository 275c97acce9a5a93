//! Taint-flow results (SPEC_FULL.md §3, §4.7, §4.8).

use crate::ids::SharedId;
use crate::sinks::VulnKind;
use serde::{Deserialize, Serialize};

/// A discovered source or sink site, before reachability is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintSite {
    pub shared_id: SharedId,
    pub description: String,
    pub kind: VulnKind,
    pub file: String,
    pub line: usize,
    /// Sink-only: the literal argument text, kept for reporting.
    pub argument: Option<String>,
}

/// A confirmed source-to-sink path (SPEC_FULL.md §3: "Taint flow").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintFlow {
    pub source_df_node: SharedId,
    pub sink_df_node: SharedId,
    pub vulnerability_kind: VulnKind,
    pub source_description: String,
    pub sink_description: String,
    pub file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taint_flow_carries_both_endpoints() {
        let flow = TaintFlow {
            source_df_node: SharedId::new("f.java", "x", 0, 1),
            sink_df_node: SharedId::new("f.java", "x", 2, 3),
            vulnerability_kind: VulnKind::SQL,
            source_description: "getParameter(\"id\")".into(),
            sink_description: "executeQuery(sql)".into(),
            file: "f.java".into(),
        };
        assert_ne!(flow.source_df_node, flow.sink_df_node);
        assert_eq!(flow.vulnerability_kind, VulnKind::SQL);
    }
}
