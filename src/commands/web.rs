use crate::config::ProjectConfig;
use crate::errors::CpgResult;
use crate::store::Store;
use console::style;
use std::path::Path;

/// `web [--config <path>]`. The HTML viewer itself is an external
/// collaborator this crate does not ship (SPEC_FULL.md §1's "treated as
/// opaque" framing covers it the same way it covers the parser and the
/// graph database); this command's job is only to materialize the store's
/// taint-flow/call-graph contents as the `report.json` a viewer consumes.
pub fn handle(config_path: &str) -> CpgResult<()> {
    let config = ProjectConfig::load(Path::new(config_path))?;
    let store = Store::open(Path::new(&config.db))?;

    let flows = store.all_taint_flows()?;
    let call_graph = store.all_call_graph()?;

    #[derive(serde::Serialize)]
    struct Report {
        taint_flows: Vec<crate::model::taint::TaintFlow>,
        call_graph: std::collections::HashMap<String, Vec<String>>,
    }

    let report = Report { taint_flows: flows, call_graph };
    let out_path = Path::new("report.json");
    std::fs::write(out_path, serde_json::to_string_pretty(&report)?)?;

    println!(
        "{} {} ({} flow(s)) — point a viewer at it",
        style("Wrote").green().bold(),
        out_path.display(),
        report.taint_flows.len()
    );
    Ok(())
}
