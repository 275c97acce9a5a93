use crate::config::ProjectConfig;
use crate::errors::CpgResult;
use crate::pipeline::{self, Stage};
use crate::store::Store;
use console::style;
use std::path::Path;

/// `run-static {all|classes|ast|cfg|dfg|taint|callgraph} [--config <path>]`.
pub fn handle(stage: Stage, config_path: &str) -> CpgResult<()> {
    let config = ProjectConfig::load(Path::new(config_path))?;
    let store = Store::open(Path::new(&config.db))?;

    println!(
        "{} {} ({:?})",
        style("Analyzing").green().bold(),
        config.name,
        stage
    );

    pipeline::run(&config, &store, stage)?;

    let flows = store.all_taint_flows().unwrap_or_default();
    println!(
        "{} {} taint flow(s) in {}",
        style("Found").green().bold(),
        flows.len(),
        config.db
    );
    Ok(())
}
