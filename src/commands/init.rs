use crate::config::ProjectConfig;
use crate::errors::{CpgError, CpgResult};
use crate::project::sanitize_project_name;
use console::style;
use std::path::Path;

/// `init <name>`: create a fresh project directory holding a `project.toml`
/// template. Refuses to overwrite an existing directory (SPEC_FULL.md §6).
pub fn handle(name: &str) -> CpgResult<()> {
    let dir = Path::new(name);
    if dir.exists() {
        return Err(CpgError::Msg(format!(
            "refusing to overwrite existing directory '{name}'"
        )));
    }

    std::fs::create_dir_all(dir)?;
    let sanitized = sanitize_project_name(name);
    ProjectConfig::write_template(&dir.join("project.toml"), &sanitized)?;

    println!(
        "{} project '{}' in ./{}/project.toml",
        style("Created").green().bold(),
        sanitized,
        name
    );
    Ok(())
}
