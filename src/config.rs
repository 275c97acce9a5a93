//! Project configuration: the key-value document described in SPEC_FULL.md
//! §6. One instance is constructed at process start (from `init`'s template
//! or from an on-disk `project.toml`) and threaded explicitly into every
//! stage — there is no process-wide mutable config singleton.

use crate::errors::CpgResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static TEMPLATE_TOML: &str = include_str!("../default-project.toml");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum WebFramework {
    #[default]
    Struts2,
    SpringMvc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project identifier used in store file names.
    pub name: String,

    /// Root directory of source files to analyze.
    pub target_dir: String,

    /// Path to the document store file.
    pub db: String,

    /// Selects which source/sink rule family the SourceSinkFinder uses.
    pub web_framework: WebFramework,

    /// Path to the MVC-action route descriptor (Struts2 `struts.xml`).
    pub struts_xml: Option<String>,

    /// Root for view templates (Struts2 JSPs).
    pub jsp_files_dir: Option<String>,

    /// Root for annotation-controller views (SpringMVC).
    pub views_dir: Option<String>,

    /// Graph-database access, used only by the optional populate stage.
    pub orientdb_name: Option<String>,
    pub orientdb_user: Option<String>,
    pub orientdb_pass: Option<String>,
    pub gremlin_name: Option<String>,

    /// File-walker and worker-pool tuning, not part of the §6 table but
    /// required to run the pipeline at all on a real checkout.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            target_dir: ".".to_owned(),
            db: "cpgtaint.sqlite".to_owned(),
            web_framework: WebFramework::default(),
            struts_xml: None,
            jsp_files_dir: None,
            views_dir: None,
            orientdb_name: None,
            orientdb_user: None,
            orientdb_pass: None,
            gremlin_name: None,
            performance: PerformanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub worker_threads: Option<usize>,
    pub channel_multiplier: usize,
    pub batch_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            channel_multiplier: 4,
            batch_size: 64,
        }
    }
}

impl ProjectConfig {
    /// Load a project config file, falling back to defaults for anything
    /// the file doesn't specify (every field is `#[serde(default)]`).
    pub fn load(path: &Path) -> CpgResult<Self> {
        let text = fs::read_to_string(path)?;
        let cfg: ProjectConfig = toml::from_str(&text)?;
        Ok(cfg)
    }

    /// Write the bundled template, with `name`/`target_dir` filled in, to
    /// `path`. Used by `init <name>`.
    pub fn write_template(path: &Path, name: &str) -> CpgResult<()> {
        let filled = TEMPLATE_TOML
            .replace("__NAME__", name)
            .replace("__DB__", &format!("{name}.sqlite"));
        fs::write(path, filled)?;
        Ok(())
    }
}

#[test]
fn defaults_cover_every_required_field() {
    let cfg = ProjectConfig::default();
    assert_eq!(cfg.web_framework, WebFramework::Struts2);
    assert_eq!(cfg.target_dir, ".");
}

#[test]
fn load_reads_and_defaults_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.toml");
    std::fs::write(
        &path,
        r#"
        name = "demo"
        target_dir = "src"
        db = "demo.sqlite"
        web_framework = "SpringMvc"
    "#,
    )
    .unwrap();

    let cfg = ProjectConfig::load(&path).unwrap();
    assert_eq!(cfg.name, "demo");
    assert_eq!(cfg.web_framework, WebFramework::SpringMvc);
    assert!(cfg.struts_xml.is_none());
}

#[test]
fn write_template_substitutes_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.toml");
    ProjectConfig::write_template(&path, "acme").unwrap();

    let cfg = ProjectConfig::load(&path).unwrap();
    assert_eq!(cfg.name, "acme");
    assert_eq!(cfg.db, "acme.sqlite");
}
