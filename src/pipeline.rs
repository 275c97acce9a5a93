//! Pipeline orchestration (SPEC_FULL.md §5): drives every stage in the
//! mandated order over a project's `target_dir`, committing each file's
//! results to the [`crate::store::Store`] before moving on. File-level work
//! within a stage runs across the walker's worker pool (`crate::walk`);
//! stages themselves run strictly sequentially.

use crate::config::ProjectConfig;
use crate::errors::CpgResult;
use crate::ids::SharedId;
use crate::model::ast::Ast;
use crate::model::class::ClassRecord;
use crate::model::dfg::MethodDfg;
use crate::model::taint::TaintSite;
use crate::sinks::VulnKind;
use crate::stages::{
    ast_builder, call_graph, call_resolver, cfg_builder, class_extractor, def_use, dfg_builder,
    reachability, source_sink,
};
use crate::store::Store;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// `run-static`'s stage selector (SPEC_FULL.md §6): `all` runs every stage in
/// order, the rest stop after the named stage so intermediate results can be
/// inspected via the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Stage {
    All,
    Classes,
    Ast,
    Cfg,
    Dfg,
    Taint,
    Callgraph,
}

fn find_method_node<'a>(n: Node<'a>, file: &str, target: SharedId) -> Option<Node<'a>> {
    if n.kind() == "method_declaration" || n.kind() == "constructor_declaration" {
        if SharedId::new(file, n.kind(), n.start_byte(), n.end_byte()) == target {
            return Some(n);
        }
    }
    let mut cursor = n.walk();
    for child in n.named_children(&mut cursor) {
        if let Some(found) = find_method_node(child, file, target) {
            return Some(found);
        }
    }
    None
}

/// Names usable in a DEF/USE set (SPEC_FULL.md §4.4's `isDefined` filter,
/// flattened without per-block scoping): the method's own parameters, every
/// local declared anywhere in its body, and the enclosing class's fields.
fn collect_known_names(method_node: Node, src: &[u8], class: &ClassRecord) -> HashSet<String> {
    let mut known: HashSet<String> = class.fields.iter().map(|f| f.name.clone()).collect();

    fn text<'a>(n: Node<'a>, src: &'a [u8]) -> String {
        std::str::from_utf8(&src[n.start_byte()..n.end_byte()])
            .unwrap_or("")
            .to_owned()
    }

    fn walk(n: Node, src: &[u8], out: &mut HashSet<String>) {
        match n.kind() {
            "variable_declarator" => {
                if let Some(name) = n.child_by_field_name("name") {
                    out.insert(text(name, src));
                }
            }
            "formal_parameter" | "spread_parameter" | "catch_formal_parameter" => {
                if let Some(name) = n.child_by_field_name("name") {
                    out.insert(text(name, src));
                }
            }
            "enhanced_for_statement" => {
                if let Some(name) = n.child_by_field_name("name") {
                    out.insert(text(name, src));
                }
            }
            _ => {}
        }
        let mut cursor = n.walk();
        for child in n.named_children(&mut cursor) {
            walk(child, src, out);
        }
    }
    walk(method_node, src, &mut known);
    known
}

/// Local-variable name → declared type, for the call resolver's "locals"
/// lookup step (SPEC_FULL.md §4.6). Flattened the same way
/// `collect_known_names` flattens DEF/USE scoping: a name declared in one
/// block is visible method-wide rather than only within its block.
fn collect_local_types(method_node: Node, src: &[u8]) -> HashMap<String, String> {
    let mut locals = HashMap::new();

    fn text<'a>(n: Node<'a>, src: &'a [u8]) -> String {
        std::str::from_utf8(&src[n.start_byte()..n.end_byte()])
            .unwrap_or("")
            .to_owned()
    }

    fn walk(n: Node, src: &[u8], out: &mut HashMap<String, String>) {
        if n.kind() == "local_variable_declaration" {
            if let Some(ty_node) = n.child_by_field_name("type") {
                let ty = text(ty_node, src);
                let mut cursor = n.walk();
                for declarator in n.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        out.insert(text(name, src), ty.clone());
                    }
                }
            }
        }
        let mut cursor = n.walk();
        for child in n.named_children(&mut cursor) {
            walk(child, src, out);
        }
    }
    walk(method_node, src, &mut locals);
    locals
}

fn param_names(class: &ClassRecord, method_name: &str, shared_id: SharedId) -> HashSet<String> {
    class
        .methods
        .iter()
        .find(|m| m.name == method_name && m.shared_id == shared_id)
        .map(|m| m.params.iter().map(|p| p.name.clone()).collect())
        .unwrap_or_default()
}

struct FileUnit {
    file: String,
    source: String,
    ast: Ast,
    classes: Vec<ClassRecord>,
}

fn parse_file(path: &Path) -> CpgResult<FileUnit> {
    let source = std::fs::read_to_string(path)?;
    let file = path.to_string_lossy().into_owned();
    let ast = ast_builder::build(&file, &source)?;
    let classes = class_extractor::extract(&file, &source)?;
    Ok(FileUnit { file, source, ast, classes })
}

/// Run every stage SPEC_FULL.md §5 orders, stopping after `stage` (`All`
/// runs everything). Returns once the selected stages' results are
/// committed to `store`.
pub fn run(config: &ProjectConfig, store: &Store, stage: Stage) -> CpgResult<()> {
    let rx = crate::walk::spawn_senders(Path::new(&config.target_dir), config);
    let mut paths = Vec::new();
    for batch in rx {
        paths.extend(batch);
    }

    let units: Vec<FileUnit> = paths
        .par_iter()
        .filter_map(|p| match parse_file(p) {
            Ok(u) => Some(u),
            Err(e) => {
                tracing::warn!(file = %p.display(), error = %e, "parse-error: skipping file");
                None
            }
        })
        .collect();

    for unit in &units {
        store.put_ast(&unit.file, &unit.ast)?;
        for class in &unit.classes {
            store.put_class(&class.qualified_name, class)?;
        }
    }
    if stage == Stage::Classes {
        return Ok(());
    }
    if stage == Stage::Ast {
        return Ok(());
    }

    let all_classes: HashMap<String, ClassRecord> = units
        .iter()
        .flat_map(|u| u.classes.iter().cloned())
        .map(|c| (c.qualified_name.clone(), c))
        .collect();

    // CFG construction: re-parse each file once more to obtain the
    // tree-sitter nodes `cfg_builder::build_method` needs (it takes a live
    // `Node`, never a stored `Ast`), same independent-reparse shape every
    // other stage in this pipeline uses.
    let mut cfgs: HashMap<String, crate::model::cfg::MethodCfg> = HashMap::new();
    let mut entry_index: HashMap<SharedId, String> = HashMap::new();
    let mut method_entries: HashMap<String, SharedId> = HashMap::new();
    let mut known_sets: HashMap<String, HashSet<String>> = HashMap::new();
    let mut param_sets: HashMap<String, HashSet<String>> = HashMap::new();
    let mut local_sets: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut owning_class_of: HashMap<String, String> = HashMap::new();

    for unit in &units {
        let mut parser = Parser::new();
        if parser.set_language(&tree_sitter_java::LANGUAGE.into()).is_err() {
            continue;
        }
        let Some(tree) = parser.parse(&unit.source, None) else {
            continue;
        };
        let src = unit.source.as_bytes();

        for class in &unit.classes {
            for method in &class.methods {
                let Some(node) = find_method_node(tree.root_node(), &unit.file, method.shared_id)
                else {
                    continue;
                };
                let qn = format!("{}.{}", class.qualified_name, method.name);
                let cfg = cfg_builder::build_method(&unit.file, &qn, node, src);
                entry_index.insert(cfg.entry_shared_id(), qn.clone());
                method_entries.insert(qn.clone(), cfg.entry_shared_id());
                known_sets.insert(qn.clone(), collect_known_names(node, src, class));
                param_sets.insert(
                    qn.clone(),
                    param_names(class, &method.name, method.shared_id),
                );
                local_sets.insert(qn.clone(), collect_local_types(node, src));
                owning_class_of.insert(qn.clone(), class.qualified_name.clone());
                cfgs.insert(qn, cfg);
            }
        }
    }

    for (qn, cfg) in &cfgs {
        store.put_cfg(qn, cfg)?;
    }
    if stage == Stage::Cfg {
        return Ok(());
    }

    let mut dfgs: HashMap<String, MethodDfg> = HashMap::new();
    for (qn, cfg) in &cfgs {
        let known = known_sets.get(qn).cloned().unwrap_or_default();
        let params = param_sets.get(qn).cloned().unwrap_or_default();
        let mut dfg = def_use::build(cfg, &params, &known);
        dfg_builder::add_edges(cfg, &mut dfg);
        dfgs.insert(qn.clone(), dfg);
    }

    for (qn, dfg) in &mut dfgs {
        let Some(owning_qn) = owning_class_of.get(qn) else { continue };
        let Some(owning_class) = all_classes.get(owning_qn) else { continue };
        let method_name = qn.rsplit('.').next().unwrap_or_default();
        let owning_params = owning_class
            .find_method(method_name)
            .map(|m| m.params.clone())
            .unwrap_or_default();
        let locals = local_sets.get(qn).cloned().unwrap_or_default();
        call_resolver::resolve(
            dfg,
            owning_class,
            &owning_params,
            &locals,
            &all_classes,
            &method_entries,
        );
    }

    for (qn, dfg) in &dfgs {
        store.put_dfg(qn, dfg)?;
    }
    if stage == Stage::Dfg {
        return Ok(());
    }

    let mut sources: Vec<TaintSite> = Vec::new();
    let mut sinks: Vec<TaintSite> = Vec::new();
    for unit in &units {
        sinks.extend(source_sink::find_sinks(&unit.ast));
        for class in &unit.classes {
            sources.extend(source_sink::find_sources(
                &unit.ast,
                class,
                config.web_framework,
                &all_classes,
            ));
        }
    }

    let asts: HashMap<String, Ast> = units.iter().map(|u| (u.file.clone(), u.ast.clone())).collect();
    let world = reachability::World {
        asts: &asts,
        dfgs: &dfgs,
        entry_index: &entry_index,
    };
    let flows = reachability::find_flows(&world, &sources, &sinks);
    store.replace_taint_flows(&flows)?;
    if stage == Stage::Taint {
        return Ok(());
    }

    for unit in &units {
        let graph = call_graph::build(&unit.ast, &unit.classes);
        for (caller, callees) in graph {
            store.put_call_graph_entry(&caller, &callees)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebFramework;

    fn write(dir: &Path, name: &str, src: &str) {
        std::fs::write(dir.join(name), src).unwrap();
    }

    #[test]
    fn end_to_end_struts2_flow_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "C.java",
            r#"package a.b;
            class C extends ActionSupport {
                private String q;
                public void setQ(String v) { this.q = v; }
                public String execute() {
                    db.createQuery(this.q);
                    return "success";
                }
            }"#,
        );

        let mut cfg = ProjectConfig::default();
        cfg.target_dir = dir.path().to_string_lossy().into_owned();
        cfg.web_framework = WebFramework::Struts2;
        cfg.performance.worker_threads = Some(1);

        let store_dir = tempfile::tempdir().unwrap();
        let store = Store::open(&store_dir.path().join("t.sqlite")).unwrap();

        run(&cfg, &store, Stage::All).unwrap();
        let flows = store.all_taint_flows().unwrap();
        assert!(!flows.is_empty());
        assert!(flows.iter().any(|f| f.vulnerability_kind == VulnKind::SQL));
    }

    #[test]
    fn classes_only_stage_stops_before_cfg() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "C.java", "class C { void m() { int x = 1; } }");

        let mut cfg = ProjectConfig::default();
        cfg.target_dir = dir.path().to_string_lossy().into_owned();
        cfg.performance.worker_threads = Some(1);

        let store_dir = tempfile::tempdir().unwrap();
        let store = Store::open(&store_dir.path().join("t.sqlite")).unwrap();

        run(&cfg, &store, Stage::Classes).unwrap();
        assert!(!store.all_classes().unwrap().is_empty());
        assert!(store.all_cfgs().unwrap().is_empty());
    }
}
