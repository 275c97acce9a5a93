//! Parallel directory walk over a project's `target_dir`, producing batches
//! of `.java` files for the pipeline's file-level stages (SPEC_FULL.md §5).
//! Same batching/worker-pool idiom as the teacher's `walk.rs`, simplified to
//! the fixed Java-only extension filter this crate needs.

use crossbeam_channel::{Receiver, Sender, bounded};
use ignore::{WalkBuilder, WalkState, overrides::OverrideBuilder};
use std::{
    mem,
    path::{Path, PathBuf},
    thread,
};

use crate::config::ProjectConfig;

type Batch = Vec<PathBuf>;

/// Directories that are never worth walking into for a Java checkout.
const EXCLUDED_DIRS: &[&str] = &[".git", "target", "build", "out", "node_modules", ".idea"];

struct BatchSender {
    tx: Sender<Batch>,
    batch: Batch,
    batch_size: usize,
}

impl BatchSender {
    fn new(tx: Sender<Batch>, batch_size: usize) -> Self {
        Self {
            tx,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    fn push(&mut self, path: PathBuf) {
        self.batch.push(path);
        if self.batch.len() >= self.batch_size {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if !self.batch.is_empty() {
            tracing::debug!(n_paths = self.batch.len(), "flushing batch");
            let _ = self.tx.send(mem::take(&mut self.batch));
        }
    }
}

impl Drop for BatchSender {
    fn drop(&mut self) {
        self.flush();
    }
}

fn build_overrides(root: &Path) -> ignore::overrides::Override {
    let mut ob = OverrideBuilder::new(root);
    for dir in EXCLUDED_DIRS {
        if let Err(e) = ob.add(&format!("!**/{dir}/**")) {
            tracing::warn!("invalid exclude-dir pattern '{dir}': {e}");
        }
    }
    ob.build().unwrap_or_else(|e| {
        tracing::error!("failed to build ignore overrides: {e}");
        ignore::overrides::Override::empty()
    })
}

/// Walk `root` and send batches of `.java` file paths through the returned
/// channel. The walk runs on a background thread; the channel closes when
/// it finishes.
pub fn spawn_senders(root: &Path, cfg: &ProjectConfig) -> Receiver<Batch> {
    let overrides = build_overrides(root);

    let workers = cfg.performance.worker_threads.unwrap_or_else(num_cpus::get);
    let (tx, rx) = bounded::<Batch>(workers * cfg.performance.channel_multiplier.max(1));

    let root = root.to_path_buf();
    let batch_size = cfg.performance.batch_size.max(1);

    thread::spawn(move || {
        tracing::info!(root = ?root, workers, batch_size, "starting directory walk");

        WalkBuilder::new(&root)
            .hidden(true)
            .follow_links(false)
            .threads(workers)
            .overrides(overrides)
            .filter_entry(|e| {
                e.file_type()
                    .map(|ft| ft.is_dir() || ft.is_file())
                    .unwrap_or(true)
            })
            .build_parallel()
            .run(move || {
                let mut bs = BatchSender::new(tx.clone(), batch_size);
                Box::new(move |entry| {
                    if let Ok(e) = entry {
                        let is_java = e
                            .path()
                            .extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("java"));
                        if e.file_type().map(|ft| ft.is_file()).unwrap_or(false) && is_java {
                            bs.push(e.into_path());
                        }
                    }
                    WalkState::Continue
                })
            });

        tracing::info!("directory walk complete");
    });

    rx
}

#[test]
fn walker_finds_only_java_files() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("Keep.java"), "class Keep {}").unwrap();
    std::fs::write(tmp.path().join("skip.txt"), "ignored").unwrap();

    let mut cfg = ProjectConfig::default();
    cfg.performance.worker_threads = Some(1);
    cfg.performance.channel_multiplier = 1;
    cfg.performance.batch_size = 2;

    let rx = spawn_senders(tmp.path(), &cfg);
    let all: Vec<_> = rx.into_iter().flatten().collect();

    assert!(all.iter().any(|p| p.ends_with("Keep.java")));
    assert!(all.iter().all(|p| !p.ends_with("skip.txt")));
}

#[test]
fn walker_skips_excluded_directories() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("target")).unwrap();
    std::fs::write(tmp.path().join("target/Gen.java"), "class Gen {}").unwrap();
    std::fs::write(tmp.path().join("Main.java"), "class Main {}").unwrap();

    let mut cfg = ProjectConfig::default();
    cfg.performance.worker_threads = Some(1);
    cfg.performance.channel_multiplier = 1;
    cfg.performance.batch_size = 2;

    let rx = spawn_senders(tmp.path(), &cfg);
    let all: Vec<_> = rx.into_iter().flatten().collect();

    assert!(all.iter().any(|p| p.ends_with("Main.java")));
    assert!(all.iter().all(|p| !p.ends_with("target/Gen.java")));
}
