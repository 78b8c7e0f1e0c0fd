use super::core::{BuildRequest, Driver};
use crate::config::{BuildConfig, COMPILE_COMMANDS_NAME};
use crate::deps::search_paths_for;
use crate::process::SystemRunner;
use crate::ui;
use anyhow::{Context, Result};
use colored::*;
use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Reruns the pipeline whenever something under the search roots changes.
/// Only returns when the watcher can not be set up or its channel closes.
pub fn watch(config: &BuildConfig, project_dir: &Path, request: &BuildRequest) -> Result<()> {
    let runner = SystemRunner;
    let driver = Driver::new(config, &runner, project_dir)?;
    let root = request
        .targets
        .first()
        .map(|t| driver.project_dir().join(t))
        .context("No source file to watch")?;

    let ignored = vec![
        driver.project_dir().join(&config.output_dir),
        driver.database_path(),
        driver.output_path(&root),
    ];

    let (tx, rx) = channel();
    let mut watcher = notify::RecommendedWatcher::new(tx, Config::default())?;
    let mut roots = search_paths_for(&root, &config.include_dirs);
    roots.dedup();
    for dir in &roots {
        if dir.is_dir() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", dir.display()))?;
        }
    }
    println!(
        "{} Watching {} for changes...",
        "👀".cyan(),
        roots
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    run_once(&driver, request);

    while let Ok(event) = rx.recv() {
        if !event.is_ok_and(|e| is_relevant(&e, &ignored)) {
            continue;
        }
        std::thread::sleep(Duration::from_millis(100));
        while rx.try_recv().is_ok() {}
        run_once(&driver, request);
    }
    Ok(())
}

fn run_once(driver: &Driver<'_, SystemRunner>, request: &BuildRequest) {
    print!("\x1B[2J\x1B[1;1H");
    println!("{} Rebuilding...", "🔄".yellow());
    match driver.execute(request) {
        Ok(code) => ui::verbose(format!("program exited with {}", code)),
        Err(e) => ui::error(e.to_string()),
    }
}

/// Changes to sources count; reads and our own outputs do not.
fn is_relevant(event: &Event, ignored: &[PathBuf]) -> bool {
    let kind_matters = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    );
    kind_matters
        && event.paths.iter().any(|path| {
            !ignored.iter().any(|skip| path.starts_with(skip))
                && path.file_name().is_none_or(|name| name != COMPILE_COMMANDS_NAME)
        })
}
