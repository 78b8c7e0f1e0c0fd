//! Build artifact cleanup.
//!
//! `tiny-make --clean` removes the output directory, an explicitly
//! configured output binary and `compile_commands.json`.

use crate::config::{BuildConfig, COMPILE_COMMANDS_NAME};
use crate::ui;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Removes build outputs below `project_dir`. Returns the removed paths.
pub fn clean(config: &BuildConfig, project_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let output_dir = project_dir.join(&config.output_dir);
    if output_dir.is_dir() {
        fs::remove_dir_all(&output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        removed.push(output_dir);
    }

    let mut files = vec![project_dir.join(COMPILE_COMMANDS_NAME)];
    if let Some(output) = &config.output {
        files.push(project_dir.join(output));
    }
    for file in files {
        if file.is_file() {
            fs::remove_file(&file)
                .with_context(|| format!("Failed to remove {}", file.display()))?;
            removed.push(file);
        }
    }

    if removed.is_empty() {
        println!("{} Nothing to clean", "!".yellow());
    } else {
        for path in &removed {
            ui::verbose(format!("removed {}", path.display()));
        }
        ui::success("Clean complete.");
    }
    Ok(removed)
}
