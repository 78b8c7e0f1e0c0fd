//! Dependency listing for `tiny-make --deps`.
//!
//! ## Example Output
//!
//! ```text
//!   ┌────────┬───────────┬───────────────────┬────────┐
//!   │ Kind   │ Origin    │ File              │ Status │
//!   ├────────┼───────────┼───────────────────┼────────┤
//!   │ header │ include   │ add/include/add.h │ newer  │
//!   │ source │ target    │ main.cpp          │ ok     │
//!   └────────┴───────────┴───────────────────┴────────┘
//! ```

use crate::build::{BuildDecision, BuildPlan, display_path};
use crate::deps::FileKind;
use crate::ui::Table;
use colored::*;
use std::fs;
use std::path::Path;

/// One row per dependency-set member, in path order.
pub fn dependency_rows(plan: &BuildPlan, project_dir: &Path) -> Vec<Vec<String>> {
    let built_at = fs::metadata(&plan.output)
        .and_then(|m| m.modified())
        .ok();

    plan.deps
        .iter()
        .map(|file| {
            let kind = match file.kind() {
                FileKind::Header => "header",
                FileKind::Source => "source",
                FileKind::Other => "other",
            };
            let status = match built_at {
                None => "unbuilt",
                Some(t) if file.modified > t => "newer",
                Some(_) => "ok",
            };
            vec![
                kind.to_string(),
                file.origin.label().to_string(),
                display_path(&file.path, project_dir),
                status.to_string(),
            ]
        })
        .collect()
}

pub fn print_dependencies(plan: &BuildPlan, decision: &BuildDecision, project_dir: &Path) {
    println!(
        "{} {}",
        display_path(&plan.output, project_dir).bold().cyan(),
        format!("({} files)", plan.deps.len()).dimmed()
    );

    let mut table = Table::new(&["Kind", "Origin", "File", "Status"]);
    for row in dependency_rows(plan, project_dir) {
        table.add_row(row);
    }
    table.print();

    match decision {
        BuildDecision::Fresh => println!("{} Up to date", "⚡".green()),
        BuildDecision::Stale(reason) => println!("{} Needs rebuild: {}", "!".yellow(), reason),
    }
}
