//! compile_commands.json reading and writing.
//!
//! Written in the `arguments` form so editors and linters see the exact
//! compiler argv, one entry per compiled source file.

use crate::deps::SourceFile;
use crate::error::{BuildError, Result};
use crate::process::Invocation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommandEntry {
    /// Absolute working directory of the compiler.
    pub directory: String,
    /// Absolute path of the source file.
    pub file: String,
    /// Full compiler argv, program first.
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationDatabase {
    entries: Vec<CompileCommandEntry>,
}

impl CompilationDatabase {
    /// One entry per unit, all sharing the invocation that builds them.
    pub fn for_units(directory: &Path, units: &[&SourceFile], invocation: &Invocation) -> Self {
        let arguments = invocation.argv();
        let entries = units
            .iter()
            .map(|unit| CompileCommandEntry {
                directory: directory.to_string_lossy().to_string(),
                file: unit.path.to_string_lossy().to_string(),
                arguments: arguments.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Reads an existing database. Missing or unparseable files yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        let entries: Vec<CompileCommandEntry> = serde_json::from_str(&text).ok()?;
        Some(Self { entries })
    }

    pub fn entries(&self) -> &[CompileCommandEntry] {
        &self.entries
    }

    pub fn find(&self, file: &Path) -> Option<&CompileCommandEntry> {
        let file = file.to_string_lossy();
        self.entries.iter().find(|e| e.file == file)
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings can not fail.
        let mut json = serde_json::to_string_pretty(&self.entries).unwrap_or_default();
        json.push('\n');
        json
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()).map_err(|source| BuildError::io(path, source))
    }
}
