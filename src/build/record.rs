//! Commands that produced the binaries currently on disk.
//!
//! Written only after a compile succeeds, so a failed build never makes an
//! older binary look like the product of the new command.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const RECORD_NAME: &str = ".tiny-make-record.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Output binary path to the argv that last built it.
    commands: BTreeMap<String, Vec<String>>,
}

impl BuildRecord {
    /// Missing or unparseable records read as empty.
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn command_for(&self, output: &Path) -> Option<&[String]> {
        self.commands
            .get(output.to_string_lossy().as_ref())
            .map(Vec::as_slice)
    }

    pub fn set(&mut self, output: &Path, argv: Vec<String>) {
        self.commands
            .insert(output.to_string_lossy().to_string(), argv);
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::io(parent, source))?;
        }
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        fs::write(path, json).map_err(|source| BuildError::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_write_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build").join(RECORD_NAME);
        let mut record = BuildRecord::default();
        record.set(Path::new("/p/build/main"), argv(&["c++", "-g", "main.cpp"]));
        record.set(Path::new("/p/build/tool"), argv(&["c++", "-O3", "tool.cpp"]));
        record.write(&path).unwrap();

        let loaded = BuildRecord::load(&path);
        assert_eq!(loaded, record);
        assert_eq!(
            loaded.command_for(Path::new("/p/build/main")),
            Some(argv(&["c++", "-g", "main.cpp"]).as_slice())
        );
        assert!(loaded.command_for(Path::new("/p/build/other")).is_none());
    }

    #[test]
    fn test_garbage_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RECORD_NAME);
        assert_eq!(BuildRecord::load(&path), BuildRecord::default());
        fs::write(&path, "[1, 2").unwrap();
        assert_eq!(BuildRecord::load(&path), BuildRecord::default());
    }
}
