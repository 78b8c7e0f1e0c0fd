use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Source-like extensions, matched case-sensitively (`.C` is C++).
const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "cp", "C", "c"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl", "ipp", "tpp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Header,
    Source,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileKind::Other;
        };
        if SOURCE_EXTENSIONS.contains(&ext) {
            FileKind::Source
        } else if HEADER_EXTENSIONS.contains(&ext) {
            FileKind::Header
        } else {
            FileKind::Other
        }
    }
}

/// How a file entered the dependency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    /// Named on the command line.
    Target,
    /// Source file sharing its stem with an included header.
    Companion,
    /// Reached through an `#include` directive.
    Include,
}

impl Origin {
    /// Targets and companions are compiled; included files are header-only.
    pub fn is_compilable(&self) -> bool {
        matches!(self, Origin::Target | Origin::Companion)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Origin::Target => "target",
            Origin::Companion => "companion",
            Origin::Include => "include",
        }
    }
}

/// A scanned file: canonical path and mtime as seen during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub origin: Origin,
    /// Flags requested by `// tiny-make:` comments inside the file.
    pub flags: Vec<String>,
}

impl SourceFile {
    pub fn kind(&self) -> FileKind {
        FileKind::of(&self.path)
    }
}

/// Every file reachable from the targets, keyed by canonical path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    files: BTreeMap<PathBuf, SourceFile>,
    /// Targets in command-line order; the first one is the root.
    targets: Vec<PathBuf>,
}

impl DependencySet {
    /// Adds a file; returns false if the path was already present.
    pub fn insert(&mut self, file: SourceFile) -> bool {
        if self.files.contains_key(&file.path) {
            return false;
        }
        if file.origin == Origin::Target {
            self.targets.push(file.path.clone());
        }
        self.files.insert(file.path.clone(), file);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Members in path order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn root(&self) -> Option<&SourceFile> {
        self.targets.first().and_then(|p| self.files.get(p))
    }

    /// Files handed to the compiler: targets in command-line order, then
    /// companion sources in path order.
    pub fn compilable(&self) -> Vec<&SourceFile> {
        let mut units: Vec<&SourceFile> =
            self.targets.iter().filter_map(|p| self.files.get(p)).collect();
        units.extend(self.iter().filter(|f| f.origin == Origin::Companion));
        units
    }

    /// Member with the latest modification time.
    pub fn newest(&self) -> Option<&SourceFile> {
        self.iter().max_by_key(|f| f.modified)
    }

    /// Flags from in-source comments, deduplicated and sorted.
    pub fn embedded_flags(&self) -> Vec<String> {
        let flags: BTreeSet<&String> = self.iter().flat_map(|f| f.flags.iter()).collect();
        flags.into_iter().cloned().collect()
    }
}
