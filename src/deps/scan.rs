use super::source::{DependencySet, FileKind, Origin, SourceFile};
use crate::error::{BuildError, Result};
use crate::ui;
use regex::Regex;
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*#\s*include\s*([<"])([^>"]+)[>"]"#).unwrap());

static FLAGS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*//\s*tiny-make:\s*(.*)$").unwrap());

/// Companion lookup does not descend further than this below a search root.
const COMPANION_MAX_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `#include "name"`
    Quote,
    /// `#include <name>`
    Angle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub name: String,
    pub delimiter: Delimiter,
}

/// What one pass over a file's text yields.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Directives {
    pub includes: Vec<Include>,
    pub flags: Vec<String>,
}

pub fn parse_directives(text: &str) -> Directives {
    let mut directives = Directives::default();
    for line in text.lines() {
        if let Some(caps) = INCLUDE_PATTERN.captures(line) {
            let delimiter = if &caps[1] == "<" {
                Delimiter::Angle
            } else {
                Delimiter::Quote
            };
            directives.includes.push(Include {
                name: caps[2].trim().to_string(),
                delimiter,
            });
        } else if let Some(caps) = FLAGS_PATTERN.captures(line) {
            directives
                .flags
                .extend(caps[1].split_whitespace().map(str::to_string));
        }
    }
    directives
}

/// The root file's directory followed by the extra include directories.
pub fn search_paths_for(root: &Path, include_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let root_dir = match root.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut paths = vec![root_dir];
    paths.extend(include_dirs.iter().cloned());
    paths
}

/// Follows `#include` directives from a set of targets.
pub struct Scanner {
    search_paths: Vec<PathBuf>,
    companions: bool,
    ignored_dirs: Vec<PathBuf>,
    companion_index: OnceCell<HashMap<String, Vec<PathBuf>>>,
}

impl Scanner {
    /// Directories that do not exist are dropped; the rest are canonicalized
    /// and deduplicated, keeping the first occurrence.
    pub fn new(search_paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut canonical: Vec<PathBuf> = Vec::new();
        for dir in search_paths {
            match fs::canonicalize(&dir) {
                Ok(path) if path.is_dir() => {
                    if !canonical.contains(&path) {
                        canonical.push(path);
                    }
                }
                _ => ui::verbose(format!("ignoring missing include dir \"{}\"", dir.display())),
            }
        }
        Self {
            search_paths: canonical,
            companions: false,
            ignored_dirs: Vec::new(),
            companion_index: OnceCell::new(),
        }
    }

    /// Enables pulling in `foo.cpp` when `foo.h` is included.
    pub fn with_companions(mut self, enabled: bool) -> Self {
        self.companions = enabled;
        self
    }

    /// Excludes a directory (typically the build output) from companion lookup.
    pub fn ignore_dir(mut self, dir: &Path) -> Self {
        if let Ok(path) = fs::canonicalize(dir) {
            self.ignored_dirs.push(path);
        }
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Builds the dependency set of `targets`; the first target is the root.
    pub fn scan(&self, targets: &[PathBuf]) -> Result<DependencySet> {
        let mut set = DependencySet::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, Origin)> = VecDeque::new();
        let mut roots = self.search_paths.clone();

        for target in targets {
            let path = fs::canonicalize(target)
                .ok()
                .filter(|p| p.is_file())
                .ok_or_else(|| BuildError::MissingRootFile {
                    path: target.clone(),
                })?;
            if let Some(dir) = path.parent()
                && !roots.iter().any(|r| dir.starts_with(r))
            {
                roots.push(dir.to_path_buf());
            }
            if visited.insert(path.clone()) {
                queue.push_back((path, Origin::Target));
            }
        }

        while let Some((path, origin)) = queue.pop_front() {
            let text = fs::read_to_string(&path).map_err(|source| BuildError::ReadError {
                path: path.clone(),
                source,
            })?;
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(|source| BuildError::ReadError {
                    path: path.clone(),
                    source,
                })?;
            let directives = parse_directives(&text);

            for include in &directives.includes {
                match self.resolve(include, &path, &roots) {
                    Some(resolved) => {
                        if visited.insert(resolved.clone()) {
                            queue.push_back((resolved, Origin::Include));
                        }
                    }
                    None => ui::verbose(format!(
                        "skipping untracked include {} in {}",
                        include.name,
                        path.display()
                    )),
                }
            }

            if self.companions
                && FileKind::of(&path) == FileKind::Header
                && let Some(source) = self.companion_of(&path)
                && visited.insert(source.clone())
            {
                ui::verbose(format!(
                    "{} pulls in companion {}",
                    path.display(),
                    source.display()
                ));
                queue.push_back((source, Origin::Companion));
            }

            set.insert(SourceFile {
                path,
                modified,
                origin,
                flags: directives.flags,
            });
        }

        Ok(set)
    }

    /// First existing candidate inside the roots. Quoted includes look next
    /// to the including file before the search paths.
    fn resolve(&self, include: &Include, from: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
        let local = match include.delimiter {
            Delimiter::Quote => from.parent(),
            Delimiter::Angle => None,
        };
        local
            .into_iter()
            .chain(self.search_paths.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(&include.name))
            .filter(|candidate| candidate.is_file())
            .filter_map(|candidate| fs::canonicalize(candidate).ok())
            .find(|candidate| roots.iter().any(|root| candidate.starts_with(root)))
    }

    /// The one source file implementing `header`, if any.
    fn companion_of(&self, header: &Path) -> Option<PathBuf> {
        let stem = header.file_stem()?.to_string_lossy().to_string();
        let candidates = self
            .companion_index
            .get_or_init(|| self.index_sources())
            .get(&stem)?;
        pick_companion(header, candidates)
    }

    /// Source files under the search paths, grouped by file stem.
    fn index_sources(&self) -> HashMap<String, Vec<PathBuf>> {
        let mut index: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for root in &self.search_paths {
            let walker = WalkDir::new(root)
                .max_depth(COMPANION_MAX_DEPTH)
                .into_iter()
                .filter_entry(|e| {
                    let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
                    !hidden && !self.ignored_dirs.iter().any(|d| e.path() == d)
                });
            for entry in walker.filter_map(|e| e.ok()) {
                let path = entry.path();
                if !entry.file_type().is_file() || FileKind::of(path) != FileKind::Source {
                    continue;
                }
                let (Some(stem), Ok(canonical)) = (path.file_stem(), fs::canonicalize(path)) else {
                    continue;
                };
                let bucket = index.entry(stem.to_string_lossy().to_string()).or_default();
                if !bucket.contains(&canonical) {
                    bucket.push(canonical);
                }
            }
        }
        for bucket in index.values_mut() {
            bucket.sort();
        }
        index
    }
}

/// Picks one of several same-stem sources for `header`: one next to the
/// header wins, then one in the `src/` sibling of an `include/` directory,
/// then the one with the fewest path components. Remaining ties go to the
/// smallest path.
fn pick_companion(header: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
    let header_dir = header.parent();
    let sibling_src = header_dir
        .filter(|dir| dir.file_name().is_some_and(|name| name == "include"))
        .and_then(Path::parent)
        .map(|dir| dir.join("src"));

    let rank = |candidate: &PathBuf| -> u8 {
        let dir = candidate.parent();
        if dir.is_some() && dir == header_dir {
            0
        } else if dir.is_some() && dir == sibling_src.as_deref() {
            1
        } else {
            2
        }
    };

    candidates
        .iter()
        .min_by_key(|candidate| (rank(*candidate), candidate.components().count(), *candidate))
        .cloned()
}
