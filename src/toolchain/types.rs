use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Compiler families whose flags and version output we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerKind {
    /// GNU Compiler Collection (g++)
    Gcc,
    /// Clang/LLVM (clang++)
    Clang,
}

impl CompilerKind {
    /// Parses a preference name such as `g++` or `clang++`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gcc" | "g++" => Some(CompilerKind::Gcc),
            "clang" | "clang++" => Some(CompilerKind::Clang),
            _ => None,
        }
    }

    /// Guesses the family from a compiler path like `/usr/bin/clang++-17`.
    pub fn from_path(path: &str) -> Option<Self> {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        if file.contains("clang") {
            Some(CompilerKind::Clang)
        } else if file.starts_with("g++") || file.starts_with("gcc") || file.contains("-g++") {
            Some(CompilerKind::Gcc)
        } else {
            None
        }
    }

    /// Binary name looked up on PATH.
    pub fn binary(&self) -> &'static str {
        match self {
            CompilerKind::Gcc => "g++",
            CompilerKind::Clang => "clang++",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            CompilerKind::Gcc => CompilerKind::Clang,
            CompilerKind::Clang => CompilerKind::Gcc,
        }
    }

    /// Minimum compiler version for each standard, oldest first.
    fn standards(&self) -> &'static [([u32; 3], &'static str)] {
        match self {
            CompilerKind::Gcc => &[
                ([4, 7, 1], "c++11"),
                ([4, 9, 0], "c++14"),
                ([5, 1, 0], "c++17"),
                ([10, 1, 0], "c++20"),
                ([11, 1, 0], "c++23"),
            ],
            CompilerKind::Clang => &[
                ([3, 3, 0], "c++11"),
                ([3, 4, 0], "c++14"),
                ([5, 0, 0], "c++17"),
                ([10, 0, 0], "c++20"),
                ([17, 0, 1], "c++26"),
            ],
        }
    }

    /// Newest standard this compiler version supports, if any is known.
    pub fn newest_standard(&self, version: &Version) -> Option<&'static str> {
        self.standards()
            .iter()
            .filter(|(min, _)| Version::from_parts(min) <= *version)
            .map(|(_, std)| *std)
            .last()
    }
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Dotted compiler version. Missing trailing components compare as zero.
#[derive(Debug, Clone)]
pub struct Version(pub Vec<u32>);

impl Version {
    pub fn from_parts(parts: &[u32]) -> Self {
        Version(parts.to_vec())
    }

    pub fn parse(text: &str) -> Option<Self> {
        let parts: Option<Vec<u32>> = text.split('.').map(|p| p.parse().ok()).collect();
        parts.filter(|p| !p.is_empty()).map(Version)
    }

    fn component(&self, idx: usize) -> u32 {
        self.0.get(idx).copied().unwrap_or(0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// The compiler chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub kind: Option<CompilerKind>,
    /// Program name or path, passed to the process runner verbatim.
    pub compiler: String,
    pub version: Option<Version>,
    /// Normalized `-std=` flag.
    pub std_flag: String,
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("no C++ compiler found (tried {0}); install clang or gcc, or set `compiler` in .tiny-make.toml")]
    NotFound(String),
}
