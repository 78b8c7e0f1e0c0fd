//! Include-based dependency scanning.
//!
//! Starting from the source files named on the command line, the scanner
//! reads every reachable file once and follows its `#include` directives
//! through the search paths:
//!
//! - **Search paths**: the root file's directory, then configured include dirs
//! - **Untracked includes**: anything that resolves to nothing (usually a
//!   standard-library header) is skipped
//! - **Companions**: including `foo.h` can pull in a matching `foo.cpp`

mod scan;
mod source;

pub use scan::{Delimiter, Directives, Include, Scanner, parse_directives, search_paths_for};
pub use source::{DependencySet, FileKind, Origin, SourceFile};
