//! # tiny-make - compile and run small C++ programs
//!
//! tiny-make takes the source file that holds `main()`, follows its local
//! `#include` directives, and rebuilds the binary only when something it
//! depends on changed. Every run also refreshes `compile_commands.json` so
//! editors and linters see the exact compiler command.
//!
//! ## Quick Start
//!
//! ```bash
//! # Build (if needed) and run, forwarding arguments after `--`
//! tiny-make main.cpp -- --input data.txt
//!
//! # Optimized build, extra include dir, link libm
//! tiny-make -r -I third_party -l m main.cpp
//! ```
//!
//! ## Module Organization
//!
//! - [`deps`] - Include scanning and the dependency set
//! - [`build`] - Staleness decision, compile_commands.json, compile and run
//! - [`toolchain`] - Compiler discovery and `-std=` selection
//! - [`config`] - Layered configuration (`.tiny-make.toml`)

/// Staleness, compilation database, compile and run.
pub mod build;

/// Configuration layering (`.tiny-make.toml`).
pub mod config;

/// Include-based dependency scanning.
pub mod deps;

/// Typed build errors and tool exit codes.
pub mod error;

/// Child process execution behind a swappable runner.
pub mod process;

/// Compiler detection and standard selection.
pub mod toolchain;

/// Dependency listing (`--deps`).
pub mod tree;

/// Terminal UI utilities (tables, colors).
pub mod ui;

pub use error::{BuildError, Result};
