//! # tiny-make CLI Entry Point
//!
//! Parses arguments with clap, layers them over the configuration files and
//! hands the request to the build driver. The process exits with the built
//! program's own exit code, or with a tool exit code on failure:
//! - **1**: configuration, toolchain or I/O failure
//! - **2**: a source file could not be found or read
//! - **3**: the compiler rejected the program

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use tiny_make::build::{self, BuildRequest, Driver};
use tiny_make::config::BuildConfig;
use tiny_make::error::{BuildError, EXIT_TOOL_FAILURE};
use tiny_make::process::SystemRunner;
use tiny_make::toolchain::CompilerKind;
use tiny_make::tree;
use tiny_make::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser, Debug)]
#[command(name = "tiny-make")]
#[command(about = "Compile (only if needed) and run a C++ program", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Source file with main(), followed by any extra sources to compile
    #[arg(required_unless_present = "clean", value_name = "SOURCES")]
    sources: Vec<PathBuf>,

    /// Arguments passed to the program
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,

    /// Compiler to use instead of searching PATH
    #[arg(short, long)]
    compiler: Option<String>,

    /// Compiler family to look for first (clang++ or g++)
    #[arg(long, value_name = "COMPILER")]
    prefer: Option<String>,

    /// Language standard, e.g. c++20 (default: newest supported)
    #[arg(long = "std", value_name = "STANDARD")]
    standard: Option<String>,

    /// Build with optimizations
    #[arg(short, long)]
    release: bool,

    /// Extra include directory (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Library to link (repeatable)
    #[arg(short = 'l', long = "lib", value_name = "NAME")]
    libs: Vec<String>,

    /// Output binary path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not pull in foo.cpp when foo.h is included
    #[arg(long)]
    no_companions: bool,

    /// Run the program under the debugger
    #[arg(short = 'g', long)]
    debug: bool,

    /// Print the dependency set and whether a rebuild is needed
    #[arg(long, conflicts_with_all = ["clean", "watch"])]
    deps: bool,

    /// Remove build outputs and exit
    #[arg(long, conflicts_with = "watch")]
    clean: bool,

    /// Rebuild and rerun on every change
    #[arg(short, long)]
    watch: bool,

    /// Print what tiny-make is doing
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags are the last configuration layer.
    fn apply(&self, config: &mut BuildConfig, project_dir: &Path) -> Result<()> {
        if let Some(compiler) = &self.compiler {
            config.compiler = Some(compiler.clone());
        }
        if let Some(prefer) = &self.prefer {
            config.prefer = CompilerKind::from_name(prefer)
                .with_context(|| format!("Unknown compiler preference \"{}\"", prefer))?;
        }
        if let Some(standard) = &self.standard {
            config.standard = Some(standard.clone());
        }
        if self.release {
            config.release = true;
        }
        config
            .include_dirs
            .extend(self.include_dirs.iter().map(|dir| project_dir.join(dir)));
        config.libs.extend(self.libs.iter().cloned());
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if self.no_companions {
            config.companion_sources = false;
        }
        Ok(())
    }

    fn request(&self) -> BuildRequest {
        BuildRequest {
            targets: self.sources.clone(),
            run_args: self.args.clone(),
            debug: self.debug,
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let project_dir = std::env::current_dir().context("Failed to read the working directory")?;
    let mut config = BuildConfig::load(&project_dir)?;
    cli.apply(&mut config, &project_dir)?;

    if cli.clean {
        build::clean(&config, &project_dir)?;
        return Ok(0);
    }

    let request = cli.request();
    if cli.watch {
        build::watch(&config, &project_dir, &request)?;
        return Ok(0);
    }

    let runner = SystemRunner;
    let driver = Driver::new(&config, &runner, &project_dir)?;
    if cli.deps {
        let plan = driver.plan(&request.targets)?;
        let decision = driver.decide(&plan);
        tree::print_dependencies(&plan, &decision, driver.project_dir());
        return Ok(0);
    }

    Ok(driver.execute(&request)?)
}

fn main() {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    ui::set_verbose(cli.verbose);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::error(format!("{:#}", e));
            let code = e
                .downcast_ref::<BuildError>()
                .map(BuildError::exit_code)
                .unwrap_or(EXIT_TOOL_FAILURE);
            std::process::exit(code);
        }
    }
}
