use super::compdb::CompilationDatabase;
use super::decision::{self, BuildDecision};
use super::feedback::FeedbackAnalyzer;
use super::record::{BuildRecord, RECORD_NAME};
use super::utils::{compile_invocation, display_path};
use crate::config::{BuildConfig, COMPILE_COMMANDS_NAME};
use crate::deps::{DependencySet, Scanner, search_paths_for};
use crate::error::{BuildError, Result};
use crate::process::{Invocation, ProcessRunner};
use crate::toolchain::{self, Toolchain};
use crate::ui;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// What the user asked for on one invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Source files to compile; the first one is the root.
    pub targets: Vec<PathBuf>,
    /// Arguments forwarded to the built program.
    pub run_args: Vec<String>,
    /// Run the program under the configured debugger.
    pub debug: bool,
}

/// Everything known about a build before anything is executed.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub deps: DependencySet,
    pub search_paths: Vec<PathBuf>,
    /// Absolute path of the binary.
    pub output: PathBuf,
    pub toolchain: Toolchain,
    pub invocation: Invocation,
}

/// Scan, decide, compile and run, in that order.
pub struct Driver<'a, R: ProcessRunner> {
    config: &'a BuildConfig,
    runner: &'a R,
    project_dir: PathBuf,
}

impl<'a, R: ProcessRunner> Driver<'a, R> {
    pub fn new(config: &'a BuildConfig, runner: &'a R, project_dir: &Path) -> Result<Self> {
        let project_dir =
            fs::canonicalize(project_dir).map_err(|source| BuildError::io(project_dir, source))?;
        Ok(Self {
            config,
            runner,
            project_dir,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn database_path(&self) -> PathBuf {
        self.project_dir.join(COMPILE_COMMANDS_NAME)
    }

    /// Absolute path of the binary built from `root`.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        self.project_dir.join(self.config.output_path(root))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Scans the targets and resolves the toolchain. A missing root file is
    /// reported before any compiler lookup happens.
    pub fn plan(&self, targets: &[PathBuf]) -> Result<BuildPlan> {
        let targets: Vec<PathBuf> = targets.iter().map(|t| self.absolute(t)).collect();
        let Some(root) = targets.first() else {
            return Err(BuildError::MissingRootFile {
                path: PathBuf::new(),
            });
        };

        let scanner = Scanner::new(search_paths_for(root, &self.config.include_dirs))
            .with_companions(self.config.companion_sources)
            .ignore_dir(&self.project_dir.join(&self.config.output_dir));
        let deps = scanner.scan(&targets)?;
        ui::verbose(format!("{} files in the dependency set", deps.len()));

        let output = self.output_path(root);
        let toolchain = toolchain::resolve(self.config, self.runner)?;
        let search_paths = scanner.search_paths().to_vec();
        let invocation = compile_invocation(
            &toolchain,
            self.config,
            &deps,
            &search_paths,
            &output,
            &self.project_dir,
        );

        Ok(BuildPlan {
            deps,
            search_paths,
            output,
            toolchain,
            invocation,
        })
    }

    /// Where the commands of successful compiles are kept.
    pub fn record_path(&self) -> PathBuf {
        self.project_dir.join(&self.config.output_dir).join(RECORD_NAME)
    }

    /// Compares the plan with the binary on disk and with the command that
    /// last built it successfully.
    pub fn decide(&self, plan: &BuildPlan) -> BuildDecision {
        let record = BuildRecord::load(&self.record_path());
        decision::decide(
            &plan.deps,
            &plan.output,
            record.command_for(&plan.output),
            &plan.invocation.argv(),
        )
    }

    pub fn write_database(&self, plan: &BuildPlan) -> Result<()> {
        let db = CompilationDatabase::for_units(
            &self.project_dir,
            &plan.deps.compilable(),
            &plan.invocation,
        );
        let path = self.database_path();
        db.write(&path)?;
        ui::verbose(format!(
            "wrote {} entries to {}",
            db.entries().len(),
            path.display()
        ));
        Ok(())
    }

    pub fn compile(&self, plan: &BuildPlan) -> Result<()> {
        if let Some(parent) = plan.output.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::io(parent, source))?;
        }

        ui::executing(plan.invocation.to_string());
        let start = Instant::now();
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "Compiling {}",
            display_path(&plan.output, &self.project_dir)
        ));
        pb.enable_steady_tick(Duration::from_millis(80));

        let result = self.runner.capture(&plan.invocation);
        pb.finish_and_clear();

        let captured = result.map_err(|source| BuildError::Spawn {
            program: plan.invocation.program.clone(),
            source,
        })?;
        print!("{}", captured.stdout);

        if !captured.success() {
            eprint!("{}", captured.stderr);
            if let Some(hint) = FeedbackAnalyzer::analyze(&captured.stderr) {
                eprintln!("\n{} {}", "hint:".bold().cyan(), hint);
            }
            return Err(BuildError::CompileError {
                code: captured.code,
                stderr: captured.stderr,
            });
        }

        if !captured.stderr.trim().is_empty() {
            ui::warn("compiler warnings:");
            eprint!("{}", captured.stderr);
        }

        let record_path = self.record_path();
        let mut record = BuildRecord::load(&record_path);
        record.set(&plan.output, plan.invocation.argv());
        record.write(&record_path)?;

        ui::success(format!("Build finished in {:.2?}", start.elapsed()));
        Ok(())
    }

    /// Runs the binary with inherited stdio and returns its exit code.
    pub fn run(&self, plan: &BuildPlan, args: &[String], debug: bool) -> Result<i32> {
        let exe = plan.output.to_string_lossy().to_string();
        let invocation = if debug {
            Invocation::new(self.config.debugger.clone())
                .arg("--args")
                .arg(exe)
                .args(args.iter().cloned())
        } else {
            Invocation::new(exe).args(args.iter().cloned())
        };

        ui::executing(invocation.to_string());
        self.runner
            .run(&invocation)
            .map_err(|source| BuildError::Spawn {
                program: invocation.program.clone(),
                source,
            })
    }

    /// The full pipeline. `Ok` carries the program's exit code.
    pub fn execute(&self, request: &BuildRequest) -> Result<i32> {
        let plan = self.plan(&request.targets)?;
        let decision = self.decide(&plan);
        self.write_database(&plan)?;

        match &decision {
            BuildDecision::Stale(reason) => {
                ui::verbose(format!("rebuilding: {}", reason));
                self.compile(&plan)?;
            }
            BuildDecision::Fresh => ui::verbose("up to date, skipping compilation"),
        }

        self.run(&plan, &request.run_args, request.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::decision::StaleReason;
    use crate::process::Captured;
    use std::cell::RefCell;
    use std::fs::File;
    use std::io;
    use std::time::SystemTime;

    /// Records every invocation. Compiling writes the `-o` file unless the
    /// compile is configured to fail.
    #[derive(Default)]
    struct FakeRunner {
        calls: RefCell<Vec<Invocation>>,
        compile_code: i32,
        compile_stderr: String,
        exit_code: i32,
    }

    impl FakeRunner {
        fn compiles(&self) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.program == "fake-c++" && c.args.iter().any(|a| a == "-o"))
                .count()
        }

        fn runs(&self) -> Vec<Invocation> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.program != "fake-c++")
                .cloned()
                .collect()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> io::Result<i32> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(self.exit_code)
        }

        fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
            self.calls.borrow_mut().push(invocation.clone());
            if invocation.args == ["--version"] {
                return Ok(Captured {
                    code: 1,
                    ..Captured::default()
                });
            }
            if self.compile_code == 0 {
                let pos = invocation.args.iter().position(|a| a == "-o").unwrap();
                let out = invocation.cwd.clone().unwrap().join(&invocation.args[pos + 1]);
                fs::write(out, "binary")?;
            }
            Ok(Captured {
                code: self.compile_code,
                stdout: String::new(),
                stderr: self.compile_stderr.clone(),
            })
        }
    }

    fn config() -> BuildConfig {
        BuildConfig {
            compiler: Some("fake-c++".to_string()),
            standard: Some("c++17".to_string()),
            ..BuildConfig::default()
        }
    }

    /// main.cpp including add/include/add.h, as a project would lay it out.
    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("add/include")).unwrap();
        fs::write(
            dir.path().join("main.cpp"),
            "#include <cstdio>\n#include \"add/include/add.h\"\nint main() { return add(3, 4); }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("add/include/add.h"),
            "inline int add(int a, int b) { return a + b; }\n",
        )
        .unwrap();
        dir
    }

    fn request() -> BuildRequest {
        BuildRequest {
            targets: vec![PathBuf::from("main.cpp")],
            run_args: vec!["--flag".to_string()],
            debug: false,
        }
    }

    #[test]
    fn test_first_run_compiles_and_forwards_exit_code() {
        let dir = project();
        let config = config();
        let runner = FakeRunner {
            exit_code: 7,
            ..FakeRunner::default()
        };
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        let plan = driver.plan(&request().targets).unwrap();
        let names: Vec<String> = plan
            .deps
            .paths()
            .map(|p| display_path(p, driver.project_dir()))
            .collect();
        assert_eq!(names, ["add/include/add.h", "main.cpp"]);
        assert_eq!(
            driver.decide(&plan),
            BuildDecision::Stale(StaleReason::MissingOutput)
        );

        assert_eq!(driver.execute(&request()).unwrap(), 7);
        assert_eq!(runner.compiles(), 1);
        assert!(driver.project_dir().join("build/main").exists());

        let runs = runner.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].program.ends_with("build/main"));
        assert_eq!(runs[0].args, ["--flag"]);
    }

    #[test]
    fn test_second_run_skips_compiler_but_rewrites_database() {
        let dir = project();
        let config = config();
        let runner = FakeRunner::default();
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        driver.execute(&request()).unwrap();
        fs::remove_file(driver.database_path()).unwrap();
        driver.execute(&request()).unwrap();

        assert_eq!(runner.compiles(), 1);
        assert_eq!(runner.runs().len(), 2);
        let db = CompilationDatabase::load(&driver.database_path()).unwrap();
        assert_eq!(db.entries().len(), 1);
        assert_eq!(db.entries()[0].arguments[0], "fake-c++");
    }

    #[test]
    fn test_touched_header_triggers_recompile() {
        let dir = project();
        let config = config();
        let runner = FakeRunner::default();
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();
        driver.execute(&request()).unwrap();

        let header = driver.project_dir().join("add/include/add.h");
        File::options()
            .write(true)
            .open(&header)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let plan = driver.plan(&request().targets).unwrap();
        assert_eq!(
            driver.decide(&plan),
            BuildDecision::Stale(StaleReason::NewerDependency(header))
        );
        driver.execute(&request()).unwrap();
        assert_eq!(runner.compiles(), 2);
    }

    #[test]
    fn test_changed_flags_trigger_recompile() {
        let dir = project();
        let runner = FakeRunner::default();
        let debug = config();
        Driver::new(&debug, &runner, dir.path())
            .unwrap()
            .execute(&request())
            .unwrap();

        let release = BuildConfig {
            release: true,
            ..config()
        };
        let driver = Driver::new(&release, &runner, dir.path()).unwrap();
        let plan = driver.plan(&request().targets).unwrap();
        assert_eq!(
            driver.decide(&plan),
            BuildDecision::Stale(StaleReason::CommandChanged)
        );
    }

    #[test]
    fn test_failed_rebuild_keeps_old_command_on_record() {
        let dir = project();
        let debug = config();
        let release = BuildConfig {
            release: true,
            ..config()
        };

        let ok = FakeRunner::default();
        Driver::new(&debug, &ok, dir.path())
            .unwrap()
            .execute(&request())
            .unwrap();

        let failing = FakeRunner {
            compile_code: 1,
            ..FakeRunner::default()
        };
        let driver = Driver::new(&release, &failing, dir.path()).unwrap();
        assert!(driver.execute(&request()).is_err());
        assert!(failing.runs().is_empty());

        let retry = FakeRunner::default();
        let driver = Driver::new(&release, &retry, dir.path()).unwrap();
        let plan = driver.plan(&request().targets).unwrap();
        assert_eq!(
            driver.decide(&plan),
            BuildDecision::Stale(StaleReason::CommandChanged)
        );
        driver.execute(&request()).unwrap();
        assert_eq!(retry.compiles(), 1);

        let record = BuildRecord::load(&driver.record_path());
        assert!(record.command_for(&plan.output).unwrap().contains(&"-O3".to_string()));
    }

    #[test]
    fn test_compile_failure_does_not_run() {
        let dir = project();
        let config = config();
        let runner = FakeRunner {
            compile_code: 1,
            compile_stderr: "main.cpp:3:1: error: expected ';'\n".to_string(),
            ..FakeRunner::default()
        };
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        let err = driver.execute(&request()).unwrap_err();
        assert!(matches!(err, BuildError::CompileError { code: 1, .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_COMPILE_FAILURE);
        assert!(runner.runs().is_empty());
        assert!(driver.database_path().exists());
    }

    #[test]
    fn test_missing_root_never_calls_compiler() {
        let dir = project();
        let config = config();
        let runner = FakeRunner::default();
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        let err = driver
            .execute(&BuildRequest {
                targets: vec![PathBuf::from("nope.cpp")],
                ..BuildRequest::default()
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingRootFile { .. }));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_companion_source_is_compiled_and_recorded() {
        let dir = project();
        fs::create_dir_all(dir.path().join("add/src")).unwrap();
        fs::write(dir.path().join("add/src/add.cpp"), "#include \"../include/add.h\"\n").unwrap();
        let config = config();
        let runner = FakeRunner::default();
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        driver.execute(&request()).unwrap();

        let db = CompilationDatabase::load(&driver.database_path()).unwrap();
        let files: Vec<&str> = db.entries().iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("main.cpp"));
        assert!(files[1].ends_with("add/src/add.cpp"));
        assert!(db.entries()[0].arguments.ends_with(&[
            "main.cpp".to_string(),
            "add/src/add.cpp".to_string()
        ]));
    }

    #[test]
    fn test_debug_runs_under_debugger() {
        let dir = project();
        let config = config();
        let runner = FakeRunner::default();
        let driver = Driver::new(&config, &runner, dir.path()).unwrap();

        driver
            .execute(&BuildRequest {
                debug: true,
                ..request()
            })
            .unwrap();
        let runs = runner.runs();
        assert_eq!(runs[0].program, "gdb");
        assert_eq!(runs[0].args[0], "--args");
        assert!(runs[0].args[1].ends_with("build/main"));
        assert_eq!(runs[0].args[2], "--flag");
    }
}
