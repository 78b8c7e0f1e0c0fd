//! Compiler discovery and language-standard selection.
//!
//! A configured compiler is used as-is. Otherwise the preferred family is
//! looked up on PATH with `which`, falling back to the other family. When no
//! standard is configured the compiler's `--version` output decides.

pub mod types;

pub use types::{CompilerKind, Toolchain, ToolchainError, Version};

use crate::config::BuildConfig;
use crate::process::{Invocation, ProcessRunner};
use crate::ui;
use regex::Regex;
use std::sync::LazyLock;

/// Used when the compiler version can not be determined.
pub const FALLBACK_STANDARD: &str = "c++17";

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" (?P<version>[0-9]+(?:\.[0-9]+)*)(?:-|\s|$)").unwrap());

/// Picks the compiler and `-std=` flag for this run.
pub fn resolve<R: ProcessRunner>(
    config: &BuildConfig,
    runner: &R,
) -> Result<Toolchain, ToolchainError> {
    let (compiler, kind) = match &config.compiler {
        Some(compiler) => (compiler.clone(), CompilerKind::from_path(compiler)),
        None => {
            let kind = discover(config.prefer, runner)?;
            (kind.binary().to_string(), Some(kind))
        }
    };

    let version = probe_version(&compiler, runner);
    let standard = match (&config.standard, kind, &version) {
        (Some(standard), _, _) => standard.clone(),
        (None, Some(kind), Some(version)) => kind
            .newest_standard(version)
            .unwrap_or(FALLBACK_STANDARD)
            .to_string(),
        _ => FALLBACK_STANDARD.to_string(),
    };

    let toolchain = Toolchain {
        kind,
        compiler,
        version,
        std_flag: std_flag(&standard),
    };
    ui::verbose(format!(
        "using {} ({}) with {}",
        toolchain.compiler,
        toolchain
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown version".to_string()),
        toolchain.std_flag
    ));
    Ok(toolchain)
}

/// Finds the preferred compiler family on PATH, or the other one.
fn discover<R: ProcessRunner>(
    prefer: CompilerKind,
    runner: &R,
) -> Result<CompilerKind, ToolchainError> {
    for kind in [prefer, prefer.other()] {
        let lookup = Invocation::new("which").arg(kind.binary());
        if let Ok(out) = runner.capture(&lookup)
            && out.success()
            && !out.stdout.trim().is_empty()
        {
            ui::verbose(format!("found {} at {}", kind, out.stdout.trim()));
            return Ok(kind);
        }
    }
    Err(ToolchainError::NotFound(format!(
        "{}, {}",
        prefer.binary(),
        prefer.other().binary()
    )))
}

/// Runs `<compiler> --version` and parses the first dotted number.
fn probe_version<R: ProcessRunner>(compiler: &str, runner: &R) -> Option<Version> {
    let out = runner
        .capture(&Invocation::new(compiler).arg("--version"))
        .ok()?;
    if !out.success() {
        return None;
    }
    parse_version(&out.stdout)
}

/// Extracts the version from the first line of `--version` output.
pub fn parse_version(output: &str) -> Option<Version> {
    let first = output.lines().next()?;
    let caps = VERSION_PATTERN.captures(first)?;
    Version::parse(&caps["version"])
}

/// Normalizes a standard name to the GCC/Clang `-std=` flag.
pub fn std_flag(standard: &str) -> String {
    let normalized = standard.trim().to_lowercase();
    let bare = normalized.strip_prefix("-std=").unwrap_or(&normalized);

    let canonical = match bare {
        "c++98" | "c++03" => "c++03",
        "c++11" | "c++0x" => "c++11",
        "c++14" | "c++1y" => "c++14",
        "c++17" | "c++1z" => "c++17",
        "c++20" | "c++2a" => "c++20",
        "c++23" | "c++2b" => "c++23",
        "c++26" | "c++2c" => "c++26",
        "gnu++98" | "gnu++03" => "gnu++03",
        "gnu++11" | "gnu++0x" => "gnu++11",
        "gnu++14" | "gnu++1y" => "gnu++14",
        "gnu++17" | "gnu++1z" => "gnu++17",
        "gnu++20" | "gnu++2a" => "gnu++20",
        "gnu++23" | "gnu++2b" => "gnu++23",
        "gnu++26" | "gnu++2c" => "gnu++26",
        "c17" | "c18" => "c17",
        "c23" | "c2x" => "c23",
        other => other,
    };
    format!("-std={}", canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Captured;
    use std::cell::RefCell;
    use std::io;

    /// Answers `which` for the listed binaries and `--version` with a fixed line.
    struct FakeRunner {
        on_path: Vec<&'static str>,
        version_line: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, _invocation: &Invocation) -> io::Result<i32> {
            unreachable!("toolchain resolution never runs attached processes")
        }

        fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
            self.calls.borrow_mut().push(invocation.to_string());
            if invocation.program == "which" {
                let found = self.on_path.contains(&invocation.args[0].as_str());
                return Ok(Captured {
                    code: if found { 0 } else { 1 },
                    stdout: if found {
                        format!("/usr/bin/{}\n", invocation.args[0])
                    } else {
                        String::new()
                    },
                    stderr: String::new(),
                });
            }
            match self.version_line {
                Some(line) => Ok(Captured {
                    code: 0,
                    stdout: format!("{}\nTarget: x86_64-pc-linux-gnu\n", line),
                    stderr: String::new(),
                }),
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }
    }

    fn runner(on_path: Vec<&'static str>, version_line: Option<&'static str>) -> FakeRunner {
        FakeRunner {
            on_path,
            version_line,
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_parse_version_lines() {
        assert_eq!(
            parse_version("clang version 17.0.6 (Fedora 17.0.6-2.fc39)"),
            Some(Version(vec![17, 0, 6]))
        );
        assert_eq!(
            parse_version("g++ (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0"),
            Some(Version(vec![11, 4, 0]))
        );
        assert_eq!(parse_version("no digits here"), None);
    }

    #[test]
    fn test_newest_standard_tables() {
        let gcc = CompilerKind::Gcc;
        assert_eq!(gcc.newest_standard(&Version(vec![4, 8])), Some("c++11"));
        assert_eq!(gcc.newest_standard(&Version(vec![9, 4, 0])), Some("c++17"));
        assert_eq!(gcc.newest_standard(&Version(vec![13, 2])), Some("c++23"));
        assert_eq!(gcc.newest_standard(&Version(vec![4, 1])), None);

        let clang = CompilerKind::Clang;
        assert_eq!(clang.newest_standard(&Version(vec![5])), Some("c++17"));
        assert_eq!(clang.newest_standard(&Version(vec![17, 0, 0])), Some("c++20"));
        assert_eq!(clang.newest_standard(&Version(vec![17, 0, 6])), Some("c++26"));
    }

    #[test]
    fn test_version_ordering_pads_with_zero() {
        assert_eq!(Version(vec![5]), Version(vec![5, 0, 0]));
        assert!(Version(vec![10, 1]) > Version(vec![10]));
        assert!(Version(vec![4, 9]) < Version(vec![5, 1, 0]));
    }

    #[test]
    fn test_std_flag_aliases() {
        assert_eq!(std_flag("c++2a"), "-std=c++20");
        assert_eq!(std_flag("C++17"), "-std=c++17");
        assert_eq!(std_flag("-std=c++1y"), "-std=c++14");
        assert_eq!(std_flag("gnu++2b"), "-std=gnu++23");
        assert_eq!(std_flag("c++98"), "-std=c++03");
    }

    #[test]
    fn test_std_flag_passthrough() {
        assert_eq!(std_flag("c++29"), "-std=c++29");
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            CompilerKind::from_path("/usr/bin/clang++-17"),
            Some(CompilerKind::Clang)
        );
        assert_eq!(CompilerKind::from_path("g++-13"), Some(CompilerKind::Gcc));
        assert_eq!(
            CompilerKind::from_path("x86_64-linux-gnu-g++"),
            Some(CompilerKind::Gcc)
        );
        assert_eq!(CompilerKind::from_path("/opt/fake/cc-wrapper"), None);
    }

    #[test]
    fn test_discovery_prefers_configured_family() {
        let fake = runner(vec!["clang++", "g++"], Some("g++ (GCC) 12.2.0"));
        let config = BuildConfig {
            prefer: CompilerKind::Gcc,
            ..BuildConfig::default()
        };
        let tc = resolve(&config, &fake).unwrap();
        assert_eq!(tc.compiler, "g++");
        assert_eq!(tc.kind, Some(CompilerKind::Gcc));
        assert_eq!(tc.std_flag, "-std=c++23");
    }

    #[test]
    fn test_discovery_falls_back_to_other_family() {
        let fake = runner(vec!["g++"], Some("g++ (GCC) 9.4.0"));
        let tc = resolve(&BuildConfig::default(), &fake).unwrap();
        assert_eq!(tc.compiler, "g++");
        assert_eq!(tc.std_flag, "-std=c++17");
        assert_eq!(fake.calls.borrow()[0], "which clang++");
    }

    #[test]
    fn test_no_compiler_on_path() {
        let fake = runner(vec![], None);
        let err = resolve(&BuildConfig::default(), &fake).unwrap_err();
        assert!(err.to_string().contains("clang++, g++"));
    }

    #[test]
    fn test_configured_standard_wins_over_probe() {
        let fake = runner(vec![], Some("clang version 18.1.0"));
        let config = BuildConfig {
            compiler: Some("/opt/llvm/bin/clang++".to_string()),
            standard: Some("c++1z".to_string()),
            ..BuildConfig::default()
        };
        let tc = resolve(&config, &fake).unwrap();
        assert_eq!(tc.compiler, "/opt/llvm/bin/clang++");
        assert_eq!(tc.std_flag, "-std=c++17");
        assert!(fake.calls.borrow().iter().all(|c| !c.starts_with("which")));
    }

    #[test]
    fn test_unknown_compiler_uses_fallback_standard() {
        let fake = runner(vec![], None);
        let config = BuildConfig {
            compiler: Some("/opt/fake/cc-wrapper".to_string()),
            ..BuildConfig::default()
        };
        let tc = resolve(&config, &fake).unwrap();
        assert_eq!(tc.version, None);
        assert_eq!(tc.std_flag, format!("-std={}", FALLBACK_STANDARD));
    }
}
