//! Configuration layering.
//!
//! Built-in defaults, then `<config_dir>/tiny-make/config.toml`, then
//! `.tiny-make.toml` in the project directory, then command-line flags.
//! Scalars from later layers replace earlier ones, lists are appended.

use crate::toolchain::CompilerKind;
use crate::ui;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_NAME: &str = ".tiny-make.toml";
pub const COMPILE_COMMANDS_NAME: &str = "compile_commands.json";

/// One TOML layer as written on disk. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub compiler: Option<String>,
    pub prefer: Option<String>,
    pub standard: Option<String>,
    pub flags: Vec<String>,
    pub release_flags: Option<Vec<String>>,
    pub debug_flags: Option<Vec<String>>,
    pub include_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub companion_sources: Option<bool>,
    pub debugger: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Option<ConfigFile>> {
        if !path.exists() {
            return Ok(None);
        }
        ui::verbose(format!("loading config from \"{}\"", path.display()));
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config \"{}\"", path.display()))?;
        let layer = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config \"{}\"", path.display()))?;
        Ok(Some(layer))
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Explicit compiler binary; `None` means discover one on PATH.
    pub compiler: Option<String>,
    pub prefer: CompilerKind,
    /// Language standard; `None` means pick the newest the compiler supports.
    pub standard: Option<String>,
    pub release: bool,
    pub flags: Vec<String>,
    pub release_flags: Vec<String>,
    pub debug_flags: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub output_dir: PathBuf,
    /// Explicit output binary path, overrides `output_dir/<stem>`.
    pub output: Option<PathBuf>,
    pub companion_sources: bool,
    pub debugger: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            prefer: CompilerKind::Clang,
            standard: None,
            release: false,
            flags: Vec::new(),
            release_flags: vec!["-O3".to_string()],
            debug_flags: vec![
                "-g".to_string(),
                "-O0".to_string(),
                "-fno-omit-frame-pointer".to_string(),
            ],
            include_dirs: Vec::new(),
            libs: Vec::new(),
            output_dir: PathBuf::from("build"),
            output: None,
            companion_sources: true,
            debugger: "gdb".to_string(),
        }
    }
}

impl BuildConfig {
    /// Defaults overlaid with the user and project config files.
    pub fn load(project_dir: &Path) -> Result<BuildConfig> {
        let mut config = BuildConfig::default();
        if let Some(user) = user_config_path()
            && let Some(layer) = ConfigFile::load(&user)?
        {
            config.apply(layer, project_dir)?;
        }
        if let Some(layer) = ConfigFile::load(&project_dir.join(LOCAL_CONFIG_NAME))? {
            config.apply(layer, project_dir)?;
        }
        Ok(config)
    }

    pub fn apply(&mut self, layer: ConfigFile, project_dir: &Path) -> Result<()> {
        if let Some(compiler) = layer.compiler {
            self.compiler = Some(compiler);
        }
        if let Some(prefer) = layer.prefer {
            self.prefer = CompilerKind::from_name(&prefer)
                .with_context(|| format!("Unknown compiler preference \"{}\"", prefer))?;
        }
        if let Some(standard) = layer.standard {
            self.standard = Some(standard);
        }
        self.flags.extend(layer.flags);
        if let Some(flags) = layer.release_flags {
            self.release_flags = flags;
        }
        if let Some(flags) = layer.debug_flags {
            self.debug_flags = flags;
        }
        self.include_dirs
            .extend(layer.include_dirs.into_iter().map(|dir| project_dir.join(dir)));
        self.libs.extend(layer.libs);
        if let Some(dir) = layer.output_dir {
            self.output_dir = dir;
        }
        if let Some(companions) = layer.companion_sources {
            self.companion_sources = companions;
        }
        if let Some(debugger) = layer.debugger {
            self.debugger = debugger;
        }
        Ok(())
    }

    /// Debug or release flags, depending on the profile.
    pub fn profile_flags(&self) -> &[String] {
        if self.release {
            &self.release_flags
        } else {
            &self.debug_flags
        }
    }

    /// Where the binary for `root` lands, relative to the project directory
    /// unless configured as an absolute path.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = root
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "a.out".to_string());
        let name = if cfg!(target_os = "windows") {
            format!("{}.exe", stem)
        } else {
            stem
        };
        self.output_dir.join(name)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tiny-make").join("config.toml"))
}
