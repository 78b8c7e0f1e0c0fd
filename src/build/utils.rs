use crate::config::BuildConfig;
use crate::deps::DependencySet;
use crate::process::Invocation;
use crate::toolchain::Toolchain;
use std::path::{Path, PathBuf};

/// `path` relative to `base` when it lives below it, otherwise absolute.
pub fn display_path(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

/// Assembles the single compile-and-link command:
///
/// `<compiler> <-std> <profile flags> <flags> <in-source flags> <-I...> -o <output> <sources...> <-l...>`
///
/// Paths are written relative to `project_dir`, which is also the
/// compiler's working directory.
pub fn compile_invocation(
    toolchain: &Toolchain,
    config: &BuildConfig,
    deps: &DependencySet,
    search_paths: &[PathBuf],
    output: &Path,
    project_dir: &Path,
) -> Invocation {
    let mut args: Vec<String> = vec![toolchain.std_flag.clone()];
    args.extend(config.profile_flags().iter().cloned());
    args.extend(config.flags.iter().cloned());
    args.extend(deps.embedded_flags());
    args.extend(
        search_paths
            .iter()
            .map(|dir| format!("-I{}", display_path(dir, project_dir))),
    );
    args.push("-o".to_string());
    args.push(display_path(output, project_dir));
    args.extend(
        deps.compilable()
            .iter()
            .map(|unit| display_path(&unit.path, project_dir)),
    );
    args.extend(config.libs.iter().map(|lib| format!("-l{}", lib)));

    Invocation::new(toolchain.compiler.clone())
        .args(args)
        .current_dir(project_dir)
}
