use colored::*;

/// Turns well-known compiler and linker failures into a one-paragraph hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        if output.contains("undefined reference to `main'")
            || output.contains("undefined reference to `_main'")
            || output.contains("_main\", referenced from")
        {
            return Some(format!(
                "The program has no {} function.\nThe first source file on the command line must define it.",
                "main()".bold().yellow()
            ));
        }

        if output.contains("undefined reference to") || output.contains("Undefined symbols") {
            return Some(format!(
                "It looks like a {} error.\nPass the source that defines the symbol as an extra argument, or add the library with {} or {} in {}.",
                "Linker".bold().red(),
                "-l <name>".bold().green(),
                "libs".bold().yellow(),
                ".tiny-make.toml".bold().yellow()
            ));
        }

        if output.contains("fatal error: ")
            && (output.contains("No such file or directory") || output.contains("file not found"))
        {
            return Some(format!(
                "It looks like a {} error.\nAdd the header's directory with {} or {} in {}.",
                "Missing Header".bold().red(),
                "-I <dir>".bold().green(),
                "include_dirs".bold().yellow(),
                ".tiny-make.toml".bold().yellow()
            ));
        }

        None
    }
}
