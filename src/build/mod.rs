mod clean;
mod compdb;
mod core;
mod decision;
mod feedback;
mod record;
mod utils;
mod watcher;

pub use clean::clean;
pub use compdb::{CompilationDatabase, CompileCommandEntry};
pub use core::{BuildPlan, BuildRequest, Driver};
pub use decision::{BuildDecision, StaleReason, decide};
pub use feedback::FeedbackAnalyzer;
pub use record::{BuildRecord, RECORD_NAME};
pub use utils::{compile_invocation, display_path};
pub use watcher::watch;
