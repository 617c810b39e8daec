use crossforge_core::{PhaseCommands, ProjectKind};
use crossforge_exec::Session;

/// How the project's own test binary is configured and run. Modes that share
/// a build configuration share a name, so their build trees collide on
/// purpose and stay warm between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestMode {
    Plain,
    Debug,
    Profile,
    Coverage,
    SanitizeAddress,
    SanitizeBehavior,
    SanitizeThread,
    SanitizeLeak,
}

impl TestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestMode::Coverage => "coverage",
            TestMode::SanitizeAddress => "address",
            TestMode::SanitizeBehavior => "behavior",
            TestMode::SanitizeThread => "thread",
            TestMode::SanitizeLeak => "leak",
            TestMode::Plain | TestMode::Debug | TestMode::Profile => "test",
        }
    }

    pub fn configure_flag(&self) -> Option<&'static str> {
        match self {
            TestMode::Coverage => Some("-DCODE_COVERAGE=1"),
            TestMode::SanitizeAddress => Some("-DSANITIZE_ADDRESS=1"),
            TestMode::SanitizeBehavior => Some("-DSANITIZE_BEHAVIOR=1"),
            TestMode::SanitizeThread => Some("-DSANITIZE_THREAD=1"),
            TestMode::SanitizeLeak => Some("-DSANITIZE_LEAK=1"),
            TestMode::Plain | TestMode::Debug | TestMode::Profile => None,
        }
    }
}

impl std::fmt::Display for TestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a native builder needs to compile the project itself: the
/// scanned file sets, the artifacts registered from the dependency cache,
/// and the manifest's command hooks.
pub struct BuildInputs {
    pub project_name: String,
    pub project_version: String,
    pub kind: ProjectKind,
    pub sources: Vec<String>,
    pub headers: Vec<String>,
    pub test_files: Vec<String>,
    pub main_file: Option<String>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
    pub build_hooks: PhaseCommands,
    pub test_hooks: PhaseCommands,
}

impl BuildInputs {
    pub fn add_library(&mut self, path: &str) {
        self.libraries.push(path.to_string());
    }

    pub fn add_include_dir(&mut self, dir: &str) {
        self.include_dirs.push(dir.to_string());
    }
}

pub trait NativeBuilder {
    fn build(&self, session: &Session, inputs: &BuildInputs, target: &str) -> bool;
    fn test(&self, session: &Session, inputs: &BuildInputs, mode: TestMode, filter: &str) -> bool;
}
