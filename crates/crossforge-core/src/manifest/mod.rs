use serde_yaml::Value;

use crate::doc;
use crate::target::DEFAULT_TARGET;

pub mod deps;

pub use deps::{
    parse_dependency_specs, DependencySpec, FetchKind, FetchSpec, ResolutionKind,
};

/// Project kind as declared by the manifest's `project.type` scalar: the
/// value `exe` selects an executable project, every other value (including
/// a missing one) reads as a library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectKind {
    Executable,
    Library,
}

impl ProjectKind {
    pub fn from_manifest(value: &str) -> Self {
        if value == "exe" {
            ProjectKind::Executable
        } else {
            ProjectKind::Library
        }
    }
}

/// The interpreted `project` section of `crossforge.yaml`.
///
/// Every field is tolerant: missing scalars read as empty strings, a missing
/// `main` reads as `None`, and the target list is normalized so `default`
/// appears exactly once, appended when the manifest omits it. Validation is
/// deliberately absent here; nonsense values surface later as failed phases.
#[derive(Clone, Debug)]
pub struct ProjectManifest {
    pub name: String,
    pub kind: ProjectKind,
    pub version: String,
    pub source_dir: String,
    pub test_dir: String,
    pub main_file: Option<String>,
    pub targets: Vec<String>,
}

impl ProjectManifest {
    pub fn from_document(document: &Value) -> Self {
        let declared = doc::strings_at(document, &["project", "targets"]);
        let main = doc::string_at(document, &["project", "main"]);
        ProjectManifest {
            name: doc::string_at(document, &["project", "name"]),
            kind: ProjectKind::from_manifest(&doc::string_at(document, &["project", "type"])),
            version: doc::string_at(document, &["project", "version"]),
            source_dir: doc::string_at(document, &["project", "source"]),
            test_dir: doc::string_at(document, &["project", "test"]),
            main_file: if main.is_empty() { None } else { Some(main) },
            targets: normalize_targets(&declared),
        }
    }

    pub fn supports_target(&self, target: &str) -> bool {
        self.targets.iter().any(|candidate| candidate == target)
    }
}

/// Declaration order is kept, duplicates collapse to their first occurrence,
/// and `default` is appended when absent.
pub fn normalize_targets(declared: &[String]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for target in declared {
        if !targets.iter().any(|existing| existing == target) {
            targets.push(target.clone());
        }
    }
    if !targets.iter().any(|target| target == DEFAULT_TARGET) {
        targets.push(DEFAULT_TARGET.to_string());
    }
    targets
}

#[derive(Clone, Debug, Default)]
pub struct PhaseCommands {
    pub pre: Vec<String>,
    pub post: Vec<String>,
}

/// The `commands.{build,test}.{pre,post}` hook lists.
#[derive(Clone, Debug, Default)]
pub struct CommandHooks {
    pub build: PhaseCommands,
    pub test: PhaseCommands,
}

impl CommandHooks {
    pub fn from_document(document: &Value) -> Self {
        CommandHooks {
            build: PhaseCommands {
                pre: doc::strings_at(document, &["commands", "build", "pre"]),
                post: doc::strings_at(document, &["commands", "build", "post"]),
            },
            test: PhaseCommands {
                pre: doc::strings_at(document, &["commands", "test", "pre"]),
                post: doc::strings_at(document, &["commands", "test", "post"]),
            },
        }
    }
}
