pub mod doc;
pub mod layout;
pub mod manifest;
pub mod registry;
pub mod target;

pub use doc::{load_document, lookup, scalar_string, sequence_at, string_at, strings_at, DocError};
pub use manifest::{
    normalize_targets, parse_dependency_specs, CommandHooks, DependencySpec, FetchKind, FetchSpec,
    PhaseCommands, ProjectKind, ProjectManifest, ResolutionKind,
};
pub use registry::{scoped_strings, ArtifactRegistry, PLACEHOLDER_VALUE};
pub use target::{
    expand_tokens, known_targets, library_extension, os_family, OsFamily, TargetDescriptor,
    ANY_TARGET, DEFAULT_TARGET,
};
