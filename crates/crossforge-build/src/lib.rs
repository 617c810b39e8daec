pub mod archive;
pub mod cmake;
pub mod dependency;
pub mod fetch;
pub mod native;
pub mod pipeline;
pub mod snapshot;

pub use archive::{entries_from_dir, package_output_tree, write_tar_gz, ArchiveEntry, ArchiveError};
pub use cmake::CMakeDriver;
pub use dependency::{Dependency, RecipeDependency, SubprojectDependency};
pub use fetch::{FetchPlan, Fetcher, PeruFetcher};
pub use native::{BuildInputs, NativeBuilder, TestMode};
pub use pipeline::{BuildPipeline, PhaseOutcome};
pub use snapshot::{ProjectSnapshot, SourceSet};
