pub mod recipe;
pub mod subproject;

pub use recipe::{
    RecipeDependency, DEPS_DIR_ENV, HEADER_DIR_ENV, LIBRARY_DIR_ENV, TARGET_ENV,
};
pub use subproject::SubprojectDependency;

use crossforge_exec::Session;

/// The two ways a declared dependency gets compiled.
pub enum Dependency {
    Recipe(RecipeDependency),
    Subproject(SubprojectDependency),
}

impl Dependency {
    pub fn name(&self) -> &str {
        match self {
            Dependency::Recipe(dependency) => dependency.name(),
            Dependency::Subproject(dependency) => dependency.name(),
        }
    }

    pub fn dir(&self) -> &str {
        match self {
            Dependency::Recipe(dependency) => dependency.dir(),
            Dependency::Subproject(dependency) => dependency.dir(),
        }
    }

    pub fn header_dir(&self, target: &str) -> String {
        match self {
            Dependency::Recipe(dependency) => dependency.header_dir(target),
            Dependency::Subproject(dependency) => dependency.header_dir(target),
        }
    }

    pub fn available_targets(&self) -> Vec<String> {
        match self {
            Dependency::Recipe(dependency) => dependency.targets().to_vec(),
            Dependency::Subproject(dependency) => dependency.available_targets(),
        }
    }

    /// Compiles for one target. Recipe dependencies cache the artifact paths
    /// the manifest scoped to that target; subprojects harvest their own
    /// output tree and ignore the passed lists.
    pub fn compile(
        &self,
        session: &Session,
        target: &str,
        library_paths: &[String],
        header_dirs: &[String],
    ) -> bool {
        match self {
            Dependency::Recipe(dependency) => {
                dependency.compile(session, target, library_paths, header_dirs)
            }
            Dependency::Subproject(dependency) => dependency.compile(session, target),
        }
    }

    pub fn libraries(&self, session: &Session, target: &str) -> Vec<String> {
        match self {
            Dependency::Recipe(dependency) => dependency.libraries(session, target),
            Dependency::Subproject(dependency) => dependency.libraries(session, target),
        }
    }
}
