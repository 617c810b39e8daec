use std::path::Path;

use crossforge_core::{layout, ProjectKind, DEFAULT_TARGET};
use crossforge_exec::Session;

use crate::archive;
use crate::fetch::Fetcher;
use crate::native::{BuildInputs, NativeBuilder, TestMode};
use crate::snapshot::ProjectSnapshot;

/// Collects step results across a phase. Every step runs regardless of
/// earlier failures, and the phase reports success only when all of them
/// succeeded.
#[derive(Default)]
pub struct PhaseOutcome {
    failed: bool,
}

impl PhaseOutcome {
    pub fn new() -> Self {
        PhaseOutcome::default()
    }

    pub fn and(&mut self, step: bool) {
        if !step {
            self.failed = true;
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.failed
    }
}

/// Drives the four phases against one project. The session, fetcher, and
/// native builder are injected, so phases run identically on the host
/// shell and inside a build container.
pub struct BuildPipeline<'a> {
    session: &'a Session,
    fetcher: &'a dyn Fetcher,
    builder: &'a dyn NativeBuilder,
    project_dir: String,
    manifest_path: String,
    cache_dir: String,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(
        session: &'a Session,
        fetcher: &'a dyn Fetcher,
        builder: &'a dyn NativeBuilder,
        project_dir: &str,
        manifest_path: &str,
    ) -> Self {
        BuildPipeline {
            session,
            fetcher,
            builder,
            project_dir: project_dir.to_string(),
            manifest_path: manifest_path.to_string(),
            cache_dir: layout::cache_dir(project_dir),
        }
    }

    pub fn cache_dir(&self) -> &str {
        &self.cache_dir
    }

    fn load(&self) -> ProjectSnapshot {
        ProjectSnapshot::load(
            self.session,
            &self.project_dir,
            &self.manifest_path,
            &self.cache_dir,
        )
    }

    /// Hands the declared fetch modules to the fetcher in one batch.
    pub fn download(&self) -> bool {
        let snapshot = self.load();
        self.fetcher.fetch(self.session, &snapshot.fetch_plan)
    }

    /// Compiles every dependency for the target and assembles the target
    /// cache: per-dependency library copies plus one merged include tree.
    /// Targets the manifest does not declare fail without side effects.
    pub fn build_dependencies(&self, target: &str) -> bool {
        let snapshot = self.load();
        if !snapshot.manifest.supports_target(target) {
            return false;
        }
        let target_cache = layout::target_cache_dir(&self.cache_dir, target);
        let include_cache = layout::include_cache_dir(&self.cache_dir, target);
        self.session.run(&format!("rm -rf {}", target_cache));
        self.session.run(&format!("rm -rf {}", include_cache));
        let mut outcome = PhaseOutcome::new();
        outcome.and(
            self.session
                .run_status(&format!("mkdir -p {}", include_cache)),
        );
        for dependency in &snapshot.dependencies {
            let dep_cache =
                layout::dependency_cache_dir(&self.cache_dir, target, dependency.name());
            outcome.and(dependency.compile(
                self.session,
                target,
                snapshot.registry.libraries_for(dependency.name(), target),
                snapshot.registry.headers_for(dependency.name(), target),
            ));
            outcome.and(self.session.run_status(&format!("mkdir -p {}", dep_cache)));
            for library in dependency.libraries(self.session, target) {
                outcome.and(
                    self.session
                        .run_status(&format!("cp {} {}", library, dep_cache)),
                );
            }
            outcome.and(self.session.run_status(&format!(
                "rsync -av {}/ {}/",
                dependency.header_dir(target),
                include_cache
            )));
        }
        outcome.succeeded()
    }

    /// Builds the project itself against the cached dependency artifacts,
    /// then assembles the output tree and its package file.
    pub fn build_project(&self, target: &str) -> bool {
        let snapshot = self.load();
        if !snapshot.manifest.supports_target(target) {
            return false;
        }
        let output_dir = layout::project_output_dir(&self.project_dir, target);
        self.session.run(&format!("rm -rf {}", output_dir));
        let mut inputs = self.build_inputs(&snapshot);
        self.register_artifacts(&mut inputs, &snapshot, target);
        if !self.builder.build(self.session, &inputs, target) {
            return false;
        }
        let mut outcome = PhaseOutcome::new();
        for subdir in ["", "/bin", "/lib", "/deps", "/pkg"] {
            outcome.and(
                self.session
                    .run_status(&format!("mkdir -p {}{}", output_dir, subdir)),
            );
        }
        let compile_dir = layout::compile_dir(&self.cache_dir, target);
        let move_artifacts = match snapshot.manifest.kind {
            ProjectKind::Executable => format!("mv {}/bin/* {}/bin/", compile_dir, output_dir),
            ProjectKind::Library => format!("mv {}/lib/* {}/lib/", compile_dir, output_dir),
        };
        outcome.and(self.session.run_status(&move_artifacts));
        for dependency in &snapshot.dependencies {
            for library in self.session.list_files(&layout::dependency_cache_dir(
                &self.cache_dir,
                target,
                dependency.name(),
            )) {
                outcome.and(
                    self.session
                        .run_status(&format!("cp {} {}/deps/", library, output_dir)),
                );
            }
        }
        let package_path = format!(
            "{}/pkg/{}",
            output_dir,
            layout::package_file_name(&snapshot.manifest.name, &snapshot.manifest.version, target)
        );
        outcome.and(
            archive::package_output_tree(Path::new(&output_dir), Path::new(&package_path)).is_ok(),
        );
        outcome.succeeded()
    }

    /// Configures and runs the project's test binary against the default
    /// target's cached artifacts.
    pub fn test(&self, mode: TestMode, filter: &str) -> bool {
        let snapshot = self.load();
        let mut inputs = self.build_inputs(&snapshot);
        self.register_artifacts(&mut inputs, &snapshot, DEFAULT_TARGET);
        self.builder.test(self.session, &inputs, mode, filter)
    }

    fn register_artifacts(
        &self,
        inputs: &mut BuildInputs,
        snapshot: &ProjectSnapshot,
        target: &str,
    ) {
        for dependency in &snapshot.dependencies {
            for library in self.session.list_files(&layout::dependency_cache_dir(
                &self.cache_dir,
                target,
                dependency.name(),
            )) {
                inputs.add_library(&library);
            }
        }
        for dependency in &snapshot.dependencies {
            inputs.add_include_dir(&dependency.header_dir(target));
        }
    }

    fn build_inputs(&self, snapshot: &ProjectSnapshot) -> BuildInputs {
        BuildInputs {
            project_name: snapshot.manifest.name.clone(),
            project_version: snapshot.manifest.version.clone(),
            kind: snapshot.manifest.kind,
            sources: snapshot.sources.sources.clone(),
            headers: snapshot.sources.headers.clone(),
            test_files: snapshot.sources.test_files.clone(),
            main_file: snapshot.sources.main_file.clone(),
            libraries: Vec::new(),
            include_dirs: Vec::new(),
            build_hooks: snapshot.hooks.build.clone(),
            test_hooks: snapshot.hooks.test.clone(),
        }
    }
}
