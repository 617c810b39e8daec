use std::fs;
use std::path::Path;

use crossforge_core::{
    doc, expand_tokens, layout, parse_dependency_specs, scoped_strings, ArtifactRegistry,
    CommandHooks, ProjectManifest, ResolutionKind, ANY_TARGET, DEFAULT_TARGET,
};
use crossforge_exec::Session;

use crate::dependency::{Dependency, RecipeDependency, SubprojectDependency, DEPS_DIR_ENV};
use crate::fetch::FetchPlan;

/// One phase's view of the project: the parsed manifest, the dependency
/// objects with their recipes already written, the artifact registry, and
/// the scanned file sets. Each phase loads a fresh snapshot, so edits to
/// any manifest take effect on the next invocation.
pub struct ProjectSnapshot {
    pub project_dir: String,
    pub cache_dir: String,
    pub manifest: ProjectManifest,
    pub hooks: CommandHooks,
    pub registry: ArtifactRegistry,
    pub dependencies: Vec<Dependency>,
    pub fetch_plan: FetchPlan,
    pub sources: SourceSet,
}

/// Project files gathered from the source and test directories.
pub struct SourceSet {
    pub sources: Vec<String>,
    pub headers: Vec<String>,
    pub test_files: Vec<String>,
    pub main_file: Option<String>,
}

impl ProjectSnapshot {
    pub fn load(
        session: &Session,
        project_dir: &str,
        manifest_path: &str,
        cache_dir: &str,
    ) -> Self {
        let _ = fs::create_dir_all(cache_dir);
        let checkout = layout::checkout_dir(cache_dir);
        let _ = fs::create_dir_all(&checkout);
        let document = doc::load_document(Path::new(manifest_path));
        let manifest = ProjectManifest::from_document(&document);
        let hooks = CommandHooks::from_document(&document);
        let mut registry = ArtifactRegistry::new();
        let mut dependencies = Vec::new();
        let mut fetch_plan = FetchPlan::new();
        for spec in parse_dependency_specs(&document) {
            if let Some(fetch) = &spec.fetch {
                fetch_plan.add_module(&spec.name, fetch.kind);
                for (key, value) in &fetch.properties {
                    fetch_plan.add_property(&spec.name, key, value);
                }
            }
            let dep_dir = layout::dependency_dir(cache_dir, &spec.name);
            match &spec.kind {
                Some(ResolutionKind::Recipe) => {
                    let _ = fs::create_dir_all(&dep_dir);
                    let dependency =
                        RecipeDependency::new(&dep_dir, &spec.name, manifest.targets.clone());
                    for target in &manifest.targets {
                        if target == ANY_TARGET {
                            continue;
                        }
                        let mut steps = vec![format!("{}={}", DEPS_DIR_ENV, checkout)];
                        if target == DEFAULT_TARGET {
                            steps.push("CC=/usr/bin/clang".to_string());
                            steps.push("CXX=/usr/bin/clang++".to_string());
                        }
                        for step in scoped_strings(&spec.node, target, "build") {
                            steps.push(expand_tokens(target, &step));
                        }
                        dependency.set_build_steps(session, target, &steps);
                        let libraries = scoped_strings(&spec.node, target, "libs")
                            .iter()
                            .map(|path| expand_tokens(target, path))
                            .collect();
                        let headers = scoped_strings(&spec.node, target, "include")
                            .iter()
                            .map(|path| expand_tokens(target, path))
                            .collect();
                        registry.record(&spec.name, target, libraries, headers);
                    }
                    dependencies.push(Dependency::Recipe(dependency));
                }
                Some(ResolutionKind::Subproject { manifest_name }) => {
                    let _ = fs::create_dir_all(&dep_dir);
                    let dependency =
                        SubprojectDependency::new(session, &dep_dir, &spec.name, manifest_name);
                    for target in dependency.available_targets() {
                        registry.record_placeholder(&spec.name, &target);
                    }
                    dependencies.push(Dependency::Subproject(dependency));
                }
                None => {}
            }
        }
        let sources = scan_source_files(session, project_dir, &manifest);
        ProjectSnapshot {
            project_dir: project_dir.to_string(),
            cache_dir: cache_dir.to_string(),
            manifest,
            hooks,
            registry,
            dependencies,
            fetch_plan,
            sources,
        }
    }
}

fn scan_source_files(session: &Session, project_dir: &str, manifest: &ProjectManifest) -> SourceSet {
    let source_dir = format!("{}/{}", project_dir, manifest.source_dir);
    let test_dir = format!("{}/{}", project_dir, manifest.test_dir);
    let main_file = manifest
        .main_file
        .as_ref()
        .map(|main| format!("{}/{}", project_dir, main));
    let mut sources = Vec::new();
    let mut headers = Vec::new();
    for file in session.list_files(&source_dir) {
        match extension_of(&file) {
            "cpp" | "c" | "cxx" => {
                if main_file.as_deref() != Some(file.as_str()) {
                    sources.push(file);
                }
            }
            "h" | "hxx" | "hpp" => headers.push(file),
            _ => {}
        }
    }
    let test_files = session
        .list_files(&test_dir)
        .into_iter()
        .filter(|file| matches!(extension_of(file), "h" | "hxx" | "hpp"))
        .collect();
    SourceSet {
        sources,
        headers,
        test_files,
        main_file,
    }
}

fn extension_of(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(project_dir: &Path, body: &str) -> String {
        let path = project_dir.join("crossforge.yaml");
        std::fs::write(&path, body).expect("manifest");
        path.to_str().expect("utf8 path").to_string()
    }

    fn load_snapshot(project_dir: &Path, body: &str) -> ProjectSnapshot {
        let manifest_path = write_manifest(project_dir, body);
        let project = project_dir.to_str().expect("utf8 path");
        let cache = layout::cache_dir(project);
        ProjectSnapshot::load(&Session::local(), project, &manifest_path, &cache)
    }

    #[test]
    fn recipes_carry_the_checkout_dir_and_scoped_steps() {
        let temp = tempfile::tempdir().expect("temp dir");
        let snapshot = load_snapshot(
            temp.path(),
            "project:\n  name: demo\n  version: 0.1.0\n  source: src\n  targets:\n    - linux-x64\ndependencies:\n  - name: libuv\n    source: git\n    type: manual\n    url: https://host/libuv.git\n    rev: v1.44.2\n    target any:\n      build:\n        - make libuv.${LIB_EXT}\n      libs:\n        - out/libuv.${LIB_EXT}\n",
        );
        assert_eq!(snapshot.dependencies.len(), 1);
        let dep_dir = layout::dependency_dir(&snapshot.cache_dir, "libuv");
        let recipe = std::fs::read_to_string(layout::recipe_file(&dep_dir, "linux-x64"))
            .expect("recipe");
        assert!(recipe.contains(&format!(
            "CROSSFORGE_DEPS_DIR={}",
            layout::checkout_dir(&snapshot.cache_dir)
        )));
        assert!(recipe.contains("make libuv.so"));
        assert!(!recipe.contains("CC=/usr/bin/clang"));
        assert_eq!(
            snapshot.registry.libraries_for("libuv", "linux-x64"),
            &["out/libuv.so".to_string()]
        );
        assert_eq!(
            snapshot.registry.headers_for("libuv", "linux-x64"),
            &[String::new()]
        );
    }

    #[test]
    fn default_recipes_pin_the_local_compilers() {
        let temp = tempfile::tempdir().expect("temp dir");
        let snapshot = load_snapshot(
            temp.path(),
            "project:\n  name: demo\n  version: 0.1.0\n  source: src\ndependencies:\n  - name: libuv\n    source: git\n    type: manual\n    url: https://host/libuv.git\n    rev: v1.44.2\n    target any:\n      build:\n        - make\n",
        );
        let dep_dir = layout::dependency_dir(&snapshot.cache_dir, "libuv");
        let recipe =
            std::fs::read_to_string(layout::recipe_file(&dep_dir, "default")).expect("recipe");
        assert!(recipe.contains("CC=/usr/bin/clang"));
        assert!(recipe.contains("CXX=/usr/bin/clang++"));
    }

    #[test]
    fn unrecognized_dependency_types_are_fetch_only() {
        let temp = tempfile::tempdir().expect("temp dir");
        let snapshot = load_snapshot(
            temp.path(),
            "project:\n  name: demo\n  version: 0.1.0\n  source: src\ndependencies:\n  - name: mystery\n    source: curl\n    type: prebuilt\n    url: https://host/blob.tar.gz\n    unpack: tar\n",
        );
        assert!(snapshot.dependencies.is_empty());
        assert_eq!(snapshot.fetch_plan.module_names(), vec!["mystery"]);
    }

    #[test]
    fn subprojects_seed_placeholders_for_their_targets() {
        let temp = tempfile::tempdir().expect("temp dir");
        let project = temp.path().to_str().expect("utf8 path");
        let dep_dir = layout::dependency_dir(&layout::cache_dir(project), "inner");
        std::fs::create_dir_all(&dep_dir).expect("dep dir");
        std::fs::write(
            Path::new(&dep_dir).join("crossforge.yaml"),
            "project:\n  name: inner\n  version: 0.1.0\n  source: src\n  targets:\n    - linux-x64\n",
        )
        .expect("nested manifest");
        let snapshot = load_snapshot(
            temp.path(),
            "project:\n  name: demo\n  version: 0.1.0\n  source: src\ndependencies:\n  - name: inner\n    source: git\n    type: crossforge\n    url: https://host/inner.git\n    rev: main\n",
        );
        assert_eq!(
            snapshot.registry.libraries_for("inner", "linux-x64"),
            &["CROSSFORGE_PLACEHOLDER_VALUE".to_string()]
        );
        assert_eq!(
            snapshot.registry.headers_for("inner", "default"),
            &["CROSSFORGE_PLACEHOLDER_VALUE".to_string()]
        );
    }

    #[test]
    fn source_scan_splits_by_extension_and_skips_main() {
        let temp = tempfile::tempdir().expect("temp dir");
        let src = temp.path().join("src");
        let tests = temp.path().join("test");
        std::fs::create_dir_all(&src).expect("src dir");
        std::fs::create_dir_all(&tests).expect("test dir");
        std::fs::write(src.join("lib.cpp"), "").expect("write");
        std::fs::write(src.join("main.cpp"), "").expect("write");
        std::fs::write(src.join("lib.hpp"), "").expect("write");
        std::fs::write(src.join("notes.md"), "").expect("write");
        std::fs::write(tests.join("lib.test.hpp"), "").expect("write");
        let snapshot = load_snapshot(
            temp.path(),
            "project:\n  name: demo\n  type: exe\n  version: 0.1.0\n  source: src\n  test: test\n  main: src/main.cpp\n",
        );
        let project = temp.path().to_str().expect("utf8 path");
        assert_eq!(snapshot.sources.sources, vec![format!("{}/src/lib.cpp", project)]);
        assert_eq!(snapshot.sources.headers, vec![format!("{}/src/lib.hpp", project)]);
        assert_eq!(
            snapshot.sources.test_files,
            vec![format!("{}/test/lib.test.hpp", project)]
        );
        assert_eq!(
            snapshot.sources.main_file,
            Some(format!("{}/src/main.cpp", project))
        );
    }
}
