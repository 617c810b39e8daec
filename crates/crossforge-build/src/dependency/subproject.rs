use std::path::Path;

use crossforge_core::{doc, layout, normalize_targets};
use crossforge_exec::Session;

use crate::dependency::recipe::RecipeDependency;

/// A dependency that is itself a crossforge project. Its recipe re-invokes
/// the tool inside the checkout, and its artifacts are harvested from the
/// nested output tree afterwards.
pub struct SubprojectDependency {
    name: String,
    dir: String,
    manifest_name: String,
    inner: RecipeDependency,
}

impl SubprojectDependency {
    pub fn new(session: &Session, dir: &str, name: &str, manifest_name: &str) -> Self {
        let targets = read_manifest_targets(dir, manifest_name);
        let dependency = SubprojectDependency {
            name: name.to_string(),
            dir: dir.to_string(),
            manifest_name: manifest_name.to_string(),
            inner: RecipeDependency::new(dir, name, targets.clone()),
        };
        for target in &targets {
            dependency
                .inner
                .set_build_steps(session, target, &reinvocation_steps(target));
        }
        dependency
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn header_dir(&self, target: &str) -> String {
        self.inner.header_dir(target)
    }

    /// Reads the nested manifest fresh on every call, so targets appear as
    /// soon as the checkout lands and never before.
    pub fn available_targets(&self) -> Vec<String> {
        read_manifest_targets(&self.dir, &self.manifest_name)
    }

    /// Runs the nested build end to end, then caches what it produced: the
    /// dependency libraries and its own libraries, plus the nested source
    /// tree and staged includes as header directories.
    pub fn compile(&self, session: &Session, target: &str) -> bool {
        if !self.inner.compile(session, target, &[], &[]) {
            return false;
        }
        let output_dir = layout::project_output_dir(&self.dir, target);
        let mut libraries = session.list_files(&format!("{}/deps", output_dir));
        libraries.extend(session.list_files(&format!("{}/lib", output_dir)));
        let headers = vec![
            format!("{}/", self.nested_source_dir()),
            format!(
                "{}/",
                layout::include_cache_dir(&layout::cache_dir(&self.dir), target)
            ),
        ];
        self.inner
            .cache_artifacts(session, target, &libraries, &headers, true)
    }

    pub fn libraries(&self, session: &Session, target: &str) -> Vec<String> {
        self.inner.libraries(session, target)
    }

    fn nested_source_dir(&self) -> String {
        let document = doc::load_document(&Path::new(&self.dir).join(&self.manifest_name));
        format!(
            "{}/{}",
            self.dir,
            doc::string_at(&document, &["project", "source"])
        )
    }
}

fn read_manifest_targets(dir: &str, manifest_name: &str) -> Vec<String> {
    let path = Path::new(dir).join(manifest_name);
    if !path.exists() {
        return Vec::new();
    }
    let document = doc::load_document(&path);
    normalize_targets(&doc::strings_at(&document, &["project", "targets"]))
}

fn reinvocation_steps(target: &str) -> Vec<String> {
    vec![
        "crossforge download --local".to_string(),
        format!("crossforge build-deps --local {}", target),
        format!("crossforge build --local {}", target),
    ]
}
