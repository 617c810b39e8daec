use std::collections::BTreeMap;

use serde::Serialize;

use crossforge_core::FetchKind;
use crossforge_exec::Session;

/// Downloads the declared external checkouts into the shared checkout
/// directory before any dependency is compiled.
pub trait Fetcher {
    fn fetch(&self, session: &Session, plan: &FetchPlan) -> bool;
}

/// An ordered, validated batch of modules to fetch. Module names are unique
/// and properties can be set once per module.
#[derive(Default)]
pub struct FetchPlan {
    modules: Vec<FetchModule>,
}

struct FetchModule {
    name: String,
    kind: FetchKind,
    properties: Vec<(String, String)>,
}

#[derive(Serialize)]
struct FetchManifest {
    imports: BTreeMap<String, String>,
    #[serde(flatten)]
    modules: BTreeMap<String, BTreeMap<String, String>>,
}

impl FetchPlan {
    pub fn new() -> Self {
        FetchPlan::default()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|module| module.name.as_str()).collect()
    }

    /// Registers a module. Returns false without changes when the name is
    /// already present.
    pub fn add_module(&mut self, name: &str, kind: FetchKind) -> bool {
        if self.modules.iter().any(|module| module.name == name) {
            return false;
        }
        self.modules.push(FetchModule {
            name: name.to_string(),
            kind,
            properties: Vec::new(),
        });
        true
    }

    /// Attaches a property to a registered module. Returns false when the
    /// module is unknown or the key was already set.
    pub fn add_property(&mut self, name: &str, key: &str, value: &str) -> bool {
        let module = match self.modules.iter_mut().find(|module| module.name == name) {
            Some(module) => module,
            None => return false,
        };
        if module.properties.iter().any(|(existing, _)| existing == key) {
            return false;
        }
        module
            .properties
            .push((key.to_string(), value.to_string()));
        true
    }

    /// Serializes the plan as a peru manifest: an imports map landing each
    /// module under its own name, plus one `<kind> module <name>` section
    /// per module.
    pub fn render_manifest(&self) -> String {
        let mut imports = BTreeMap::new();
        let mut modules = BTreeMap::new();
        for module in &self.modules {
            imports.insert(module.name.clone(), format!("{}/", module.name));
            modules.insert(
                format!("{} module {}", module.kind.as_str(), module.name),
                module.properties.iter().cloned().collect(),
            );
        }
        serde_yaml::to_string(&FetchManifest { imports, modules }).unwrap_or_default()
    }
}

/// Fetcher backed by the peru version-fetching tool, driven through the
/// session so checkouts land where the build runs.
pub struct PeruFetcher {
    manifest_file: String,
    sync_dir: String,
}

impl PeruFetcher {
    pub fn new(manifest_file: &str, sync_dir: &str) -> Self {
        PeruFetcher {
            manifest_file: manifest_file.to_string(),
            sync_dir: sync_dir.to_string(),
        }
    }
}

impl Fetcher for PeruFetcher {
    fn fetch(&self, session: &Session, plan: &FetchPlan) -> bool {
        let mut file = match session.create_file(&self.manifest_file) {
            Ok(file) => file,
            Err(_) => return false,
        };
        let mut written = true;
        for line in plan.render_manifest().lines() {
            written &= file.write_line(line).is_ok();
        }
        if !(written && file.close()) {
            return false;
        }
        session.run_checked(
            "Downloading External Dependencies",
            &format!(
                "peru --file={} --sync-dir={} sync",
                self.manifest_file, self.sync_dir
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_modules_are_rejected() {
        let mut plan = FetchPlan::new();
        assert!(plan.add_module("libuv", FetchKind::Git));
        assert!(!plan.add_module("libuv", FetchKind::Curl));
        assert_eq!(plan.module_names(), vec!["libuv"]);
    }

    #[test]
    fn properties_require_a_known_module_and_reject_overwrites() {
        let mut plan = FetchPlan::new();
        assert!(!plan.add_property("libuv", "url", "https://host/libuv.git"));
        plan.add_module("libuv", FetchKind::Git);
        assert!(plan.add_property("libuv", "url", "https://host/libuv.git"));
        assert!(!plan.add_property("libuv", "url", "https://other/libuv.git"));
        assert!(plan.add_property("libuv", "rev", "v1.44.2"));
    }

    #[test]
    fn manifest_has_imports_and_one_section_per_module() {
        let mut plan = FetchPlan::new();
        plan.add_module("libuv", FetchKind::Git);
        plan.add_property("libuv", "url", "https://host/libuv.git");
        plan.add_property("libuv", "rev", "v1.44.2");
        plan.add_module("restbed", FetchKind::Curl);
        plan.add_property("restbed", "url", "https://host/restbed.tar.gz");
        plan.add_property("restbed", "unpack", "tar");
        let manifest = plan.render_manifest();
        assert!(manifest.contains("imports:"));
        assert!(manifest.contains("libuv: libuv/"));
        assert!(manifest.contains("restbed: restbed/"));
        assert!(manifest.contains("git module libuv:"));
        assert!(manifest.contains("rev: v1.44.2"));
        assert!(manifest.contains("curl module restbed:"));
        assert!(manifest.contains("unpack: tar"));
    }

    #[test]
    fn empty_plan_renders_an_empty_imports_map() {
        let manifest = FetchPlan::new().render_manifest();
        assert!(manifest.contains("imports: {}"));
    }
}
