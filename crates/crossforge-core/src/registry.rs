use std::collections::HashMap;

use serde_yaml::Value;

use crate::doc;
use crate::target::{self, ANY_TARGET};

/// Sentinel recorded for subproject artifacts before their nested build has
/// produced anything listable.
pub const PLACEHOLDER_VALUE: &str = "CROSSFORGE_PLACEHOLDER_VALUE";

/// Per-(dependency, target) output declarations: which library files a
/// dependency recipe leaves behind and which header trees it exports.
#[derive(Clone, Debug, Default)]
pub struct ArtifactRegistry {
    libraries: HashMap<(String, String), Vec<String>>,
    headers: HashMap<(String, String), Vec<String>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty header list records the single empty-string skip entry.
    pub fn record(
        &mut self,
        dependency: &str,
        target: &str,
        libraries: Vec<String>,
        mut headers: Vec<String>,
    ) {
        if headers.is_empty() {
            headers.push(String::new());
        }
        self.libraries.insert(key(dependency, target), libraries);
        self.headers.insert(key(dependency, target), headers);
    }

    pub fn record_placeholder(&mut self, dependency: &str, target: &str) {
        self.libraries.insert(
            key(dependency, target),
            vec![PLACEHOLDER_VALUE.to_string()],
        );
        self.headers.insert(
            key(dependency, target),
            vec![PLACEHOLDER_VALUE.to_string()],
        );
    }

    pub fn libraries_for(&self, dependency: &str, target: &str) -> &[String] {
        self.libraries
            .get(&key(dependency, target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn headers_for(&self, dependency: &str, target: &str) -> &[String] {
        self.headers
            .get(&key(dependency, target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn key(dependency: &str, target: &str) -> (String, String) {
    (dependency.to_string(), target.to_string())
}

/// Resolves a target-scoped list from a dependency node: the exact
/// `target <triple>` block wins, then the `target <os-family>` block, then
/// `target any`. The first non-empty list is taken as-is.
pub fn scoped_strings(node: &Value, target: &str, list: &str) -> Vec<String> {
    let exact_scope = format!("target {}", target);
    let exact = doc::strings_at(node, &[exact_scope.as_str(), list]);
    if !exact.is_empty() {
        return exact;
    }
    if let Some(family) = target::os_family(target) {
        let family_scope = format!("target {}", family.as_str());
        let family_list = doc::strings_at(node, &[family_scope.as_str(), list]);
        if !family_list.is_empty() {
            return family_list;
        }
    }
    let any_scope = format!("target {}", ANY_TARGET);
    doc::strings_at(node, &[any_scope.as_str(), list])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> Value {
        serde_yaml::from_str(text).expect("yaml")
    }

    #[test]
    fn exact_block_wins_over_family_and_any() {
        let node = node(
            "\"target linux-x64\":\n  libs:\n    - exact.so\n\"target linux\":\n  libs:\n    - family.so\n\"target any\":\n  libs:\n    - any.so\n",
        );
        assert_eq!(
            scoped_strings(&node, "linux-x64", "libs"),
            vec!["exact.so"]
        );
    }

    #[test]
    fn family_block_covers_unlisted_triples() {
        let node = node(
            "\"target windows\":\n  libs:\n    - family.dll\n\"target any\":\n  libs:\n    - any.so\n",
        );
        assert_eq!(
            scoped_strings(&node, "windows-static-x86", "libs"),
            vec!["family.dll"]
        );
    }

    #[test]
    fn any_block_is_the_last_resort() {
        let node = node("\"target any\":\n  build:\n    - make\n  libs:\n    - out.so\n");
        assert_eq!(scoped_strings(&node, "linux-arm64", "build"), vec!["make"]);
        assert_eq!(scoped_strings(&node, "linux-arm64", "libs"), vec!["out.so"]);
    }

    #[test]
    fn unknown_triple_still_reaches_any() {
        let node = node("\"target any\":\n  libs:\n    - any.so\n");
        assert_eq!(
            scoped_strings(&node, "solaris-sparc", "libs"),
            vec!["any.so"]
        );
    }

    #[test]
    fn absent_blocks_resolve_empty() {
        let node = node("name: dep\n");
        assert!(scoped_strings(&node, "linux-x64", "libs").is_empty());
    }

    #[test]
    fn empty_headers_record_the_skip_entry() {
        let mut registry = ArtifactRegistry::new();
        registry.record("dep", "default", Vec::new(), Vec::new());
        assert_eq!(registry.headers_for("dep", "default"), [String::new()]);
        assert!(registry.libraries_for("dep", "default").is_empty());
    }

    #[test]
    fn placeholder_seeds_both_lists() {
        let mut registry = ArtifactRegistry::new();
        registry.record_placeholder("nested", "default");
        assert_eq!(
            registry.libraries_for("nested", "default"),
            [PLACEHOLDER_VALUE.to_string()]
        );
        assert_eq!(
            registry.headers_for("nested", "default"),
            [PLACEHOLDER_VALUE.to_string()]
        );
    }

    #[test]
    fn unrecorded_keys_read_empty() {
        let registry = ArtifactRegistry::new();
        assert!(registry.libraries_for("missing", "default").is_empty());
        assert!(registry.headers_for("missing", "default").is_empty());
    }
}
