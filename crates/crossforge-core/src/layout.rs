pub const MANIFEST_FILE_NAME: &str = "crossforge.yaml";
pub const CACHE_DIR_NAME: &str = ".crossforge";
pub const CHECKOUT_SUBDIR: &str = "external/raw";
pub const PACKAGE_EXTENSION: &str = "cfpk";

/// Glob matching the per-target artifact directories a dependency owns,
/// used to keep them out of recursive header copies.
pub const ARTIFACT_DIR_GLOB: &str = "*/crossforge_*";

pub fn cache_dir(project_dir: &str) -> String {
    format!("{}/{}", project_dir, CACHE_DIR_NAME)
}

pub fn checkout_dir(cache_dir: &str) -> String {
    format!("{}/{}", cache_dir, CHECKOUT_SUBDIR)
}

pub fn dependency_dir(cache_dir: &str, name: &str) -> String {
    format!("{}/{}/{}", cache_dir, CHECKOUT_SUBDIR, name)
}

pub fn fetch_manifest_file(cache_dir: &str) -> String {
    format!("{}/peru.yaml", cache_dir)
}

pub fn target_cache_dir(cache_dir: &str, target: &str) -> String {
    format!("{}/output/{}", cache_dir, target)
}

pub fn dependency_cache_dir(cache_dir: &str, target: &str, dependency: &str) -> String {
    format!("{}/output/{}/{}", cache_dir, target, dependency)
}

pub fn include_cache_dir(cache_dir: &str, target: &str) -> String {
    format!("{}/includes/{}", cache_dir, target)
}

pub fn builds_dir(cache_dir: &str) -> String {
    format!("{}/builds", cache_dir)
}

pub fn compile_dir(cache_dir: &str, target: &str) -> String {
    format!("{}/builds/compile/{}", cache_dir, target)
}

pub fn project_output_dir(project_dir: &str, target: &str) -> String {
    format!("{}/output/{}", project_dir, target)
}

pub fn recipe_file(dependency_dir: &str, target: &str) -> String {
    format!("{}/crossforge-build_{}.sh", dependency_dir, target)
}

pub fn library_dir(dependency_dir: &str, target: &str) -> String {
    format!("{}/crossforge_{}_libraries", dependency_dir, target)
}

pub fn header_dir(dependency_dir: &str, target: &str) -> String {
    format!("{}/crossforge_{}_headers", dependency_dir, target)
}

pub fn package_file_name(name: &str, version: &str, target: &str) -> String {
    format!("{}-{}-{}.{}", name, version, target, PACKAGE_EXTENSION)
}
