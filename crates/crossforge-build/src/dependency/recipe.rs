use crossforge_core::layout;
use crossforge_exec::Session;

use crate::pipeline::PhaseOutcome;

pub const TARGET_ENV: &str = "CROSSFORGE_TARGET";
pub const HEADER_DIR_ENV: &str = "CROSSFORGE_HEADER_DIR";
pub const LIBRARY_DIR_ENV: &str = "CROSSFORGE_LIBRARY_DIR";
pub const DEPS_DIR_ENV: &str = "CROSSFORGE_DEPS_DIR";

const COLON_TOKEN: &str = "__COLON__";
const QUOTE_TOKEN: &str = "__QUOTE__";

/// A dependency compiled by a per-target shell recipe generated from the
/// manifest's scoped build steps.
pub struct RecipeDependency {
    name: String,
    dir: String,
    targets: Vec<String>,
}

impl RecipeDependency {
    pub fn new(dir: &str, name: &str, targets: Vec<String>) -> Self {
        RecipeDependency {
            name: name.to_string(),
            dir: dir.to_string(),
            targets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn supports(&self, target: &str) -> bool {
        self.targets.iter().any(|known| known == target)
    }

    pub fn library_dir(&self, target: &str) -> String {
        layout::library_dir(&self.dir, target)
    }

    pub fn header_dir(&self, target: &str) -> String {
        layout::header_dir(&self.dir, target)
    }

    /// Writes the recipe script for one target: a fixed preamble that pins
    /// the working directory and artifact directories, then the decoded
    /// build steps. Unsupported targets get no file.
    pub fn set_build_steps(&self, session: &Session, target: &str, steps: &[String]) -> bool {
        if !self.supports(target) {
            return false;
        }
        let recipe = layout::recipe_file(&self.dir, target);
        let mut file = match session.create_file(&recipe) {
            Ok(file) => file,
            Err(_) => return false,
        };
        let header_dir = self.header_dir(target);
        let library_dir = self.library_dir(target);
        let mut written = true;
        written &= file.write_line(&format!("cd {}", self.dir)).is_ok();
        written &= file
            .write_line(&format!("{}={}", TARGET_ENV, target))
            .is_ok();
        written &= file
            .write_line(&format!("{}={}", HEADER_DIR_ENV, header_dir))
            .is_ok();
        written &= file
            .write_line(&format!("{}={}", LIBRARY_DIR_ENV, library_dir))
            .is_ok();
        written &= file.write_line(&format!("mkdir -p {}", header_dir)).is_ok();
        written &= file
            .write_line(&format!("mkdir -p {}", library_dir))
            .is_ok();
        for step in steps {
            written &= file.write_line(&decode_step(step)).is_ok();
        }
        written && file.close()
    }

    /// Rebuilds the per-target artifact directories from scratch, runs the
    /// recipe, and caches the listed artifacts on success.
    pub fn compile(
        &self,
        session: &Session,
        target: &str,
        library_paths: &[String],
        header_dirs: &[String],
    ) -> bool {
        session.run(&format!("rm -rf {}", self.library_dir(target)));
        session.run(&format!("rm -rf {}", self.header_dir(target)));
        let built = session.run_checked(
            &format!("Building {} for Target {}", self.name, target),
            &format!("bash {}", layout::recipe_file(&self.dir, target)),
        );
        if !built {
            return false;
        }
        self.cache_artifacts(session, target, library_paths, header_dirs, false)
    }

    /// Copies produced libraries and header trees into the per-target
    /// artifact directories. Paths are taken relative to the dependency
    /// directory unless `full_paths` says otherwise; empty strings mark
    /// targets with nothing to cache and are skipped.
    pub fn cache_artifacts(
        &self,
        session: &Session,
        target: &str,
        library_paths: &[String],
        header_dirs: &[String],
        full_paths: bool,
    ) -> bool {
        let mut outcome = PhaseOutcome::new();
        let prefix = if full_paths {
            String::new()
        } else {
            format!("{}/", self.dir)
        };
        for path in library_paths {
            if path.is_empty() {
                continue;
            }
            outcome.and(session.run_checked(
                &format!(
                    "Caching {} Binary {} for Target {}",
                    self.name,
                    artifact_label(path, full_paths),
                    target
                ),
                &format!("cp {}{} {}/", prefix, path, self.library_dir(target)),
            ));
        }
        for dir in header_dirs {
            if dir.is_empty() {
                continue;
            }
            outcome.and(session.run_checked(
                &format!(
                    "Caching {} Headers {} for Target {}",
                    self.name,
                    artifact_label(dir, full_paths),
                    target
                ),
                &format!(
                    "rsync -av --exclude='{}' {}{} {}/",
                    layout::ARTIFACT_DIR_GLOB,
                    prefix,
                    dir,
                    self.header_dir(target)
                ),
            ));
        }
        outcome.succeeded()
    }

    pub fn libraries(&self, session: &Session, target: &str) -> Vec<String> {
        if !self.supports(target) {
            return Vec::new();
        }
        session.list_files(&self.library_dir(target))
    }
}

fn decode_step(step: &str) -> String {
    step.replace(COLON_TOKEN, ":").replace(QUOTE_TOKEN, "\"")
}

fn artifact_label(path: &str, full_paths: bool) -> &str {
    if full_paths {
        path.rsplit('/').next().unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reserved_tokens_in_steps() {
        assert_eq!(
            decode_step("curl https__COLON__//host/x -o __QUOTE__x y__QUOTE__"),
            "curl https://host/x -o \"x y\""
        );
        assert_eq!(decode_step("make -j4"), "make -j4");
    }

    #[test]
    fn labels_shorten_only_full_paths() {
        assert_eq!(artifact_label("out/libuv.so", true), "libuv.so");
        assert_eq!(artifact_label("out/libuv.so", false), "out/libuv.so");
        assert_eq!(artifact_label("libuv.so", true), "libuv.so");
    }

    #[test]
    fn rejects_build_steps_for_unknown_target() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().to_str().expect("utf8 path").to_string();
        let session = Session::local();
        let dependency = RecipeDependency::new(&dir, "libuv", vec!["default".to_string()]);
        assert!(!dependency.set_build_steps(&session, "linux-x64", &["make".to_string()]));
        assert!(!std::path::Path::new(&layout::recipe_file(&dir, "linux-x64")).exists());
    }

    #[test]
    fn recipe_preamble_precedes_steps() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().to_str().expect("utf8 path").to_string();
        let session = Session::local();
        let dependency = RecipeDependency::new(&dir, "libuv", vec!["default".to_string()]);
        assert!(dependency.set_build_steps(
            &session,
            "default",
            &["./configure".to_string(), "make libuv".to_string()]
        ));
        let recipe =
            std::fs::read_to_string(layout::recipe_file(&dir, "default")).expect("recipe");
        let lines: Vec<&str> = recipe.lines().collect();
        assert_eq!(lines[0], format!("cd {}", dir));
        assert_eq!(lines[1], "CROSSFORGE_TARGET=default");
        assert_eq!(
            lines[2],
            format!("CROSSFORGE_HEADER_DIR={}/crossforge_default_headers", dir)
        );
        assert_eq!(
            lines[3],
            format!(
                "CROSSFORGE_LIBRARY_DIR={}/crossforge_default_libraries",
                dir
            )
        );
        assert!(lines[4].starts_with("mkdir -p "));
        assert!(lines[5].starts_with("mkdir -p "));
        assert_eq!(lines[6], "./configure");
        assert_eq!(lines[7], "make libuv");
    }

    #[test]
    fn compile_runs_recipe_and_caches_listed_libraries() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().to_str().expect("utf8 path").to_string();
        let session = Session::local();
        let dependency = RecipeDependency::new(&dir, "libuv", vec!["default".to_string()]);
        assert!(dependency.set_build_steps(
            &session,
            "default",
            &["mkdir -p out".to_string(), "touch out/libuv.so".to_string()]
        ));
        assert!(dependency.compile(&session, "default", &["out/libuv.so".to_string()], &[]));
        let cached = dependency.libraries(&session, "default");
        assert_eq!(cached, vec![format!(
            "{}/crossforge_default_libraries/libuv.so",
            dir
        )]);
    }

    #[test]
    fn empty_artifact_paths_are_skipped() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().to_str().expect("utf8 path").to_string();
        let session = Session::local();
        let dependency = RecipeDependency::new(&dir, "header-only", vec!["default".to_string()]);
        assert!(dependency.cache_artifacts(&session, "default", &[String::new()], &[], false));
    }
}
