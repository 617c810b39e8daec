use std::cell::RefCell;
use std::fs;
use std::path::Path;

use crossforge_build::{
    BuildInputs, BuildPipeline, FetchPlan, Fetcher, NativeBuilder, TestMode,
};
use crossforge_core::layout;
use crossforge_exec::Session;
use flate2::read::GzDecoder;

struct RecordingFetcher {
    modules: RefCell<Vec<String>>,
}

impl Fetcher for RecordingFetcher {
    fn fetch(&self, _session: &Session, plan: &FetchPlan) -> bool {
        let mut modules = self.modules.borrow_mut();
        for name in plan.module_names() {
            modules.push(name.to_string());
        }
        true
    }
}

/// Stands in for the cmake driver: drops a finished library where make
/// would have left one, and records what it was asked to do.
struct SimulatedMake {
    cache_dir: String,
    built_targets: RefCell<Vec<String>>,
    test_runs: RefCell<Vec<(TestMode, String, Vec<String>)>>,
}

impl SimulatedMake {
    fn new(cache_dir: &str) -> Self {
        SimulatedMake {
            cache_dir: cache_dir.to_string(),
            built_targets: RefCell::new(Vec::new()),
            test_runs: RefCell::new(Vec::new()),
        }
    }
}

impl NativeBuilder for SimulatedMake {
    fn build(&self, _session: &Session, inputs: &BuildInputs, target: &str) -> bool {
        let lib_dir = format!("{}/lib", layout::compile_dir(&self.cache_dir, target));
        fs::create_dir_all(&lib_dir).expect("compile lib dir");
        fs::write(
            format!("{}/lib{}.so", lib_dir, inputs.project_name),
            b"built",
        )
        .expect("compile artifact");
        self.built_targets.borrow_mut().push(target.to_string());
        true
    }

    fn test(&self, _session: &Session, inputs: &BuildInputs, mode: TestMode, filter: &str) -> bool {
        self.test_runs.borrow_mut().push((
            mode,
            filter.to_string(),
            inputs.libraries.clone(),
        ));
        true
    }
}

fn write_project(project_dir: &Path) {
    fs::create_dir_all(project_dir.join("src")).expect("src dir");
    fs::create_dir_all(project_dir.join("test")).expect("test dir");
    fs::write(project_dir.join("src/demo.cpp"), "").expect("source");
    fs::write(project_dir.join("src/demo.hpp"), "").expect("header");
    fs::write(project_dir.join("test/demo.test.hpp"), "").expect("test header");
    fs::write(
        project_dir.join("crossforge.yaml"),
        concat!(
            "project:\n",
            "  name: demo\n",
            "  version: 0.1.0\n",
            "  source: src\n",
            "  test: test\n",
            "  targets:\n",
            "    - linux-x64\n",
            "dependencies:\n",
            "  - name: libuv\n",
            "    source: git\n",
            "    type: manual\n",
            "    url: https://host/libuv.git\n",
            "    rev: v1.44.2\n",
            "    target any:\n",
            "      build:\n",
            "        - mkdir -p out\n",
            "        - touch out/libuv.${LIB_EXT}\n",
            "      libs:\n",
            "        - out/libuv.${LIB_EXT}\n",
        ),
    )
    .expect("manifest");
}

fn read_package_paths(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("open package");
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut paths: Vec<String> = archive
        .entries()
        .expect("entries")
        .map(|entry| {
            entry
                .expect("entry")
                .path()
                .expect("path")
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    paths.sort();
    paths
}

#[test]
fn phases_assemble_the_cache_and_the_output_tree() {
    let temp = tempfile::tempdir().expect("temp dir");
    let project = temp.path().to_str().expect("utf8 path");
    write_project(temp.path());
    let manifest = format!("{}/crossforge.yaml", project);
    let session = Session::local();
    let fetcher = RecordingFetcher {
        modules: RefCell::new(Vec::new()),
    };
    let builder = SimulatedMake::new(&layout::cache_dir(project));
    let pipeline = BuildPipeline::new(&session, &fetcher, &builder, project, &manifest);

    assert!(pipeline.download());
    assert_eq!(*fetcher.modules.borrow(), vec!["libuv".to_string()]);

    pipeline.build_dependencies("linux-x64");
    let dep_cache = layout::dependency_cache_dir(pipeline.cache_dir(), "linux-x64", "libuv");
    assert!(Path::new(&format!("{}/libuv.so", dep_cache)).exists());
    let staged_lib = layout::library_dir(
        &layout::dependency_dir(pipeline.cache_dir(), "libuv"),
        "linux-x64",
    );
    assert!(Path::new(&format!("{}/libuv.so", staged_lib)).exists());

    assert!(pipeline.build_project("linux-x64"));
    assert_eq!(*builder.built_targets.borrow(), vec!["linux-x64".to_string()]);
    let output_dir = temp.path().join("output/linux-x64");
    assert!(output_dir.join("lib/libdemo.so").exists());
    assert!(output_dir.join("deps/libuv.so").exists());
    let package = output_dir.join("pkg/demo-0.1.0-linux-x64.cfpk");
    assert!(package.exists());
    let paths = read_package_paths(&package);
    assert!(paths.contains(&"lib/libdemo.so".to_string()));
    assert!(paths.contains(&"deps/libuv.so".to_string()));
    assert!(!paths.iter().any(|path| path.starts_with("pkg/")));
}

#[test]
fn rebuilding_clears_the_previous_output_tree() {
    let temp = tempfile::tempdir().expect("temp dir");
    let project = temp.path().to_str().expect("utf8 path");
    write_project(temp.path());
    let manifest = format!("{}/crossforge.yaml", project);
    let session = Session::local();
    let fetcher = RecordingFetcher {
        modules: RefCell::new(Vec::new()),
    };
    let builder = SimulatedMake::new(&layout::cache_dir(project));
    let pipeline = BuildPipeline::new(&session, &fetcher, &builder, project, &manifest);

    let stale = temp.path().join("output/linux-x64/bin/stale");
    fs::create_dir_all(stale.parent().expect("parent")).expect("stale dir");
    fs::write(&stale, b"old").expect("stale file");
    assert!(pipeline.build_project("linux-x64"));
    assert!(!stale.exists());
    assert!(temp.path().join("output/linux-x64/lib/libdemo.so").exists());
}

#[test]
fn testing_registers_the_default_target_cache() {
    let temp = tempfile::tempdir().expect("temp dir");
    let project = temp.path().to_str().expect("utf8 path");
    write_project(temp.path());
    let manifest = format!("{}/crossforge.yaml", project);
    let session = Session::local();
    let fetcher = RecordingFetcher {
        modules: RefCell::new(Vec::new()),
    };
    let builder = SimulatedMake::new(&layout::cache_dir(project));
    let pipeline = BuildPipeline::new(&session, &fetcher, &builder, project, &manifest);

    let default_cache = layout::dependency_cache_dir(pipeline.cache_dir(), "default", "libuv");
    fs::create_dir_all(&default_cache).expect("default cache");
    fs::write(format!("{}/libuv.so", default_cache), b"uv").expect("cached lib");

    assert!(pipeline.test(TestMode::SanitizeAddress, "[fast]"));
    let runs = builder.test_runs.borrow();
    assert_eq!(runs.len(), 1);
    let (mode, filter, libraries) = &runs[0];
    assert_eq!(*mode, TestMode::SanitizeAddress);
    assert_eq!(filter, "[fast]");
    assert_eq!(libraries, &[format!("{}/libuv.so", default_cache)]);
}
