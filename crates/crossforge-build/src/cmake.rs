use crossforge_core::{layout, ProjectKind, DEFAULT_TARGET};
use crossforge_exec::Session;

use crate::native::{BuildInputs, NativeBuilder, TestMode};

const SCRIPT_HEADER: &str =
    "# THIS IS AN AUTOGENERATED FILE USING CROSSFORGE\n# DO NOT EDIT (UNLESS YOU KNOW WHAT'S UP)";
const CLANG_C: &str = "-DCMAKE_C_COMPILER=/usr/bin/clang";
const CLANG_CXX: &str = "-DCMAKE_CXX_COMPILER=/usr/bin/clang++";

/// Builds the project itself with CMake and make, through a pair of
/// generated scripts per operation: one that configures the build tree and
/// one that runs make plus the manifest's hook commands.
pub struct CMakeDriver {
    project_dir: String,
    cache_dir: String,
}

impl CMakeDriver {
    pub fn new(project_dir: &str, cache_dir: &str) -> Self {
        CMakeDriver {
            project_dir: project_dir.to_string(),
            cache_dir: cache_dir.to_string(),
        }
    }

    fn write_script(&self, session: &Session, path: &str, text: &str) -> bool {
        let mut file = match session.create_file(path) {
            Ok(file) => file,
            Err(_) => return false,
        };
        let mut written = true;
        for line in text.lines() {
            written &= file.write_line(line).is_ok();
        }
        written && file.close()
    }

    fn write_project_files(&self, session: &Session, inputs: &BuildInputs, with_tests: bool) -> bool {
        let build_file = format!("{}/CMakeLists.txt", self.cache_dir);
        if !self.write_script(
            session,
            &build_file,
            &render_build_file(inputs, &self.cache_dir, with_tests),
        ) {
            return false;
        }
        if with_tests {
            let test_main = format!("{}/test-main.cpp", self.cache_dir);
            return self.write_script(session, &test_main, &render_test_main(&inputs.test_files));
        }
        true
    }
}

impl NativeBuilder for CMakeDriver {
    fn build(&self, session: &Session, inputs: &BuildInputs, target: &str) -> bool {
        if !self.write_project_files(session, inputs, false) {
            return false;
        }
        let builds = layout::builds_dir(&self.cache_dir);
        if !session.run_status(&format!("mkdir -p {}", builds)) {
            return false;
        }
        let configure = format!("{}/compile-{}.sh", builds, target);
        let driver = format!("{}/compile-{}.make.sh", builds, target);
        let wrote = self.write_script(
            session,
            &configure,
            &build_configure_text(&self.cache_dir, target),
        ) && self.write_script(
            session,
            &driver,
            &build_driver_text(&self.cache_dir, target, inputs),
        );
        if !wrote {
            return false;
        }
        let ready = session.run_checked(
            &format!(
                "Setting-Up Build for {} Version {}",
                inputs.project_name, inputs.project_version
            ),
            &format!("bash {}", configure),
        );
        println!(
            "Building {} Version {}",
            inputs.project_name, inputs.project_version
        );
        ready && session.run_live(&format!("bash {}", driver))
    }

    fn test(&self, session: &Session, inputs: &BuildInputs, mode: TestMode, filter: &str) -> bool {
        if !self.write_project_files(session, inputs, true) {
            return false;
        }
        let builds = layout::builds_dir(&self.cache_dir);
        if !session.run_status(&format!("mkdir -p {}/{}", builds, mode)) {
            return false;
        }
        let configure = format!("{}/{}.sh", builds, mode);
        let driver = format!("{}/{}.make.sh", builds, mode);
        let wrote = self.write_script(
            session,
            &configure,
            &test_configure_text(&self.cache_dir, mode),
        ) && self.write_script(
            session,
            &driver,
            &test_driver_text(&self.project_dir, &self.cache_dir, mode, filter, inputs),
        );
        if !wrote {
            return false;
        }
        let ready = session.run_checked(
            &format!(
                "Setting-Up Test {} for {} Version {}",
                mode, inputs.project_name, inputs.project_version
            ),
            &format!("bash {}", configure),
        );
        println!(
            "Running {} Version {} for Test {}",
            inputs.project_name, inputs.project_version, mode
        );
        ready && session.run_live(&format!("bash {}", driver))
    }
}

fn build_configure_text(cache_dir: &str, target: &str) -> String {
    let compile_dir = layout::compile_dir(cache_dir, target);
    let compilers = if target == DEFAULT_TARGET {
        format!(" {} {}", CLANG_C, CLANG_CXX)
    } else {
        String::new()
    };
    format!(
        "{}\nset -e\n\n# Build Steps for the Compile operation for target {}\nmkdir -p {}\ncd {}\ncmake{} -DCMAKE_BUILD_TYPE=Release {}\n",
        SCRIPT_HEADER, target, compile_dir, compile_dir, compilers, cache_dir
    )
}

fn build_driver_text(cache_dir: &str, target: &str, inputs: &BuildInputs) -> String {
    let mut text = format!("{}\n\n# Pre-Build commands for the Process\n", SCRIPT_HEADER);
    for command in &inputs.build_hooks.pre {
        text.push_str(command);
        text.push('\n');
    }
    text.push_str(&format!(
        "\n# Run the Make Operation: Compile Target {}\ncd {} && make {}\n",
        target,
        layout::compile_dir(cache_dir, target),
        inputs.project_name
    ));
    text.push_str("\n# Post-Build commands for the Process\n");
    for command in &inputs.build_hooks.post {
        text.push_str(command);
        text.push('\n');
    }
    text
}

fn test_configure_text(cache_dir: &str, mode: TestMode) -> String {
    let mode_dir = format!("{}/{}", layout::builds_dir(cache_dir), mode);
    let flag = mode
        .configure_flag()
        .map(|flag| format!(" {}", flag))
        .unwrap_or_default();
    format!(
        "{}\nset -e\n\n# Build Steps for the Test operation {}\nmkdir -p {}\ncd {}\ncmake {} {} -DCMAKE_BUILD_TYPE=Debug {}{}\n",
        SCRIPT_HEADER, mode, mode_dir, mode_dir, CLANG_C, CLANG_CXX, cache_dir, flag
    )
}

fn test_driver_text(
    project_dir: &str,
    cache_dir: &str,
    mode: TestMode,
    filter: &str,
    inputs: &BuildInputs,
) -> String {
    let mode_dir = format!("{}/{}", layout::builds_dir(cache_dir), mode);
    let ld_path = format!(
        "LD_LIBRARY_PATH=\"{}/deps\"",
        layout::project_output_dir(project_dir, DEFAULT_TARGET)
    );
    let make_target = if mode == TestMode::Coverage {
        format!("{}_test_coverage", inputs.project_name)
    } else {
        format!("{}_test", inputs.project_name)
    };
    let mut text = format!("{}\n\n# Pre-Test commands for the Test\n", SCRIPT_HEADER);
    for command in &inputs.test_hooks.pre {
        text.push_str(command);
        text.push('\n');
    }
    text.push_str(&format!(
        "\n# Run the Make Operation: {}\ncd {} && {} make {}\n",
        mode, mode_dir, ld_path, make_target
    ));
    let test_binary = format!("{}/bin/{}_test", mode_dir, inputs.project_name);
    if mode != TestMode::Coverage && mode != TestMode::Debug {
        text.push_str(&format!("{} {} {}\n", ld_path, test_binary, filter));
    }
    if mode == TestMode::Debug {
        text.push_str(&format!("{} gdb {}\n", ld_path, test_binary));
    }
    text.push_str("\n# Post-Test commands for the Test\n");
    for command in &inputs.test_hooks.post {
        text.push_str(command);
        text.push('\n');
    }
    text
}

fn render_build_file(inputs: &BuildInputs, cache_dir: &str, with_tests: bool) -> String {
    let mut text = String::new();
    text.push_str("cmake_minimum_required(VERSION 3.10)\n");
    text.push_str(&format!("project({})\n\n", inputs.project_name));
    text.push_str("set(CMAKE_CXX_STANDARD 17)\n");
    text.push_str("set(CMAKE_CXX_STANDARD_REQUIRED ON)\n");
    text.push_str("set(CMAKE_POSITION_INDEPENDENT_CODE ON)\n\n");
    for include_dir in &inputs.include_dirs {
        text.push_str(&format!("include_directories({})\n", include_dir));
    }
    match inputs.kind {
        ProjectKind::Executable => {
            text.push_str(&format!("\nadd_executable({}\n", inputs.project_name));
            if let Some(main_file) = &inputs.main_file {
                text.push_str(&format!("    {}\n", main_file));
            }
        }
        ProjectKind::Library => {
            text.push_str(&format!("\nadd_library({} SHARED\n", inputs.project_name));
        }
    }
    for source in &inputs.sources {
        text.push_str(&format!("    {}\n", source));
    }
    text.push_str(")\n");
    text.push_str(&format!(
        "set_target_properties({} PROPERTIES\n    RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_BINARY_DIR}}/bin\n    LIBRARY_OUTPUT_DIRECTORY ${{CMAKE_BINARY_DIR}}/lib\n    ARCHIVE_OUTPUT_DIRECTORY ${{CMAKE_BINARY_DIR}}/lib)\n",
        inputs.project_name
    ));
    text.push_str(&link_line(&inputs.project_name, &inputs.libraries));
    if with_tests {
        let test_target = format!("{}_test", inputs.project_name);
        text.push_str(&format!(
            "\nadd_executable({}\n    {}/test-main.cpp\n",
            test_target, cache_dir
        ));
        for source in &inputs.sources {
            text.push_str(&format!("    {}\n", source));
        }
        text.push_str(")\n");
        text.push_str(&format!(
            "set_target_properties({} PROPERTIES RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_BINARY_DIR}}/bin)\n",
            test_target
        ));
        text.push_str(&link_line(&test_target, &inputs.libraries));
        text.push_str(&format!(
            "add_custom_target({}_coverage\n    COMMAND ${{CMAKE_BINARY_DIR}}/bin/{}\n    DEPENDS {})\n",
            test_target, test_target, test_target
        ));
    }
    text
}

// Libraries link in the reverse of their registration order, so artifacts
// layered on earlier dependencies resolve their symbols.
fn link_line(target_name: &str, libraries: &[String]) -> String {
    if libraries.is_empty() {
        return String::new();
    }
    let mut line = format!("target_link_libraries({}", target_name);
    for library in libraries.iter().rev() {
        line.push_str(&format!("\n    {}", library));
    }
    line.push_str(")\n");
    line
}

fn render_test_main(test_files: &[String]) -> String {
    let mut text = String::new();
    text.push_str("#define CATCH_CONFIG_MAIN\n");
    text.push_str("#include <catch2/catch.hpp>\n");
    for test_file in test_files {
        text.push_str(&format!("#include \"{}\"\n", test_file));
    }
    text
}
