use clap::{Parser, Subcommand};

use crossforge_build::{BuildPipeline, CMakeDriver, PeruFetcher, TestMode};
use crossforge_core::{known_targets, layout, DEFAULT_TARGET};
use crossforge_exec::{Session, DEFAULT_IMAGE};

#[derive(Parser)]
#[command(name = "crossforge", version, about = "Cross-compiling build orchestrator")]
struct Cli {
    /// Run directly on the host shell instead of the build container.
    #[arg(long, global = true)]
    local: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the target triples this tool can build for.
    ListTargets,
    /// Fetch the declared external dependencies.
    Download,
    /// Compile and cache the dependencies for one target.
    BuildDeps {
        /// Target to compile the dependencies for.
        target: String,
    },
    /// Build the project and assemble its output tree for one target.
    Build {
        /// Target to build the project for.
        target: String,
    },
    /// Build and run the project tests.
    Test {
        /// Filter forwarded to the test binary.
        filter: Option<String>,
    },
    /// Build and run the project tests under the coverage harness.
    Coverage {
        /// Filter forwarded to the test binary.
        filter: Option<String>,
    },
    /// Build the project tests and hand the binary to gdb.
    Debug {
        /// Filter forwarded to the test binary.
        filter: Option<String>,
    },
    /// Build and run the project tests for profiling.
    Profile {
        /// Filter forwarded to the test binary.
        filter: Option<String>,
    },
    /// Build and run the project tests under a sanitizer.
    Sanitize {
        /// Sanitizer to use (address | behavior | thread | leak).
        kind: String,
    },
}

fn main() {
    if let Err(message) = run_cli() {
        let _ = exit_with_error(&message);
    }
}

fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::ListTargets => {
            for target in known_targets() {
                println!("{}", target);
            }
            Ok(())
        }
        Command::Download => {
            let ok = run_phase(cli.local, DEFAULT_TARGET, |pipeline| pipeline.download())?;
            ensure(ok, "download failed")
        }
        Command::BuildDeps { target } => {
            let ok = run_phase(cli.local, &target, |pipeline| {
                pipeline.build_dependencies(&target)
            })?;
            ensure(ok, &format!("dependency build failed for target {}", target))
        }
        Command::Build { target } => {
            let ok = run_phase(cli.local, &target, |pipeline| pipeline.build_project(&target))?;
            ensure(ok, &format!("build failed for target {}", target))
        }
        Command::Test { filter } => run_test(cli.local, TestMode::Plain, filter),
        Command::Coverage { filter } => run_test(cli.local, TestMode::Coverage, filter),
        Command::Debug { filter } => run_test(cli.local, TestMode::Debug, filter),
        Command::Profile { filter } => run_test(cli.local, TestMode::Profile, filter),
        Command::Sanitize { kind } => {
            let mode = match kind.as_str() {
                "address" => TestMode::SanitizeAddress,
                "behavior" => TestMode::SanitizeBehavior,
                "thread" => TestMode::SanitizeThread,
                "leak" => TestMode::SanitizeLeak,
                other => {
                    return exit_with_error(&format!(
                        "invalid sanitizer '{}'; expected address, behavior, thread, or leak",
                        other
                    ));
                }
            };
            run_test(cli.local, mode, None)
        }
    }
}

fn run_phase<F>(local: bool, target: &str, phase: F) -> Result<bool, String>
where
    F: FnOnce(&BuildPipeline) -> bool,
{
    let project_dir = std::env::current_dir()
        .map_err(|err| format!("failed to resolve the working directory: {}", err))?
        .to_string_lossy()
        .into_owned();
    let manifest_path = format!("{}/{}", project_dir, layout::MANIFEST_FILE_NAME);
    let cache_dir = layout::cache_dir(&project_dir);
    let session = if local {
        Session::local()
    } else {
        Session::container(&project_dir, target, DEFAULT_IMAGE)
    };
    session.start();
    let fetcher = PeruFetcher::new(
        &layout::fetch_manifest_file(&cache_dir),
        &layout::checkout_dir(&cache_dir),
    );
    let builder = CMakeDriver::new(&project_dir, &cache_dir);
    let pipeline = BuildPipeline::new(&session, &fetcher, &builder, &project_dir, &manifest_path);
    Ok(phase(&pipeline))
}

fn run_test(local: bool, mode: TestMode, filter: Option<String>) -> Result<(), String> {
    let filter = filter.unwrap_or_default();
    let ok = run_phase(local, DEFAULT_TARGET, |pipeline| pipeline.test(mode, &filter))?;
    ensure(ok, &format!("test {} failed", mode))
}

fn ensure(ok: bool, message: &str) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

fn exit_with_error(message: &str) -> Result<(), String> {
    eprintln!("{}", message);
    std::process::exit(1);
}
