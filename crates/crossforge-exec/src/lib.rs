use std::fs::File;
use std::io::{self, Write};
use std::process::Command;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use sha2::{Digest, Sha256};

pub const DEFAULT_IMAGE: &str = "crossforge/builder";

const READINESS_ATTEMPTS: u32 = 10;
const READINESS_BACKOFF: Duration = Duration::from_millis(500);

/// Where a session dispatches its commands: the host shell, or one named
/// reusable container with the project directory volume-mounted at its host
/// path so file paths mean the same thing on both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Runtime {
    Local,
    Container {
        name: String,
        image: String,
        project_dir: String,
    },
}

/// A serialized command-execution session. Every dispatch goes through one
/// mutex so interleaved phases cannot mix their output or their container
/// bring-up.
pub struct Session {
    runtime: Runtime,
    dispatch: Mutex<()>,
}

pub fn container_name(project_dir: &str, target: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_dir.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("crossforge-{}-{}", &digest[..12], target)
}

impl Session {
    pub fn local() -> Self {
        Session {
            runtime: Runtime::Local,
            dispatch: Mutex::new(()),
        }
    }

    pub fn container(project_dir: &str, target: &str, image: &str) -> Self {
        Session {
            runtime: Runtime::Container {
                name: container_name(project_dir, target),
                image: image.to_string(),
                project_dir: project_dir.to_string(),
            },
            dispatch: Mutex::new(()),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.runtime, Runtime::Local)
    }

    pub fn name(&self) -> Option<&str> {
        match &self.runtime {
            Runtime::Local => None,
            Runtime::Container { name, .. } => Some(name),
        }
    }

    /// Idempotent bring-up. A container that fails to report ready within
    /// the bounded poll is used anyway; the commands that follow surface the
    /// failure as their own outcomes.
    pub fn start(&self) {
        let _guard = self.guard();
        if let Runtime::Container {
            name,
            image,
            project_dir,
        } = &self.runtime
        {
            let (_, listed) = capture("docker ps --format {{.Names}}");
            if listed.lines().any(|line| line.trim() == name) {
                return;
            }
            capture(&format!(
                "docker run --detach --rm --name {} --workdir {} --volume {}:{} {} sleep infinity",
                name, project_dir, project_dir, project_dir, image
            ));
            for _ in 0..READINESS_ATTEMPTS {
                let (ready, _) = capture(&format!("docker exec {} true", name));
                if ready {
                    return;
                }
                thread::sleep(READINESS_BACKOFF);
            }
        }
    }

    /// Runs a command and returns its merged stdout/stderr.
    pub fn run(&self, command: &str) -> String {
        let _guard = self.guard();
        let (_, output) = capture(&self.wrapped(command));
        output
    }

    /// Runs a command and reports only whether it exited zero.
    pub fn run_status(&self, command: &str) -> bool {
        let _guard = self.guard();
        let (ok, _) = capture(&self.wrapped(command));
        ok
    }

    /// Prints `<label> ... ` up front, then `OK` or `FAIL`, and on failure
    /// the full captured output.
    pub fn run_checked(&self, label: &str, command: &str) -> bool {
        let _guard = self.guard();
        print!("{} ... ", label);
        let _ = io::stdout().flush();
        let (ok, output) = capture(&self.wrapped(command));
        println!("{}", if ok { "OK" } else { "FAIL" });
        if !ok {
            println!("{}", output);
        }
        ok
    }

    /// Runs a command with stdout and stderr inherited, for long steps whose
    /// output should stream as it happens.
    pub fn run_live(&self, command: &str) -> bool {
        let _guard = self.guard();
        Command::new("sh")
            .arg("-c")
            .arg(self.wrapped(command))
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Sorted recursive file listing, filtered to paths under `dir` so find
    /// diagnostics never read as file names.
    pub fn list_files(&self, dir: &str) -> Vec<String> {
        let listing = self.run(&format!("find {} -type f", dir));
        let mut files: Vec<String> = listing
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(dir))
            .map(str::to_string)
            .collect();
        files.sort();
        files
    }

    /// Copies a finished local file into the container at the same path.
    pub fn copy_into(&self, path: &str) -> bool {
        match &self.runtime {
            Runtime::Local => true,
            Runtime::Container { name, .. } => {
                let _guard = self.guard();
                let (ok, _) = capture(&format!("docker cp {} {}:{}", path, name, path));
                ok
            }
        }
    }

    pub fn stop(&self) {
        if let Runtime::Container { name, .. } = &self.runtime {
            let _guard = self.guard();
            capture(&format!("docker stop {}", name));
        }
    }

    pub fn create_file(&self, path: &str) -> io::Result<SessionFile<'_>> {
        if !self.is_local() {
            self.run(&format!("rm -rf {}", path));
        }
        let file = File::create(path)?;
        Ok(SessionFile {
            session: self,
            path: path.to_string(),
            file: Some(file),
        })
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.dispatch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wrapped(&self, command: &str) -> String {
        match &self.runtime {
            Runtime::Local => command.to_string(),
            Runtime::Container { name, .. } => {
                format!("docker exec {} sh -c {}", name, shell_quote(command))
            }
        }
    }
}

/// Scoped writer for files the session's commands will consume: written
/// locally line by line, then landed into the container on close.
pub struct SessionFile<'a> {
    session: &'a Session,
    path: String,
    file: Option<File>,
}

impl SessionFile<'_> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => writeln!(file, "{}", line),
            None => Ok(()),
        }
    }

    /// Flushes, closes, and lands the file in the session. Later calls are
    /// no-ops.
    pub fn close(&mut self) -> bool {
        match self.file.take() {
            Some(mut file) => {
                let flushed = file.flush().is_ok();
                drop(file);
                flushed && self.session.copy_into(&self.path)
            }
            None => true,
        }
    }
}

impl Drop for SessionFile<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

fn capture(command: &str) -> (bool, String) {
    let merged = format!("{} 2>&1", command);
    match Command::new("sh").arg("-c").arg(&merged).output() {
        Ok(output) => (
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ),
        Err(error) => (false, error.to_string()),
    }
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}
