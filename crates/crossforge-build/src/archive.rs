use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    Io { message: String },
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io { message } => write!(f, "package i/o error: {}", message),
        }
    }
}

impl std::error::Error for ArchiveError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub archive_path: String,
    pub source: PathBuf,
}

/// Collects every file under `root` as an archive entry with a relative,
/// forward-slash path, sorted so the archive is byte-stable across runs.
pub fn entries_from_dir(root: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| ArchiveError::Io {
            message: err.to_string(),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|err| ArchiveError::Io {
                message: err.to_string(),
            })?;
        entries.push(ArchiveEntry {
            archive_path: path_to_archive_path(relative),
            source: entry.path().to_path_buf(),
        });
    }
    entries.sort_by(|left, right| left.archive_path.cmp(&right.archive_path));
    Ok(entries)
}

pub fn write_tar_gz(path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let file = fs::File::create(path).map_err(|err| ArchiveError::Io {
        message: err.to_string(),
    })?;
    let encoder = flate2::GzBuilder::new()
        .mtime(0)
        .write(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        let metadata = fs::metadata(&entry.source).map_err(|err| ArchiveError::Io {
            message: err.to_string(),
        })?;
        header.set_size(metadata.len());
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(0);
        header
            .set_path(&entry.archive_path)
            .map_err(|err| ArchiveError::Io {
                message: err.to_string(),
            })?;
        header.set_cksum();
        let mut input = fs::File::open(&entry.source).map_err(|err| ArchiveError::Io {
            message: err.to_string(),
        })?;
        builder
            .append_data(&mut header, &entry.archive_path, &mut input)
            .map_err(|err| ArchiveError::Io {
                message: err.to_string(),
            })?;
    }
    builder.finish().map_err(|err| ArchiveError::Io {
        message: err.to_string(),
    })?;
    builder
        .into_inner()
        .map_err(|err| ArchiveError::Io {
            message: err.to_string(),
        })?
        .finish()
        .map_err(|err| ArchiveError::Io {
            message: err.to_string(),
        })?;
    Ok(())
}

/// Packages the finished output tree into one gzipped tar. Entries are
/// listed before the package file is created, so the package never
/// contains itself.
pub fn package_output_tree(output_dir: &Path, package_path: &Path) -> Result<(), ArchiveError> {
    let entries = entries_from_dir(output_dir)?;
    write_tar_gz(package_path, &entries)
}

fn path_to_archive_path(path: &Path) -> String {
    let mut components = Vec::new();
    for component in path.components() {
        components.push(component.as_os_str().to_string_lossy().into_owned());
    }
    components.join("/")
}
