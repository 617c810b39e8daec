use std::path::{Path, PathBuf};

use serde_yaml::Value;

#[derive(Debug)]
pub enum DocError {
    Missing {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocError::Missing { path } => {
                write!(f, "document '{}' does not exist", path.display())
            }
            DocError::Io { path, source } => {
                write!(f, "failed to read document '{}': {}", path.display(), source)
            }
            DocError::Yaml { path, source } => {
                write!(
                    f,
                    "failed to parse document '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for DocError {}

static NULL: Value = Value::Null;

pub fn try_load_document(path: &Path) -> Result<Value, DocError> {
    if !path.exists() {
        return Err(DocError::Missing {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| DocError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| DocError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Absent or unreadable documents read as the empty document.
pub fn load_document(path: &Path) -> Value {
    try_load_document(path).unwrap_or(Value::Null)
}

pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> &'a Value {
    let mut node = root;
    for key in path {
        node = node.get(*key).unwrap_or(&NULL);
    }
    node
}

pub fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

pub fn string_at(root: &Value, path: &[&str]) -> String {
    scalar_string(lookup(root, path))
}

pub fn sequence_at<'a>(root: &'a Value, path: &[&str]) -> &'a [Value] {
    match lookup(root, path) {
        Value::Sequence(items) => items,
        _ => &[],
    }
}

pub fn strings_at(root: &Value, path: &[&str]) -> Vec<String> {
    sequence_at(root, path).iter().map(scalar_string).collect()
}
