//! Corpus loading.
//!
//! The external project loader hands over compiled classes as JSON
//! documents matching [`ClassModel`]. This module only finds and parses
//! them; it performs no analysis.

use crate::error::{ClasslintError, ClasslintResult};
use crate::model::ClassModel;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CLASS_FILE_EXTENSION: &str = "json";

pub fn load_class_file(path: &Path) -> ClasslintResult<ClassModel> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| ClasslintError::corpus(format!("{}: {err}", path.display())))
}

/// Collect every class document under the given paths. Directories are
/// walked recursively in file-name order so corpus order is deterministic.
pub fn collect_corpus(paths: &[PathBuf]) -> ClasslintResult<Vec<ClassModel>> {
    let mut classes = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry =
                    entry.map_err(|err| ClasslintError::corpus(err.to_string()))?;
                let p = entry.path();
                if p.extension().and_then(|e| e.to_str()) == Some(CLASS_FILE_EXTENSION) {
                    classes.push(load_class_file(p)?);
                }
            }
        } else {
            classes.push(load_class_file(path)?);
        }
    }
    Ok(classes)
}
