//! Local input files for upload slots.
//!
//! Hosts collect files as `spec=path` assignments. A path naming a
//! directory stands for every regular file below it.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parse a `spec=path` assignment.
///
/// # Errors
///
/// Fails when there is no `=` or either side is empty.
pub fn parse_assignment(raw: &str) -> Result<(String, PathBuf)> {
    let Some((spec, path)) = raw.split_once('=') else {
        bail!("expected <spec>=<path>, got {raw:?}");
    };
    let (spec, path) = (spec.trim(), path.trim());
    if spec.is_empty() || path.is_empty() {
        bail!("expected <spec>=<path>, got {raw:?}");
    }
    Ok((spec.to_string(), PathBuf::from(path)))
}

/// Expand `path` into the files it stands for.
///
/// Directory contents are returned in file-name order; hidden entries are
/// skipped.
///
/// # Errors
///
/// Fails when the path does not exist, a directory cannot be walked, or a
/// directory holds no files.
pub fn expand_path(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("cannot read {}", path.display()))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
    for entry in walker {
        let entry = entry.with_context(|| format!("cannot walk {}", path.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        bail!("{} contains no files", path.display());
    }
    Ok(files)
}

/// Group assignments by spec id, expanding directories. Repeated specs
/// accumulate in the order given.
///
/// # Errors
///
/// Propagates the first malformed assignment or unreadable path.
pub fn collect_assignments<S: AsRef<str>>(raw: &[S]) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for assignment in raw {
        let (spec, path) = parse_assignment(assignment.as_ref())?;
        let files = expand_path(&path)?;
        grouped.entry(spec).or_default().extend(files);
    }
    Ok(grouped)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_assignment() {
        let (spec, path) = parse_assignment("notas = data/notas.xlsx").unwrap();
        assert_eq!(spec, "notas");
        assert_eq!(path, PathBuf::from("data/notas.xlsx"));

        assert!(parse_assignment("notas").is_err());
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("notas=").is_err());
    }

    #[test]
    fn test_directory_expands_to_sorted_visible_files() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("b.xlsx"), "b").unwrap();
        fs::write(dir.path().join("a.xlsx"), "a").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.xlsx"), "c").unwrap();

        let files = expand_path(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx", "c.xlsx"]);
    }

    #[test]
    fn test_missing_path_and_empty_directory_fail() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(expand_path(&dir.path().join("nope.xlsx")).is_err());
        assert!(expand_path(dir.path()).is_err());
    }

    #[test]
    fn test_collect_assignments_groups_by_spec() {
        let dir = tempdir().expect("Failed to create temp dir");
        let a = dir.path().join("a.xlsx");
        let b = dir.path().join("b.xlsx");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let raw = vec![
            format!("notas={}", a.display()),
            format!("contexto={}", b.display()),
            format!("notas={}", b.display()),
        ];
        let grouped = collect_assignments(&raw).unwrap();
        assert_eq!(grouped["notas"], vec![a, b.clone()]);
        assert_eq!(grouped["contexto"], vec![b]);
    }
}
