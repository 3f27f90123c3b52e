//! Reads a primary source file and every file it transitively imports.

use crate::ast::SourceUnit;
use crate::error::GraphError;
use crate::lowering::lower_source_unit;
use crate::parser::parse_solidity;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One parsed and lowered source file.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub unit: SourceUnit,
}

/// Loads `path` and follows its import directives breadth-first.
///
/// Relative imports (`./`, `../`) resolve against the importing file, all
/// other import paths against the primary file's directory. Imports that do
/// not exist on disk are skipped. Every file is visited at most once, keyed by
/// its canonical path, so import cycles terminate.
pub fn load_sources(path: &Path) -> Result<Vec<LoadedSource>> {
    if !path.is_file() {
        return Err(GraphError::SourceNotFound(path.to_path_buf()).into());
    }
    let primary = fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve path {}", path.display()))?;
    let root_dir = primary
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut to_parse = vec![primary.clone()];
    seen.insert(primary);
    let mut loaded = Vec::new();

    let mut index = 0;
    while index < to_parse.len() {
        let current = to_parse[index].clone();
        index += 1;

        let source = fs::read_to_string(&current)
            .with_context(|| format!("Failed to read file {}", current.display()))?;
        let ast = parse_solidity(&source)
            .with_context(|| format!("Failed to parse {}", current.display()))?;
        let unit = lower_source_unit(&ast);

        for import in &unit.imports {
            let candidate = resolve_import(&current, &root_dir, &import.path);
            if !candidate.is_file() {
                debug!(
                    "Skipping import '{}' from {}: not found",
                    import.path,
                    current.display()
                );
                continue;
            }
            let canonical = fs::canonicalize(&candidate)
                .with_context(|| format!("Failed to resolve import {}", candidate.display()))?;
            if seen.insert(canonical.clone()) {
                to_parse.push(canonical);
            }
        }

        debug!(
            "Loaded {} ({} contracts, {} imports)",
            current.display(),
            unit.contracts.len(),
            unit.imports.len()
        );
        loaded.push(LoadedSource {
            path: current,
            unit,
        });
    }

    Ok(loaded)
}

fn resolve_import(importing_file: &Path, root_dir: &Path, import_path: &str) -> PathBuf {
    if import_path.starts_with('.') {
        importing_file
            .parent()
            .unwrap_or(root_dir)
            .join(import_path)
    } else {
        root_dir.join(import_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_primary_file() {
        let dir = tempdir().unwrap();
        let err = load_sources(&dir.path().join("Nope.sol")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_follows_imports_once() {
        let dir = tempdir().unwrap();
        let main = write(
            dir.path(),
            "Main.sol",
            r#"import "./lib/A.sol"; import "B.sol"; import "./Missing.sol"; contract Main {}"#,
        );
        write(
            dir.path(),
            "lib/A.sol",
            r#"import "../B.sol"; import "../Main.sol"; contract A {}"#,
        );
        write(dir.path(), "B.sol", r#"import "./lib/A.sol"; contract B {}"#);

        let sources = load_sources(&main).unwrap();
        let names: Vec<_> = sources
            .iter()
            .flat_map(|s| s.unit.contracts.iter().map(|c| c.name.clone()))
            .collect();
        assert_eq!(names, vec!["Main", "A", "B"]);
    }
}
