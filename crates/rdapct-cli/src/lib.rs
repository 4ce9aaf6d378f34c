//! # rdapct-cli — RDAP Conformance Command-Line Interface
//!
//! Validates RDAP responses against the RDAP schemas and prints the coded
//! diagnostic records as a JSON array.
//!
//! ## Subcommands
//!
//! - `validate` — validate and classify one response file
//! - `audit` — list schema metadata gaps
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `rdapct-schema` and `rdapct-classify`; no
//!   classification logic here.
//! - Handlers return the process exit code: 0 clean, 1 findings, 2 on
//!   operational error.

use std::path::{Path, PathBuf};

pub mod audit;
pub mod config;
pub mod validate;

/// `path` unchanged when absolute, otherwise joined onto `base`.
pub fn anchor(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Locate a response file named on the command line: the path as given
/// when it exists from the working directory, else the same path under
/// `repo_root` when that exists, else the path as given so the read error
/// names what the user typed.
pub fn locate_response(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    let under_root = anchor(path, repo_root);
    if under_root.exists() {
        under_root
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_joins_relative_paths() {
        assert_eq!(anchor(Path::new("schemas"), Path::new("/repo")), PathBuf::from("/repo/schemas"));
        assert_eq!(anchor(Path::new("/etc/schemas"), Path::new("/repo")), PathBuf::from("/etc/schemas"));
    }

    #[test]
    fn locate_response_keeps_absolute_paths() {
        let path = PathBuf::from("/tmp/response.json");
        assert_eq!(locate_response(&path, Path::new("/repo")), path);
    }

    #[test]
    fn locate_response_falls_back_to_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rdapct-locate-fixture.json"), "{}").unwrap();
        let resolved = locate_response(Path::new("rdapct-locate-fixture.json"), dir.path());
        assert_eq!(resolved, dir.path().join("rdapct-locate-fixture.json"));
    }

    #[test]
    fn locate_response_keeps_missing_paths_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = locate_response(Path::new("missing.json"), dir.path());
        assert_eq!(resolved, PathBuf::from("missing.json"));
    }
}
