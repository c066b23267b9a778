//! Guard against writing a snapshot over its own input.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that a snapshot output path is safe to overwrite.
///
/// Checks:
/// - Output must be a `.json` file
/// - Output cannot be the same as any of the provided source paths
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
        );
    }

    for source in source_paths {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/dashboard-vn.json");
        let source = PathBuf::from("/data/charts.sqlite3");
        assert!(validate_output_path(&output, &[&source]).is_ok());
    }

    #[test]
    fn test_database_output_blocked() {
        let output = PathBuf::from("/data/charts.sqlite3");
        let result = validate_output_path(&output, &[]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must have a .json extension"));
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/rankings.json");
        let result = validate_output_path(&path, &[&path]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }
}
