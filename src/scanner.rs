use crate::error::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for directories of endpoint definitions.
///
/// The `EndpointFileScanner` recursively walks a directory to find every `.json` file.
/// It skips the `target` directory and hidden directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use api_schema_docs::scanner::EndpointFileScanner;
/// use std::path::PathBuf;
///
/// let scanner = EndpointFileScanner::new(PathBuf::from("./endpoints"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} endpoint files", result.files.len());
/// ```
pub struct EndpointFileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
///
/// Contains the discovered files, sorted by path, and any warnings encountered.
pub struct ScanResult {
    /// Paths of all discovered `.json` files
    pub files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl EndpointFileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Scans the directory tree and collects all `.json` files.
    ///
    /// Entries that cannot be accessed are logged and reported as warnings, but
    /// scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        std::fs::metadata(&self.root_path)?;

        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        files.sort();
        Ok(ScanResult { files, warnings })
    }
}
