//! Utility functions for cross-platform path handling

use std::path::Path;

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Display `path` relative to `root` in Git format
///
/// Returns `.` for the root itself; paths outside `root` are shown as-is.
pub fn relative_display(path: &Path, root: &Path) -> String {
  match path.strip_prefix(root) {
    Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
    Ok(relative) => path_to_git_format(relative),
    Err(_) => path_to_git_format(path),
  }
}
