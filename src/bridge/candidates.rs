//! Ordered list of places to look for the native library.

use std::path::{Path, PathBuf};

use crate::config::{NativeConfig, native_library_file_name};

/// Candidate library paths, tried in order; the first that exists is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCandidates {
    paths: Vec<PathBuf>,
}

impl LibraryCandidates {
    /// Uses exactly the given paths.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Default search order for `file_name`:
    ///
    /// 1. next to the running executable
    /// 2. the executable's parent directory (test and bench binaries live in
    ///    `target/<profile>/deps`)
    /// 3. `./target/release`, `./target/debug`
    /// 4. `./lib`
    /// 5. `/usr/local/lib`, `/usr/lib` (Unix only)
    pub fn default_for(file_name: &str) -> Self {
        let mut dirs: Vec<PathBuf> = Vec::new();

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if let Some(parent) = exe_dir.parent() {
                let parent = parent.to_path_buf();
                dirs.push(exe_dir);
                dirs.push(parent);
            } else {
                dirs.push(exe_dir);
            }
        }

        dirs.push(PathBuf::from("target").join("release"));
        dirs.push(PathBuf::from("target").join("debug"));
        dirs.push(PathBuf::from("lib"));

        if cfg!(unix) {
            dirs.push(PathBuf::from("/usr/local/lib"));
            dirs.push(PathBuf::from("/usr/lib"));
        }

        Self::new(dirs.into_iter().map(|dir| dir.join(file_name)))
    }

    /// Explicit paths from settings when given, otherwise the default order
    /// for the configured file name.
    pub fn from_config(config: &NativeConfig) -> Self {
        if config.library_paths.is_empty() {
            Self::default_for(&config.library_name)
        } else {
            Self::new(config.library_paths.iter().cloned())
        }
    }

    /// First candidate that exists on disk.
    pub fn first_existing(&self) -> Option<&Path> {
        self.paths
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for LibraryCandidates {
    fn default() -> Self {
        Self::default_for(&native_library_file_name("tessera_vector_ops"))
    }
}
