//! Loader configuration.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable holding extra library directories, in the
/// platform's path-list syntax.
pub const LIBRARY_PATH_VAR: &str = "SHALE_LIBRARY_PATH";

/// Settings for a [`Loader`](crate::Loader).
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct LoaderConfig {
    /// Directories searched, in order, for `/`-prefixed dependency specs.
    pub library_dirs: Vec<PathBuf>,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library directories from `SHALE_LIBRARY_PATH`, if set.
    pub fn from_env() -> Self {
        Self::from_path_list(std::env::var_os(LIBRARY_PATH_VAR))
    }

    fn from_path_list(list: Option<OsString>) -> Self {
        let library_dirs = list
            .map(|list| {
                std::env::split_paths(&list)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        LoaderConfig { library_dirs }
    }

    #[must_use]
    pub fn library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dirs.push(dir.into());
        self
    }
}
