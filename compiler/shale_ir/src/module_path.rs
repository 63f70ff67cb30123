//! Module identities and declared dependencies.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::ids::ModuleId;

/// Canonical identity of a registered module.
///
/// File modules are keyed by their canonicalized filesystem path. Virtual
/// modules are keyed by a lexically normalized `/`-separated name.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModulePath {
    File(PathBuf),
    Virtual(String),
}

impl ModulePath {
    /// A virtual path, normalized.
    pub fn virtual_path(path: &str) -> Self {
        ModulePath::Virtual(normalize_virtual(path))
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        matches!(self, ModulePath::Virtual(_))
    }

    /// Directory that relative dependency specs are resolved against.
    pub fn parent(&self) -> ModulePath {
        match self {
            ModulePath::File(path) => {
                ModulePath::File(path.parent().map(Path::to_path_buf).unwrap_or_default())
            }
            ModulePath::Virtual(path) => match path.rfind('/') {
                Some(0) => ModulePath::Virtual("/".to_owned()),
                Some(slash) => ModulePath::Virtual(path[..slash].to_owned()),
                None => ModulePath::Virtual(String::new()),
            },
        }
    }

    /// Resolve a relative spec against this directory path.
    pub fn join(&self, spec: &str) -> ModulePath {
        match self {
            ModulePath::File(dir) => ModulePath::File(normalize_path(&dir.join(spec))),
            ModulePath::Virtual(dir) if dir.is_empty() => ModulePath::virtual_path(spec),
            ModulePath::Virtual(dir) => ModulePath::virtual_path(&format!("{dir}/{spec}")),
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModulePath::File(path) => write!(f, "{}", path.display()),
            ModulePath::Virtual(path) => write!(f, "virtual:{path}"),
        }
    }
}

/// Resolve `.` and `..` lexically without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other),
        }
    }
    result
}

fn normalize_virtual(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// A module's declared dependency.
///
/// The spec string is known as soon as the module is decoded; the target is
/// filled in by dependency resolution.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dependency {
    pub path: String,
    pub module: Option<ModuleId>,
}

impl Dependency {
    pub fn new(path: impl Into<String>) -> Self {
        Dependency {
            path: path.into(),
            module: None,
        }
    }

    /// Whether the spec is searched in library directories rather than
    /// relative to the requesting module.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with('/')
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.module.is_some()
    }
}
