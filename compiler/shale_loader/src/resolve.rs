//! Dependency spec resolution.
//!
//! - `/name` specs are searched in the library directories, in order; if no
//!   file matches, the spec names a virtual module.
//! - Other specs are relative to the requesting module's directory, on disk
//!   for file modules and lexically for virtual modules.

use shale_ir::{normalize_path, ModulePath};

use crate::config::LoaderConfig;
use crate::error::LoadError;

pub(crate) fn resolve_dependency(
    spec: &str,
    requester: &ModulePath,
    config: &LoaderConfig,
) -> Result<ModulePath, LoadError> {
    let unresolved = |reason| LoadError::Dependency {
        spec: spec.to_owned(),
        requester: requester.clone(),
        reason,
    };

    if spec.is_empty() {
        return Err(unresolved("empty dependency path"));
    }

    if let Some(relative) = spec.strip_prefix('/') {
        for dir in &config.library_dirs {
            let candidate = dir.join(relative);
            if candidate.is_file() {
                let canonical = std::fs::canonicalize(&candidate)
                    .unwrap_or_else(|_| normalize_path(&candidate));
                tracing::trace!(spec, path = %canonical.display(), "found in library directory");
                return Ok(ModulePath::File(canonical));
            }
        }
        return Ok(ModulePath::virtual_path(spec));
    }

    match requester.parent().join(spec) {
        ModulePath::File(candidate) => std::fs::canonicalize(&candidate)
            .map(ModulePath::File)
            .map_err(|_| unresolved("no such module file")),
        path @ ModulePath::Virtual(_) => Ok(path),
    }
}
