//! The module registry.
//!
//! # Pipeline
//!
//! `load` and `build` register their root module, then run one completion
//! pass over every module the call registers:
//!
//! 1. **Resolve**: a worklist walks declared dependencies. Unknown file
//!    paths are decoded and registered on the spot and queued in turn, so
//!    the registry grows transitively without recursive calls.
//! 2. **Link**: mapped structure fields and function mappings are rewritten
//!    to concrete ids in their dependencies.
//! 3. **Cycle check** over the connected structure graph.
//! 4. **Layout** of every structure.
//!
//! # Atomicity
//!
//! A top-level call either completes or leaves no trace: every slot it
//! registered is replaced by [`ModuleInfo::Empty`] and dropped from the path
//! index. Ids are never reused. Modules completed by earlier calls are never
//! mutated, which is why a dependency on a virtual module that has not been
//! built is rejected.
//!
//! A failed `build` of a virtual module that has been built before keeps the
//! module live and drops whatever was added to it since that build, so
//! modules already linked against it stay valid. A module that never built
//! is discarded.

use std::collections::VecDeque;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use shale_bytecode::{DecodeError, Parser};
use shale_ir::{
    normalize_path, FunctionId, FunctionInfo, Layout, ModuleId, ModulePath, StructureId,
    StructureInfo, Type, TypeInfo,
};

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::layout::{check_cycles, compute_layouts, structure_at};
use crate::link::link_module;
use crate::module::{ByteModule, Module, ModuleInfo, VirtualModule};
use crate::resolve::resolve_dependency;

/// Append-only arena of modules, keyed by id and by canonical path.
#[derive(Debug, Default)]
pub struct Loader {
    config: LoaderConfig,
    modules: Vec<ModuleInfo>,
    paths: FxHashMap<ModulePath, ModuleId>,
}

impl Loader {
    /// A loader with no library directories.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Loader {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Append a library directory to the search list. The path is
    /// canonicalized when it exists.
    pub fn add_library_directory(&mut self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| normalize_path(dir));
        self.config.library_dirs.push(dir);
    }

    /// Forget every module. Ids start again from zero.
    pub fn clear(&mut self) {
        self.modules.clear();
        self.paths.clear();
    }

    /// Load a module file and everything it depends on.
    ///
    /// Loading a path that is already registered returns the existing id
    /// without reading the file again.
    ///
    /// # Errors
    ///
    /// Fails if the file or any dependency cannot be decoded or resolved, if
    /// a mapped symbol is missing, or if the structures cannot be laid out.
    /// Nothing registered by this call survives a failure.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<ModuleId, LoadError> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(&id) = self.paths.get(&ModulePath::File(canonical.clone())) {
            tracing::debug!(module = %id, "already loaded");
            return Ok(id);
        }

        let mark = self.modules.len();
        let result = self
            .register_file(canonical)
            .and_then(|id| self.complete(&[id]).map(|()| id));
        if result.is_err() {
            self.rollback(mark, None);
        }
        result
    }

    /// Register an empty virtual module at `path`, which must start with
    /// `/`. Populate it, then call [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// `InvalidVirtualPath` for a relative path, `DuplicateModule` if the
    /// normalized path is taken.
    pub fn create(&mut self, path: &str) -> Result<&mut VirtualModule, LoadError> {
        if !path.starts_with('/') {
            return Err(LoadError::InvalidVirtualPath(path.to_owned()));
        }
        let path = ModulePath::virtual_path(path);
        if self.paths.contains_key(&path) {
            return Err(LoadError::DuplicateModule(path));
        }

        let id = self.next_id();
        tracing::debug!(module = %id, %path, "virtual module registered");
        self.paths.insert(path.clone(), id);
        self.modules
            .push(ModuleInfo::Virtual(VirtualModule::new(id, path)));
        match self.modules.last_mut() {
            Some(ModuleInfo::Virtual(module)) => Ok(module),
            _ => Err(LoadError::UnknownModule(id)),
        }
    }

    /// Resolve, link and lay out a virtual module.
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load). On failure anything loaded on the
    /// module's behalf is discarded. A module that was built before returns
    /// to its state after that build; one that never built is discarded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn build(&mut self, id: ModuleId) -> Result<(), LoadError> {
        match self.modules.get(id.index()) {
            None | Some(ModuleInfo::Empty) => return Err(LoadError::UnknownModule(id)),
            Some(ModuleInfo::File(_)) => return Err(LoadError::NotVirtual(id)),
            Some(ModuleInfo::Virtual(_)) => {}
        }

        let mark = self.modules.len();
        let result = self.complete(&[id]);
        if result.is_err() {
            let restored = match self.modules.get_mut(id.index()) {
                Some(ModuleInfo::Virtual(module)) => module.restore_checkpoint(),
                _ => false,
            };
            if restored {
                tracing::debug!(module = %id, "rebuild reverted");
            }
            self.rollback(mark, (!restored).then_some(id));
        }
        result
    }

    /// Mutable access for populating a virtual module before `build`.
    pub fn virtual_module_mut(&mut self, id: ModuleId) -> Option<&mut VirtualModule> {
        match self.modules.get_mut(id.index()) {
            Some(ModuleInfo::Virtual(module)) => Some(module),
            _ => None,
        }
    }

    pub fn module(&self, id: ModuleId) -> Option<&dyn Module> {
        self.modules.get(id.index()).and_then(ModuleInfo::view)
    }

    pub fn module_info(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get(id.index())
    }

    /// Id of the module registered under `path`.
    ///
    /// File paths that are not found verbatim are canonicalized first.
    pub fn find(&self, path: &ModulePath) -> Option<ModuleId> {
        if let Some(&id) = self.paths.get(path) {
            return Some(id);
        }
        match path {
            ModulePath::File(file) => {
                let canonical = std::fs::canonicalize(file).ok()?;
                self.paths.get(&ModulePath::File(canonical)).copied()
            }
            ModulePath::Virtual(name) => self.paths.get(&ModulePath::virtual_path(name)).copied(),
        }
    }

    pub fn module_by_path(&self, path: &ModulePath) -> Option<&dyn Module> {
        self.find(path).and_then(|id| self.module(id))
    }

    /// Number of live modules.
    pub fn module_count(&self) -> usize {
        self.paths.len()
    }

    /// Live modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &dyn Module> {
        self.modules.iter().filter_map(ModuleInfo::view)
    }

    pub fn structure(&self, id: StructureId) -> Option<&StructureInfo> {
        structure_at(&self.modules, id)
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionInfo> {
        self.module(id.module)
            .and_then(|module| module.function(id.index))
    }

    /// Descriptor behind a type handle. `None` for unresolved mappings and
    /// dangling structure ids.
    pub fn type_info(&self, ty: Type) -> Option<&TypeInfo> {
        match ty {
            Type::Fundamental(fundamental) => Some(fundamental.info()),
            Type::Structure(id) => self.structure(id).map(|s| &s.type_info),
            Type::Mapped(_) => None,
        }
    }

    /// Computed layout of a type, once available.
    pub fn layout(&self, ty: Type) -> Option<Layout> {
        self.type_info(ty).and_then(|info| info.layout.layout())
    }

    fn next_id(&self) -> ModuleId {
        ModuleId::new(u32::try_from(self.modules.len()).unwrap_or(u32::MAX))
    }

    /// Decode the file at canonical `path` and register it.
    fn register_file(&mut self, path: std::path::PathBuf) -> Result<ModuleId, LoadError> {
        let mut parser = Parser::open(&path)?;
        parser.parse()?;
        let descriptor = parser.into_result()?;

        let id = self.next_id();
        let path = ModulePath::File(path);
        tracing::debug!(module = %id, %path, "module registered");
        self.paths.insert(path.clone(), id);
        self.modules
            .push(ModuleInfo::File(ByteModule::from_descriptor(id, path, descriptor)));
        Ok(id)
    }

    fn complete(&mut self, roots: &[ModuleId]) -> Result<(), LoadError> {
        let targets = self.resolve_dependencies(roots)?;
        for &id in &targets {
            link_module(&mut self.modules, id)?;
        }
        check_cycles(&self.modules, &targets)?;
        compute_layouts(&mut self.modules, &targets)?;

        for &id in &targets {
            if let Some(ModuleInfo::Virtual(module)) = self.modules.get_mut(id.index()) {
                module.mark_built();
            }
        }
        tracing::debug!(modules = targets.len(), "modules completed");
        Ok(())
    }

    /// Resolve the dependencies of `roots` and of every module registered
    /// along the way. Returns all of them, roots first.
    fn resolve_dependencies(&mut self, roots: &[ModuleId]) -> Result<Vec<ModuleId>, LoadError> {
        let mut queue: VecDeque<ModuleId> = roots.iter().copied().collect();
        let mut queued: FxHashSet<ModuleId> = roots.iter().copied().collect();
        let mut targets = Vec::with_capacity(roots.len());

        while let Some(id) = queue.pop_front() {
            targets.push(id);
            let common = self
                .modules
                .get(id.index())
                .and_then(ModuleInfo::common)
                .ok_or(LoadError::UnknownModule(id))?;
            let requester = common.path.clone();
            let specs: Vec<String> = common.dependencies.iter().map(|d| d.path.clone()).collect();

            for (index, spec) in specs.into_iter().enumerate() {
                let path = resolve_dependency(&spec, &requester, &self.config)?;
                let existing = self.paths.get(&path).copied();
                let target = match (existing, &path) {
                    (Some(target), _) => target,
                    (None, ModulePath::File(file)) => {
                        let target = self.register_file(file.clone())?;
                        queued.insert(target);
                        queue.push_back(target);
                        target
                    }
                    (None, ModulePath::Virtual(_)) => {
                        return Err(LoadError::Dependency {
                            spec,
                            requester,
                            reason: "no module file or virtual module with this path",
                        });
                    }
                };

                let unbuilt = self
                    .modules
                    .get(target.index())
                    .is_some_and(ModuleInfo::needs_build);
                if unbuilt && !queued.contains(&target) {
                    return Err(LoadError::Dependency {
                        spec,
                        requester,
                        reason: "virtual module has not been built",
                    });
                }

                tracing::debug!(%spec, module = %id, target = %target, "dependency resolved");
                if let Some(dependency) = self
                    .modules
                    .get_mut(id.index())
                    .and_then(ModuleInfo::common_mut)
                    .and_then(|common| common.dependencies.get_mut(index))
                {
                    dependency.module = Some(target);
                }
            }
        }
        Ok(targets)
    }

    /// Tombstone every slot from `mark` on, and `root` if given.
    fn rollback(&mut self, mark: usize, root: Option<ModuleId>) {
        let mut discarded = 0usize;
        let slots = (mark..self.modules.len()).chain(root.map(ModuleId::index));
        for index in slots {
            let Some(slot) = self.modules.get_mut(index) else {
                continue;
            };
            if let Some(path) = std::mem::take(slot).view().map(|m| m.path().clone()) {
                self.paths.remove(&path);
                discarded += 1;
            }
        }
        tracing::debug!(discarded, "load rolled back");
    }
}
