//! Shale Loader - Module Registry and Linker
//!
//! Turns module files and host-authored virtual modules into a fully linked,
//! laid-out module table for the execution engine:
//!
//! - [`Loader`]: the append-only module arena, lookup by id or path
//! - [`Module`] / [`ModuleInfo`]: the shared accessor surface and the closed
//!   set of module kinds
//! - Dependency resolution against library directories ([`LoaderConfig`])
//! - Cross-module linking of structure and function mappings
//! - Structure cycle detection and layout
//!
//! # Usage
//!
//! ```text
//! let mut loader = Loader::with_config(LoaderConfig::from_env());
//! let app = loader.load("app.shb")?;
//! let main = loader.module(app).and_then(|m| m.function_by_name("main"));
//! ```
//!
//! # Tracing
//!
//! Set `RUST_LOG=shale_loader=debug` (or `trace` for per-structure layout)
//! and call [`init_tracing`].

mod config;
mod error;
mod layout;
mod link;
mod loader;
mod module;
mod resolve;
mod stack;

pub use config::{LoaderConfig, LIBRARY_PATH_VAR};
pub use error::{CycleEntry, LoadError, LoadErrorKind, SymbolKind};
pub use loader::Loader;
pub use module::{ByteModule, Module, ModuleCommon, ModuleInfo, VirtualModule};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber for debug output.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        }
    });
}
