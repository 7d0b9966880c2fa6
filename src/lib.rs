//! A host-agnostic JavaScript bundler core: Option Normalizer, Plugin
//! Context, Hook Driver, Build Coordinator, Generate Coordinator, Asset
//! Registry, and Output Writer.
//!
//! The module dependency graph, parser, and per-format code generator are
//! external collaborators reached through the [`graph::Graph`]/[`graph::Chunk`]
//! traits; this crate does not parse or emit JavaScript itself.
//!
//! ```no_run
//! # async fn run() -> bundle_core::error::Result<()> {
//! use bundle_core::options::{InputOptions, OutputOptions, OutputFormat};
//!
//! let input = InputOptions::new("src/main.js");
//! # let graph: Box<dyn bundle_core::graph::Graph> = unimplemented!();
//! let mut build = bundle_core::build(input, false, graph).await?;
//! let output = OutputOptions::new(OutputFormat::Es).dir("dist");
//! bundle_core::write(&mut build, output).await?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod build;
pub mod cache;
pub mod context;
pub mod error;
pub mod generate;
pub mod graph;
pub mod hooks;
#[cfg(feature = "logging")]
pub mod logging;
pub mod options;
pub mod output;
pub mod plugin;
pub mod timing;

/// In-memory `Graph`/`Chunk`/`Plugin` fakes, public so embedders can exercise
/// their own plugins against this crate's coordinators without a real
/// module graph.
pub mod test_util;

pub use build::{build, Build};
pub use generate::{generate, write};
pub use options::{normalize, InputOptions, Normalized, OutputOptions, RawConfig};
pub use plugin::Plugin;
