//! The module dependency graph, parser, tree-shaker, chunk-assignment
//! algorithm, and per-format finalizer are external collaborators (§1):
//! this crate drives them through the traits below but does not implement
//! their internals.
//!
//! A production embedder supplies a real `Graph`; this crate's own test
//! suite supplies [`crate::test_util::FakeGraph`] instead.

use async_trait::async_trait;
use std::sync::Arc;

use crate::assets::AssetRegistry;
use crate::error::Result;
use crate::options::{ExportMode, InputOptions, OutputOptions};

/// A resolved, loaded, transformed module as it is known to the Graph.
/// Opaque beyond the identity the core needs for naming and addon composition.
pub trait Chunk: Send + Sync + std::fmt::Debug {
    /// Whether this chunk contains (one of) the build's entry modules.
    fn is_entry(&self) -> bool;

    /// Whether this chunk exists solely to re-export an entry module's
    /// interface (a facade chunk, per the glossary).
    fn is_facade(&self) -> bool;

    /// Absolute id of this chunk's entry module, if it has exactly one.
    fn entry_module_id(&self) -> Option<&str>;

    /// Named exports the facade makes available, used to derive `auto`
    /// export mode (§4.5 step 8).
    fn export_names(&self) -> Vec<String>;

    /// Whether the facade has exactly one default export and no named ones.
    fn has_only_default_export(&self) -> bool;

    /// Module ids this chunk imports from other chunks.
    fn import_ids(&self) -> Vec<String>;

    /// Prepare the chunk for a specific output configuration; called once
    /// per generate call before naming (§4.5 step 9).
    fn pre_render(&mut self, output: &OutputOptions, input_base: &str) -> Result<()>;

    /// Assign internal export bindings for the target format; called
    /// before pre-render unless `preserveModules` is set (§4.5 step 8).
    fn generate_internal_exports(&mut self, format: crate::options::OutputFormat, mode: ExportMode);

    /// Produce a chunk id relative to `input_base` under preserve-modules mode.
    fn generate_id_preserve_modules(&self, input_base: &str) -> String;

    /// Render the chunk to final code + optional source map. This is the
    /// seam to the out-of-scope finalizer: the Graph/Chunk owns the
    /// per-format text emission, this core only orchestrates when it runs.
    fn render(&self, output: &OutputOptions, addons: &crate::hooks::Addons) -> Result<RenderedChunk>;
}

/// The textual result of rendering a chunk, owned by the core once produced.
#[derive(Debug, Clone)]
pub struct RenderedChunk {
    pub code: String,
    pub map: Option<crate::output::SourceMap>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

/// The module graph collaborator: builds the chunk sequence from entry
/// points and owns tree-shaking, resolution, and chunk assignment.
#[async_trait]
pub trait Graph: Send + Sync {
    /// Run the BUILD-phase graph construction (§4.4 step 6).
    async fn build(
        &mut self,
        input: &InputOptions,
        manual_chunks: bool,
        inline_dynamic_imports: bool,
        preserve_modules: bool,
    ) -> Result<Vec<Box<dyn Chunk>>>;

    /// Run the chunk-optimization pass (§4.5 step 10). Must be idempotent
    /// at the call-site level; the Generate Coordinator is responsible for
    /// only calling this once per Build (the idempotence latch lives there,
    /// not here, since the Graph has no notion of "per Build").
    fn optimize_chunks(
        &self,
        chunks: &mut [Box<dyn Chunk>],
        output: &OutputOptions,
        chunk_grouping_size: usize,
        input_base: &str,
    ) -> Result<()>;

    /// A handle to the asset registry this Graph shares with plugin
    /// contexts created over its lifetime.
    fn assets(&self) -> Arc<AssetRegistry>;

    /// A serializable snapshot of per-module transform state, returned via
    /// `Build::cache()`.
    fn get_cache(&self) -> crate::cache::CacheSnapshot {
        crate::cache::CacheSnapshot::default()
    }
}
