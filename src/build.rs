//! The Build Coordinator (§4.4): the BUILD phase of one `rollup()` call.

use std::sync::Arc;

use crate::assets::AssetRegistry;
use crate::context::PluginContext;
use crate::error::Result;
use crate::graph::{Chunk, Graph};
use crate::hooks;
use crate::options::InputOptions;
use crate::timing::{Timer, Timings};

/// A completed build, ready for one or more `generate`/`write` calls
/// (§3: "the result of BUILD may be used for multiple GENERATE calls").
pub struct Build {
    input: InputOptions,
    graph: Box<dyn Graph>,
    chunks: Vec<Box<dyn Chunk>>,
    assets: Arc<AssetRegistry>,
    build_ctx: PluginContext,
    manual_chunks: bool,
    timings: Timings,
    chunks_optimized: std::sync::atomic::AtomicBool,
}

impl Build {
    pub fn chunks(&self) -> &[Box<dyn Chunk>] {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut [Box<dyn Chunk>] {
        &mut self.chunks
    }

    pub fn input(&self) -> &InputOptions {
        &self.input
    }

    pub fn assets(&self) -> &Arc<AssetRegistry> {
        &self.assets
    }

    pub fn context(&self) -> &PluginContext {
        &self.build_ctx
    }

    pub fn manual_chunks(&self) -> bool {
        self.manual_chunks
    }

    pub fn cache(&self) -> crate::cache::CacheSnapshot {
        self.graph.get_cache()
    }

    pub fn get_timings(&self) -> Vec<(String, f64)> {
        self.timings.as_millis()
    }

    pub(crate) fn timings_mut(&mut self) -> &mut Timings {
        &mut self.timings
    }

    /// Runs the Graph's chunk-optimization pass exactly once per `Build`,
    /// no matter how many generate calls share this build (§4.5 step 10,
    /// "idempotence latch lives [in the Generate Coordinator]").
    pub(crate) fn optimize_chunks_once(
        &mut self,
        output: &crate::options::OutputOptions,
        chunk_grouping_size: usize,
        input_base: &str,
    ) -> Result<()> {
        use std::sync::atomic::Ordering;
        if self.chunks_optimized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.graph
            .optimize_chunks(&mut self.chunks, output, chunk_grouping_size, input_base)
    }
}

/// Runs the BUILD phase: `normalize` must already have produced `input`.
pub async fn build(input: InputOptions, manual_chunks: bool, mut graph: Box<dyn Graph>) -> Result<Build> {
    let mut timings = Timings::new();
    let build_timer = Timer::start("# BUILD");

    let assets = graph.assets();
    let build_ctx = PluginContext::for_build(&input, assets.clone());

    // A `buildStart` failure still routes through `buildEnd` before the
    // build is rejected (§4.4 step 8); it just means `graph.build` never runs.
    let phase_result = match hooks::fan_out_build_start(&input.plugins, &build_ctx, &input).await {
        Ok(()) => {
            graph
                .build(
                    &input,
                    manual_chunks,
                    input.inline_dynamic_imports,
                    input.preserve_modules,
                )
                .await
        }
        Err(e) => Err(e),
    };

    let build_err = phase_result.as_ref().err();
    let build_end_result = hooks::fan_out_build_end(&input.plugins, &build_ctx, build_err).await;

    // The original failure always wins; a `buildEnd` plugin error is only
    // surfaced when the build itself otherwise succeeded (§7).
    let chunks = phase_result?;
    build_end_result?;

    build_timer.finish(&mut timings);

    Ok(Build {
        input,
        graph,
        chunks,
        assets,
        build_ctx,
        manual_chunks,
        timings,
        chunks_optimized: std::sync::atomic::AtomicBool::new(false),
    })
}
