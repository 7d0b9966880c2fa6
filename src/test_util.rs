//! In-memory `Graph`/`Chunk`/`Plugin` fakes used by this crate's own test
//! suite (§8, "Test-tooling additions"). Not a reference implementation of
//! a real module graph — just enough behavior to exercise the coordinators.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::assets::AssetRegistry;
use crate::error::Result;
use crate::graph::{Chunk, Graph, RenderedChunk};
use crate::hooks::Addons;
use crate::options::{ExportMode, InputOptions, OutputFormat, OutputOptions};

/// A single in-memory module: an id and a body string standing in for
/// source code, with no real parsing behind it.
#[derive(Debug, Clone)]
pub struct FakeModule {
    pub id: String,
    pub is_entry: bool,
    pub export_names: Vec<String>,
}

/// A `Chunk` holding exactly one `FakeModule`; this fake never merges
/// modules into shared chunks, so `FakeGraph::build` returns one chunk per
/// entry point.
#[derive(Debug)]
pub struct FakeChunk {
    module: FakeModule,
    format: Option<OutputFormat>,
    export_mode: ExportMode,
}

impl FakeChunk {
    pub fn new(module: FakeModule) -> Self {
        Self {
            module,
            format: None,
            export_mode: ExportMode::Auto,
        }
    }
}

impl Chunk for FakeChunk {
    fn is_entry(&self) -> bool {
        self.module.is_entry
    }

    fn is_facade(&self) -> bool {
        self.module.is_entry
    }

    fn entry_module_id(&self) -> Option<&str> {
        self.module.is_entry.then_some(self.module.id.as_str())
    }

    fn export_names(&self) -> Vec<String> {
        self.module.export_names.clone()
    }

    fn has_only_default_export(&self) -> bool {
        self.module.export_names == ["default"]
    }

    fn import_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn pre_render(&mut self, _output: &OutputOptions, _input_base: &str) -> Result<()> {
        Ok(())
    }

    fn generate_internal_exports(&mut self, format: OutputFormat, mode: ExportMode) {
        self.format = Some(format);
        self.export_mode = mode;
    }

    fn generate_id_preserve_modules(&self, input_base: &str) -> String {
        self.module
            .id
            .strip_prefix(input_base)
            .unwrap_or(&self.module.id)
            .trim_start_matches('/')
            .to_string()
    }

    fn render(&self, output: &OutputOptions, addons: &Addons) -> Result<RenderedChunk> {
        let mut code = String::new();
        if !addons.banner.is_empty() {
            code.push_str(&addons.banner);
            code.push('\n');
        }
        if !addons.intro.is_empty() {
            code.push_str(&addons.intro);
            code.push('\n');
        }
        code.push_str(&format!(
            "// module: {} ({})\n",
            self.module.id,
            output.format.map(|f| f.as_str()).unwrap_or("?")
        ));
        if !addons.outro.is_empty() {
            code.push_str(&addons.outro);
            code.push('\n');
        }
        if !addons.footer.is_empty() {
            code.push_str(&addons.footer);
            code.push('\n');
        }
        Ok(RenderedChunk {
            code,
            map: None,
            imports: self.import_ids(),
            exports: self.export_names(),
        })
    }
}

/// A `Graph` whose module set is supplied up front; `build` simply wraps
/// each entry point in its own `FakeChunk`.
pub struct FakeGraph {
    modules: Vec<FakeModule>,
    assets: Arc<AssetRegistry>,
    optimize_calls: AtomicUsize,
}

impl FakeGraph {
    pub fn new(modules: Vec<FakeModule>) -> Self {
        Self {
            modules,
            assets: AssetRegistry::new(),
            optimize_calls: AtomicUsize::new(0),
        }
    }

    pub fn optimize_call_count(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }

    /// Wraps each configured module in its own chunk. Takes `&self` (rather
    /// than requiring the `&mut self` of the `Graph::build` signature) so
    /// wrapper `Graph`s sharing an `Arc<FakeGraph>` can call it too.
    pub fn build_chunks(&self) -> Vec<Box<dyn Chunk>> {
        self.modules
            .iter()
            .cloned()
            .map(|m| Box::new(FakeChunk::new(m)) as Box<dyn Chunk>)
            .collect()
    }
}

#[async_trait]
impl Graph for FakeGraph {
    async fn build(
        &mut self,
        _input: &InputOptions,
        _manual_chunks: bool,
        _inline_dynamic_imports: bool,
        _preserve_modules: bool,
    ) -> Result<Vec<Box<dyn Chunk>>> {
        Ok(self.build_chunks())
    }

    fn optimize_chunks(
        &self,
        _chunks: &mut [Box<dyn Chunk>],
        _output: &OutputOptions,
        _chunk_grouping_size: usize,
        _input_base: &str,
    ) -> Result<()> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn assets(&self) -> Arc<AssetRegistry> {
        self.assets.clone()
    }
}

/// A plugin that records every hook invocation it sees, for assertions
/// about fan-out order and call counts.
#[derive(Default)]
pub struct RecordingPlugin {
    pub name: String,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, hook: &str) {
        self.calls.lock().unwrap().push(hook.to_string());
    }
}

#[async_trait]
impl crate::plugin::Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn build_start(&self, _ctx: &crate::context::PluginContext, _options: &InputOptions) -> Result<()> {
        self.record("buildStart");
        Ok(())
    }

    async fn build_end(&self, _ctx: &crate::context::PluginContext, _error: Option<&crate::error::Error>) -> Result<()> {
        self.record("buildEnd");
        Ok(())
    }

    async fn generate_bundle(
        &self,
        _ctx: &crate::context::PluginContext,
        _output: &OutputOptions,
        _bundle: &crate::output::OutputBundle,
    ) -> Result<()> {
        self.record("generateBundle");
        Ok(())
    }
}
