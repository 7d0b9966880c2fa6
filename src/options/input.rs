//! `InputOptions`: immutable after normalization (§3).

use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Warning;
use crate::plugin::SharedPlugin;

/// Entry specifier(s): a single path, an ordered sequence of paths, or a
/// named mapping from alias to path.
#[derive(Debug, Clone)]
pub enum EntryPoints {
    Single(String),
    Multiple(Vec<String>),
    Named(FxHashMap<String, String>),
}

impl EntryPoints {
    pub fn len(&self) -> usize {
        match self {
            EntryPoints::Single(_) => 1,
            EntryPoints::Multiple(v) => v.len(),
            EntryPoints::Named(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_import_list(&self) -> Vec<String> {
        match self {
            EntryPoints::Single(p) => vec![p.clone()],
            EntryPoints::Multiple(v) => v.clone(),
            EntryPoints::Named(m) => {
                let mut entries: Vec<_> = m.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                entries.into_iter().map(|(_, v)| v.clone()).collect()
            }
        }
    }
}

/// External-module policy: either an explicit set of ids or a predicate.
#[derive(Clone)]
pub enum ExternalOption {
    Ids(Vec<String>),
    Predicate(Arc<dyn Fn(&str, Option<&str>, bool) -> bool + Send + Sync>),
    None,
}

impl std::fmt::Debug for ExternalOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalOption::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            ExternalOption::Predicate(_) => f.write_str("Predicate(..)"),
            ExternalOption::None => f.write_str("None"),
        }
    }
}

impl Default for ExternalOption {
    fn default() -> Self {
        ExternalOption::None
    }
}

impl ExternalOption {
    pub fn is_external(&self, id: &str, importer: Option<&str>, resolved: bool) -> bool {
        match self {
            ExternalOption::Ids(ids) => ids.iter().any(|e| e == id),
            ExternalOption::Predicate(f) => f(id, importer, resolved),
            ExternalOption::None => false,
        }
    }
}

/// Tree-shaking policy. `false` disables it entirely; `true` uses defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeshakeOption {
    Enabled,
    Disabled,
}

impl Default for TreeshakeOption {
    fn default() -> Self {
        TreeshakeOption::Enabled
    }
}

/// A shared, cloneable sink for warnings raised during build/generate.
pub type WarnSink = Arc<dyn Fn(Warning) + Send + Sync>;

#[derive(Clone)]
pub struct InputOptions {
    pub input: EntryPoints,
    pub plugins: Vec<SharedPlugin>,
    pub external: ExternalOption,
    pub treeshake: TreeshakeOption,
    pub cache: Option<crate::cache::CacheSnapshot>,

    pub preserve_modules: bool,
    pub inline_dynamic_imports: bool,
    pub optimize_chunks: bool,
    pub chunk_grouping_size: usize,
    pub prefer_const: bool,
    pub perf: bool,
    pub shim_missing_exports: bool,

    pub cwd: PathBuf,
    pub on_warn: WarnSink,
}

impl std::fmt::Debug for InputOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputOptions")
            .field("input", &self.input)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("external", &self.external)
            .field("treeshake", &self.treeshake)
            .field("preserve_modules", &self.preserve_modules)
            .field("inline_dynamic_imports", &self.inline_dynamic_imports)
            .field("optimize_chunks", &self.optimize_chunks)
            .field("chunk_grouping_size", &self.chunk_grouping_size)
            .field("prefer_const", &self.prefer_const)
            .field("perf", &self.perf)
            .field("shim_missing_exports", &self.shim_missing_exports)
            .field("cwd", &self.cwd)
            .finish()
    }
}

fn default_warn_sink() -> WarnSink {
    Arc::new(|w: Warning| {
        tracing::warn!(target: "bundle_core::warn", "{}", w.one_line());
    })
}

impl InputOptions {
    /// Start building `InputOptions` for a single entry point. Mirrors the
    /// typed builder convention used elsewhere alongside a loosely-typed
    /// configuration entry point (SPEC_FULL §4.10): `.build()` still runs
    /// through the same normalization contract as `rollup(RawConfig)`.
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            input: EntryPoints::Single(entry.into()),
            plugins: Vec::new(),
            external: ExternalOption::None,
            treeshake: TreeshakeOption::Enabled,
            cache: None,
            preserve_modules: false,
            inline_dynamic_imports: false,
            optimize_chunks: false,
            chunk_grouping_size: 1,
            prefer_const: false,
            perf: false,
            shim_missing_exports: false,
            cwd: std::env::current_dir().unwrap_or_default(),
            on_warn: default_warn_sink(),
        }
    }

    pub fn entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut opts = Self::new(String::new());
        opts.input = EntryPoints::Multiple(entries.into_iter().map(Into::into).collect());
        opts
    }

    pub fn plugin(mut self, plugin: SharedPlugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn external_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external = ExternalOption::Ids(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn preserve_modules(mut self, enabled: bool) -> Self {
        self.preserve_modules = enabled;
        self
    }

    pub fn inline_dynamic_imports(mut self, enabled: bool) -> Self {
        self.inline_dynamic_imports = enabled;
        self
    }

    pub fn optimize_chunks(mut self, enabled: bool) -> Self {
        self.optimize_chunks = enabled;
        self
    }

    pub fn perf(mut self, enabled: bool) -> Self {
        self.perf = enabled;
        self
    }

    pub fn on_warn(mut self, sink: impl Fn(Warning) + Send + Sync + 'static) -> Self {
        self.on_warn = Arc::new(sink);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }
}

impl Default for InputOptions {
    fn default() -> Self {
        Self::new(String::new())
    }
}
