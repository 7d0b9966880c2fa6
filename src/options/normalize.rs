//! The Option Normalizer (§4.1): merges a loosely-typed configuration
//! surface with defaults, applies deprecation rewrites, validates
//! mutually exclusive combinations, and materializes a typed
//! `InputOptions` plus a sequence of typed `OutputOptions`.

use rustc_hash::FxHashMap;
use std::path::PathBuf;

use crate::error::{Error, Result, Warning};
use crate::hooks::fold_options;
use crate::options::input::{EntryPoints, ExternalOption, InputOptions, TreeshakeOption, WarnSink};
use crate::options::output::{Destination, ExportMode, OutputFormat, OutputOptions, SourceMapMode};
use crate::plugin::SharedPlugin;

/// Markers for the four hooks that used to live at the top level of the
/// configuration object before being moved into plugins. Their mere
/// presence is an error (§4.1) — the core does not attempt to run them.
#[derive(Debug, Clone, Default)]
pub struct LegacyTopLevelHooks {
    pub transform: bool,
    pub load: bool,
    pub resolve_id: bool,
    pub resolve_external: bool,
}

impl LegacyTopLevelHooks {
    fn first_present(&self) -> Option<&'static str> {
        if self.transform {
            Some("transform")
        } else if self.load {
            Some("load")
        } else if self.resolve_id {
            Some("resolveId")
        } else if self.resolve_external {
            Some("resolveExternal")
        } else {
            None
        }
    }
}

/// One raw output configuration: every field optional so later merge
/// stages can cascade `Some` values from higher-precedence sources.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub format: Option<String>,
    pub file: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub entry_file_names: Option<String>,
    pub chunk_file_names: Option<String>,
    pub asset_file_names: Option<String>,
    pub sourcemap: Option<SourceMapMode>,
    pub sourcemap_file: Option<String>,
    pub globals: FxHashMap<String, String>,
    pub export_mode: Option<ExportMode>,
    pub compact: Option<bool>,
    pub amd_id: Option<String>,
    pub module_id: Option<String>,
}

impl RawOutput {
    /// Cascade: fields set on `self` win, falling back to `lower` otherwise.
    /// Used to apply the §4.1 precedence: nested `.output` > top-level
    /// output fields > input-level fallback.
    fn cascade(self, lower: &RawOutput) -> RawOutput {
        RawOutput {
            format: self.format.or_else(|| lower.format.clone()),
            file: self.file.or_else(|| lower.file.clone()),
            dir: self.dir.or_else(|| lower.dir.clone()),
            entry_file_names: self.entry_file_names.or_else(|| lower.entry_file_names.clone()),
            chunk_file_names: self.chunk_file_names.or_else(|| lower.chunk_file_names.clone()),
            asset_file_names: self.asset_file_names.or_else(|| lower.asset_file_names.clone()),
            sourcemap: self.sourcemap.or(lower.sourcemap),
            sourcemap_file: self.sourcemap_file.or_else(|| lower.sourcemap_file.clone()),
            globals: if self.globals.is_empty() {
                lower.globals.clone()
            } else {
                self.globals
            },
            export_mode: self.export_mode.or(lower.export_mode),
            compact: self.compact.or(lower.compact),
            amd_id: self.amd_id.or_else(|| lower.amd_id.clone()),
            module_id: self.module_id.or_else(|| lower.module_id.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OutputSpec {
    None,
    Single(RawOutput),
    Multiple(Vec<RawOutput>),
}

impl Default for OutputSpec {
    fn default() -> Self {
        OutputSpec::None
    }
}

/// The loosely-typed configuration object consumed by the normalizer.
#[derive(Clone, Default)]
pub struct RawConfig {
    pub legacy: LegacyTopLevelHooks,
    pub input: Option<EntryPoints>,
    pub plugins: Vec<SharedPlugin>,
    pub external: Option<ExternalOption>,
    pub treeshake: Option<TreeshakeOption>,
    pub cache: Option<crate::cache::CacheSnapshot>,
    pub preserve_modules: Option<bool>,
    pub inline_dynamic_imports: Option<bool>,
    pub optimize_chunks: Option<bool>,
    pub manual_chunks: Option<bool>,
    pub chunk_grouping_size: Option<usize>,
    pub prefer_const: Option<bool>,
    pub perf: Option<bool>,
    pub shim_missing_exports: Option<bool>,
    pub cwd: Option<PathBuf>,
    pub on_warn: Option<WarnSink>,

    /// Top-level output fields, used as a fallback source during output
    /// merge (the "input-level fallback" / "top-level output fields"
    /// sources of §4.1's precedence list collapse into this one bag since
    /// this core has no distinct "legacy flat config" shape to preserve).
    pub output_fallback: RawOutput,
    pub output: OutputSpec,
}

/// Everything the normalizer produced for a single `rollup()` call, before
/// any `generate`/`write`-time re-normalization of a caller-supplied
/// `OutputOptions` (§4.5 step 1 reapplies these same rules).
pub struct Normalized {
    pub input: InputOptions,
    pub manual_chunks: bool,
    pub outputs: Vec<OutputOptions>,
}

/// Run the full Option Normalizer contract (§4.1) over a raw configuration.
pub async fn normalize(raw: RawConfig) -> Result<Normalized> {
    if let Some(name) = raw.legacy.first_present() {
        return Err(Error::UnsupportedLegacyOption { name: name.into() });
    }

    let entry = raw
        .input
        .clone()
        .ok_or_else(|| Error::MissingOption { name: "input".into() })?;

    let preserve_modules = raw.preserve_modules.unwrap_or(false);
    let inline_dynamic_imports = raw.inline_dynamic_imports.unwrap_or(false);
    let optimize_chunks = raw.optimize_chunks.unwrap_or(false);
    let manual_chunks = raw.manual_chunks.unwrap_or(false);

    validate_toggle_combinations(
        preserve_modules,
        inline_dynamic_imports,
        optimize_chunks,
        manual_chunks,
        entry.len(),
    )?;

    let on_warn = raw.on_warn.unwrap_or_else(|| {
        std::sync::Arc::new(|w: Warning| tracing::warn!(target: "bundle_core::warn", "{}", w.one_line()))
    });

    let mut input_options = InputOptions {
        input: entry,
        plugins: raw.plugins,
        external: raw.external.unwrap_or_default(),
        treeshake: raw.treeshake.unwrap_or_default(),
        cache: raw.cache,
        preserve_modules,
        inline_dynamic_imports,
        optimize_chunks,
        chunk_grouping_size: raw.chunk_grouping_size.unwrap_or(1),
        prefer_const: raw.prefer_const.unwrap_or(false),
        perf: raw.perf.unwrap_or(false),
        shim_missing_exports: raw.shim_missing_exports.unwrap_or(false),
        cwd: raw.cwd.unwrap_or_else(|| std::env::current_dir().unwrap_or_default()),
        on_warn,
    };

    // Fold each plugin's `options` hook left-to-right (§4.1, "Applies each
    // plugin's options hook in declared order"). Re-validate afterward
    // since a plugin may have changed entry count or the toggle flags.
    input_options = fold_options(&input_options.plugins.clone(), input_options).await?;
    validate_toggle_combinations(
        input_options.preserve_modules,
        input_options.inline_dynamic_imports,
        input_options.optimize_chunks,
        manual_chunks,
        input_options.input.len(),
    )?;

    let raw_outputs = match raw.output {
        OutputSpec::None => vec![raw.output_fallback.clone()],
        OutputSpec::Single(o) => vec![o.cascade(&raw.output_fallback)],
        OutputSpec::Multiple(outs) => outs
            .into_iter()
            .map(|o| o.cascade(&raw.output_fallback))
            .collect(),
    };

    let mut outputs = Vec::with_capacity(raw_outputs.len());
    for raw_out in raw_outputs {
        outputs.push(normalize_output(raw_out)?);
    }

    Ok(Normalized {
        input: input_options,
        manual_chunks,
        outputs,
    })
}

/// Re-apply §4.1's rules to a single caller-supplied output configuration
/// at generate time (§4.5 step 1). `already_normalized` lets us skip
/// re-running the legacy-hook and toggle checks, which are input-level.
pub fn normalize_output(raw: RawOutput) -> Result<OutputOptions> {
    if raw.amd_id.is_some() && raw.module_id.is_some() {
        return Err(Error::ConflictingOption {
            message: "output.amd and the legacy output.moduleId cannot both be set".into(),
        });
    }

    if raw.file.is_some() && raw.dir.is_some() {
        return Err(Error::ConflictingOption {
            message: "output.file and output.dir are mutually exclusive".into(),
        });
    }

    let format_str = raw.format.ok_or(Error::FormatRequired)?;
    let format = OutputFormat::parse(&format_str)?;

    let mut out = OutputOptions::new(format);
    if let Some(file) = raw.file {
        out.destination = Destination::File(file);
    }
    if let Some(dir) = raw.dir {
        out.destination = Destination::Dir(dir);
    }
    if let Some(v) = raw.entry_file_names {
        out.entry_file_names = v;
    }
    if let Some(v) = raw.chunk_file_names {
        out.chunk_file_names = v;
    }
    if let Some(v) = raw.asset_file_names {
        out.asset_file_names = v;
    }
    if let Some(v) = raw.sourcemap {
        out.sourcemap = v;
    }
    out.sourcemap_file = raw.sourcemap_file;
    out.globals = raw.globals;
    if let Some(v) = raw.export_mode {
        out.export_mode = v;
    }
    if let Some(v) = raw.compact {
        out.compact = v;
    }
    out.amd_id = raw.amd_id;
    out.module_id = raw.module_id;

    Ok(out)
}

fn validate_toggle_combinations(
    preserve_modules: bool,
    inline_dynamic_imports: bool,
    optimize_chunks: bool,
    manual_chunks: bool,
    entry_count: usize,
) -> Result<()> {
    if inline_dynamic_imports {
        if manual_chunks {
            return Err(Error::invalid_option(
                "inlineDynamicImports cannot be combined with manualChunks",
            ));
        }
        if optimize_chunks {
            return Err(Error::invalid_option(
                "inlineDynamicImports cannot be combined with optimizeChunks",
            ));
        }
        if entry_count > 1 {
            return Err(Error::invalid_option(
                "inlineDynamicImports cannot be used with more than one entry point",
            ));
        }
    }

    if preserve_modules {
        if inline_dynamic_imports {
            return Err(Error::invalid_option(
                "preserveModules cannot be combined with inlineDynamicImports",
            ));
        }
        if manual_chunks {
            return Err(Error::invalid_option(
                "preserveModules cannot be combined with manualChunks",
            ));
        }
        if optimize_chunks {
            return Err(Error::invalid_option(
                "preserveModules cannot be combined with optimizeChunks",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_entry(entry: &str) -> RawConfig {
        RawConfig {
            input: Some(EntryPoints::Single(entry.into())),
            output: OutputSpec::Single(RawOutput {
                format: Some("es".into()),
                dir: Some(PathBuf::from("dist")),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn rejects_legacy_top_level_transform() {
        let mut raw = raw_with_entry("a.js");
        raw.legacy.transform = true;
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "UNSUPPORTED_LEGACY_OPTION");
    }

    #[tokio::test]
    async fn rejects_es6_format() {
        let raw = RawConfig {
            input: Some(EntryPoints::Single("a.js".into())),
            output: OutputSpec::Single(RawOutput {
                format: Some("es6".into()),
                dir: Some(PathBuf::from("dist")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "FORMAT_DEPRECATED");
    }

    #[tokio::test]
    async fn rejects_missing_format() {
        let raw = RawConfig {
            input: Some(EntryPoints::Single("a.js".into())),
            output: OutputSpec::Single(RawOutput {
                dir: Some(PathBuf::from("dist")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "FORMAT_REQUIRED");
    }

    #[tokio::test]
    async fn rejects_inline_dynamic_imports_with_two_entries() {
        let mut raw = raw_with_entry("a.js");
        raw.input = Some(EntryPoints::Multiple(vec!["a.js".into(), "b.js".into()]));
        raw.inline_dynamic_imports = Some(true);
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_OPTION");
    }

    #[tokio::test]
    async fn rejects_preserve_modules_with_manual_chunks() {
        let mut raw = raw_with_entry("a.js");
        raw.preserve_modules = Some(true);
        raw.manual_chunks = Some(true);
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_OPTION");
    }

    #[tokio::test]
    async fn rejects_amd_and_module_id_conflict() {
        let raw = RawConfig {
            input: Some(EntryPoints::Single("a.js".into())),
            output: OutputSpec::Single(RawOutput {
                format: Some("amd".into()),
                dir: Some(PathBuf::from("dist")),
                amd_id: Some("my-amd-id".into()),
                module_id: Some("legacy-id".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = normalize(raw).await.unwrap_err();
        assert_eq!(err.code().as_str(), "CONFLICTING_OPTION");
    }

    #[tokio::test]
    async fn output_fallback_cascades_when_no_explicit_output() {
        let raw = RawConfig {
            input: Some(EntryPoints::Single("a.js".into())),
            output_fallback: RawOutput {
                format: Some("es".into()),
                dir: Some(PathBuf::from("dist")),
                ..Default::default()
            },
            ..Default::default()
        };
        let normalized = normalize(raw).await.unwrap();
        assert_eq!(normalized.outputs.len(), 1);
        assert_eq!(normalized.outputs[0].format, Some(OutputFormat::Es));
    }

    #[tokio::test]
    async fn is_a_fixed_point_under_repeated_merging() {
        let raw = raw_with_entry("a.js");
        let once = normalize(raw.clone()).await.unwrap();
        let format_once = once.outputs[0].format;

        // Re-normalizing an already-normalized output must reproduce the
        // same structure (§8, "merging a set of options twice ... is a
        // fixed point").
        let raw_out = RawOutput {
            format: Some(format_once.unwrap().as_str().to_string()),
            dir: Some(PathBuf::from("dist")),
            ..Default::default()
        };
        let twice = normalize_output(raw_out).unwrap();
        assert_eq!(twice.format, format_once);
    }
}
