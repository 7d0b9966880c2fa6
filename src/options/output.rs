//! `OutputOptions`: normalized per generate call (§3).

use rustc_hash::FxHashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Es,
    Cjs,
    Amd,
    SystemJs,
    Iife,
    Umd,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "es" | "esm" | "module" => Ok(OutputFormat::Es),
            "es6" => Err(Error::FormatDeprecated {
                used: "es6".into(),
                suggestion: "es".into(),
            }),
            "cjs" | "commonjs" => Ok(OutputFormat::Cjs),
            "amd" => Ok(OutputFormat::Amd),
            "system" | "systemjs" => Ok(OutputFormat::SystemJs),
            "iife" => Ok(OutputFormat::Iife),
            "umd" => Ok(OutputFormat::Umd),
            other => Err(Error::invalid_option(format!("unknown output format: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Es => "es",
            OutputFormat::Cjs => "cjs",
            OutputFormat::Amd => "amd",
            OutputFormat::SystemJs => "system",
            OutputFormat::Iife => "iife",
            OutputFormat::Umd => "umd",
        }
    }

    /// `umd`/`iife` formats require exactly one chunk (§3 invariants).
    pub fn requires_single_chunk(&self) -> bool {
        matches!(self, OutputFormat::Umd | OutputFormat::Iife)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapMode {
    Off,
    External,
    Inline,
}

impl Default for SourceMapMode {
    fn default() -> Self {
        SourceMapMode::Off
    }
}

/// An entry-module facade's export mode (§4.5 step 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Default,
    Named,
    None,
    Auto,
}

impl Default for ExportMode {
    fn default() -> Self {
        ExportMode::Auto
    }
}

/// Destination for a single generate call: `file` XOR `dir` (§3 invariant).
#[derive(Debug, Clone)]
pub enum Destination {
    File(PathBuf),
    Dir(PathBuf),
    None,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: Option<OutputFormat>,
    pub destination: Destination,

    pub entry_file_names: String,
    pub chunk_file_names: String,
    pub asset_file_names: String,

    pub sourcemap: SourceMapMode,
    pub sourcemap_file: Option<String>,

    pub globals: FxHashMap<String, String>,
    pub export_mode: ExportMode,

    pub compact: bool,
    pub indent: bool,
    pub strict: bool,
    pub freeze: bool,
    pub es_module: bool,
    pub namespace_to_string_tag: bool,
    pub interop: bool,
    pub extend: bool,

    /// Legacy alias for `amd.id`; conflicts with a nested `amd` object (§4.1).
    pub module_id: Option<String>,
    pub amd_id: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: None,
            destination: Destination::None,
            entry_file_names: "[name].js".to_string(),
            chunk_file_names: "[name]-[hash].js".to_string(),
            asset_file_names: "assets/[name]-[hash][extname]".to_string(),
            sourcemap: SourceMapMode::Off,
            sourcemap_file: None,
            globals: FxHashMap::default(),
            export_mode: ExportMode::Auto,
            compact: false,
            indent: true,
            strict: true,
            freeze: true,
            es_module: true,
            namespace_to_string_tag: false,
            interop: true,
            extend: false,
            module_id: None,
            amd_id: None,
        }
    }
}

impl OutputOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format: Some(format),
            ..Default::default()
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Destination::File(path.into());
        self
    }

    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Destination::Dir(path.into());
        self
    }

    pub fn sourcemap(mut self, mode: SourceMapMode) -> Self {
        self.sourcemap = mode;
        self
    }

    pub fn entry_file_names(mut self, pattern: impl Into<String>) -> Self {
        self.entry_file_names = pattern.into();
        self
    }

    pub fn chunk_file_names(mut self, pattern: impl Into<String>) -> Self {
        self.chunk_file_names = pattern.into();
        self
    }

    pub fn asset_file_names(mut self, pattern: impl Into<String>) -> Self {
        self.asset_file_names = pattern.into();
        self
    }

    pub fn global(mut self, package: impl Into<String>, name: impl Into<String>) -> Self {
        self.globals.insert(package.into(), name.into());
        self
    }
}
