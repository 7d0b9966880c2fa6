//! Typed option surfaces and the normalizer that produces them (§4.1).

mod input;
mod normalize;
mod output;

pub use input::{EntryPoints, ExternalOption, InputOptions, TreeshakeOption, WarnSink};
pub use normalize::{
    normalize, normalize_output, LegacyTopLevelHooks, Normalized, OutputSpec, RawConfig, RawOutput,
};
pub use output::{Destination, ExportMode, OutputFormat, OutputOptions, SourceMapMode};
