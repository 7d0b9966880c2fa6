//! Error types surfaced by every fallible core operation.
//!
//! Every variant carries one of the codes from the specification's error
//! table and a `miette` diagnostic code, so host applications can either
//! match on `Error::code()` or hand the error to a miette reporter without
//! this crate doing any human-facing formatting itself.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable machine-readable error codes from the specification's error table (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownOption,
    InvalidOption,
    MissingOption,
    DeprecatedOptions,
    MissingOutputOption,
    UnsupportedLegacyOption,
    FormatRequired,
    FormatDeprecated,
    ConflictingOption,
    AssetFinalized,
    UnknownAsset,
    AssetSourceMissing,
    PluginError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownOption => "UNKNOWN_OPTION",
            ErrorCode::InvalidOption => "INVALID_OPTION",
            ErrorCode::MissingOption => "MISSING_OPTION",
            ErrorCode::DeprecatedOptions => "DEPRECATED_OPTIONS",
            ErrorCode::MissingOutputOption => "MISSING_OUTPUT_OPTION",
            ErrorCode::UnsupportedLegacyOption => "UNSUPPORTED_LEGACY_OPTION",
            ErrorCode::FormatRequired => "FORMAT_REQUIRED",
            ErrorCode::FormatDeprecated => "FORMAT_DEPRECATED",
            ErrorCode::ConflictingOption => "CONFLICTING_OPTION",
            ErrorCode::AssetFinalized => "ASSET_FINALIZED",
            ErrorCode::UnknownAsset => "UNKNOWN_ASSET",
            ErrorCode::AssetSourceMissing => "ASSET_SOURCE_MISSING",
            ErrorCode::PluginError => "PLUGIN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source position, attached to warnings/errors raised through the plugin context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("unknown option: {name}")]
    #[diagnostic(code(bundle_core::unknown_option))]
    UnknownOption { name: String },

    #[error("invalid option: {message}")]
    #[diagnostic(code(bundle_core::invalid_option))]
    InvalidOption { message: String },

    #[error("missing option: {name}")]
    #[diagnostic(code(bundle_core::missing_option))]
    MissingOption { name: String },

    #[error("output option is required")]
    #[diagnostic(
        code(bundle_core::missing_output_option),
        help("pass at least one OutputOptions to generate()/write()")
    )]
    MissingOutputOption,

    #[error("unsupported legacy option: {name}")]
    #[diagnostic(
        code(bundle_core::unsupported_legacy_option),
        help("move `{name}` into a plugin hook of the same name")
    )]
    UnsupportedLegacyOption { name: String },

    #[error("output.format is required")]
    #[diagnostic(code(bundle_core::format_required))]
    FormatRequired,

    #[error("output.format \"es6\" is deprecated")]
    #[diagnostic(
        code(bundle_core::format_deprecated),
        help("use \"es\" instead of \"es6\"")
    )]
    FormatDeprecated { used: String, suggestion: String },

    #[error("conflicting option: {message}")]
    #[diagnostic(code(bundle_core::conflicting_option))]
    ConflictingOption { message: String },

    #[error("asset {asset_id} already has a source")]
    #[diagnostic(code(bundle_core::asset_finalized))]
    AssetFinalized { asset_id: String },

    #[error("unknown asset id: {asset_id}")]
    #[diagnostic(code(bundle_core::unknown_asset))]
    UnknownAsset { asset_id: String },

    #[error("asset {asset_id} (\"{name}\") was emitted without a source and never finalized")]
    #[diagnostic(code(bundle_core::asset_source_missing))]
    AssetSourceMissing { asset_id: String, name: String },

    #[error("plugin \"{plugin}\" failed: {message}")]
    #[diagnostic(code(bundle_core::plugin_error))]
    Plugin {
        plugin: String,
        message: String,
        pos: Option<Pos>,
    },

    #[error("I/O error: {source}")]
    #[diagnostic(code(bundle_core::io_error))]
    Io {
        #[source]
        source: std::io::Error,
        path: Option<std::path::PathBuf>,
    },

    #[error("invalid output path: {0}")]
    #[diagnostic(code(bundle_core::invalid_output_path))]
    InvalidOutputPath(String),
}

impl Error {
    /// The stable machine-readable code for this error, matching the
    /// specification's error table (§7).
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::UnknownOption { .. } => ErrorCode::UnknownOption,
            Error::InvalidOption { .. } => ErrorCode::InvalidOption,
            Error::MissingOption { .. } => ErrorCode::MissingOption,
            Error::MissingOutputOption => ErrorCode::MissingOutputOption,
            Error::UnsupportedLegacyOption { .. } => ErrorCode::UnsupportedLegacyOption,
            Error::FormatRequired => ErrorCode::FormatRequired,
            Error::FormatDeprecated { .. } => ErrorCode::FormatDeprecated,
            Error::ConflictingOption { .. } => ErrorCode::ConflictingOption,
            Error::AssetFinalized { .. } => ErrorCode::AssetFinalized,
            Error::UnknownAsset { .. } => ErrorCode::UnknownAsset,
            Error::AssetSourceMissing { .. } => ErrorCode::AssetSourceMissing,
            Error::Plugin { .. } => ErrorCode::PluginError,
            Error::Io { .. } | Error::InvalidOutputPath(_) => ErrorCode::InvalidOption,
        }
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        Error::InvalidOption {
            message: message.into(),
        }
    }

    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>, pos: Option<Pos>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
            pos,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source, path: None }
    }
}

/// A non-fatal warning routed through `PluginContext::warn`/`InputOptions::onwarn`.
#[derive(Debug, Clone)]
pub struct Warning {
    pub code: Option<&'static str>,
    pub message: String,
    pub pos: Option<Pos>,
    pub plugin: Option<String>,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            pos: None,
            plugin: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_pos(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    /// The one-line description a default warning sink writes, matching
    /// the propagation policy's "default sink writes a one-line description".
    pub fn one_line(&self) -> String {
        match (&self.plugin, self.code) {
            (Some(plugin), Some(code)) => format!("({plugin} plugin) [{code}] {}", self.message),
            (Some(plugin), None) => format!("({plugin} plugin) {}", self.message),
            (None, Some(code)) => format!("[{code}] {}", self.message),
            (None, None) => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_matches_spec_string() {
        assert_eq!(ErrorCode::InvalidOption.as_str(), "INVALID_OPTION");
        assert_eq!(
            Error::invalid_option("x").code().as_str(),
            "INVALID_OPTION"
        );
    }

    #[test]
    fn warning_one_line_includes_plugin_and_code() {
        let w = Warning::new("deprecated option").with_code("DEPRECATED_OPTIONS");
        let mut w = w;
        w.plugin = Some("my-plugin".into());
        assert_eq!(
            w.one_line(),
            "(my-plugin plugin) [DEPRECATED_OPTIONS] deprecated option"
        );
    }
}
