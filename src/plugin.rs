//! The plugin trait and the four hook-invocation shapes that the Hook
//! Driver (§4.3, `hooks.rs`) schedules them under.

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::PluginContext;
use crate::error::Result;
use crate::options::InputOptions;

/// The result of a "first non-absent wins" hook: `resolveId`, `load`, and
/// `resolveDynamicImport` all follow this shape (§4.3).
#[derive(Debug, Clone)]
pub enum HookResult<T> {
    /// The plugin declined to handle this call; the driver asks the next plugin.
    Absent,
    /// The plugin produced a value; no further plugin is asked.
    Value(T),
    /// The plugin marked the id as external; short-circuits resolution.
    External,
}

impl<T> HookResult<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, HookResult::Absent)
    }
}

/// A resolved module id, as returned by `resolveId`/`resolveDynamicImport`.
#[derive(Debug, Clone)]
pub struct ResolvedId {
    pub id: String,
    pub external: bool,
}

/// Either a literal string or a thunk producing one, normalized by the Hook
/// Driver to a single zero-argument callable before composition (§4.5 step 7).
#[derive(Clone)]
pub enum AddonValue {
    Literal(String),
    Dynamic(Arc<dyn Fn() -> Result<String> + Send + Sync>),
}

impl AddonValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            AddonValue::Literal(s) => Ok(s.clone()),
            AddonValue::Dynamic(f) => f(),
        }
    }
}

impl std::fmt::Debug for AddonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddonValue::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            AddonValue::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for AddonValue {
    fn from(s: &str) -> Self {
        AddonValue::Literal(s.to_string())
    }
}

impl From<String> for AddonValue {
    fn from(s: String) -> Self {
        AddonValue::Literal(s)
    }
}

/// A plugin participating in the BUILD and/or GENERATE phase. Every hook
/// has a default no-op implementation; a plugin overrides only what it needs.
///
/// Hook invocation shapes (§4.3), implemented by the Hook Driver, not here:
/// - `options`: sequential reducing fold over `InputOptions`.
/// - `build_start`/`build_end`/`generate_bundle`/`ongenerate`/`onwrite`: parallel fan-out.
/// - `resolve_id`/`load`/`resolve_dynamic_import`: first non-absent wins.
/// - `transform`: sequential pipeline, each plugin sees the previous one's output.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Required. Used in error messages and diagnostics; must be stable.
    fn name(&self) -> &str;

    /// Sequential reducing fold: may return a modified `InputOptions`.
    async fn options(&self, options: InputOptions) -> Result<InputOptions> {
        Ok(options)
    }

    async fn build_start(&self, _ctx: &PluginContext, _options: &InputOptions) -> Result<()> {
        Ok(())
    }

    /// Fan-out at the end of BUILD; `error` carries the build's failure, if any.
    async fn build_end(&self, _ctx: &PluginContext, _error: Option<&crate::error::Error>) -> Result<()> {
        Ok(())
    }

    async fn resolve_id(
        &self,
        _ctx: &PluginContext,
        _source: &str,
        _importer: Option<&str>,
    ) -> Result<HookResult<ResolvedId>> {
        Ok(HookResult::Absent)
    }

    async fn load(&self, _ctx: &PluginContext, _id: &str) -> Result<HookResult<String>> {
        Ok(HookResult::Absent)
    }

    async fn resolve_dynamic_import(
        &self,
        _ctx: &PluginContext,
        _specifier: &str,
        _importer: &str,
    ) -> Result<HookResult<ResolvedId>> {
        Ok(HookResult::Absent)
    }

    /// Sequential pipeline: each plugin transforms the previous output in order.
    async fn transform(&self, _ctx: &PluginContext, code: String, _id: &str) -> Result<String> {
        Ok(code)
    }

    /// Fan-out once per generate call, after chunks are rendered (§4.5 step 14).
    async fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        _output: &crate::options::OutputOptions,
        _bundle: &crate::output::OutputBundle,
    ) -> Result<()> {
        Ok(())
    }

    /// Deprecated alias for `generate_bundle`, called with the legacy
    /// positional `(outputOptions, chunk)` shape once per chunk (SPEC_FULL §9).
    async fn ongenerate(
        &self,
        _ctx: &PluginContext,
        _output: &crate::options::OutputOptions,
        _chunk: &crate::output::OutputChunk,
    ) -> Result<()> {
        Ok(())
    }

    /// Deprecated, fired once per generate call after files are written.
    async fn onwrite(
        &self,
        _ctx: &PluginContext,
        _output: &crate::options::OutputOptions,
        _bundle: &crate::output::OutputBundle,
    ) -> Result<()> {
        Ok(())
    }

    fn banner(&self) -> Option<AddonValue> {
        None
    }

    fn footer(&self) -> Option<AddonValue> {
        None
    }

    fn intro(&self) -> Option<AddonValue> {
        None
    }

    fn outro(&self) -> Option<AddonValue> {
        None
    }
}

pub type SharedPlugin = Arc<dyn Plugin>;
