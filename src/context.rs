//! Plugin Context (§4.2): the capability object passed to every hook.

use std::sync::Arc;

use crate::assets::AssetRegistry;
use crate::error::{Error, Pos, Result, Warning};
use crate::options::{ExternalOption, InputOptions, WarnSink};
use crate::plugin::{HookResult, ResolvedId, SharedPlugin};

/// Which lifecycle phase constructed this context. `Generate` contexts are
/// derived from a `Build` context for the duration of one `generateBundle`
/// fan-out: `emit_asset` writes into a fresh per-call registry instead of
/// the shared one, so an asset emitted in this scope is visible only in the
/// output of this generate call and never leaks into a later one sharing
/// the same `Build` (§4.2, §4.6). `set_asset_source`/`get_asset_file_name`
/// still resolve ids from the shared registry when they don't belong to
/// this call's own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Build,
    Generate,
}

#[derive(Clone)]
pub struct PluginContext {
    plugins: Vec<SharedPlugin>,
    external: ExternalOption,
    on_warn: WarnSink,
    assets: Arc<AssetRegistry>,
    /// A fresh, per-generate-call registry that `emit_asset` writes into
    /// instead of the shared build-scoped `assets` whenever `scope` is
    /// `Generate`, so an asset a `generateBundle` plugin emits cannot leak
    /// into a later `generate`/`write` call on the same `Build` (§4.2,
    /// §4.6). Unused (and equal to `assets`) under `Scope::Build`.
    generate_assets: Arc<AssetRegistry>,
    scope: Scope,
    plugin_name: Option<String>,
}

impl PluginContext {
    pub fn for_build(options: &InputOptions, assets: Arc<AssetRegistry>) -> Self {
        Self {
            plugins: options.plugins.clone(),
            external: options.external.clone(),
            on_warn: options.on_warn.clone(),
            generate_assets: assets.clone(),
            assets,
            scope: Scope::Build,
            plugin_name: None,
        }
    }

    /// Construct the scoped context handed to `generateBundle`/`ongenerate`/`onwrite`.
    pub fn for_generate(build_ctx: &PluginContext) -> Self {
        Self {
            plugins: build_ctx.plugins.clone(),
            external: build_ctx.external.clone(),
            on_warn: build_ctx.on_warn.clone(),
            assets: build_ctx.assets.clone(),
            generate_assets: AssetRegistry::new_scoped(),
            scope: Scope::Generate,
            plugin_name: None,
        }
    }

    /// A copy of this context tagged with the plugin currently running, so
    /// `warn`/`error` can attribute the message without the caller passing
    /// a plugin name through every hook body.
    pub fn attributed_to(&self, plugin_name: &str) -> Self {
        Self {
            plugins: self.plugins.clone(),
            external: self.external.clone(),
            on_warn: self.on_warn.clone(),
            assets: self.assets.clone(),
            generate_assets: self.generate_assets.clone(),
            scope: self.scope,
            plugin_name: Some(plugin_name.to_string()),
        }
    }

    /// This call's own scoped asset table. Only meaningful under
    /// `Scope::Generate` (under `Scope::Build` it is the same registry as
    /// `assets`). The Generate Coordinator reads this after the
    /// `generateBundle` fan-out to fold its assets into the bundle, then
    /// lets it drop at the end of the call.
    pub(crate) fn generate_assets(&self) -> &Arc<AssetRegistry> {
        &self.generate_assets
    }

    /// Which registry owns `asset_id`: the per-call scratch table if this is
    /// a generate-scoped context and the id belongs to it, else the shared
    /// build-scoped table.
    fn registry_for(&self, asset_id: &str) -> &Arc<AssetRegistry> {
        if self.scope == Scope::Generate && self.generate_assets.owns(asset_id) {
            &self.generate_assets
        } else {
            &self.assets
        }
    }

    pub fn warn(&self, message: impl Into<String>) {
        let mut w = Warning::new(message);
        w.plugin = self.plugin_name.clone();
        tracing::debug!(target: "bundle_core::context", plugin = ?self.plugin_name, "warn");
        (self.on_warn)(w);
    }

    pub fn warn_with_pos(&self, message: impl Into<String>, pos: Pos) {
        let mut w = Warning::new(message).with_pos(pos);
        w.plugin = self.plugin_name.clone();
        (self.on_warn)(w);
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        tracing::debug!(target: "bundle_core::context", plugin = ?self.plugin_name, "error");
        Error::plugin(
            self.plugin_name.clone().unwrap_or_else(|| "<unknown>".into()),
            message,
            None,
        )
    }

    pub fn is_external(&self, id: &str, importer: Option<&str>, resolved: bool) -> bool {
        tracing::debug!(target: "bundle_core::context", id, "is_external");
        self.external.is_external(id, importer, resolved)
    }

    pub async fn resolve_id(&self, source: &str, importer: Option<&str>) -> Result<HookResult<ResolvedId>> {
        tracing::debug!(target: "bundle_core::context", source, "resolve_id");
        crate::hooks::first_resolve_id(&self.plugins, self, source, importer).await
    }

    pub fn emit_asset(&self, name: impl Into<String>) -> String {
        tracing::debug!(target: "bundle_core::context", scope = ?self.scope, "emit_asset");
        // Under Scope::Generate, a new asset always goes into this call's
        // own scratch table, never the shared build-scoped one (§4.2).
        if self.scope == Scope::Generate {
            self.generate_assets.emit(name.into())
        } else {
            self.assets.emit(name.into())
        }
    }

    pub fn set_asset_source(&self, asset_id: &str, source: Vec<u8>) -> Result<()> {
        tracing::debug!(target: "bundle_core::context", asset_id, "set_asset_source");
        self.registry_for(asset_id).set_source(asset_id, source)
    }

    pub fn get_asset_file_name(&self, asset_id: &str) -> Result<String> {
        tracing::debug!(target: "bundle_core::context", asset_id, "get_asset_file_name");
        self.registry_for(asset_id).file_name(asset_id)
    }

    /// Always `None` in this core: file-watching is an embedder concern
    /// layered on top of `Graph`, not part of the orchestrator (§1 Non-goals).
    pub fn watcher(&self) -> Option<()> {
        None
    }
}
