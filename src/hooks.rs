//! The Hook Driver (§4.3): schedules plugin hooks under one of four
//! invocation shapes and composes the addon strings used by the Generate
//! Coordinator.

use futures::future::join_all;

use crate::context::PluginContext;
use crate::error::{Error, Result};
use crate::options::{InputOptions, OutputOptions};
use crate::output::OutputBundle;
use crate::plugin::{HookResult, ResolvedId, SharedPlugin};

/// Sequential reducing fold over `options`: plugin N sees plugin N-1's output.
pub async fn fold_options(plugins: &[SharedPlugin], mut options: InputOptions) -> Result<InputOptions> {
    for plugin in plugins {
        let span = tracing::debug_span!("hook", hook = "options", plugin = plugin.name());
        let _enter = span.enter();
        options = plugin.options(options).await.map_err(|e| wrap(plugin, e))?;
    }
    Ok(options)
}

/// Parallel fan-out: every plugin runs concurrently, first error wins.
pub async fn fan_out_build_start(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    options: &InputOptions,
) -> Result<()> {
    let span = tracing::debug_span!("hook", hook = "buildStart");
    let _enter = span.enter();
    let futures = plugins.iter().map(|p| {
        let attributed = ctx.attributed_to(p.name());
        async move { p.build_start(&attributed, options).await.map_err(|e| wrap(p, e)) }
    });
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}

/// Parallel fan-out, run unconditionally even when the build failed; the
/// Build Coordinator surfaces the original failure regardless of what this
/// returns (§4.4 step 8).
pub async fn fan_out_build_end(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    error: Option<&Error>,
) -> Result<()> {
    let span = tracing::debug_span!("hook", hook = "buildEnd");
    let _enter = span.enter();
    let futures = plugins.iter().map(|p| {
        let attributed = ctx.attributed_to(p.name());
        async move { p.build_end(&attributed, error).await.map_err(|e| wrap(p, e)) }
    });
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}

pub async fn fan_out_generate_bundle(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    output: &OutputOptions,
    bundle: &OutputBundle,
) -> Result<()> {
    let span = tracing::debug_span!("hook", hook = "generateBundle");
    let _enter = span.enter();
    let futures = plugins.iter().map(|p| {
        let attributed = ctx.attributed_to(p.name());
        async move {
            p.generate_bundle(&attributed, output, bundle)
                .await
                .map_err(|e| wrap(p, e))
        }
    });
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}

/// Legacy per-chunk fan-out, positional `(outputOptions, chunk)` shape
/// preserved for compatibility (SPEC_FULL §9).
pub async fn fan_out_ongenerate(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    output: &OutputOptions,
    chunks: &[crate::output::OutputChunk],
) -> Result<()> {
    let span = tracing::debug_span!("hook", hook = "ongenerate");
    let _enter = span.enter();
    let futures = plugins.iter().flat_map(|p| {
        let attributed = ctx.attributed_to(p.name());
        chunks.iter().map(move |chunk| {
            let attributed = attributed.clone();
            async move { p.ongenerate(&attributed, output, chunk).await.map_err(|e| wrap(p, e)) }
        })
    });
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}

pub async fn fan_out_onwrite(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    output: &OutputOptions,
    bundle: &OutputBundle,
) -> Result<()> {
    let span = tracing::debug_span!("hook", hook = "onwrite");
    let _enter = span.enter();
    let futures = plugins.iter().map(|p| {
        let attributed = ctx.attributed_to(p.name());
        async move { p.onwrite(&attributed, output, bundle).await.map_err(|e| wrap(p, e)) }
    });
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}

/// First-non-absent-wins: plugins are asked in declared order, the first
/// one to return other than `Absent` settles the call.
pub async fn first_resolve_id(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    source: &str,
    importer: Option<&str>,
) -> Result<HookResult<ResolvedId>> {
    for plugin in plugins {
        let attributed = ctx.attributed_to(plugin.name());
        let result = plugin
            .resolve_id(&attributed, source, importer)
            .await
            .map_err(|e| wrap(plugin, e))?;
        if !result.is_absent() {
            return Ok(result);
        }
    }
    Ok(HookResult::Absent)
}

pub async fn first_load(plugins: &[SharedPlugin], ctx: &PluginContext, id: &str) -> Result<HookResult<String>> {
    for plugin in plugins {
        let attributed = ctx.attributed_to(plugin.name());
        let result = plugin.load(&attributed, id).await.map_err(|e| wrap(plugin, e))?;
        if !result.is_absent() {
            return Ok(result);
        }
    }
    Ok(HookResult::Absent)
}

pub async fn first_resolve_dynamic_import(
    plugins: &[SharedPlugin],
    ctx: &PluginContext,
    specifier: &str,
    importer: &str,
) -> Result<HookResult<ResolvedId>> {
    for plugin in plugins {
        let attributed = ctx.attributed_to(plugin.name());
        let result = plugin
            .resolve_dynamic_import(&attributed, specifier, importer)
            .await
            .map_err(|e| wrap(plugin, e))?;
        if !result.is_absent() {
            return Ok(result);
        }
    }
    Ok(HookResult::Absent)
}

/// Sequential transform pipeline: each plugin sees the previous plugin's output.
pub async fn pipeline_transform(plugins: &[SharedPlugin], ctx: &PluginContext, id: &str, mut code: String) -> Result<String> {
    for plugin in plugins {
        let attributed = ctx.attributed_to(plugin.name());
        code = plugin
            .transform(&attributed, code, id)
            .await
            .map_err(|e| wrap(plugin, e))?;
    }
    Ok(code)
}

/// The composed `banner`/`footer`/`intro`/`outro` strings for one generate
/// call, resolved once and shared by every chunk's render (§4.5 step 7).
#[derive(Debug, Clone, Default)]
pub struct Addons {
    pub banner: String,
    pub footer: String,
    pub intro: String,
    pub outro: String,
}

/// Concatenates every plugin's addon value for each of the four slots, in
/// declared plugin order, separated by a newline.
pub fn compose_addons(plugins: &[SharedPlugin]) -> Result<Addons> {
    let mut addons = Addons::default();
    for plugin in plugins {
        if let Some(v) = plugin.banner() {
            push_line(&mut addons.banner, &v.resolve().map_err(|e| wrap(plugin, e))?);
        }
    }
    for plugin in plugins {
        if let Some(v) = plugin.intro() {
            push_line(&mut addons.intro, &v.resolve().map_err(|e| wrap(plugin, e))?);
        }
    }
    for plugin in plugins {
        if let Some(v) = plugin.outro() {
            push_line(&mut addons.outro, &v.resolve().map_err(|e| wrap(plugin, e))?);
        }
    }
    for plugin in plugins {
        if let Some(v) = plugin.footer() {
            push_line(&mut addons.footer, &v.resolve().map_err(|e| wrap(plugin, e))?);
        }
    }
    Ok(addons)
}

fn push_line(into: &mut String, line: &str) {
    if !into.is_empty() {
        into.push('\n');
    }
    into.push_str(line);
}

fn wrap(plugin: &SharedPlugin, err: Error) -> Error {
    match err {
        Error::Plugin { .. } => err,
        other => Error::plugin(plugin.name(), other.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{AddonValue, Plugin};
    use async_trait::async_trait;

    struct BannerPlugin(&'static str);

    #[async_trait]
    impl Plugin for BannerPlugin {
        fn name(&self) -> &str {
            self.0
        }

        fn banner(&self) -> Option<AddonValue> {
            Some(AddonValue::Literal(format!("/* {} */", self.0)))
        }
    }

    #[test]
    fn compose_addons_concatenates_in_declared_order() {
        let plugins: Vec<SharedPlugin> = vec![
            std::sync::Arc::new(BannerPlugin("a")),
            std::sync::Arc::new(BannerPlugin("b")),
        ];
        let addons = compose_addons(&plugins).unwrap();
        assert_eq!(addons.banner, "/* a */\n/* b */");
        assert!(addons.footer.is_empty());
    }
}
