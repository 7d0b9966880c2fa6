//! The Generate Coordinator (§4.5): the GENERATE phase, runnable any
//! number of times against one completed `Build`.

use crate::build::Build;
use crate::context::PluginContext;
use crate::error::{Error, Result};
use crate::hooks;
use crate::options::{Destination, ExportMode, OutputFormat, OutputOptions};
use crate::output::{OutputAsset, OutputBundle, OutputChunk};
use crate::timing::Timer;

/// Runs one GENERATE phase against `build`, producing an `OutputBundle`.
/// Does not write anything to disk; see `crate::write` for that.
pub async fn generate(build: &mut Build, output: OutputOptions) -> Result<OutputBundle> {
    let gen_timer = Timer::start("# GENERATE");

    validate_output(&output)?;

    let format = output.format.ok_or(Error::FormatRequired)?;
    if format.requires_single_chunk() && build.chunks().len() > 1 {
        return Err(Error::invalid_option(format!(
            "\"{}\" format requires a single chunk, but the build produced {}",
            format.as_str(),
            build.chunks().len()
        )));
    }

    // Resolve every still-pending asset's file name up front so plugin
    // code running during render can already call `getAssetFileName`.
    build.assets().finalize_all(&output.asset_file_names)?;

    let input_base = compute_input_base(build.chunks());
    let addons = hooks::compose_addons(&build.input().plugins)?;

    let preserve_modules = build.input().preserve_modules;
    let chunk_grouping_size = build.input().chunk_grouping_size;
    let export_mode_pref = output.export_mode;

    for chunk in build.chunks_mut() {
        if !preserve_modules {
            let mode = derive_export_mode(chunk.as_ref(), export_mode_pref);
            chunk.generate_internal_exports(format, mode);
        }
        chunk.pre_render(&output, &input_base)?;
    }

    build.optimize_chunks_once(&output, chunk_grouping_size, &input_base)?;

    let mut rendered_chunks = Vec::with_capacity(build.chunks().len());
    for (index, chunk) in build.chunks().iter().enumerate() {
        let file_name = if preserve_modules {
            chunk.generate_id_preserve_modules(&input_base)
        } else {
            name_for_chunk(chunk.as_ref(), &output, index)
        };
        let rendered = chunk.render(&output, &addons)?;
        rendered_chunks.push(OutputChunk {
            file_name,
            code: rendered.code,
            map: rendered.map,
            is_entry: chunk.is_entry(),
            is_dynamic_entry: !chunk.is_entry() && chunk.is_facade(),
            facade_module_id: chunk.entry_module_id().map(str::to_string),
            imports: rendered.imports,
            exports: rendered.exports,
        });
    }

    hooks::fan_out_ongenerate(&build.input().plugins, build.context(), &output, &rendered_chunks).await?;

    let mut bundle = OutputBundle {
        chunks: rendered_chunks,
        assets: Vec::new(),
    };

    let generate_ctx = PluginContext::for_generate(build.context());
    hooks::fan_out_generate_bundle(&build.input().plugins, &generate_ctx, &output, &bundle).await?;

    // Any asset emitted during generateBundle without a source is forced
    // to finalize now, using the same template (§4.5 step 15). Assets this
    // call emitted live in `generate_ctx`'s own scratch registry (§4.2) and
    // are folded into this bundle only; they never touch `build.assets()`,
    // so they cannot reappear in a later `generate`/`write` call.
    build.assets().finalize_all(&output.asset_file_names)?;
    let scoped_assets = generate_ctx.generate_assets();
    scoped_assets.finalize_all(&output.asset_file_names)?;

    bundle.assets = build
        .assets()
        .all_finalized()
        .into_iter()
        .chain(scoped_assets.all_finalized())
        .map(|(_, file_name, source)| OutputAsset { file_name, source })
        .collect();

    let mut timings = crate::timing::Timings::new();
    gen_timer.finish(&mut timings);
    for (label, millis) in timings.as_millis() {
        build.timings_mut().record(&label, std::time::Duration::from_secs_f64(millis / 1000.0));
    }

    Ok(bundle)
}

/// Runs `generate`, then writes the result to disk and fires the deprecated
/// `onwrite` fan-out (§4.7).
pub async fn write(build: &mut Build, output: OutputOptions) -> Result<OutputBundle> {
    let destination = output.destination.clone();
    let sourcemap = output.sourcemap;
    let bundle = generate(build, output.clone()).await?;

    let dir = match destination {
        Destination::Dir(dir) => dir,
        Destination::File(file) => file
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| std::path::PathBuf::from(".")),
        Destination::None => return Err(Error::MissingOutputOption),
    };

    crate::output::write_bundle(&bundle, &dir, sourcemap)?;

    hooks::fan_out_onwrite(&build.input().plugins, build.context(), &output, &bundle).await?;

    Ok(bundle)
}

fn validate_output(output: &OutputOptions) -> Result<()> {
    if output.amd_id.is_some() && output.module_id.is_some() {
        return Err(Error::ConflictingOption {
            message: "output.amd and the legacy output.moduleId cannot both be set".into(),
        });
    }
    Ok(())
}

fn derive_export_mode(chunk: &dyn crate::graph::Chunk, preference: ExportMode) -> ExportMode {
    if preference != ExportMode::Auto {
        return preference;
    }
    if chunk.has_only_default_export() {
        ExportMode::Default
    } else if chunk.export_names().is_empty() {
        ExportMode::None
    } else {
        ExportMode::Named
    }
}

/// Longest common directory prefix across every entry chunk's module id,
/// used as the relative base for `preserveModules` output (§4.5 step 5).
fn compute_input_base(chunks: &[Box<dyn crate::graph::Chunk>]) -> String {
    let entry_ids: Vec<&str> = chunks
        .iter()
        .filter(|c| c.is_entry())
        .filter_map(|c| c.entry_module_id())
        .collect();

    let Some(first) = entry_ids.first() else {
        return String::new();
    };
    let mut common: Vec<&str> = first.split('/').collect();
    common.pop();

    for id in &entry_ids[1..] {
        let parts: Vec<&str> = id.split('/').collect();
        let mut i = 0;
        while i < common.len() && i < parts.len().saturating_sub(1) && common[i] == parts[i] {
            i += 1;
        }
        common.truncate(i);
    }
    common.join("/")
}

fn name_for_chunk(chunk: &dyn crate::graph::Chunk, output: &OutputOptions, index: usize) -> String {
    if let Destination::File(path) = &output.destination {
        return path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("chunk-{index}"));
    }

    let pattern = if chunk.is_entry() {
        &output.entry_file_names
    } else {
        &output.chunk_file_names
    };
    let name = chunk
        .entry_module_id()
        .and_then(|id| id.rsplit('/').next())
        .and_then(|f| f.split('.').next())
        .map(str::to_string)
        .unwrap_or_else(|| format!("chunk-{index}"));

    pattern
        .replace("[name]", &name)
        .replace("[hash]", &format!("{:08x}", index as u32 * 2654435761))
        .replace("[format]", format_extension(output.format))
}

fn format_extension(format: Option<OutputFormat>) -> &'static str {
    match format {
        Some(OutputFormat::Cjs) => "cjs",
        Some(OutputFormat::Es) => "es",
        _ => "js",
    }
}
