//! Output Writer (§4.7): validates destination paths, writes files
//! atomically via a temp-file-then-rename, and cleans up on any failure.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::error::{Error, Result};
use crate::options::SourceMapMode;
use crate::output::OutputBundle;

/// Writes every chunk and asset in `bundle` under `dir`. Source maps are
/// written as `<file>.map` siblings unless `sourcemap` is `Inline`, in
/// which case the map is appended to the chunk as a data URL comment
/// instead of becoming its own entry.
pub fn write_bundle(bundle: &OutputBundle, dir: &Path, sourcemap: SourceMapMode) -> Result<()> {
    let dir = validate_and_normalize_dir(dir)?;
    std::fs::create_dir_all(&dir)?;

    let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    for chunk in &bundle.chunks {
        let chunk_path = validate_output_path(&dir, &chunk.file_name)?;
        let mut code = chunk.code.clone();
        if let Some(map) = &chunk.map {
            match sourcemap {
                SourceMapMode::Inline => {
                    let encoded = base64_encode(map.json.as_bytes());
                    code.push_str(&format!(
                        "\n//# sourceMappingURL=data:application/json;base64,{encoded}\n"
                    ));
                }
                SourceMapMode::External => {
                    let map_name = format!("{}.map", chunk.file_name);
                    let map_path = validate_output_path(&dir, &map_name)?;
                    code.push_str(&format!("\n//# sourceMappingURL={}\n", file_name_of(&map_name)));
                    files.push((map_path, map.json.clone().into_bytes()));
                }
                SourceMapMode::Off => {}
            }
        }
        files.push((chunk_path, code.into_bytes()));
    }
    for asset in &bundle.assets {
        let asset_path = validate_output_path(&dir, &asset.file_name)?;
        files.push((asset_path, asset.source.clone()));
    }

    write_files_atomic(files)
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(Error::InvalidOutputPath("output directory is empty".into()));
    }
    Ok(dir.clean())
}

/// Rejects null bytes, reserved Windows device names, and any path that
/// `path_clean`s outside of `base_dir` — the same traversal guard the
/// teacher's writer uses.
fn validate_output_path(base_dir: &Path, file_name: &str) -> Result<PathBuf> {
    if file_name.contains('\0') {
        return Err(Error::InvalidOutputPath(format!(
            "file name contains a null byte: {file_name}"
        )));
    }

    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    for component in Path::new(file_name).components() {
        if let std::path::Component::Normal(part) = component {
            let stem = part.to_string_lossy();
            let stem = stem.split('.').next().unwrap_or_default().to_uppercase();
            if RESERVED.contains(&stem.as_str()) {
                return Err(Error::InvalidOutputPath(format!(
                    "file name uses a reserved device name: {file_name}"
                )));
            }
        }
    }

    let joined = base_dir.join(file_name).clean();
    if !joined.starts_with(base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "file name escapes the output directory: {file_name}"
        )));
    }
    Ok(joined)
}

/// Writes every file to a `.tmp` sibling first, then renames each into
/// place. If any write or rename fails, every `.tmp` file created so far is
/// removed and the original error propagates (§4.7).
fn write_files_atomic(files: Vec<(PathBuf, Vec<u8>)>) -> Result<()> {
    let mut written_temps = Vec::new();

    let result = (|| -> Result<()> {
        for (path, contents) in &files {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp_path = path.with_extension(format!(
                "{}.tmp",
                path.extension().and_then(|e| e.to_str()).unwrap_or("out")
            ));
            std::fs::write(&tmp_path, contents)?;
            written_temps.push((tmp_path, path.clone()));
        }
        for (tmp_path, final_path) in &written_temps {
            std::fs::rename(tmp_path, final_path)?;
        }
        Ok(())
    })();

    if result.is_err() {
        cleanup_temp_files(&written_temps);
    }
    result
}

fn cleanup_temp_files(pending: &[(PathBuf, PathBuf)]) {
    for (tmp_path, _) in pending {
        let _ = std::fs::remove_file(tmp_path);
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputAsset, OutputChunk};
    use tempfile::TempDir;

    fn chunk(file_name: &str, code: &str) -> OutputChunk {
        OutputChunk {
            file_name: file_name.to_string(),
            code: code.to_string(),
            map: None,
            is_entry: true,
            is_dynamic_entry: false,
            facade_module_id: None,
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    #[test]
    fn writes_a_single_chunk() {
        let dir = TempDir::new().unwrap();
        let bundle = OutputBundle {
            chunks: vec![chunk("main.js", "console.log(1)")],
            assets: vec![],
        };
        write_bundle(&bundle, dir.path(), SourceMapMode::Off).unwrap();
        let written = std::fs::read_to_string(dir.path().join("main.js")).unwrap();
        assert_eq!(written, "console.log(1)");
    }

    #[test]
    fn writes_nested_chunk_paths() {
        let dir = TempDir::new().unwrap();
        let bundle = OutputBundle {
            chunks: vec![chunk("nested/dir/main.js", "x")],
            assets: vec![],
        };
        write_bundle(&bundle, dir.path(), SourceMapMode::Off).unwrap();
        assert!(dir.path().join("nested/dir/main.js").exists());
    }

    #[test]
    fn writes_asset_alongside_chunks() {
        let dir = TempDir::new().unwrap();
        let bundle = OutputBundle {
            chunks: vec![chunk("main.js", "x")],
            assets: vec![OutputAsset {
                file_name: "assets/logo-abcd1234.png".into(),
                source: vec![1, 2, 3],
            }],
        };
        write_bundle(&bundle, dir.path(), SourceMapMode::Off).unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("assets/logo-abcd1234.png")).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let bundle = OutputBundle {
            chunks: vec![chunk("../../etc/passwd", "x")],
            assets: vec![],
        };
        let err = write_bundle(&bundle, dir.path(), SourceMapMode::Off).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_OPTION");
    }

    #[test]
    fn rejects_null_byte_in_file_name() {
        let dir = TempDir::new().unwrap();
        let bundle = OutputBundle {
            chunks: vec![chunk("main\0.js", "x")],
            assets: vec![],
        };
        let err = write_bundle(&bundle, dir.path(), SourceMapMode::Off).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_OPTION");
    }

    #[test]
    fn external_sourcemap_is_written_as_sibling() {
        let dir = TempDir::new().unwrap();
        let mut c = chunk("main.js", "x");
        c.map = Some(crate::output::SourceMap {
            json: "{\"version\":3}".into(),
        });
        let bundle = OutputBundle {
            chunks: vec![c],
            assets: vec![],
        };
        write_bundle(&bundle, dir.path(), SourceMapMode::External).unwrap();
        assert!(dir.path().join("main.js.map").exists());
        let code = std::fs::read_to_string(dir.path().join("main.js")).unwrap();
        assert!(code.contains("sourceMappingURL=main.js.map"));
    }
}
