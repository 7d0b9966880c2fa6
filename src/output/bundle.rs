//! The bundle types returned by `generate()`/`write()` (§3).

use rustc_hash::FxHashMap;

/// A source map, opaque beyond what the writer needs to serialize it.
#[derive(Debug, Clone)]
pub struct SourceMap {
    pub json: String,
}

#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub file_name: String,
    pub code: String,
    pub map: Option<SourceMap>,
    pub is_entry: bool,
    pub is_dynamic_entry: bool,
    pub facade_module_id: Option<String>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OutputAsset {
    pub file_name: String,
    pub source: Vec<u8>,
}

/// The complete result of one generate call: every chunk and asset, keyed
/// by the `file_name` each will be written under (§4.5 step 4, "a fresh
/// OutputBundle").
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
    pub chunks: Vec<OutputChunk>,
    pub assets: Vec<OutputAsset>,
}

impl OutputBundle {
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.chunks
            .iter()
            .map(|c| c.file_name.as_str())
            .chain(self.assets.iter().map(|a| a.file_name.as_str()))
    }

    pub fn entry_chunks(&self) -> impl Iterator<Item = &OutputChunk> {
        self.chunks.iter().filter(|c| c.is_entry)
    }

    pub fn as_files(&self) -> FxHashMap<String, Vec<u8>> {
        let mut files = FxHashMap::default();
        for chunk in &self.chunks {
            files.insert(chunk.file_name.clone(), chunk.code.clone().into_bytes());
            if let Some(map) = &chunk.map {
                files.insert(format!("{}.map", chunk.file_name), map.json.clone().into_bytes());
            }
        }
        for asset in &self.assets {
            files.insert(asset.file_name.clone(), asset.source.clone());
        }
        files
    }
}
