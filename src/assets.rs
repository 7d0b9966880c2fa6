//! The Asset Registry (§4.6): tracks emitted assets from `emitAsset` through
//! deferred filename finalization, expanding `[name]`/`[hash]`/`[extname]`/
//! `[ext]` placeholders and disambiguating collisions.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct AssetEntry {
    name: String,
    source: Option<Vec<u8>>,
    file_name: Option<String>,
}

struct Inner {
    assets: FxHashMap<String, AssetEntry>,
    next_id: AtomicU64,
}

/// Shared, cloneable handle to one build's asset table. A `Graph` owns one
/// instance and hands clones to every `PluginContext` created over its
/// lifetime (§4.6).
pub struct AssetRegistry {
    inner: RwLock<Inner>,
    prefix: &'static str,
}

impl AssetRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_prefix("asset")
    }

    /// A registry whose ids never collide with another registry's, used for
    /// the per-generate-call scratch table (§4.2, §4.6): assets a
    /// `generateBundle` plugin emits get a `genasset_*` id distinct from any
    /// `asset_*` id the Graph's own registry has already handed out.
    pub fn new_scoped() -> Arc<Self> {
        Self::with_prefix("genasset")
    }

    fn with_prefix(prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Inner {
                assets: FxHashMap::default(),
                next_id: AtomicU64::new(1),
            }),
            prefix,
        })
    }

    /// Registers a new asset under `name`, without a source yet. Returns the
    /// fresh asset id.
    pub fn emit(&self, name: String) -> String {
        let mut inner = self.inner.write();
        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let asset_id = format!("{}_{id:x}", self.prefix);
        inner.assets.insert(
            asset_id.clone(),
            AssetEntry {
                name,
                source: None,
                file_name: None,
            },
        );
        asset_id
    }

    /// Whether `asset_id` belongs to this registry's id namespace, used by a
    /// derived `PluginContext` to route a capability call to the right table.
    pub fn owns(&self, asset_id: &str) -> bool {
        asset_id.starts_with(self.prefix) && asset_id[self.prefix.len()..].starts_with('_')
    }

    /// Attaches the byte source to a previously emitted asset. An asset may
    /// only be given a source once (§4.6 invariant).
    pub fn set_source(&self, asset_id: &str, source: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner
            .assets
            .get_mut(asset_id)
            .ok_or_else(|| Error::UnknownAsset {
                asset_id: asset_id.to_string(),
            })?;
        if entry.source.is_some() {
            return Err(Error::AssetFinalized {
                asset_id: asset_id.to_string(),
            });
        }
        entry.source = Some(source);
        Ok(())
    }

    /// The asset's final file name, computed lazily from its name template
    /// on first access and then cached (§4.6, "finalization is deferred").
    pub fn file_name(&self, asset_id: &str) -> Result<String> {
        let mut inner = self.inner.write();
        let existing = inner
            .assets
            .get(asset_id)
            .ok_or_else(|| Error::UnknownAsset {
                asset_id: asset_id.to_string(),
            })?
            .file_name
            .clone();
        if let Some(name) = existing {
            return Ok(name);
        }

        let (name, source) = {
            let entry = inner.assets.get(asset_id).unwrap();
            (entry.name.clone(), entry.source.clone())
        };
        let source = source.ok_or_else(|| Error::AssetSourceMissing {
            asset_id: asset_id.to_string(),
            name: name.clone(),
        })?;

        let finalized = finalize_file_name(
            "assets/[name]-[hash][extname]",
            &name,
            &source,
            &taken_names(&inner.assets, asset_id),
        );
        inner.assets.get_mut(asset_id).unwrap().file_name = Some(finalized.clone());
        Ok(finalized)
    }

    /// Finalizes every remaining un-finalized asset using `pattern`, called
    /// once up front (§4.5 step 3) and again defensively after
    /// `generateBundle` to force-finalize anything emitted late (§4.5 step 15).
    pub fn finalize_all(&self, pattern: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let ids: Vec<String> = inner
            .assets
            .iter()
            .filter(|(_, e)| e.file_name.is_none())
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            let (name, source) = {
                let entry = inner.assets.get(&id).unwrap();
                (entry.name.clone(), entry.source.clone())
            };
            let source = source.ok_or_else(|| Error::AssetSourceMissing {
                asset_id: id.clone(),
                name: name.clone(),
            })?;
            let taken = taken_names(&inner.assets, &id);
            let finalized = finalize_file_name(pattern, &name, &source, &taken);
            inner.assets.get_mut(&id).unwrap().file_name = Some(finalized);
        }
        Ok(())
    }

    pub fn all_finalized(&self) -> Vec<(String, String, Vec<u8>)> {
        let inner = self.inner.read();
        inner
            .assets
            .iter()
            .filter_map(|(id, e)| {
                let file_name = e.file_name.clone()?;
                let source = e.source.clone()?;
                Some((id.clone(), file_name, source))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn taken_names(assets: &FxHashMap<String, AssetEntry>, exclude: &str) -> Vec<String> {
    assets
        .iter()
        .filter(|(id, _)| id.as_str() != exclude)
        .filter_map(|(_, e)| e.file_name.clone())
        .collect()
}

/// Expands `[name]`/`[hash]`/`[extname]`/`[ext]` in `pattern` and appends a
/// numeric suffix (`-1`, `-2`, ...) before the extension if the result
/// collides with an already-finalized name (§4.6).
fn finalize_file_name(pattern: &str, name: &str, source: &[u8], taken: &[String]) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let extname = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let ext = extname.trim_start_matches('.').to_string();
    let hash = &blake3::hash(source).to_hex().to_string()[..8];

    let expand = |stem: &str| -> String {
        pattern
            .replace("[name]", stem)
            .replace("[hash]", hash)
            .replace("[extname]", &extname)
            .replace("[ext]", &ext)
    };

    let mut candidate = expand(&stem);
    if !taken.iter().any(|t| t == &candidate) {
        return candidate;
    }

    let mut n = 1;
    loop {
        candidate = expand(&format!("{stem}{n}"));
        if !taken.iter().any(|t| t == &candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_then_set_source_then_finalize() {
        let registry = AssetRegistry::new();
        let id = registry.emit("logo.png".to_string());
        registry.set_source(&id, b"fake-png-bytes".to_vec()).unwrap();
        let file_name = registry.file_name(&id).unwrap();
        assert!(file_name.starts_with("assets/logo-"));
        assert!(file_name.ends_with(".png"));
    }

    #[test]
    fn setting_source_twice_is_an_error() {
        let registry = AssetRegistry::new();
        let id = registry.emit("logo.png".to_string());
        registry.set_source(&id, b"first".to_vec()).unwrap();
        let err = registry.set_source(&id, b"second".to_vec()).unwrap_err();
        assert_eq!(err.code().as_str(), "ASSET_FINALIZED");
    }

    #[test]
    fn file_name_without_source_is_an_error() {
        let registry = AssetRegistry::new();
        let id = registry.emit("logo.png".to_string());
        let err = registry.file_name(&id).unwrap_err();
        assert_eq!(err.code().as_str(), "ASSET_SOURCE_MISSING");
    }

    #[test]
    fn unknown_asset_id_is_an_error() {
        let registry = AssetRegistry::new();
        let err = registry.set_source("asset_99", vec![]).unwrap_err();
        assert_eq!(err.code().as_str(), "UNKNOWN_ASSET");
    }

    #[test]
    fn colliding_names_get_disambiguated() {
        let registry = AssetRegistry::new();
        let a = registry.emit("logo.png".to_string());
        let b = registry.emit("logo.png".to_string());
        registry.set_source(&a, b"same-bytes".to_vec()).unwrap();
        registry.set_source(&b, b"same-bytes".to_vec()).unwrap();
        let name_a = registry.file_name(&a).unwrap();
        let name_b = registry.file_name(&b).unwrap();
        assert_ne!(name_a, name_b);
    }

    #[test]
    fn finalize_all_settles_every_unfinalized_asset() {
        let registry = AssetRegistry::new();
        let a = registry.emit("a.css".to_string());
        let b = registry.emit("b.css".to_string());
        registry.set_source(&a, b"a".to_vec()).unwrap();
        registry.set_source(&b, b"b".to_vec()).unwrap();
        registry.finalize_all("assets/[name]-[hash][extname]").unwrap();
        assert_eq!(registry.all_finalized().len(), 2);
    }
}
