//! Per-module transform state, carried across builds by the embedder
//! (§4.4, `Build::cache()` / `InputOptions::cache`).

use serde::{Deserialize, Serialize};

/// An opaque, serializable snapshot handed back by `Build::cache()` and fed
/// into the next build's `InputOptions::cache` to let the `Graph` skip
/// re-transforming unchanged modules. The core never inspects its contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub modules: rustc_hash::FxHashMap<String, Vec<u8>>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
