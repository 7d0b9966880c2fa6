//! The rendered output of one generate call, and the writer that persists
//! it to disk (§4.5, §4.7).

mod bundle;
mod writer;

pub use bundle::{OutputAsset, OutputBundle, OutputChunk, SourceMap};
pub use writer::write_bundle;
