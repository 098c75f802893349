//! Reader/writer for the SupercellSWF (`.sc`) animation asset container.
//!
//! Three-layer architecture:
//! - **Layer 1** (`compression`/`cursor`): raw byte I/O — whole-file
//!   compression envelopes, little-endian cursor, tag framing
//! - **Layer 2** (`pixel`/`texture`/`transform`/`record`): typed codecs for
//!   individual tag payloads
//! - **Layer 3** (`reader`/`writer`/`document`): whole-document
//!   orchestration — header, emit order, external texture companion files

pub mod compression;
pub mod cursor;
pub mod document;
pub mod error;
pub mod pixel;
pub mod progress;
pub mod raster;
pub mod record;
mod reader;
pub mod tags;
pub mod texture;
pub mod transform;
mod writer;

pub use compression::CompressionMethod;
pub use document::SupercellSwf;
pub use error::{Error, Result};
