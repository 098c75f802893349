use thiserror::Error;

use crate::compression::CompressionMethod;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    Truncated {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("tag {tag} declares negative payload length {length}")]
    NegativeLength { tag: u8, length: i32 },

    #[error("stream contains more {kind} records than the {declared} declared")]
    CountOverflow { kind: &'static str, declared: u16 },

    #[error("unknown pixel format index {index}")]
    UnknownPixelFormat { index: u8 },

    #[error("no external texture file found for {base:?}")]
    MissingExternalTexture { base: String },

    #[error("{method} decompression failed: {message}")]
    CompressionFailure {
        method: CompressionMethod,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
