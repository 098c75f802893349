//! Whole-file compression envelopes.
//!
//! An `.sc` payload is wrapped in one of four envelopes: raw bytes, a classic
//! LZMA1 stream (5-byte properties + `u32` LE uncompressed size), an LZHAM
//! wrapper marked `SCLZ`, or a standard Zstandard frame. An optional outer
//! container header (`SC` magic, version, 16-byte metadata hash) may prefix
//! any of these and is stripped before method detection.

use crate::error::{Error, Result};

/// Outer container magic: `"SC"` + 4 version bytes.
const OUTER_MAGIC: &[u8; 2] = b"SC";
/// Outer envelope size: 2-byte magic + 4-byte version + 16-byte metadata hash.
const OUTER_LEN: usize = 22;

/// Ceiling for a header-declared uncompressed size. A crafted header can
/// otherwise force a multi-gigabyte allocation before any payload byte is
/// decoded.
const MAX_DECOMPRESSED_LEN: usize = 1 << 30;

/// LZHAM wrapper magic.
const LZHAM_MAGIC: &[u8; 4] = b"SCLZ";
/// Zstandard frame magic (little-endian `0xFD2FB528`).
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression method applied to a whole `.sc` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    None,
    Lzma,
    Lzham,
    Zstd,
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompressionMethod::None => "none",
            CompressionMethod::Lzma => "LZMA",
            CompressionMethod::Lzham => "LZHAM",
            CompressionMethod::Zstd => "Zstd",
        };
        write!(f, "{name}")
    }
}

/// Detect the compression envelope of `data` and unwrap it.
///
/// Detection inspects the leading bytes: outer `SC` container (stripped
/// first), then the `SCLZ` LZHAM magic, then the Zstd frame magic, then an
/// LZMA properties-byte heuristic. An unrecognised stream is returned as
/// [`CompressionMethod::None`] with only the outer container header (when
/// present) removed; the tag reader will reject malformed headers later.
/// Failure to decode a *recognised* envelope is
/// [`Error::CompressionFailure`].
pub fn decompress(data: &[u8]) -> Result<(CompressionMethod, Vec<u8>)> {
    let body = strip_outer(data);

    if body.starts_with(LZHAM_MAGIC) {
        // No portable LZHAM decoder exists; refusing beats mis-decoding.
        return Err(Error::CompressionFailure {
            method: CompressionMethod::Lzham,
            message: "LZHAM streams are not supported".into(),
        });
    }

    if body.len() >= 4 && body[..4] == ZSTD_MAGIC {
        tracing::debug!(len = body.len(), "detected Zstd envelope");
        let plain = zstd::decode_all(body).map_err(|e| Error::CompressionFailure {
            method: CompressionMethod::Zstd,
            message: e.to_string(),
        })?;
        return Ok((CompressionMethod::Zstd, plain));
    }

    if looks_like_lzma(body) {
        tracing::debug!(len = body.len(), "detected LZMA envelope");
        let plain = decompress_lzma(body)?;
        return Ok((CompressionMethod::Lzma, plain));
    }

    Ok((CompressionMethod::None, body.to_vec()))
}

/// Wrap `plain` in the given envelope. The output is classified back to the
/// same method by [`decompress`] and decodes to `plain` byte-for-byte.
pub fn compress(method: CompressionMethod, plain: &[u8]) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(plain.to_vec()),
        CompressionMethod::Lzma => compress_lzma(plain),
        CompressionMethod::Lzham => Err(Error::CompressionFailure {
            method: CompressionMethod::Lzham,
            message: "LZHAM streams are not supported".into(),
        }),
        CompressionMethod::Zstd => {
            zstd::encode_all(plain, 0).map_err(|e| Error::CompressionFailure {
                method: CompressionMethod::Zstd,
                message: e.to_string(),
            })
        }
    }
}

/// Strip the optional outer `SC` container header.
fn strip_outer(data: &[u8]) -> &[u8] {
    if data.len() >= OUTER_LEN && data.starts_with(OUTER_MAGIC) {
        return &data[OUTER_LEN..];
    }
    data
}

/// Heuristic for a classic LZMA1 header: a valid properties byte, a
/// plausible dictionary size (`2^n` or `3 * 2^n`, 4 KiB..1 GiB), and a
/// non-zero `u32` uncompressed size. Plain tag streams begin with small
/// little-endian counts and fail the dictionary check.
fn looks_like_lzma(data: &[u8]) -> bool {
    if data.len() < 13 {
        return false;
    }
    // properties = (pb * 5 + lp) * 9 + lc, always < 225
    if data[0] >= 225 {
        return false;
    }
    let dict = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    if dict < (1 << 12) || dict > (1 << 30) {
        return false;
    }
    if !(dict.is_power_of_two() || (dict % 3 == 0 && (dict / 3).is_power_of_two())) {
        return false;
    }
    u32::from_le_bytes([data[5], data[6], data[7], data[8]]) != 0
}

/// Decode a classic LZMA1 stream: 5-byte properties, `u32` LE uncompressed
/// size, then the compressed payload.
fn decompress_lzma(data: &[u8]) -> Result<Vec<u8>> {
    let unpacked = u32::from_le_bytes([data[5], data[6], data[7], data[8]]);
    if unpacked as usize > MAX_DECOMPRESSED_LEN {
        return Err(Error::CompressionFailure {
            method: CompressionMethod::Lzma,
            message: format!("declared uncompressed size {unpacked} exceeds limit"),
        });
    }

    // lzma-rs expects properties immediately followed by the payload when
    // the unpacked size is supplied out of band.
    let mut stream = Vec::with_capacity(data.len() - 4);
    stream.extend_from_slice(&data[..5]);
    stream.extend_from_slice(&data[9..]);

    let options = lzma_rs::decompress::Options {
        unpacked_size: lzma_rs::decompress::UnpackedSize::UseProvided(Some(u64::from(unpacked))),
        ..Default::default()
    };

    let mut plain = Vec::with_capacity(unpacked as usize);
    lzma_rs::lzma_decompress_with_options(&mut &stream[..], &mut plain, &options).map_err(
        |e| Error::CompressionFailure {
            method: CompressionMethod::Lzma,
            message: e.to_string(),
        },
    )?;
    Ok(plain)
}

/// Encode `plain` as a classic LZMA1 stream with the 4-byte size field.
fn compress_lzma(plain: &[u8]) -> Result<Vec<u8>> {
    let options = lzma_rs::compress::Options {
        unpacked_size: lzma_rs::compress::UnpackedSize::SkipWritingToHeader,
    };

    let mut stream = Vec::new();
    lzma_rs::lzma_compress_with_options(&mut &plain[..], &mut stream, &options).map_err(|e| {
        Error::CompressionFailure {
            method: CompressionMethod::Lzma,
            message: e.to_string(),
        }
    })?;

    // Splice the u32 uncompressed size between the properties and the payload.
    let mut framed = Vec::with_capacity(stream.len() + 4);
    framed.extend_from_slice(&stream[..5]);
    framed.extend_from_slice(&(plain.len() as u32).to_le_bytes());
    framed.extend_from_slice(&stream[5..]);
    Ok(framed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"the quick brown fox jumps over the lazy dog, twice over";

    #[test]
    fn none_round_trip() {
        let packed = compress(CompressionMethod::None, SAMPLE).unwrap();
        let (method, plain) = decompress(&packed).unwrap();
        assert_eq!(method, CompressionMethod::None);
        assert_eq!(plain, SAMPLE);
    }

    #[test]
    fn lzma_round_trip() {
        let packed = compress(CompressionMethod::Lzma, SAMPLE).unwrap();
        let (method, plain) = decompress(&packed).unwrap();
        assert_eq!(method, CompressionMethod::Lzma);
        assert_eq!(plain, SAMPLE);
    }

    #[test]
    fn zstd_round_trip() {
        let packed = compress(CompressionMethod::Zstd, SAMPLE).unwrap();
        let (method, plain) = decompress(&packed).unwrap();
        assert_eq!(method, CompressionMethod::Zstd);
        assert_eq!(plain, SAMPLE);
    }

    #[test]
    fn plain_tag_stream_stays_plain() {
        // A typical uncompressed header: small LE counts, zero reserved bytes.
        let header = [0u8, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let (method, plain) = decompress(&header).unwrap();
        assert_eq!(method, CompressionMethod::None);
        assert_eq!(plain, header);
    }

    #[test]
    fn outer_envelope_is_stripped() {
        let packed = compress(CompressionMethod::Zstd, SAMPLE).unwrap();
        let mut outer = Vec::new();
        outer.extend_from_slice(b"SC");
        outer.extend_from_slice(&[0, 0, 0, 3]); // version
        outer.extend_from_slice(&[0u8; 16]); // metadata hash
        outer.extend_from_slice(&packed);

        let (method, plain) = decompress(&outer).unwrap();
        assert_eq!(method, CompressionMethod::Zstd);
        assert_eq!(plain, SAMPLE);
    }

    #[test]
    fn outer_envelope_over_plain_payload_is_stripped() {
        let mut outer = Vec::new();
        outer.extend_from_slice(b"SC");
        outer.extend_from_slice(&[0, 0, 0, 1]); // version
        outer.extend_from_slice(&[0u8; 16]); // metadata hash
        outer.extend_from_slice(SAMPLE);

        let (method, plain) = decompress(&outer).unwrap();
        assert_eq!(method, CompressionMethod::None);
        assert_eq!(plain, SAMPLE);
    }

    #[test]
    fn oversized_lzma_declaration_is_refused() {
        // Valid properties byte and dictionary size, absurd declared size.
        let mut data = vec![0x5D, 0, 0, 0x80, 0];
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);

        let err = decompress(&data).unwrap_err();
        assert!(matches!(
            err,
            Error::CompressionFailure {
                method: CompressionMethod::Lzma,
                ..
            }
        ));
    }

    #[test]
    fn lzham_is_refused() {
        let mut data = Vec::new();
        data.extend_from_slice(b"SCLZ");
        data.extend_from_slice(&[18, 64, 0, 0, 0]);
        let err = decompress(&data).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::CompressionFailure {
                method: CompressionMethod::Lzham,
                ..
            }
        ));
    }

    #[test]
    fn lzham_compression_is_refused() {
        assert!(compress(CompressionMethod::Lzham, SAMPLE).is_err());
    }
}
