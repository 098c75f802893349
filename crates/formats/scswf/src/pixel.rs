//! Packed pixel formats and payload layouts.
//!
//! Eleven indexed formats map onto five packings (RGBA8888, RGBA4444,
//! RGBA5551, RGB565, luminance with or without alpha). Payloads are stored
//! either row-major (`linear`) or tiled in 32×32 row-major blocks with
//! truncated tail blocks.

use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::raster::{ChannelKind, Raster};

/// Side length of a tile in the block layout.
const BLOCK_SIZE: usize = 32;

/// Indexed pixel format as carried in a texture tag.
///
/// Indices 0..=10 are valid; several indices share a packing but differ in
/// the OpenGL upload format they map to, so the index itself is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat(u8);

/// Per-pixel byte packing behind a format index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packing {
    Rgba8888,
    Rgba4444,
    Rgba5551,
    Rgb565,
    LuminanceAlpha88,
    Luminance8,
}

impl PixelFormat {
    pub const RGBA8: Self = Self(0);
    pub const RGBA4: Self = Self(2);
    pub const RGB5_A1: Self = Self(3);
    pub const RGB565: Self = Self(4);
    pub const LUMINANCE8_ALPHA8: Self = Self(6);
    pub const LUMINANCE8: Self = Self(10);

    /// Validate a format index read from a stream.
    pub fn from_index(index: u8) -> Result<Self> {
        if index > 10 {
            return Err(Error::UnknownPixelFormat { index });
        }
        Ok(Self(index))
    }

    /// The wire index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// The default format for a raster's channel layout. Used when a
    /// texture's declared format disagrees with its pixel data.
    pub fn default_for(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Rgba => Self::RGBA8,
            ChannelKind::Rgb => Self::RGB565,
            ChannelKind::LuminanceAlpha => Self::LUMINANCE8_ALPHA8,
            ChannelKind::Luminance => Self::LUMINANCE8,
        }
    }

    pub fn channel_kind(self) -> ChannelKind {
        match self.packing() {
            Packing::Rgba8888 | Packing::Rgba4444 | Packing::Rgba5551 => ChannelKind::Rgba,
            Packing::Rgb565 => ChannelKind::Rgb,
            Packing::LuminanceAlpha88 => ChannelKind::LuminanceAlpha,
            Packing::Luminance8 => ChannelKind::Luminance,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self.packing() {
            Packing::Rgba8888 => 4,
            Packing::Rgba4444
            | Packing::Rgba5551
            | Packing::Rgb565
            | Packing::LuminanceAlpha88 => 2,
            Packing::Luminance8 => 1,
        }
    }

    fn packing(self) -> Packing {
        match self.0 {
            0 | 1 | 5 | 7 | 8 => Packing::Rgba8888,
            2 | 9 => Packing::Rgba4444,
            3 => Packing::Rgba5551,
            4 => Packing::Rgb565,
            6 => Packing::LuminanceAlpha88,
            10 => Packing::Luminance8,
            // from_index is the only constructor
            _ => unreachable!("pixel format index out of range"),
        }
    }
}

/// Decode a pixel payload into a raster.
pub fn decode_raster(
    c: &mut Cursor,
    format: PixelFormat,
    width: u16,
    height: u16,
    linear: bool,
) -> Result<Raster> {
    let kind = format.channel_kind();
    let channels = kind.channels();
    let mut raster = Raster::new(width, height, kind);
    let mut pixel = [0u8; 4];
    walk(width as usize, height as usize, linear, |x, y| {
        read_pixel(c, format, &mut pixel)?;
        raster.set(x, y, &pixel[..channels]);
        Ok(())
    })?;
    Ok(raster)
}

/// Encode a raster as a pixel payload.
///
/// Pixels with a zero alpha byte are written as all-zero channels
/// (pre-multiplied opaque black), matching the producer of these files.
pub fn encode_raster(
    w: &mut Writer,
    format: PixelFormat,
    raster: &Raster,
    linear: bool,
) -> Result<()> {
    let has_alpha = format.channel_kind().has_alpha();
    let channels = format.channel_kind().channels();
    let zero = [0u8; 4];
    walk(
        raster.width() as usize,
        raster.height() as usize,
        linear,
        |x, y| {
            let mut pixel = raster.get(x, y);
            if has_alpha && pixel[channels - 1] == 0 {
                pixel = &zero[..channels];
            }
            write_pixel(w, format, pixel);
            Ok(())
        },
    )
}

/// Visit every pixel coordinate in payload order.
///
/// Linear order is row-major over the whole image. Block order tiles the
/// image with 32×32 blocks in row-major order and walks each block
/// row-major; tail blocks on the right/bottom edges are truncated to the
/// remaining pixels, not padded.
fn walk(
    width: usize,
    height: usize,
    linear: bool,
    mut visit: impl FnMut(usize, usize) -> Result<()>,
) -> Result<()> {
    if linear {
        for y in 0..height {
            for x in 0..width {
                visit(x, y)?;
            }
        }
        return Ok(());
    }

    for block_y in 0..height.div_ceil(BLOCK_SIZE) {
        let y_end = ((block_y + 1) * BLOCK_SIZE).min(height);
        for block_x in 0..width.div_ceil(BLOCK_SIZE) {
            let x_end = ((block_x + 1) * BLOCK_SIZE).min(width);
            for y in block_y * BLOCK_SIZE..y_end {
                for x in block_x * BLOCK_SIZE..x_end {
                    visit(x, y)?;
                }
            }
        }
    }
    Ok(())
}

/// Round an 8-bit channel down to `max` levels.
fn quantize(v: u8, max: u32) -> u16 {
    ((v as u32 * max + 127) / 255) as u16
}

/// Expand a quantized channel back to 8 bits.
fn expand(v: u16, max: u32) -> u8 {
    ((v as u32 * 255 + max / 2) / max) as u8
}

fn read_pixel(c: &mut Cursor, format: PixelFormat, out: &mut [u8; 4]) -> Result<()> {
    match format.packing() {
        Packing::Rgba8888 => {
            let bytes = c.read_bytes(4)?;
            out[..4].copy_from_slice(bytes);
        }
        Packing::Rgba4444 => {
            let v = c.read_u16()?;
            out[0] = expand((v >> 12) & 0xF, 15);
            out[1] = expand((v >> 8) & 0xF, 15);
            out[2] = expand((v >> 4) & 0xF, 15);
            out[3] = expand(v & 0xF, 15);
        }
        Packing::Rgba5551 => {
            let v = c.read_u16()?;
            out[0] = expand((v >> 11) & 0x1F, 31);
            out[1] = expand((v >> 6) & 0x1F, 31);
            out[2] = expand((v >> 1) & 0x1F, 31);
            out[3] = expand(v & 0x1, 1);
        }
        Packing::Rgb565 => {
            let v = c.read_u16()?;
            out[0] = expand((v >> 11) & 0x1F, 31);
            out[1] = expand((v >> 5) & 0x3F, 63);
            out[2] = expand(v & 0x1F, 31);
        }
        Packing::LuminanceAlpha88 => {
            let bytes = c.read_bytes(2)?;
            out[0] = bytes[0];
            out[1] = bytes[1];
        }
        Packing::Luminance8 => {
            out[0] = c.read_u8()?;
        }
    }
    Ok(())
}

fn write_pixel(w: &mut Writer, format: PixelFormat, pixel: &[u8]) {
    match format.packing() {
        Packing::Rgba8888 => w.write_bytes(&pixel[..4]),
        Packing::Rgba4444 => {
            let v = (quantize(pixel[0], 15) << 12)
                | (quantize(pixel[1], 15) << 8)
                | (quantize(pixel[2], 15) << 4)
                | quantize(pixel[3], 15);
            w.write_u16(v);
        }
        Packing::Rgba5551 => {
            let v = (quantize(pixel[0], 31) << 11)
                | (quantize(pixel[1], 31) << 6)
                | (quantize(pixel[2], 31) << 1)
                | quantize(pixel[3], 1);
            w.write_u16(v);
        }
        Packing::Rgb565 => {
            let v = (quantize(pixel[0], 31) << 11)
                | (quantize(pixel[1], 63) << 5)
                | quantize(pixel[2], 31);
            w.write_u16(v);
        }
        Packing::LuminanceAlpha88 => w.write_bytes(&pixel[..2]),
        Packing::Luminance8 => w.write_u8(pixel[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_index_bounds() {
        assert!(PixelFormat::from_index(10).is_ok());
        assert!(matches!(
            PixelFormat::from_index(11),
            Err(Error::UnknownPixelFormat { index: 11 })
        ));
    }

    #[test]
    fn four_bit_channels_are_stable() {
        // Writing then reading an 8-bit value lands on the nearest 4-bit
        // level; re-encoding that level is lossless.
        for v in 0..=255u8 {
            let mut w = Writer::new();
            write_pixel(&mut w, PixelFormat::RGBA4, &[v, v, v, 255]);
            let bytes = w.into_bytes();
            let mut pixel = [0u8; 4];
            read_pixel(&mut Cursor::new(&bytes), PixelFormat::RGBA4, &mut pixel).unwrap();

            let level = quantize(v, 15);
            assert_eq!(pixel[0], expand(level, 15));

            let mut w2 = Writer::new();
            write_pixel(&mut w2, PixelFormat::RGBA4, &pixel);
            assert_eq!(w2.as_bytes(), bytes);
        }
    }

    #[test]
    fn rgb565_packs_expected_bits() {
        let mut w = Writer::new();
        write_pixel(&mut w, PixelFormat::RGB565, &[255, 0, 255]);
        let v = u16::from_le_bytes([w.as_bytes()[0], w.as_bytes()[1]]);
        assert_eq!(v, 0b11111_000000_11111);
    }

    #[test]
    fn zero_alpha_writes_zero_channels() {
        let mut w = Writer::new();
        let mut raster = Raster::new(1, 1, ChannelKind::Rgba);
        raster.set(0, 0, &[200, 100, 50, 0]);
        encode_raster(&mut w, PixelFormat::RGBA8, &raster, true).unwrap();
        assert_eq!(w.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn block_walk_order_for_wide_image() {
        // 33×2: one full-width column block plus a truncated 1-pixel block.
        let mut order = Vec::new();
        walk(33, 2, false, |x, y| {
            order.push((x, y));
            Ok(())
        })
        .unwrap();

        let mut expected: Vec<(usize, usize)> = Vec::new();
        for y in 0..2 {
            for x in 0..32 {
                expected.push((x, y));
            }
        }
        expected.push((32, 0));
        expected.push((32, 1));
        assert_eq!(order, expected);
    }

    #[test]
    fn small_block_walk_matches_linear() {
        let mut block = Vec::new();
        walk(2, 2, false, |x, y| {
            block.push((x, y));
            Ok(())
        })
        .unwrap();
        let mut linear = Vec::new();
        walk(2, 2, true, |x, y| {
            linear.push((x, y));
            Ok(())
        })
        .unwrap();
        assert_eq!(block, linear);
    }

    #[test]
    fn block_and_linear_round_trip_same_pixels() {
        let mut raster = Raster::new(40, 35, ChannelKind::Luminance);
        for y in 0..35 {
            for x in 0..40 {
                raster.set(x, y, &[((x * 7 + y * 13) % 256) as u8]);
            }
        }

        for linear in [true, false] {
            let mut w = Writer::new();
            encode_raster(&mut w, PixelFormat::LUMINANCE8, &raster, linear).unwrap();
            let bytes = w.into_bytes();
            assert_eq!(bytes.len(), 40 * 35);

            let decoded =
                decode_raster(&mut Cursor::new(&bytes), PixelFormat::LUMINANCE8, 40, 35, linear)
                    .unwrap();
            assert_eq!(decoded, raster);
        }
    }
}
