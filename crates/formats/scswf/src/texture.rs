//! Texture tags: filter/layout flags encoded in the tag id, pixel payload
//! framed by the pixel codec.

use crate::cursor::{Cursor, Writer};
use crate::error::Result;
use crate::pixel::{self, PixelFormat};
use crate::raster::Raster;

/// OpenGL-style texture filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Linear,
    Nearest,
    LinearMipmapNearest,
}

/// One row of the texture tag table. `None` layout bits match any value on
/// save and leave the texture defaults untouched on load.
struct TagSpec {
    tag: u8,
    mag: Filter,
    min: Filter,
    linear: Option<bool>,
    downscaling: Option<bool>,
}

#[rustfmt::skip]
const TAG_TABLE: [TagSpec; 8] = [
    TagSpec { tag: 1, mag: Filter::Linear, min: Filter::Nearest, linear: Some(true), downscaling: Some(true) },
    TagSpec { tag: 16, mag: Filter::Linear, min: Filter::LinearMipmapNearest, linear: Some(true), downscaling: Some(true) },
    TagSpec { tag: 19, mag: Filter::Linear, min: Filter::LinearMipmapNearest, linear: Some(true), downscaling: Some(false) },
    TagSpec { tag: 24, mag: Filter::Linear, min: Filter::Nearest, linear: Some(true), downscaling: Some(false) },
    TagSpec { tag: 27, mag: Filter::Linear, min: Filter::Nearest, linear: Some(false), downscaling: Some(false) },
    TagSpec { tag: 28, mag: Filter::Linear, min: Filter::Nearest, linear: Some(false), downscaling: Some(true) },
    TagSpec { tag: 29, mag: Filter::Linear, min: Filter::LinearMipmapNearest, linear: Some(false), downscaling: Some(true) },
    TagSpec { tag: 34, mag: Filter::Nearest, min: Filter::Nearest, linear: None, downscaling: None },
];

/// Fallback when no table row matches a texture's flags on save.
const FALLBACK_TAG: u8 = 1;

/// A sprite-sheet texture.
///
/// `pixels` is `None` when the document stores pixel data externally and the
/// current file did not provide it; `width`/`height` are always known.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub pixel_format: PixelFormat,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    /// Row-major payload when true, 32×32-block payload when false.
    pub linear: bool,
    /// Whether mipmap generation is permitted for this texture.
    pub downscaling: bool,
    pub width: u16,
    pub height: u16,
    pub pixels: Option<Raster>,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::RGBA8,
            mag_filter: Filter::Linear,
            min_filter: Filter::Nearest,
            linear: true,
            downscaling: true,
            width: 0,
            height: 0,
            pixels: None,
        }
    }
}

impl Texture {
    /// Build a texture around an existing raster.
    pub fn with_pixels(pixel_format: PixelFormat, raster: Raster) -> Self {
        Self {
            pixel_format,
            width: raster.width(),
            height: raster.height(),
            pixels: Some(raster),
            ..Self::default()
        }
    }

    /// Whether a tag id introduces a texture record.
    pub fn is_texture_tag(tag: u8) -> bool {
        TAG_TABLE.iter().any(|row| row.tag == tag)
    }

    /// Parse a texture tag payload. `with_pixels` is false when the document
    /// stores pixel data in an external companion file.
    pub fn parse(c: &mut Cursor, tag: u8, with_pixels: bool) -> Result<Self> {
        let mut texture = Self::default();
        if let Some(row) = TAG_TABLE.iter().find(|row| row.tag == tag) {
            texture.mag_filter = row.mag;
            texture.min_filter = row.min;
            if let Some(linear) = row.linear {
                texture.linear = linear;
            }
            if let Some(downscaling) = row.downscaling {
                texture.downscaling = downscaling;
            }
        }

        texture.pixel_format = PixelFormat::from_index(c.read_u8()?)?;
        texture.width = c.read_u16()?;
        texture.height = c.read_u16()?;
        if with_pixels {
            texture.pixels = Some(pixel::decode_raster(
                c,
                texture.pixel_format,
                texture.width,
                texture.height,
                texture.linear,
            )?);
        }
        Ok(texture)
    }

    /// Emit this texture as a complete tag. `include_pixels` is false for the
    /// main file of a document with external textures.
    ///
    /// When the declared format's channel layout disagrees with the raster,
    /// the format is silently rewritten to the default for the raster's
    /// channel kind before encoding.
    pub fn write(&self, w: &mut Writer, include_pixels: bool) -> Result<()> {
        self.write_scaled(w, include_pixels, None)
    }

    /// Like [`Texture::write`], but encodes `raster` in place of the
    /// texture's own pixels (used for downscaled companion files).
    pub fn write_scaled(
        &self,
        w: &mut Writer,
        include_pixels: bool,
        raster: Option<&Raster>,
    ) -> Result<()> {
        let raster = raster.or(self.pixels.as_ref());
        let format = match raster {
            Some(r) if r.kind() != self.pixel_format.channel_kind() => {
                PixelFormat::default_for(r.kind())
            }
            _ => self.pixel_format,
        };

        let mut payload = Writer::new();
        payload.write_u8(format.index());
        match raster {
            Some(r) => {
                payload.write_u16(r.width());
                payload.write_u16(r.height());
                if include_pixels {
                    pixel::encode_raster(&mut payload, format, r, self.linear)?;
                }
            }
            None => {
                payload.write_u16(self.width);
                payload.write_u16(self.height);
            }
        }

        w.save_tag(self.select_tag(), payload.as_bytes());
        Ok(())
    }

    /// The lowest tag id whose table row matches this texture's flags.
    fn select_tag(&self) -> u8 {
        TAG_TABLE
            .iter()
            .find(|row| {
                row.mag == self.mag_filter
                    && row.min == self.min_filter
                    && row.linear.map_or(true, |v| v == self.linear)
                    && row.downscaling.map_or(true, |v| v == self.downscaling)
            })
            .map_or(FALLBACK_TAG, |row| row.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ChannelKind;

    fn checker(width: u16, height: u16) -> Raster {
        let mut raster = Raster::new(width, height, ChannelKind::Rgba);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let v = if (x + y) % 2 == 0 { 255 } else { 10 };
                raster.set(x, y, &[v, 0, v, 255]);
            }
        }
        raster
    }

    #[test]
    fn tag_selection_prefers_lowest_match() {
        let mut texture = Texture::with_pixels(PixelFormat::RGBA8, checker(2, 2));
        assert_eq!(texture.select_tag(), 1);

        texture.linear = false;
        assert_eq!(texture.select_tag(), 28);

        texture.downscaling = false;
        assert_eq!(texture.select_tag(), 27);

        texture.mag_filter = Filter::Nearest;
        texture.min_filter = Filter::Nearest;
        assert_eq!(texture.select_tag(), 34);
    }

    #[test]
    fn tag_selection_falls_back_to_one() {
        let mut texture = Texture::with_pixels(PixelFormat::RGBA8, checker(2, 2));
        texture.min_filter = Filter::LinearMipmapNearest;
        texture.linear = false;
        texture.downscaling = false;
        assert_eq!(texture.select_tag(), 1);
    }

    #[test]
    fn tag_round_trip() {
        let texture = Texture::with_pixels(PixelFormat::RGBA8, checker(3, 2));

        let mut w = Writer::new();
        texture.write(&mut w, true).unwrap();
        let bytes = w.into_bytes();

        let mut c = Cursor::new(&bytes);
        let (tag, length) = c.read_tag_header().unwrap();
        assert_eq!(tag, 1);
        assert_eq!(length, 1 + 2 + 2 + 3 * 2 * 4);

        let parsed = Texture::parse(&mut c, tag, true).unwrap();
        assert_eq!(parsed, texture);
        assert!(c.is_empty());
    }

    #[test]
    fn headerless_payload_when_external() {
        let texture = Texture::with_pixels(PixelFormat::RGBA8, checker(4, 4));
        let mut w = Writer::new();
        texture.write(&mut w, false).unwrap();

        let mut c = Cursor::new(w.as_bytes());
        let (_, length) = c.read_tag_header().unwrap();
        assert_eq!(length, 5);
    }

    #[test]
    fn mismatched_format_is_rewritten() {
        let raster = Raster::new(2, 2, ChannelKind::Luminance);
        let texture = Texture::with_pixels(PixelFormat::RGBA8, raster);

        let mut w = Writer::new();
        texture.write(&mut w, true).unwrap();

        let mut c = Cursor::new(w.as_bytes());
        let (tag, _) = c.read_tag_header().unwrap();
        let parsed = Texture::parse(&mut c, tag, true).unwrap();
        assert_eq!(parsed.pixel_format, PixelFormat::LUMINANCE8);
    }
}
