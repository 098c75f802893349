//! Transform banks: affine matrices and color transforms that movie-clip
//! frames reference by integer index.

use crate::cursor::{Cursor, Writer};
use crate::error::Result;

/// Fixed-point divisor for the scale/skew terms of the standard matrix form.
const SCALE_DIVISOR: f32 = 1024.0;
/// Divisor for the precise matrix form.
const PRECISE_DIVISOR: f32 = 65535.0;
/// Translation terms are stored in twips.
const TWIPS_PER_PIXEL: f32 = 20.0;

/// An affine 2×3 matrix entry.
///
/// On the wire: six little-endian `i32`s, `a b c d` scaled by 1024 (or by
/// 65535 in the precise form) and `tx ty` in twips. A matrix keeps the form
/// it was read in and is re-emitted the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
    pub precise: bool,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
            precise: false,
        }
    }
}

impl Matrix {
    pub fn parse(c: &mut Cursor, precise: bool) -> Result<Self> {
        let divisor = if precise { PRECISE_DIVISOR } else { SCALE_DIVISOR };
        Ok(Self {
            a: c.read_i32()? as f32 / divisor,
            b: c.read_i32()? as f32 / divisor,
            c: c.read_i32()? as f32 / divisor,
            d: c.read_i32()? as f32 / divisor,
            tx: c.read_i32()? as f32 / TWIPS_PER_PIXEL,
            ty: c.read_i32()? as f32 / TWIPS_PER_PIXEL,
            precise,
        })
    }

    /// Append the six fixed-point terms to `w`.
    pub fn write(&self, w: &mut Writer) {
        let divisor = if self.precise { PRECISE_DIVISOR } else { SCALE_DIVISOR };
        w.write_i32((self.a * divisor).round() as i32);
        w.write_i32((self.b * divisor).round() as i32);
        w.write_i32((self.c * divisor).round() as i32);
        w.write_i32((self.d * divisor).round() as i32);
        w.write_i32((self.tx * TWIPS_PER_PIXEL).round() as i32);
        w.write_i32((self.ty * TWIPS_PER_PIXEL).round() as i32);
    }
}

/// A color transform entry: additive RGB terms, then multiplicative
/// alpha/RGB terms, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTransform {
    pub red_add: u8,
    pub green_add: u8,
    pub blue_add: u8,
    pub alpha_mul: u8,
    pub red_mul: u8,
    pub green_mul: u8,
    pub blue_mul: u8,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self {
            red_add: 0,
            green_add: 0,
            blue_add: 0,
            alpha_mul: 255,
            red_mul: 255,
            green_mul: 255,
            blue_mul: 255,
        }
    }
}

impl ColorTransform {
    pub fn parse(c: &mut Cursor) -> Result<Self> {
        Ok(Self {
            red_add: c.read_u8()?,
            green_add: c.read_u8()?,
            blue_add: c.read_u8()?,
            alpha_mul: c.read_u8()?,
            red_mul: c.read_u8()?,
            green_mul: c.read_u8()?,
            blue_mul: c.read_u8()?,
        })
    }

    pub fn write(&self, w: &mut Writer) {
        w.write_u8(self.red_add);
        w.write_u8(self.green_add);
        w.write_u8(self.blue_add);
        w.write_u8(self.alpha_mul);
        w.write_u8(self.red_mul);
        w.write_u8(self.green_mul);
        w.write_u8(self.blue_mul);
    }
}

/// An ordered pool of matrices and color transforms.
///
/// Bank 0 is embedded in the file header (count fields only, no name);
/// further banks are introduced by a dedicated tag carrying their name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformBank {
    pub name: String,
    pub matrices: Vec<Matrix>,
    pub colors: Vec<ColorTransform>,
}
