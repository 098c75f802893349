//! Tag ids of the closed record set.
//!
//! Every tag is framed as `u8 id` + `i32 payload_length`; tag 0 terminates
//! the stream. Texture tag ids live in [`crate::texture`] since they also
//! encode filter and layout flags.

pub const END: u8 = 0;
pub const USE_LOWRES_TEXTURE: u8 = 23;
pub const USE_EXTERNAL_TEXTURE: u8 = 26;
pub const USE_UNCOMMON_RESOLUTION: u8 = 30;
pub const TEXTURE_POSTFIXES: u8 = 32;

pub const MATRIX: u8 = 8;
pub const COLOR_TRANSFORM: u8 = 9;
pub const MATRIX_PRECISE: u8 = 36;
pub const MATRIX_BANK: u8 = 42;

pub const MODIFIER_COUNT: u8 = 37;

pub fn is_shape(tag: u8) -> bool {
    matches!(tag, 2 | 18)
}

pub fn is_movie_clip(tag: u8) -> bool {
    matches!(tag, 3 | 10 | 12 | 14 | 35)
}

pub fn is_text_field(tag: u8) -> bool {
    matches!(tag, 7 | 15 | 20 | 21 | 25 | 33 | 43 | 44)
}

pub fn is_modifier(tag: u8) -> bool {
    matches!(tag, 38 | 39 | 40)
}
