//! Header parsing and the tag dispatcher.
//!
//! A load walks the decompressed byte stream once: fixed header fields,
//! then tag records until the terminator. Unknown tags are skipped;
//! producing more resources of a kind than the header declares is fatal.

use crate::cursor::Cursor;
use crate::document::SupercellSwf;
use crate::error::{Error, Result};
use crate::progress::{Progress, ProgressSink};
use crate::record::{RawRecord, Resource};
use crate::tags;
use crate::texture::Texture;
use crate::transform::{ColorTransform, Matrix, TransformBank};

/// Header-declared resource counts, authoritative for overflow checks.
#[derive(Debug, Default, Clone, Copy)]
struct Declared {
    shapes: u16,
    movie_clips: u16,
    text_fields: u16,
    textures: u16,
}

/// Ephemeral state shared by the header reader and the tag dispatcher:
/// the cursor, the growing document, and the progress sink travel together.
pub(crate) struct LoadContext<'a, 'b> {
    cursor: Cursor<'a>,
    doc: &'b mut SupercellSwf,
    sink: &'b dyn ProgressSink,
    declared: Declared,
    loaded_shapes: u16,
    loaded_movie_clips: u16,
    loaded_text_fields: u16,
    loaded_modifiers: u16,
    declared_modifiers: u16,
    texture_index: usize,
}

impl<'a, 'b> LoadContext<'a, 'b> {
    pub fn new(data: &'a [u8], doc: &'b mut SupercellSwf, sink: &'b dyn ProgressSink) -> Self {
        Self {
            cursor: Cursor::new(data),
            doc,
            sink,
            declared: Declared::default(),
            loaded_shapes: 0,
            loaded_movie_clips: 0,
            loaded_text_fields: 0,
            loaded_modifiers: 0,
            declared_modifiers: 0,
            texture_index: 0,
        }
    }

    /// Read the fixed header: resource counts, primary-bank counts, five
    /// reserved bytes, and the exports table.
    pub fn read_header(&mut self) -> Result<()> {
        self.declared.shapes = self.cursor.read_u16()?;
        self.declared.movie_clips = self.cursor.read_u16()?;
        self.declared.textures = self.cursor.read_u16()?;
        self.declared.text_fields = self.cursor.read_u16()?;

        self.doc.textures =
            vec![Texture::default(); self.declared.textures as usize];

        let matrix_count = self.cursor.read_u16()?;
        let color_count = self.cursor.read_u16()?;
        if matrix_count > 0 || color_count > 0 {
            self.doc.banks.push(TransformBank {
                name: String::new(),
                matrices: Vec::with_capacity(matrix_count as usize),
                colors: Vec::with_capacity(color_count as usize),
            });
        }

        self.cursor.skip(5)?;

        let export_count = self.cursor.read_u16()?;
        let mut ids = Vec::with_capacity(export_count as usize);
        for _ in 0..export_count {
            ids.push(self.cursor.read_u16()?);
        }
        for id in ids {
            let name = self.cursor.read_ascii()?;
            self.doc.exports.entry(id).or_default().push(name);
        }
        Ok(())
    }

    /// Dispatch tag records until the terminator.
    pub fn read_tags(&mut self) -> Result<()> {
        loop {
            let (tag, length) = self.cursor.read_tag_header()?;
            let payload_start = self.cursor.position();

            match tag {
                tags::END => break,
                tags::USE_LOWRES_TEXTURE => self.doc.use_lowres_texture = true,
                tags::USE_EXTERNAL_TEXTURE => self.doc.has_external_texture = true,
                tags::USE_UNCOMMON_RESOLUTION => self.doc.use_uncommon_texture = true,
                tags::TEXTURE_POSTFIXES => {
                    let highres = self.cursor.read_ascii()?;
                    let lowres = self.cursor.read_ascii()?;
                    if highres.is_empty() || lowres.is_empty() {
                        tracing::warn!("ignoring blank texture postfixes");
                    } else {
                        self.doc.highres_postfix = highres;
                        self.doc.lowres_postfix = lowres;
                    }
                }
                t if Texture::is_texture_tag(t) => self.read_texture(t)?,
                t if tags::is_shape(t) => self.read_shape(t, length)?,
                t if tags::is_movie_clip(t) => self.read_movie_clip(t, length)?,
                t if tags::is_text_field(t) => self.read_text_field(t, length)?,
                t if tags::is_modifier(t) => self.read_modifier(t, length)?,
                tags::MATRIX => {
                    let matrix = Matrix::parse(&mut self.cursor, false)?;
                    self.current_bank().matrices.push(matrix);
                }
                tags::MATRIX_PRECISE => {
                    let matrix = Matrix::parse(&mut self.cursor, true)?;
                    self.current_bank().matrices.push(matrix);
                }
                tags::COLOR_TRANSFORM => {
                    let color = ColorTransform::parse(&mut self.cursor)?;
                    self.current_bank().colors.push(color);
                }
                tags::MODIFIER_COUNT => {
                    self.declared_modifiers = self.cursor.read_u16()?;
                }
                tags::MATRIX_BANK => {
                    let matrix_count = self.cursor.read_u16()?;
                    let color_count = self.cursor.read_u16()?;
                    let name = self.cursor.read_ascii()?;
                    self.doc.banks.push(TransformBank {
                        name,
                        matrices: Vec::with_capacity(matrix_count as usize),
                        colors: Vec::with_capacity(color_count as usize),
                    });
                }
                unknown => {
                    tracing::warn!(tag = unknown, length, "skipping unknown tag");
                    self.cursor.skip(length)?;
                }
            }

            // A tag's declared length is authoritative for framing.
            self.cursor.seek(payload_start + length);
        }
        Ok(())
    }

    fn read_texture(&mut self, tag: u8) -> Result<()> {
        if self.texture_index >= self.declared.textures as usize {
            return Err(Error::CountOverflow {
                kind: "texture",
                declared: self.declared.textures,
            });
        }
        let with_pixels = !self.doc.has_external_texture;
        let texture = Texture::parse(&mut self.cursor, tag, with_pixels)?;
        self.doc.textures[self.texture_index] = texture;
        self.texture_index += 1;
        self.sink.progress(Progress::TextureLoad {
            percent: (self.texture_index * 100 / self.declared.textures as usize) as u8,
            index: self.texture_index - 1,
        });
        Ok(())
    }

    fn read_shape(&mut self, tag: u8, length: usize) -> Result<()> {
        if self.loaded_shapes == self.declared.shapes {
            return Err(Error::CountOverflow {
                kind: "shape",
                declared: self.declared.shapes,
            });
        }
        self.loaded_shapes += 1;
        let record = RawRecord::parse(&mut self.cursor, tag, length)?;
        self.insert_resource(Resource::Shape(record));
        Ok(())
    }

    fn read_movie_clip(&mut self, tag: u8, length: usize) -> Result<()> {
        if self.loaded_movie_clips == self.declared.movie_clips {
            return Err(Error::CountOverflow {
                kind: "movie clip",
                declared: self.declared.movie_clips,
            });
        }
        self.loaded_movie_clips += 1;
        let record = RawRecord::parse(&mut self.cursor, tag, length)?;
        self.insert_resource(Resource::MovieClip(record));
        Ok(())
    }

    fn read_text_field(&mut self, tag: u8, length: usize) -> Result<()> {
        if self.loaded_text_fields == self.declared.text_fields {
            return Err(Error::CountOverflow {
                kind: "text field",
                declared: self.declared.text_fields,
            });
        }
        self.loaded_text_fields += 1;
        let record = RawRecord::parse(&mut self.cursor, tag, length)?;
        self.insert_resource(Resource::TextField(record));
        Ok(())
    }

    fn read_modifier(&mut self, tag: u8, length: usize) -> Result<()> {
        if self.loaded_modifiers == self.declared_modifiers {
            return Err(Error::CountOverflow {
                kind: "movie clip modifier",
                declared: self.declared_modifiers,
            });
        }
        self.loaded_modifiers += 1;
        let record = RawRecord::parse(&mut self.cursor, tag, length)?;
        self.insert_resource(Resource::MovieClipModifier(record));
        Ok(())
    }

    fn insert_resource(&mut self, resource: Resource) {
        let id = resource.id();
        if let Some(previous) = self.doc.resources.insert(id, resource) {
            tracing::warn!(id, kind = previous.kind_name(), "duplicate resource id replaced");
        }
        let percent = (self.cursor.position() * 100 / self.cursor.len().max(1)) as u8;
        self.sink.progress(Progress::ResourcesLoad { percent });
    }

    fn current_bank(&mut self) -> &mut TransformBank {
        if self.doc.banks.is_empty() {
            self.doc.banks.push(TransformBank::default());
        }
        self.doc.banks.last_mut().expect("banks is non-empty")
    }
}

/// Parse an external texture companion stream: texture tags only, then the
/// terminator. Pixel payloads replace the main file's placeholders in order.
pub(crate) fn read_external_textures(
    doc: &mut SupercellSwf,
    data: &[u8],
    sink: &dyn ProgressSink,
) -> Result<()> {
    let mut cursor = Cursor::new(data);
    let total = doc.textures.len();
    let mut index = 0;
    loop {
        let (tag, length) = cursor.read_tag_header()?;
        let payload_start = cursor.position();
        match tag {
            tags::END => break,
            t if Texture::is_texture_tag(t) => {
                if index >= total {
                    return Err(Error::CountOverflow {
                        kind: "texture",
                        declared: total as u16,
                    });
                }
                doc.textures[index] = Texture::parse(&mut cursor, t, true)?;
                index += 1;
                sink.progress(Progress::TextureLoad {
                    percent: (index * 100 / total.max(1)) as u8,
                    index: index - 1,
                });
            }
            unknown => {
                tracing::warn!(tag = unknown, length, "skipping unknown tag in texture file");
                cursor.skip(length)?;
            }
        }
        cursor.seek(payload_start + length);
    }
    Ok(())
}
