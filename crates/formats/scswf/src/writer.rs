//! Header emission and save-order serialisation.
//!
//! The emit order is fixed: header, flag tags, textures, the modifier
//! block, shapes, text fields, transform banks, movie clips, terminator.
//! Resources of one kind are emitted in ascending id order.

use crate::cursor::Writer;
use crate::document::{SupercellSwf, DEFAULT_HIGHRES_POSTFIX, DEFAULT_LOWRES_POSTFIX};
use crate::error::Result;
use crate::progress::{Progress, ProgressSink};
use crate::record::{RawRecord, Resource};
use crate::tags;

/// Serialise a whole document to its uncompressed main-file byte image.
pub(crate) fn write_document(doc: &SupercellSwf, sink: &dyn ProgressSink) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    write_header(doc, &mut w);

    if doc.use_uncommon_texture
        && (doc.highres_postfix != DEFAULT_HIGHRES_POSTFIX
            || doc.lowres_postfix != DEFAULT_LOWRES_POSTFIX)
    {
        let mut payload = Writer::new();
        payload.write_ascii(&doc.highres_postfix);
        payload.write_ascii(&doc.lowres_postfix);
        w.save_tag(tags::TEXTURE_POSTFIXES, payload.as_bytes());
    }
    if doc.use_lowres_texture {
        w.save_tag(tags::USE_LOWRES_TEXTURE, &[]);
    }
    if doc.use_uncommon_texture {
        w.save_tag(tags::USE_UNCOMMON_RESOLUTION, &[]);
    }
    if doc.has_external_texture {
        w.save_tag(tags::USE_EXTERNAL_TEXTURE, &[]);
    }

    for (index, texture) in doc.textures.iter().enumerate() {
        texture.write(&mut w, !doc.has_external_texture)?;
        sink.progress(Progress::TextureSave {
            percent: ((index + 1) * 100 / doc.textures.len()) as u8,
            index,
        });
    }

    let total = doc.resources.len();
    let mut emitted = 0usize;
    let mut emit = |w: &mut Writer, record: &RawRecord| {
        w.save_tag(record.tag, &record.payload);
        emitted += 1;
        sink.progress(Progress::ResourcesSave {
            percent: (emitted * 100 / total.max(1)) as u8,
        });
    };

    let modifiers: Vec<&RawRecord> =
        records(doc, |r| matches!(r, Resource::MovieClipModifier(_))).collect();
    if !modifiers.is_empty() {
        let mut payload = Writer::new();
        payload.write_u16(modifiers.len() as u16);
        w.save_tag(tags::MODIFIER_COUNT, payload.as_bytes());
        for record in modifiers {
            emit(&mut w, record);
        }
    }

    for record in records(doc, |r| matches!(r, Resource::Shape(_))) {
        emit(&mut w, record);
    }
    for record in records(doc, |r| matches!(r, Resource::TextField(_))) {
        emit(&mut w, record);
    }

    for (index, bank) in doc.banks.iter().enumerate() {
        if index > 0 {
            let mut payload = Writer::new();
            payload.write_u16(bank.matrices.len() as u16);
            payload.write_u16(bank.colors.len() as u16);
            payload.write_ascii(&bank.name);
            w.save_tag(tags::MATRIX_BANK, payload.as_bytes());
        }
        for matrix in &bank.matrices {
            let mut payload = Writer::new();
            matrix.write(&mut payload);
            let tag = if matrix.precise {
                tags::MATRIX_PRECISE
            } else {
                tags::MATRIX
            };
            w.save_tag(tag, payload.as_bytes());
        }
        for color in &bank.colors {
            let mut payload = Writer::new();
            color.write(&mut payload);
            w.save_tag(tags::COLOR_TRANSFORM, payload.as_bytes());
        }
    }

    for record in records(doc, |r| matches!(r, Resource::MovieClip(_))) {
        emit(&mut w, record);
    }

    w.save_tag(tags::END, &[]);
    Ok(w.into_bytes())
}

/// Serialise an external texture companion: texture tags with pixel data,
/// then the terminator. `scale` resamples every raster (the lowres file).
pub(crate) fn write_texture_file(
    doc: &SupercellSwf,
    scale: Option<f32>,
    sink: &dyn ProgressSink,
) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    for (index, texture) in doc.textures.iter().enumerate() {
        match scale {
            None => texture.write(&mut w, true)?,
            Some(factor) => {
                let scaled = texture.pixels.as_ref().map(|raster| raster.resize(factor));
                texture.write_scaled(&mut w, true, scaled.as_ref())?;
            }
        }
        sink.progress(Progress::TextureSave {
            percent: ((index + 1) * 100 / doc.textures.len()) as u8,
            index,
        });
    }
    w.save_tag(tags::END, &[]);
    Ok(w.into_bytes())
}

fn write_header(doc: &SupercellSwf, w: &mut Writer) {
    w.write_u16(count(doc, |r| matches!(r, Resource::Shape(_))));
    w.write_u16(count(doc, |r| matches!(r, Resource::MovieClip(_))));
    w.write_u16(doc.textures.len() as u16);
    w.write_u16(count(doc, |r| matches!(r, Resource::TextField(_))));

    match doc.banks.first() {
        Some(bank) => {
            w.write_u16(bank.matrices.len() as u16);
            w.write_u16(bank.colors.len() as u16);
        }
        None => w.fill(4),
    }

    w.fill(5);

    let pairs: Vec<(u16, &str)> = doc
        .exports
        .iter()
        .flat_map(|(id, names)| names.iter().map(move |name| (*id, name.as_str())))
        .collect();
    w.write_u16(pairs.len() as u16);
    for (id, _) in &pairs {
        w.write_u16(*id);
    }
    for (_, name) in &pairs {
        w.write_ascii(name);
    }
}

fn records(
    doc: &SupercellSwf,
    pred: fn(&Resource) -> bool,
) -> impl Iterator<Item = &RawRecord> {
    doc.resources
        .values()
        .filter(move |&resource| pred(resource))
        .map(|resource| resource.record())
}

fn count(doc: &SupercellSwf, pred: fn(&Resource) -> bool) -> u16 {
    records(doc, pred).count() as u16
}
