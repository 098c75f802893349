//! The document aggregate.
//!
//! A [`SupercellSwf`] owns everything a `.sc` file carries: textures,
//! transform banks, resources keyed by id, and the export table. `load`
//! fully populates one; `save` fully serialises one, splitting texture
//! pixel data into companion files when the document asks for it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::compression::{self, CompressionMethod};
use crate::error::{Error, Result};
use crate::progress::{NoopSink, Progress, ProgressSink};
use crate::reader::{self, LoadContext};
use crate::record::Resource;
use crate::texture::Texture;
use crate::transform::TransformBank;
use crate::writer;

pub(crate) const DEFAULT_HIGHRES_POSTFIX: &str = "_highres";
pub(crate) const DEFAULT_LOWRES_POSTFIX: &str = "_lowres";
/// Companion files carrying split-out texture pixel data end with this.
const EXTERNAL_TEXTURE_SUFFIX: &str = "_tex.sc";
/// Resample factor for the lowres companion file.
const LOWRES_SCALE: f32 = 0.5;

/// An in-memory SupercellSWF document.
#[derive(Debug, Clone, PartialEq)]
pub struct SupercellSwf {
    /// Whole-file envelope applied on save and detected on load.
    pub compression: CompressionMethod,
    /// Texture pixel data lives in companion `_tex.sc` files.
    pub has_external_texture: bool,
    pub use_lowres_texture: bool,
    /// Companion files use the highres/lowres postfix pair.
    pub use_uncommon_texture: bool,
    pub highres_postfix: String,
    pub lowres_postfix: String,
    pub textures: Vec<Texture>,
    /// Transform banks; index 0 is the primary bank embedded in the header.
    pub banks: Vec<TransformBank>,
    /// Resources of all four kinds, keyed by their unique 16-bit id.
    pub resources: BTreeMap<u16, Resource>,
    /// Export names per resource id, insertion-ordered per id.
    pub exports: BTreeMap<u16, Vec<String>>,
}

impl Default for SupercellSwf {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::None,
            has_external_texture: false,
            use_lowres_texture: false,
            use_uncommon_texture: false,
            highres_postfix: DEFAULT_HIGHRES_POSTFIX.to_string(),
            lowres_postfix: DEFAULT_LOWRES_POSTFIX.to_string(),
            textures: Vec::new(),
            banks: Vec::new(),
            resources: BTreeMap::new(),
            exports: BTreeMap::new(),
        }
    }
}

impl SupercellSwf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from disk, resolving external texture companions.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, &NoopSink)
    }

    pub fn load_with(path: impl AsRef<Path>, sink: &dyn ProgressSink) -> Result<Self> {
        let path = path.as_ref();
        sink.progress(Progress::Loading(path));

        let raw = fs::read(path)?;
        let mut doc = Self::from_bytes_with(&raw, sink)?;
        if doc.has_external_texture {
            doc.load_external_textures(path, sink)?;
        }
        doc.check_exports();

        sink.progress(Progress::LoadingFinish);
        Ok(doc)
    }

    /// Decompress and parse a main-file byte image. External texture
    /// companions are not resolved (there is no path to look beside).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with(data, &NoopSink)
    }

    pub fn from_bytes_with(data: &[u8], sink: &dyn ProgressSink) -> Result<Self> {
        let (method, plain) = compression::decompress(data)?;
        let mut doc = Self {
            compression: method,
            ..Self::default()
        };
        {
            let mut ctx = LoadContext::new(&plain, &mut doc, sink);
            ctx.read_header()?;
            ctx.read_tags()?;
        }
        Ok(doc)
    }

    /// Save the document, writing texture companion files when
    /// `has_external_texture` is set.
    ///
    /// A partial file left behind by a failed save is not cleaned up;
    /// treat it as invalid.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &NoopSink)
    }

    pub fn save_with(&self, path: impl AsRef<Path>, sink: &dyn ProgressSink) -> Result<()> {
        let path = path.as_ref();
        sink.progress(Progress::Saving(path));

        let plain = writer::write_document(self, sink)?;
        let packed = compression::compress(self.compression, &plain)?;
        fs::write(path, packed)?;

        if self.has_external_texture {
            self.save_external_textures(path, sink)?;
        }

        sink.progress(Progress::SavingFinish);
        Ok(())
    }

    /// Serialise to a main-file byte image without touching the filesystem.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let plain = writer::write_document(self, &NoopSink)?;
        compression::compress(self.compression, &plain)
    }

    fn save_external_textures(&self, path: &Path, sink: &dyn ProgressSink) -> Result<()> {
        let base = external_base(path);
        if self.use_uncommon_texture {
            let highres = format!("{base}{}{EXTERNAL_TEXTURE_SUFFIX}", self.highres_postfix);
            self.write_texture_file(&highres, None, sink)?;
            let lowres = format!("{base}{}{EXTERNAL_TEXTURE_SUFFIX}", self.lowres_postfix);
            self.write_texture_file(&lowres, Some(LOWRES_SCALE), sink)?;
        } else {
            self.write_texture_file(&format!("{base}{EXTERNAL_TEXTURE_SUFFIX}"), None, sink)?;
        }
        Ok(())
    }

    fn write_texture_file(
        &self,
        path: &str,
        scale: Option<f32>,
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        let plain = writer::write_texture_file(self, scale, sink)?;
        let packed = compression::compress(self.compression, &plain)?;
        fs::write(path, packed)?;
        Ok(())
    }

    /// Pick the external texture companion: highres file first, then
    /// lowres, then the common `_tex.sc`.
    fn load_external_textures(&mut self, path: &Path, sink: &dyn ProgressSink) -> Result<()> {
        let base = external_base(path);
        let candidates = [
            format!("{base}{}{EXTERNAL_TEXTURE_SUFFIX}", self.highres_postfix),
            format!("{base}{}{EXTERNAL_TEXTURE_SUFFIX}", self.lowres_postfix),
            format!("{base}{EXTERNAL_TEXTURE_SUFFIX}"),
        ];
        let found = candidates
            .iter()
            .find(|candidate| Path::new(candidate).exists())
            .ok_or_else(|| Error::MissingExternalTexture { base: base.clone() })?;

        let raw = fs::read(found)?;
        let (_, plain) = compression::decompress(&raw)?;
        reader::read_external_textures(self, &plain, sink)
    }

    fn check_exports(&self) {
        for id in self.exports.keys() {
            if !self.resources.contains_key(id) {
                tracing::warn!(id = *id, "export references a missing resource");
            }
        }
    }
}

/// Companion files are named from the main path minus its `.sc` extension.
fn external_base(path: &Path) -> String {
    let s = path.to_string_lossy();
    match s.strip_suffix(".sc") {
        Some(stripped) => stripped.to_string(),
        None => s.into_owned(),
    }
}
