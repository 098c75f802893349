//! Opaque resource records.
//!
//! Shapes, movie clips, text fields, and movie-clip modifiers are framed by
//! the codec but treated as raw byte runs: each record keeps its tag id and
//! payload verbatim, exposing only the leading resource id.

use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// A tag whose payload the codec does not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl RawRecord {
    /// Capture `length` payload bytes. Every resource payload leads with its
    /// `u16` id, so anything shorter than 2 bytes is truncated.
    pub fn parse(c: &mut Cursor, tag: u8, length: usize) -> Result<Self> {
        let offset = c.position();
        let payload = c.read_bytes(length)?.to_vec();
        if payload.len() < 2 {
            return Err(Error::Truncated {
                offset,
                need: 2,
                have: payload.len(),
            });
        }
        Ok(Self { tag, payload })
    }

    /// The resource id carried in the payload's first two bytes.
    pub fn id(&self) -> u16 {
        u16::from_le_bytes([self.payload[0], self.payload[1]])
    }
}

/// A document resource, keyed by id across all four kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Shape(RawRecord),
    MovieClip(RawRecord),
    TextField(RawRecord),
    MovieClipModifier(RawRecord),
}

impl Resource {
    pub fn record(&self) -> &RawRecord {
        match self {
            Resource::Shape(r)
            | Resource::MovieClip(r)
            | Resource::TextField(r)
            | Resource::MovieClipModifier(r) => r,
        }
    }

    pub fn id(&self) -> u16 {
        self.record().id()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Resource::Shape(_) => "shape",
            Resource::MovieClip(_) => "movie clip",
            Resource::TextField(_) => "text field",
            Resource::MovieClipModifier(_) => "movie clip modifier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_leading_u16() {
        let data = [0x34, 0x12, 0xAA, 0xBB];
        let mut c = Cursor::new(&data);
        let record = RawRecord::parse(&mut c, 2, 4).unwrap();
        assert_eq!(record.id(), 0x1234);
        assert_eq!(record.payload, data);
    }

    #[test]
    fn record_shorter_than_id_is_truncated() {
        let data = [0x01];
        let mut c = Cursor::new(&data);
        assert!(matches!(
            RawRecord::parse(&mut c, 2, 1),
            Err(Error::Truncated { need: 2, .. })
        ));
    }
}
