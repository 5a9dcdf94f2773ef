use crate::error::{Result, SearchError};
use crate::DocId;
use serde::Serialize;

const TITLE_BIT: u16 = 1 << 9;
const TAG_BIT: u16 = 1 << 8;
const FREQUENCY_MASK: u16 = 0xFF;
const META_MASK: u16 = 0x3FF;

/// 10-bit posting metadata: bit 9 = in title, bit 8 = in tag, bits 7..0 = frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PackedMeta(u16);

impl PackedMeta {
    pub fn pack(in_title: bool, in_tag: bool, frequency: u8) -> Self {
        let mut bits = frequency as u16;
        if in_title {
            bits |= TITLE_BIT;
        }
        if in_tag {
            bits |= TAG_BIT;
        }
        Self(bits)
    }

    /// Accept a raw value as stored upstream. Bits above the 10-bit field
    /// are dropped; negative values are rejected.
    pub fn from_raw(raw: i64) -> Result<Self> {
        if raw < 0 {
            return Err(SearchError::InvalidFrequency(raw));
        }
        Ok(Self((raw & META_MASK as i64) as u16))
    }

    pub fn in_title(self) -> bool {
        self.0 & TITLE_BIT != 0
    }

    pub fn in_tag(self) -> bool {
        self.0 & TAG_BIT != 0
    }

    pub fn frequency(self) -> u8 {
        (self.0 & FREQUENCY_MASK) as u8
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

/// One (document, metadata) entry of a term's posting list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub meta: PackedMeta,
}

impl Posting {
    pub fn new(doc_id: DocId, meta: PackedMeta) -> Self {
        Self { doc_id, meta }
    }

    /// Parse a `docID:meta` pair.
    ///
    /// `Ok(None)` for a pair without a colon (dropped by callers), an error
    /// when either side is not a valid number.
    pub fn parse(pair: &str, line: usize) -> Result<Option<Self>> {
        let Some((doc, meta)) = pair.split_once(':') else {
            return Ok(None);
        };

        let doc_id = doc
            .trim()
            .parse::<DocId>()
            .map_err(|e| SearchError::malformed(line, format!("document id {doc:?}: {e}")))?;
        let raw = meta
            .trim()
            .parse::<i64>()
            .map_err(|e| SearchError::malformed(line, format!("metadata {meta:?}: {e}")))?;
        let meta = PackedMeta::from_raw(raw)
            .map_err(|e| SearchError::malformed(line, e.to_string()))?;

        Ok(Some(Self { doc_id, meta }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_bits() -> Result<()> {
        let meta = PackedMeta::from_raw(0b10_0000_0011)?;
        assert!(meta.in_title());
        assert!(!meta.in_tag());
        assert_eq!(meta.frequency(), 3);

        let meta = PackedMeta::from_raw(0b01_1111_1111)?;
        assert!(!meta.in_title());
        assert!(meta.in_tag());
        assert_eq!(meta.frequency(), 255);

        Ok(())
    }

    #[test]
    fn test_parse_preserves_every_meta_value() -> Result<()> {
        for raw in 0u16..=1023 {
            let posting = Posting::parse(&format!("42:{raw}"), 1)?.expect("pair has a colon");
            assert_eq!(posting.doc_id, 42);
            assert_eq!(posting.meta.in_title(), raw & 0x200 != 0);
            assert_eq!(posting.meta.in_tag(), raw & 0x100 != 0);
            assert_eq!(posting.meta.frequency() as u16, raw & 0xFF);
        }
        Ok(())
    }

    #[test]
    fn test_wide_values_are_masked() -> Result<()> {
        assert_eq!(PackedMeta::from_raw(1024 + 5)?.bits(), 5);
        Ok(())
    }

    #[test]
    fn test_negative_meta_rejected() {
        assert!(matches!(
            PackedMeta::from_raw(-1),
            Err(SearchError::InvalidFrequency(-1))
        ));
        assert!(Posting::parse("3:-1", 4).unwrap_err().is_recoverable());
    }

    #[test]
    fn test_parse_malformed_pairs() -> Result<()> {
        assert_eq!(Posting::parse("12", 1)?, None);
        assert!(Posting::parse("x:1", 1).is_err());
        assert!(Posting::parse("1:y", 1).is_err());
        Ok(())
    }

    #[test]
    fn test_pack() {
        let meta = PackedMeta::pack(true, true, 7);
        assert_eq!(meta.bits(), 0b11_0000_0111);
    }
}
