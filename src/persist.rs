//! Flat persistence: a table as its header fields plus the byte image of
//! its slot array.
//!
//! The byte image is copied verbatim in both directions, so a blob written
//! by one process can be restored by another on the same architecture.
//! Restoring validates everything the probe engine relies on before the
//! new table is handed out.

use crate::error::{Result, TableError};
use crate::layout::{self, Header, Image, ImageMut, Status, SLOT_BYTES, WORD_BYTES};
use crate::probe;
use crate::table::IntTable;
use crate::value::Storable;
use hashbrown::HashSet;
use tracing::warn;

/// Header fields and slot array bytes of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawParts {
    pub capacity: usize,
    pub len: usize,
    pub slot_count: usize,
    pub read_only: bool,
    pub growable: bool,
    /// Table-wide default as a value word, if the table has one.
    pub default: Option<u64>,
    /// Slot array image, `slot_count * 24` bytes in native byte order.
    pub bytes: Vec<u8>,
}

impl<V: Storable> IntTable<V> {
    /// Snapshot of the header fields and the slot array bytes.
    pub fn serialize(&self) -> RawParts {
        let image = self.image();
        let header = image.header();
        let bytes = image
            .slot_words()
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .collect();
        RawParts {
            capacity: header.capacity,
            len: header.len,
            slot_count: header.slot_count,
            read_only: header.read_only,
            growable: header.growable,
            default: self.default_value().map(V::to_word),
            bytes,
        }
    }

    /// Restore a table from [`RawParts`] into a fresh owning allocation.
    ///
    /// Fails with `Validation` unless `len <= capacity <= slot_count`,
    /// `slot_count >= 1`, the byte image is exactly `slot_count` slots long,
    /// every status tag is known, the number of used slots equals `len`, no
    /// key is used twice and every key is reachable from its home slot.
    pub fn deserialize(parts: &RawParts) -> Result<Self> {
        validate_sizes(parts).map_err(rejected)?;

        let mut words = layout::allocate_zeroed(parts.slot_count)?;
        let mut image = ImageMut::new(&mut words);
        image.write_header(Header {
            capacity: parts.capacity,
            len: parts.len,
            slot_count: parts.slot_count,
            read_only: parts.read_only,
            growable: parts.growable,
        });
        for (word, chunk) in image
            .slot_words_mut()
            .iter_mut()
            .zip(parts.bytes.chunks_exact(WORD_BYTES))
        {
            let mut buf = [0u8; WORD_BYTES];
            buf.copy_from_slice(chunk);
            *word = u64::from_ne_bytes(buf);
        }

        validate_slots(Image::new(&words)).map_err(rejected)?;
        let table = Self::from_words(words);
        Ok(match parts.default {
            Some(word) => table.with_default(V::from_word(word)),
            None => table,
        })
    }
}

fn rejected(reason: String) -> TableError {
    warn!(%reason, "rejected table image");
    TableError::Validation(reason)
}

fn validate_sizes(parts: &RawParts) -> core::result::Result<(), String> {
    if parts.len > parts.capacity {
        return Err(format!(
            "len {} exceeds capacity {}",
            parts.len, parts.capacity
        ));
    }
    if parts.capacity > parts.slot_count {
        return Err(format!(
            "capacity {} exceeds slot count {}",
            parts.capacity, parts.slot_count
        ));
    }
    if parts.slot_count == 0 {
        return Err("slot count is zero".to_string());
    }
    let expected = parts
        .slot_count
        .checked_mul(SLOT_BYTES)
        .ok_or_else(|| format!("slot count {} overflows", parts.slot_count))?;
    if parts.bytes.len() != expected {
        return Err(format!(
            "byte image is {} bytes, expected {} for {} slots",
            parts.bytes.len(),
            expected,
            parts.slot_count
        ));
    }
    Ok(())
}

fn validate_slots(image: Image<'_>) -> core::result::Result<(), String> {
    let mut keys = HashSet::with_capacity(image.len());
    for idx in 0..image.slot_count() {
        let tag = image.status_tag(idx);
        match Status::from_tag(tag) {
            Some(Status::Used) => {
                let key = image.key(idx);
                if !keys.insert(key) {
                    return Err(format!("key {} is stored twice", key));
                }
            }
            Some(_) => {}
            None => return Err(format!("slot {} has unknown status tag {}", idx, tag)),
        }
    }
    if keys.len() != image.len() {
        return Err(format!(
            "len {} does not match {} used slots",
            image.len(),
            keys.len()
        ));
    }
    // Keys are unique now, so the first match of a probe is the slot itself.
    for idx in 0..image.slot_count() {
        if image.status(idx) == Status::Used && probe::find(image, image.key(idx)) != Some(idx) {
            return Err(format!(
                "key {} in slot {} is unreachable from its home slot",
                image.key(idx),
                idx
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Int2Float, Int2Int, TableConfig};

    fn sample() -> Int2Int {
        let pairs = (1..=8).map(|k| (k, k + 1000));
        let mut t = Int2Int::from_pairs(TableConfig::fixed(10), pairs).unwrap();
        t.delete(4).unwrap();
        t
    }

    /// Invariant: serialize then deserialize preserves every lookup.
    #[test]
    fn round_trip_preserves_lookups() {
        let t = sample();
        let parts = t.serialize();
        assert_eq!(parts.bytes.len(), t.slot_count() * SLOT_BYTES);
        let back = Int2Int::deserialize(&parts).unwrap();
        for k in 0..20 {
            assert_eq!(back.has(k), t.has(k));
            assert_eq!(back.get(k), t.get(k));
        }
        assert_eq!(back.len(), t.len());
        assert_eq!(back.capacity(), t.capacity());
        assert_eq!(back.serialize(), parts);
    }

    #[test]
    fn round_trip_keeps_flags() {
        let mut t = Int2Float::from_pairs(TableConfig::growable(), [(1, 0.5)]).unwrap();
        t.mark_read_only();
        let back = Int2Float::deserialize(&t.serialize()).unwrap();
        assert!(back.is_read_only());
        assert!(back.is_growable());
        assert_eq!(back.get(1), Ok(0.5));
    }

    #[test]
    fn round_trip_keeps_table_default() {
        let t = Int2Float::fixed(2).unwrap().with_default(-1.5);
        let parts = t.serialize();
        assert_eq!(parts.default, Some((-1.5f64).to_bits()));
        let mut back = Int2Float::deserialize(&parts).unwrap();
        assert_eq!(back.default_value(), Some(-1.5));
        assert_eq!(back.get_or_default(3), Ok(-1.5));

        let plain = Int2Float::deserialize(&Int2Float::fixed(2).unwrap().serialize()).unwrap();
        assert_eq!(plain.default_value(), None);
    }

    #[test]
    fn rejects_len_above_capacity() {
        let mut parts = sample().serialize();
        parts.len = parts.capacity + 1;
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn rejects_capacity_above_slot_count() {
        let mut parts = sample().serialize();
        parts.capacity = parts.slot_count + 1;
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    /// Invariant: a wrong-length image is refused, never truncated or padded.
    #[test]
    fn rejects_wrong_byte_length() {
        let mut parts = sample().serialize();
        parts.bytes.pop();
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
        let mut parts = sample().serialize();
        parts.bytes.extend_from_slice(&[0; SLOT_BYTES]);
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_status_tag() {
        let mut parts = sample().serialize();
        parts.bytes[16..20].copy_from_slice(&7u32.to_ne_bytes());
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn rejects_len_that_disagrees_with_slots() {
        let mut parts = sample().serialize();
        parts.len -= 1;
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn rejects_zero_slots() {
        let parts = RawParts {
            capacity: 0,
            len: 0,
            slot_count: 0,
            read_only: false,
            growable: false,
            default: None,
            bytes: Vec::new(),
        };
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn accepts_empty_image_with_extra_slots() {
        let t = Int2Int::fixed(2).unwrap();
        let mut parts = t.serialize();
        parts.slot_count += 2;
        parts.bytes.extend_from_slice(&[0; 2 * SLOT_BYTES]);
        let mut back = Int2Int::deserialize(&parts).unwrap();
        assert_eq!(back.slot_count(), 5);
        back.set(3, 4).unwrap();
        assert_eq!(back.get(3), Ok(4));
    }

    /// Invariant: an entry the probe engine could never find is refused.
    #[test]
    fn rejects_unreachable_entry() {
        let mut t = Int2Int::fixed(2).unwrap();
        t.set(3, 4).unwrap();
        let mut parts = t.serialize();
        // Home of 3 is slot 0 of 3, but slot 1 of 5.
        parts.slot_count += 2;
        parts.bytes.extend_from_slice(&[0; 2 * SLOT_BYTES]);
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut t = Int2Int::fixed(4).unwrap();
        t.set(1, 1).unwrap();
        t.set(2, 2).unwrap();
        let mut parts = t.serialize();
        // Rewrite every used key to 1.
        for slot in parts.bytes.chunks_exact_mut(SLOT_BYTES) {
            if slot[16..20] == 1u32.to_ne_bytes() {
                slot[..8].copy_from_slice(&1u64.to_ne_bytes());
            }
        }
        assert!(matches!(
            Int2Int::deserialize(&parts),
            Err(TableError::Validation(_))
        ));
    }
}
