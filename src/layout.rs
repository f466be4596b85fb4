//! Memory image of a table: a fixed header immediately followed by the
//! slot array, all in one allocation of native-endian 64-bit words.
//!
//! ```text
//! word  0          1      2           3                  4 ..
//!       +----------+------+-----------+------------------+----------------------+
//!       | capacity | len  | slot_count| flags (ro, grow) | slot 0 | slot 1 | ...|
//!       +----------+------+-----------+------------------+----------------------+
//!
//! slot  +-----+-------+--------------------+
//!       | key | value | status:u32 pad:u32 |
//!       +-----+-------+--------------------+
//! ```
//!
//! The header is 32 bytes and every slot is 24 bytes. Byte 0 of the flags
//! word is the read-only flag and byte 1 the growable flag. A zeroed image
//! is an empty table, since the `Empty` status tag is zero.
//!
//! Other processes and other languages read this layout by address, so
//! field order, widths and [`slot_count_for`] are fixed.

use crate::error::{Result, TableError};

pub const WORD_BYTES: usize = core::mem::size_of::<u64>();
pub const HEADER_WORDS: usize = 4;
pub const SLOT_WORDS: usize = 3;
pub const HEADER_BYTES: usize = HEADER_WORDS * WORD_BYTES;
pub const SLOT_BYTES: usize = SLOT_WORDS * WORD_BYTES;

const CAPACITY: usize = 0;
const LEN: usize = 1;
const SLOT_COUNT: usize = 2;
const FLAGS: usize = 3;

const FLAG_READ_ONLY: usize = 0;
const FLAG_GROWABLE: usize = 1;

const KEY: usize = 0;
const VALUE: usize = 1;
const STATUS: usize = 2;

/// State of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    /// Never occupied since creation or the last `clear`.
    Empty = 0,
    Used = 1,
    /// Previously occupied; keeps probe runs intact after a delete.
    Tombstone = 2,
}

impl Status {
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Status::Empty),
            1 => Some(Status::Used),
            2 => Some(Status::Tombstone),
            _ => None,
        }
    }

    fn to_word(self) -> u64 {
        let tag = (self as u32).to_ne_bytes();
        u64::from_ne_bytes([tag[0], tag[1], tag[2], tag[3], 0, 0, 0, 0])
    }
}

/// Status tag stored in the first four bytes of a status word.
#[inline]
pub fn status_tag(word: u64) -> u32 {
    let b = word.to_ne_bytes();
    u32::from_ne_bytes([b[0], b[1], b[2], b[3]])
}

/// Decoded header fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub capacity: usize,
    pub len: usize,
    pub slot_count: usize,
    pub read_only: bool,
    pub growable: bool,
}

/// Physical slot count for a logical capacity: `floor(capacity * 1.2) + 1`.
///
/// Returns `None` on overflow.
pub fn slot_count_for(capacity: usize) -> Option<usize> {
    capacity.checked_add(capacity / 5)?.checked_add(1)
}

/// Number of words in an image with `slot_count` slots.
pub fn words_for(slot_count: usize) -> Option<usize> {
    slot_count.checked_mul(SLOT_WORDS)?.checked_add(HEADER_WORDS)
}

/// Allocate a zeroed image for `capacity` entries and write its header.
pub fn allocate(capacity: usize, growable: bool) -> Result<Vec<u64>> {
    let slot_count = slot_count_for(capacity).ok_or(TableError::OutOfMemory { bytes: None })?;
    let mut words = allocate_zeroed(slot_count)?;
    ImageMut::new(&mut words).write_header(Header {
        capacity,
        len: 0,
        slot_count,
        read_only: false,
        growable,
    });
    Ok(words)
}

/// Allocate a zeroed image with room for `slot_count` slots. The header is
/// left zeroed.
pub fn allocate_zeroed(slot_count: usize) -> Result<Vec<u64>> {
    let n = words_for(slot_count).ok_or(TableError::OutOfMemory { bytes: None })?;
    let mut words = Vec::new();
    words
        .try_reserve_exact(n)
        .map_err(|_| TableError::OutOfMemory {
            bytes: n.checked_mul(WORD_BYTES),
        })?;
    words.resize(n, 0);
    Ok(words)
}

/// Read access to a table image.
///
/// The slice always spans the header plus `slot_count` slots; every
/// constructor establishes that before handing one out.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    words: &'a [u64],
}

impl<'a> Image<'a> {
    #[inline]
    pub fn new(words: &'a [u64]) -> Self {
        debug_assert!(words.len() >= HEADER_WORDS);
        Self { words }
    }

    #[inline]
    pub fn words(&self) -> &'a [u64] {
        self.words
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.words[CAPACITY] as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words[LEN] as usize
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.words[SLOT_COUNT] as usize
    }

    #[inline]
    pub fn read_only(&self) -> bool {
        self.words[FLAGS].to_ne_bytes()[FLAG_READ_ONLY] != 0
    }

    #[inline]
    pub fn growable(&self) -> bool {
        self.words[FLAGS].to_ne_bytes()[FLAG_GROWABLE] != 0
    }

    pub fn header(&self) -> Header {
        Header {
            capacity: self.capacity(),
            len: self.len(),
            slot_count: self.slot_count(),
            read_only: self.read_only(),
            growable: self.growable(),
        }
    }

    /// Slot status. Unknown tags read as `Tombstone`: they end no probe
    /// run and hold no entry.
    #[inline]
    pub fn status(&self, slot: usize) -> Status {
        Status::from_tag(self.status_tag(slot)).unwrap_or(Status::Tombstone)
    }

    /// Raw status tag of a slot, without interpretation.
    #[inline]
    pub fn status_tag(&self, slot: usize) -> u32 {
        status_tag(self.words[slot_base(slot) + STATUS])
    }

    #[inline]
    pub fn key(&self, slot: usize) -> u64 {
        self.words[slot_base(slot) + KEY]
    }

    #[inline]
    pub fn value_word(&self, slot: usize) -> u64 {
        self.words[slot_base(slot) + VALUE]
    }

    /// The slot array without the header.
    pub fn slot_words(&self) -> &'a [u64] {
        &self.words[HEADER_WORDS..]
    }

    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_BYTES
    }
}

/// Write access to a table image.
pub struct ImageMut<'a> {
    words: &'a mut [u64],
}

impl<'a> ImageMut<'a> {
    #[inline]
    pub fn new(words: &'a mut [u64]) -> Self {
        debug_assert!(words.len() >= HEADER_WORDS);
        Self { words }
    }

    #[inline]
    pub fn as_image(&self) -> Image<'_> {
        Image::new(self.words)
    }

    pub fn write_header(&mut self, header: Header) {
        self.words[CAPACITY] = header.capacity as u64;
        self.words[LEN] = header.len as u64;
        self.words[SLOT_COUNT] = header.slot_count as u64;
        let mut flags = [0u8; WORD_BYTES];
        flags[FLAG_READ_ONLY] = u8::from(header.read_only);
        flags[FLAG_GROWABLE] = u8::from(header.growable);
        self.words[FLAGS] = u64::from_ne_bytes(flags);
    }

    #[inline]
    pub fn set_len(&mut self, len: usize) {
        self.words[LEN] = len as u64;
    }

    pub fn set_read_only(&mut self) {
        let mut flags = self.words[FLAGS].to_ne_bytes();
        flags[FLAG_READ_ONLY] = 1;
        self.words[FLAGS] = u64::from_ne_bytes(flags);
    }

    /// Store a live entry in `slot`.
    #[inline]
    pub fn occupy(&mut self, slot: usize, key: u64, value: u64) {
        let base = slot_base(slot);
        self.words[base + KEY] = key;
        self.words[base + VALUE] = value;
        self.words[base + STATUS] = Status::Used.to_word();
    }

    #[inline]
    pub fn set_value_word(&mut self, slot: usize, value: u64) {
        self.words[slot_base(slot) + VALUE] = value;
    }

    /// Mark `slot` deleted. Key and value bytes stay as they were.
    #[inline]
    pub fn bury(&mut self, slot: usize) {
        self.words[slot_base(slot) + STATUS] = Status::Tombstone.to_word();
    }

    /// Zero the whole slot array.
    pub fn clear_slots(&mut self) {
        self.words[HEADER_WORDS..].fill(0);
    }

    pub fn slot_words_mut(&mut self) -> &mut [u64] {
        &mut self.words[HEADER_WORDS..]
    }
}

#[inline]
fn slot_base(slot: usize) -> usize {
    HEADER_WORDS + slot * SLOT_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_count_matches_load_factor_formula() {
        assert_eq!(slot_count_for(0), Some(1));
        assert_eq!(slot_count_for(1), Some(2));
        assert_eq!(slot_count_for(2), Some(3));
        assert_eq!(slot_count_for(5), Some(7));
        assert_eq!(slot_count_for(8), Some(10));
        assert_eq!(slot_count_for(10), Some(13));
        assert_eq!(slot_count_for(1000), Some(1201));
        assert_eq!(slot_count_for(usize::MAX), None);
    }

    #[test]
    fn sizes_match_c_layout() {
        assert_eq!(HEADER_BYTES, 32);
        assert_eq!(SLOT_BYTES, 24);
        let words = allocate(8, true).unwrap();
        assert_eq!(Image::new(&words).byte_len(), 32 + 10 * 24);
    }

    #[test]
    fn header_round_trips_through_words() {
        let mut words = allocate_zeroed(3).unwrap();
        let header = Header {
            capacity: 2,
            len: 1,
            slot_count: 3,
            read_only: true,
            growable: false,
        };
        ImageMut::new(&mut words).write_header(header);
        assert_eq!(Image::new(&words).header(), header);

        let flags = words[3].to_ne_bytes();
        assert_eq!(flags, [1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn status_tag_sits_in_first_four_bytes() {
        let mut words = allocate(2, false).unwrap();
        ImageMut::new(&mut words).occupy(1, 42, 7);
        let status_word = words[HEADER_WORDS + SLOT_WORDS + 2];
        let bytes = status_word.to_ne_bytes();
        assert_eq!(&bytes[..4], &1u32.to_ne_bytes());
        assert_eq!(&bytes[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn fresh_image_is_all_empty() {
        let words = allocate(4, true).unwrap();
        let image = Image::new(&words);
        assert_eq!(image.len(), 0);
        assert!(image.growable());
        assert!(!image.read_only());
        for i in 0..image.slot_count() {
            assert_eq!(image.status(i), Status::Empty);
        }
    }

    #[test]
    fn unknown_status_tag_reads_as_tombstone() {
        let mut words = allocate(1, false).unwrap();
        words[HEADER_WORDS + 2] = 9;
        assert_eq!(Image::new(&words).status(0), Status::Tombstone);
    }

    #[test]
    fn bury_keeps_key_and_value() {
        let mut words = allocate(2, false).unwrap();
        let mut image = ImageMut::new(&mut words);
        image.occupy(0, 5, 50);
        image.bury(0);
        let image = Image::new(&words);
        assert_eq!(image.status(0), Status::Tombstone);
        assert_eq!(image.key(0), 5);
        assert_eq!(image.value_word(0), 50);
    }
}
