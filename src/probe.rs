//! Probe engine: hashing and linear probing over a table image.
//!
//! Keys are trusted integer identifiers, so the hash is a fixed
//! multiplicative one with no seed: `h(key) = (97 * key) mod slot_count`.
//! Every walk visits at most `slot_count` slots, which bounds the work even
//! on an image with no `Empty` slot left.

use crate::layout::{Image, Status};

const MULTIPLIER: u64 = 97;

/// Home slot of `key`.
#[inline]
pub fn home(key: u64, slot_count: usize) -> usize {
    debug_assert!(slot_count > 0);
    (MULTIPLIER.wrapping_mul(key) % slot_count as u64) as usize
}

/// Linear probe sequence starting at the home slot of a key.
pub struct ProbeSeq {
    idx: usize,
    remaining: usize,
    slot_count: usize,
}

impl ProbeSeq {
    pub fn new(key: u64, slot_count: usize) -> Self {
        let idx = if slot_count == 0 { 0 } else { home(key, slot_count) };
        Self {
            idx,
            remaining: slot_count,
            slot_count,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let idx = self.idx;
        self.idx += 1;
        if self.idx == self.slot_count {
            self.idx = 0;
        }
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Slot holding `key`, if any.
///
/// Stops at the first `Empty` slot; tombstones are skipped because the
/// run they belong to may continue past them.
pub fn find(image: Image<'_>, key: u64) -> Option<usize> {
    for idx in ProbeSeq::new(key, image.slot_count()) {
        match image.status(idx) {
            Status::Empty => return None,
            Status::Used if image.key(idx) == key => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Where an insert of some key should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The key is live in this slot.
    Occupied(usize),
    /// The key is absent; this is the first reusable slot on its run.
    Vacant(usize),
    /// The key is absent and the walk met no reusable slot.
    Full,
}

/// Locate `key` for an insert.
///
/// The walk continues past tombstones until it reaches `Empty` so that a
/// key stored further down the run is found and overwritten instead of
/// being inserted twice. The first tombstone seen is preferred over the
/// terminating `Empty` slot.
pub fn find_slot(image: Image<'_>, key: u64) -> Slot {
    let mut reusable = None;
    for idx in ProbeSeq::new(key, image.slot_count()) {
        match image.status(idx) {
            Status::Used => {
                if image.key(idx) == key {
                    return Slot::Occupied(idx);
                }
            }
            Status::Tombstone => {
                reusable.get_or_insert(idx);
            }
            Status::Empty => return Slot::Vacant(reusable.unwrap_or(idx)),
        }
    }
    reusable.map_or(Slot::Full, Slot::Vacant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{allocate, ImageMut};

    #[test]
    fn home_uses_multiplicative_hash() {
        assert_eq!(home(0, 13), 0);
        assert_eq!(home(1, 13), 97 % 13);
        assert_eq!(home(10, 3), 970 % 3);
        // 97 * key wraps in 64 bits like the C expression does.
        let key = u64::MAX;
        assert_eq!(home(key, 1201), (97u64.wrapping_mul(key) % 1201) as usize);
    }

    #[test]
    fn probe_seq_wraps_and_visits_every_slot_once() {
        let slots: Vec<usize> = ProbeSeq::new(2, 5).collect();
        let start = home(2, 5);
        assert_eq!(slots.len(), 5);
        for (i, s) in slots.iter().enumerate() {
            assert_eq!(*s, (start + i) % 5);
        }
    }

    /// Invariant: a lookup stops at `Empty` but walks through tombstones.
    #[test]
    fn find_skips_tombstones_and_stops_at_empty() {
        let mut words = allocate(10, false).unwrap();
        let slot_count = Image::new(&words).slot_count();
        // Two keys sharing a home slot.
        let a = 0u64;
        let b = slot_count as u64;
        assert_eq!(home(a, slot_count), home(b, slot_count));
        {
            let mut image = ImageMut::new(&mut words);
            image.occupy(0, a, 1);
            image.occupy(1, b, 2);
            image.bury(0);
        }
        let image = Image::new(&words);
        assert_eq!(find(image, a), None);
        assert_eq!(find(image, b), Some(1));
        assert_eq!(find(image, 12345), None);
    }

    /// Invariant: insert search finds an existing key behind a tombstone
    /// rather than reusing the tombstone for a duplicate.
    #[test]
    fn find_slot_prefers_existing_key_over_tombstone() {
        let mut words = allocate(10, false).unwrap();
        let slot_count = Image::new(&words).slot_count();
        let b = slot_count as u64;
        {
            let mut image = ImageMut::new(&mut words);
            image.occupy(0, 0, 1);
            image.occupy(1, b, 2);
            image.bury(0);
        }
        let image = Image::new(&words);
        assert_eq!(find_slot(image, b), Slot::Occupied(1));
        assert_eq!(find_slot(image, 2 * b), Slot::Vacant(0));
    }

    #[test]
    fn find_slot_on_empty_image_is_home() {
        let words = allocate(4, true).unwrap();
        let image = Image::new(&words);
        assert_eq!(find_slot(image, 9), Slot::Vacant(home(9, image.slot_count())));
    }

    /// Invariant: walks terminate after `slot_count` probes even when the
    /// image has no `Empty` slot left.
    #[test]
    fn saturated_image_terminates() {
        let mut words = allocate(1, false).unwrap();
        {
            let mut image = ImageMut::new(&mut words);
            image.occupy(0, 100, 1);
            image.occupy(1, 200, 2);
        }
        let image = Image::new(&words);
        assert_eq!(find(image, 300), None);
        assert_eq!(find_slot(image, 300), Slot::Full);

        ImageMut::new(&mut words).bury(1);
        let image = Image::new(&words);
        assert_eq!(find(image, 300), None);
        assert_eq!(find_slot(image, 300), Slot::Vacant(1));
    }
}
