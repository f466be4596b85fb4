//! TableView: borrowed, read-only access to a frozen table image.
//!
//! A view never owns the memory it reads and offers no mutating operation
//! at all. It is obtained either from an owning handle that has been
//! marked read-only ([`IntTable::view`]) or from the raw address of such a
//! table, possibly published by another component or process.
//!
//! The read-only flag is the only thing that makes concurrent reading
//! sound: nothing in the image changes once it is set, so any number of
//! views may read it from any number of threads without locking.

use crate::error::{Result, TableError};
use crate::iter::{Iter, Keys, Values};
use crate::layout::{self, Image, HEADER_WORDS, WORD_BYTES};
use crate::probe;
use crate::table::IntTable;
use crate::value::Storable;
use core::fmt;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Read-only, non-owning handle over a table image.
pub struct TableView<'a, V> {
    image: Image<'a>,
    _value: PhantomData<V>,
}

impl<'a, V> Clone for TableView<'a, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V> Copy for TableView<'a, V> {}

impl<'a, V: Storable> TableView<'a, V> {
    pub(crate) fn from_image(image: Image<'a>) -> Self {
        Self {
            image,
            _value: PhantomData,
        }
    }

    /// Attach to the table whose header lives at `address`.
    ///
    /// Fails with `Access` when `address` is null or not 8-byte aligned, or
    /// when the table there has not been marked read-only.
    ///
    /// # Safety
    ///
    /// `address` must be the start of a table image in the layout produced
    /// by this crate (for example [`IntTable::raw_address`] of a live
    /// table), readable for its whole length, and that memory must stay
    /// valid and unmodified for `'a`. The header is read before the
    /// read-only check, so it must be readable even when attaching fails.
    pub unsafe fn from_address(address: usize) -> Result<Self> {
        let refuse = |reason: &'static str| -> Result<Self> {
            warn!(address, reason, "refused to attach table view");
            Err(TableError::Access { address, reason })
        };
        if address == 0 {
            return refuse("null address");
        }
        if address % WORD_BYTES != 0 {
            return refuse("address is not 8-byte aligned");
        }
        let ptr = address as *const u64;

        // SAFETY: the caller guarantees a readable header at `address`.
        let header = Image::new(unsafe { core::slice::from_raw_parts(ptr, HEADER_WORDS) });
        if !header.read_only() {
            return refuse("table is not read-only");
        }
        if header.slot_count() == 0 {
            return refuse("table has no slots");
        }
        let Some(words) = layout::words_for(header.slot_count()) else {
            return refuse("slot count overflows the address space");
        };

        // SAFETY: the caller guarantees the full image behind the header is
        // readable and left unmodified for `'a`; the read-only flag checked
        // above is what keeps the owner from writing to it.
        let image = Image::new(unsafe { core::slice::from_raw_parts(ptr, words) });
        debug!(
            kind = V::KIND,
            address,
            len = image.len(),
            slot_count = image.slot_count(),
            "attached table view"
        );
        Ok(Self::from_image(image))
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.image.capacity()
    }

    pub fn slot_count(&self) -> usize {
        self.image.slot_count()
    }

    pub fn is_read_only(&self) -> bool {
        self.image.read_only()
    }

    pub fn is_growable(&self) -> bool {
        self.image.growable()
    }

    pub fn get(&self, key: u64) -> Result<V> {
        probe::find(self.image, key)
            .map(|slot| V::from_word(self.image.value_word(slot)))
            .ok_or(TableError::KeyNotFound { key })
    }

    pub fn get_or(&self, key: u64, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: u64) -> bool {
        probe::find(self.image, key).is_some()
    }

    pub fn iter(&self) -> Iter<'a, V> {
        Iter::new(self.image)
    }

    pub fn keys(&self) -> Keys<'a, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'a, V> {
        Values::new(self.iter())
    }

    pub fn raw_address(&self) -> usize {
        self.image.words().as_ptr() as usize
    }

    pub fn raw_byte_length(&self) -> usize {
        self.image.byte_len()
    }

    /// Copy the viewed image into a new owning table. The copy keeps the
    /// read-only flag of the source.
    pub fn to_owned_table(&self) -> Result<IntTable<V>> {
        let mut words = layout::allocate_zeroed(self.slot_count())?;
        words.copy_from_slice(self.image.words());
        Ok(IntTable::from_words(words))
    }
}

impl<'a, V: Storable> fmt::Debug for TableView<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V: Storable> IntoIterator for TableView<'a, V> {
    type Item = (u64, V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, 'b, V: Storable> PartialEq<TableView<'b, V>> for TableView<'a, V> {
    fn eq(&self, other: &TableView<'b, V>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Ok(v))
    }
}

impl<'a, V: Storable> PartialEq<IntTable<V>> for TableView<'a, V> {
    fn eq(&self, other: &IntTable<V>) -> bool {
        other == self
    }
}

impl<'a, V: Storable, S: BuildHasher> PartialEq<HashMap<u64, V, S>> for TableView<'a, V> {
    fn eq(&self, other: &HashMap<u64, V, S>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(&k) == Some(&v))
    }
}
