//! IntTable: the owning, mutable table handle.

use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::growth;
use crate::iter::{Iter, Keys, Values};
use crate::layout::{self, Image, ImageMut, Status};
use crate::probe::{self, Slot};
use crate::value::Storable;
use crate::view::TableView;
use core::fmt;
use core::hash::BuildHasher;
use std::collections::HashMap;
use tracing::debug;

/// Fixed-layout hash table from `u64` keys to `V` values.
///
/// The table owns a single allocation holding its header and slot array.
/// Once [`mark_read_only`](Self::mark_read_only) has been called the
/// allocation never changes again, and its address may be handed to other
/// readers (see [`TableView`]).
///
/// An optional table-wide default lives beside the image, not in it, so
/// views attached by address never see it.
pub struct IntTable<V: Storable> {
    words: Vec<u64>,
    default: Option<V>,
}

/// Table from `u64` keys to `u64` values.
pub type Int2Int = IntTable<u64>;

/// Table from `u64` keys to `f64` values.
pub type Int2Float = IntTable<f64>;

impl<V: Storable> IntTable<V> {
    /// Growable table with the default preallocation.
    pub fn new() -> Result<Self> {
        Self::with_config(TableConfig::default())
    }

    /// Fixed-size table accepting at most `capacity` entries.
    pub fn fixed(capacity: usize) -> Result<Self> {
        Self::with_config(TableConfig::fixed(capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        let capacity = config.resolved_capacity();
        let words = layout::allocate(capacity, config.growable)?;
        debug!(
            kind = V::KIND,
            capacity,
            slot_count = Image::new(&words).slot_count(),
            growable = config.growable,
            "created table"
        );
        Ok(Self::from_words(words))
    }

    /// Create a table and insert every pair in order.
    pub fn from_pairs<I>(config: TableConfig, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, V)>,
    {
        let mut table = Self::with_config(config)?;
        table.try_extend(pairs)?;
        Ok(table)
    }

    /// Wrap a fully initialized image.
    pub(crate) fn from_words(words: Vec<u64>) -> Self {
        Self {
            words,
            default: None,
        }
    }

    /// Attach a table-wide default used by
    /// [`get_or_default`](Self::get_or_default).
    pub fn with_default(mut self, default: V) -> Self {
        self.default = Some(default);
        self
    }

    pub fn default_value(&self) -> Option<V> {
        self.default
    }

    #[inline]
    pub(crate) fn image(&self) -> Image<'_> {
        Image::new(&self.words)
    }

    #[inline]
    fn image_mut(&mut self) -> ImageMut<'_> {
        ImageMut::new(&mut self.words)
    }

    #[inline]
    fn reader(&self) -> TableView<'_, V> {
        TableView::from_image(self.image())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.image().read_only() {
            return Err(TableError::ReadOnly);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.image().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical capacity: entries accepted before growing or failing.
    pub fn capacity(&self) -> usize {
        self.image().capacity()
    }

    /// Physical number of slots.
    pub fn slot_count(&self) -> usize {
        self.image().slot_count()
    }

    pub fn is_read_only(&self) -> bool {
        self.image().read_only()
    }

    pub fn is_growable(&self) -> bool {
        self.image().growable()
    }

    pub fn get(&self, key: u64) -> Result<V> {
        self.reader().get(key)
    }

    /// Value for `key`, or `default` when absent. Never inserts.
    pub fn get_or(&self, key: u64, default: V) -> V {
        self.reader().get_or(key, default)
    }

    pub fn has(&self, key: u64) -> bool {
        self.reader().has(key)
    }

    /// Insert `key` or overwrite its value.
    ///
    /// Overwriting an existing key always succeeds on a writable table. A
    /// new key needs a free unit of capacity: a growable table doubles when
    /// it has none, a fixed table fails with `CapacityExceeded`.
    pub fn set(&mut self, key: u64, value: V) -> Result<()> {
        self.ensure_writable()?;
        match probe::find_slot(self.image(), key) {
            Slot::Occupied(slot) => {
                self.image_mut().set_value_word(slot, value.to_word());
                Ok(())
            }
            Slot::Vacant(slot) => self.insert_new(key, value, Some(slot)),
            Slot::Full => self.insert_new(key, value, None),
        }
    }

    /// Existing value for `key`, or insert `default` and return it.
    pub fn get_or_insert(&mut self, key: u64, default: V) -> Result<V> {
        match probe::find_slot(self.image(), key) {
            Slot::Occupied(slot) => Ok(V::from_word(self.image().value_word(slot))),
            Slot::Vacant(slot) => {
                self.ensure_writable()?;
                self.insert_new(key, default, Some(slot))?;
                Ok(default)
            }
            Slot::Full => {
                self.ensure_writable()?;
                self.insert_new(key, default, None)?;
                Ok(default)
            }
        }
    }

    /// Value for `key`. A missing key is inserted with the table-wide
    /// default, which is returned; without one it is `KeyNotFound`.
    pub fn get_or_default(&mut self, key: u64) -> Result<V> {
        match self.default {
            Some(default) => self.get_or_insert(key, default),
            None => self.get(key),
        }
    }

    /// Write a key known to be absent. `slot` is where probing said it
    /// should go in the current image.
    fn insert_new(&mut self, key: u64, value: V, slot: Option<usize>) -> Result<()> {
        let header = self.image().header();
        let slot = match slot {
            Some(slot) if header.len < header.capacity => slot,
            _ if header.growable => {
                self.grow()?;
                match probe::find_slot(self.image(), key) {
                    Slot::Vacant(slot) => slot,
                    _ => {
                        return Err(TableError::CapacityExceeded {
                            capacity: self.capacity(),
                        })
                    }
                }
            }
            _ => {
                return Err(TableError::CapacityExceeded {
                    capacity: header.capacity,
                })
            }
        };
        let len = self.len();
        let mut image = self.image_mut();
        image.occupy(slot, key, value.to_word());
        image.set_len(len + 1);
        Ok(())
    }

    /// Replace the backing allocation with one of twice the capacity. The
    /// old allocation is released only once the new one is complete.
    fn grow(&mut self) -> Result<()> {
        let words = growth::grown(self.image())?;
        self.words = words;
        Ok(())
    }

    /// Remove `key` and return its value.
    pub fn delete(&mut self, key: u64) -> Result<V> {
        self.ensure_writable()?;
        let slot = probe::find(self.image(), key).ok_or(TableError::KeyNotFound { key })?;
        let value = V::from_word(self.image().value_word(slot));
        let len = self.len();
        let mut image = self.image_mut();
        image.bury(slot);
        image.set_len(len - 1);
        Ok(value)
    }

    /// Remove and return the entry in the lowest occupied slot.
    pub fn pop_item(&mut self) -> Result<(u64, V)> {
        self.ensure_writable()?;
        let image = self.image();
        let slot = (0..image.slot_count())
            .find(|&i| image.status(i) == Status::Used)
            .ok_or(TableError::Empty)?;
        let entry = (image.key(slot), V::from_word(image.value_word(slot)));
        let len = image.len();
        let mut image = self.image_mut();
        image.bury(slot);
        image.set_len(len - 1);
        Ok(entry)
    }

    /// Remove every entry. Capacity and slot count are kept.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let mut image = self.image_mut();
        image.clear_slots();
        image.set_len(0);
        Ok(())
    }

    /// Set every pair in order, stopping at the first failure. Pairs set
    /// before the failure stay in the table.
    pub fn try_extend<I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, V)>,
    {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Freeze the table. There is no way back.
    pub fn mark_read_only(&mut self) {
        if !self.is_read_only() {
            self.image_mut().set_read_only();
            debug!(
                kind = V::KIND,
                address = self.raw_address(),
                len = self.len(),
                "marked table read-only"
            );
        }
    }

    /// Address of the header. Stable for as long as the table is neither
    /// grown nor dropped, which a read-only table never is until drop.
    pub fn raw_address(&self) -> usize {
        self.words.as_ptr() as usize
    }

    /// Size of the whole allocation (header and slots) in bytes.
    pub fn raw_byte_length(&self) -> usize {
        self.image().byte_len()
    }

    /// Borrowed read-only view of this table.
    ///
    /// Fails with `Access` unless the table has been marked read-only, the
    /// same rule [`TableView::from_address`] enforces.
    pub fn view(&self) -> Result<TableView<'_, V>> {
        if !self.is_read_only() {
            return Err(TableError::Access {
                address: self.raw_address(),
                reason: "table is not read-only",
            });
        }
        Ok(self.reader())
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self.image())
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, V> {
        Values::new(self.iter())
    }
}

impl<V: Storable> Clone for IntTable<V> {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            default: self.default,
        }
    }
}

impl<V: Storable> fmt::Debug for IntTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V: Storable> IntoIterator for &'a IntTable<V> {
    type Item = (u64, V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Compares entries only; the table-wide default is not part of equality.
impl<V: Storable> PartialEq for IntTable<V> {
    fn eq(&self, other: &Self) -> bool {
        self.reader() == other.reader()
    }
}

impl<'a, V: Storable> PartialEq<TableView<'a, V>> for IntTable<V> {
    fn eq(&self, other: &TableView<'a, V>) -> bool {
        self.reader() == *other
    }
}

impl<V: Storable, S: BuildHasher> PartialEq<HashMap<u64, V, S>> for IntTable<V> {
    fn eq(&self, other: &HashMap<u64, V, S>) -> bool {
        self.reader() == *other
    }
}
