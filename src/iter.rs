//! Slot-order iterators over live entries, shared by owning and borrowed
//! handles.

use crate::layout::{Image, Status};
use crate::value::Storable;
use core::iter::FusedIterator;
use core::marker::PhantomData;

/// Iterator over `(key, value)` pairs in slot order.
pub struct Iter<'a, V> {
    image: Image<'a>,
    pos: usize,
    _value: PhantomData<V>,
}

impl<'a, V: Storable> Iter<'a, V> {
    pub(crate) fn new(image: Image<'a>) -> Self {
        Self {
            image,
            pos: 0,
            _value: PhantomData,
        }
    }
}

impl<'a, V: Storable> Iterator for Iter<'a, V> {
    type Item = (u64, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.image.slot_count() {
            let idx = self.pos;
            self.pos += 1;
            if self.image.status(idx) == Status::Used {
                return Some((self.image.key(idx), V::from_word(self.image.value_word(idx))));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.image.slot_count().saturating_sub(self.pos)))
    }
}

impl<'a, V: Storable> FusedIterator for Iter<'a, V> {}

impl<'a, V> Clone for Iter<'a, V> {
    fn clone(&self) -> Self {
        Self {
            image: self.image,
            pos: self.pos,
            _value: PhantomData,
        }
    }
}

/// Iterator over keys in slot order.
pub struct Keys<'a, V> {
    it: Iter<'a, V>,
}

impl<'a, V: Storable> Keys<'a, V> {
    pub(crate) fn new(it: Iter<'a, V>) -> Self {
        Self { it }
    }
}

impl<'a, V: Storable> Iterator for Keys<'a, V> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, V: Storable> FusedIterator for Keys<'a, V> {}

/// Iterator over values in slot order.
pub struct Values<'a, V> {
    it: Iter<'a, V>,
}

impl<'a, V: Storable> Values<'a, V> {
    pub(crate) fn new(it: Iter<'a, V>) -> Self {
        Self { it }
    }
}

impl<'a, V: Storable> Iterator for Values<'a, V> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, V: Storable> FusedIterator for Values<'a, V> {}
