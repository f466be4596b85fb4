//! Growth controller: capacity doubling for growable tables.
//!
//! Growth never touches the current image. A complete replacement is built
//! and rehashed on the side and only then handed back for the caller to
//! swap in, so an allocation failure leaves the table exactly as it was.

use crate::error::{Result, TableError};
use crate::layout::{self, Image, ImageMut, Status};
use crate::probe::{self, Slot};
use tracing::debug;

/// Build a replacement image with twice the capacity of `image`, holding
/// every live entry of it and no tombstones.
pub fn grown(image: Image<'_>) -> Result<Vec<u64>> {
    let old = image.header();
    let capacity = old
        .capacity
        .checked_mul(2)
        .ok_or(TableError::OutOfMemory { bytes: None })?
        .max(1);

    let mut words = layout::allocate(capacity, old.growable)?;
    let moved = rehash(image, ImageMut::new(&mut words))?;
    debug_assert_eq!(moved, old.len);

    debug!(
        old_capacity = old.capacity,
        new_capacity = capacity,
        old_slot_count = old.slot_count,
        new_slot_count = Image::new(&words).slot_count(),
        len = moved,
        "grew table"
    );
    Ok(words)
}

/// Insert every `Used` slot of `src` into the empty image `dst` and set
/// the live count of `dst`. Returns the number of entries moved.
pub fn rehash(src: Image<'_>, mut dst: ImageMut<'_>) -> Result<usize> {
    let mut moved = 0;
    for idx in 0..src.slot_count() {
        if src.status(idx) != Status::Used {
            continue;
        }
        let key = src.key(idx);
        match probe::find_slot(dst.as_image(), key) {
            Slot::Vacant(slot) => dst.occupy(slot, key, src.value_word(idx)),
            // Keys in a valid image are unique, so this keeps the last copy.
            Slot::Occupied(slot) => {
                dst.set_value_word(slot, src.value_word(idx));
                continue;
            }
            Slot::Full => {
                return Err(TableError::CapacityExceeded {
                    capacity: dst.as_image().capacity(),
                })
            }
        }
        moved += 1;
    }
    dst.set_len(moved);
    Ok(moved)
}
