//! int-hashmap: a fixed-layout, open-addressing hash table from `u64` keys
//! to `u64` or `f64` values, whose memory can be read in place by a second
//! party through its raw address.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one flat allocation that a builder fills through a safe API and
//!   that any number of readers then walk at native speed without copying.
//! - Layers:
//!   - `layout`: the byte image (header followed by the slot array) and
//!     typed read/write access to it. Nothing above this layer computes an
//!     offset.
//!   - `probe`: hashing and linear probing over an image.
//!   - `growth`: capacity doubling by full rehash into a new image.
//!   - `IntTable<V>`: the owning handle; the only type that can mutate.
//!   - `TableView<'a, V>`: the borrowing handle; read-only by construction.
//!   - `persist`: flattening to and restoring from `RawParts`.
//!
//! Constraints
//! - Keys are trusted integer identifiers; the hash is unseeded.
//! - One allocation per table, laid out exactly like the C structs other
//!   consumers expect (see `layout`).
//! - Single writer. No locking anywhere.
//! - No operation leaves a partial change behind when it fails.
//!
//! Sharing model
//! - A table is built through `IntTable`, then frozen with
//!   `mark_read_only`. Freezing is one-way.
//! - A frozen table publishes `raw_address()`; `TableView::from_address`
//!   attaches to it and refuses tables that are not frozen. Views never
//!   free memory and expose no mutating operation.
//! - Because a frozen image never changes, views are `Send + Sync` and
//!   may be read from many threads at once.
//!
//! Growth
//! - A growable table doubles its capacity when a new key arrives and
//!   `len == capacity`. The replacement image is built completely before
//!   the old one is released, so an allocation failure is reported as
//!   `OutOfMemory` with the table untouched.
//! - Fixed tables refuse new keys with `CapacityExceeded` once full.
//!   Overwrites never grow and never fail for capacity.
//!
//! Notes and non-goals
//! - No object keys, no generic value types beyond [`Storable`] words.
//! - No concurrent mutation.
//! - Persistence is the raw slot image only; byte order is native.

mod config;
mod error;
mod growth;
mod iter;
mod layout;
mod persist;
mod probe;
mod table;
mod table_proptest;
mod value;
mod view;

// Public surface
pub use config::TableConfig;
pub use error::{Result, TableError};
pub use iter::{Iter, Keys, Values};
pub use layout::{slot_count_for, Status, HEADER_BYTES, SLOT_BYTES};
pub use persist::RawParts;
pub use table::{Int2Float, Int2Int, IntTable};
pub use value::Storable;
pub use view::TableView;
