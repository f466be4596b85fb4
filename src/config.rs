//! Table construction parameters.

/// Configuration for a new table.
///
/// `capacity` is the number of live entries the table accepts before it
/// either grows (growable tables) or starts refusing new keys (fixed
/// tables). The physical slot array is always somewhat larger, see
/// [`slot_count_for`](crate::slot_count_for).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Capacity hint. `None` picks a default based on `growable`.
    pub capacity: Option<usize>,

    /// Whether the table doubles its capacity instead of failing when full.
    pub growable: bool,
}

impl TableConfig {
    /// Preallocated capacity when none is given.
    pub const DEFAULT_CAPACITY: usize = 8;

    /// A fixed-size table holding at most `capacity` entries.
    pub const fn fixed(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            growable: false,
        }
    }

    /// A growable table starting from the minimal capacity.
    pub const fn growable() -> Self {
        Self {
            capacity: None,
            growable: true,
        }
    }

    /// Replace the capacity hint.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Capacity the table is actually created with.
    ///
    /// A growable table never starts at zero because doubling zero would
    /// never make room.
    pub fn resolved_capacity(&self) -> usize {
        match (self.capacity, self.growable) {
            (Some(n), true) => n.max(1),
            (None, true) => 1,
            (Some(n), false) => n,
            (None, false) => Self::DEFAULT_CAPACITY,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            capacity: Some(Self::DEFAULT_CAPACITY),
            growable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growable_without_hint_starts_at_one() {
        assert_eq!(TableConfig::growable().resolved_capacity(), 1);
        assert_eq!(
            TableConfig::growable().with_capacity(0).resolved_capacity(),
            1
        );
    }

    #[test]
    fn fixed_keeps_zero_capacity() {
        let config = TableConfig::fixed(0);
        assert!(!config.growable);
        assert_eq!(config.resolved_capacity(), 0);
    }

    #[test]
    fn default_is_growable_with_preallocation() {
        let config = TableConfig::default();
        assert!(config.growable);
        assert_eq!(config.resolved_capacity(), TableConfig::DEFAULT_CAPACITY);
    }

    #[test]
    fn fixed_without_hint_uses_default_capacity() {
        let config = TableConfig {
            capacity: None,
            growable: false,
        };
        assert_eq!(config.resolved_capacity(), TableConfig::DEFAULT_CAPACITY);
    }
}
