use std::sync::{Arc, Weak};

use tracing::{debug, trace};

/// The minimum reserved capacity of a pool's slot table.
///
/// The capacity floor of the adaptive resizing policy: a table never reserves fewer slots
/// than this, not at construction, not after [`clear`][crate::ContentPool::clear], and not
/// after any number of [`cleanup_shrink`][crate::ContentPool::cleanup_shrink] calls.
pub const MIN_RESERVED_CAPACITY: usize = 16;

/// The backing storage of a `ContentPool`: a vector of slots, each pairing the content hash
/// cached at insertion time with a weak observation handle.
///
/// Vacant slots form an intrusive free list (a virtual stack threaded through the vector),
/// so insertion reuses reclaimed slots before appending. Occupancy counts every occupied
/// slot, including those whose object has already been destroyed but not yet swept - the
/// capacity policy is driven by slot pressure, not by live object count.
///
/// This type is not synchronized; `ContentPool` wraps it in a readers-writer lock.
#[derive(Debug)]
pub(crate) struct SlotTable<T> {
    /// Initialized slots. Never longer than `capacity`; the suffix up to `capacity` is
    /// unallocated `Vec` headroom, consumed by appends.
    entries: Vec<Entry<T>>,

    /// Head of the free list of vacant slots, if any.
    first_free_index: Option<usize>,

    /// Number of occupied slots, expired ones included.
    occupied: usize,

    /// The declared capacity. Always at least [`MIN_RESERVED_CAPACITY`]; changes only by
    /// doubling or halving.
    capacity: usize,
}

#[derive(Debug)]
enum Entry<T> {
    Occupied {
        /// The content hash of the observed object, computed once at insertion. Valid for
        /// the slot's whole lifetime because pooled identities are immutable.
        cached_hash: u64,

        handle: Weak<T>,
    },

    Vacant {
        /// Next entry in the free list, terminated by `None`.
        next_free_index: Option<usize>,
    },
}

impl<T> SlotTable<T> {
    /// Creates a table with the requested reserved capacity, raised to the
    /// [`MIN_RESERVED_CAPACITY`] floor if below it.
    #[must_use]
    pub(crate) fn new(reserved: usize) -> Self {
        let capacity = reserved.max(MIN_RESERVED_CAPACITY);

        Self {
            entries: Vec::with_capacity(capacity),
            first_free_index: None,
            occupied: 0,
            capacity,
        }
    }

    /// The number of occupied slots, including expired slots not yet swept.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.occupied
    }

    /// The declared capacity.
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Searches the slots whose cached hash equals `hash` for a live object matching
    /// `is_match`.
    ///
    /// Each candidate's weak handle is upgraded to a strong handle before the match
    /// predicate runs, so a returned handle is guaranteed alive. Expired candidates met
    /// during the scan do not abort it; they stay in place for the next sweep.
    pub(crate) fn find(&self, hash: u64, mut is_match: impl FnMut(&T) -> bool) -> Option<Arc<T>> {
        self.entries.iter().find_map(|entry| {
            let Entry::Occupied { cached_hash, handle } = entry else {
                return None;
            };

            if *cached_hash != hash {
                return None;
            }

            let strong = handle.upgrade()?;
            is_match(&strong).then_some(strong)
        })
    }

    /// Installs a weak observation of `strong` under the cached hash `hash`.
    ///
    /// Runs the capacity policy first: at or above the high watermark the table sweeps
    /// expired slots, and if still at the watermark afterwards it doubles its capacity.
    /// The slot itself comes from the free list when one is available, otherwise it is
    /// appended.
    pub(crate) fn insert(&mut self, hash: u64, strong: &Arc<T>) {
        if self.occupied >= self.high_watermark() {
            self.sweep();

            if self.occupied >= self.high_watermark() {
                self.grow();
            }
        }

        let entry = Entry::Occupied {
            cached_hash: hash,
            handle: Arc::downgrade(strong),
        };

        match self.first_free_index.take() {
            Some(index) => {
                let slot = self
                    .entries
                    .get_mut(index)
                    .expect("free list indices always point inside the initialized entries");

                let next_free_index = match slot {
                    Entry::Vacant { next_free_index } => *next_free_index,
                    Entry::Occupied { .. } => panic!("free list pointed at an occupied slot"),
                };

                self.first_free_index = next_free_index;
                *slot = entry;
            }
            None => self.entries.push(entry),
        }

        self.occupied = self
            .occupied
            .checked_add(1)
            .expect("occupied slot count cannot exceed the address space");
    }

    /// Reclaims every occupied slot whose object has been destroyed, pushing each onto the
    /// free list. Capacity is untouched. Returns the number of slots reclaimed.
    pub(crate) fn sweep(&mut self) -> usize {
        let mut released = 0_usize;

        for index in 0..self.entries.len() {
            let slot = self
                .entries
                .get_mut(index)
                .expect("iterating indices below the entries length");

            if let Entry::Occupied { handle, .. } = slot {
                if handle.strong_count() == 0 {
                    *slot = Entry::Vacant {
                        next_free_index: self.first_free_index.take(),
                    };
                    self.first_free_index = Some(index);

                    self.occupied = self
                        .occupied
                        .checked_sub(1)
                        .expect("every reclaimed slot was counted as occupied");

                    released = released
                        .checked_add(1)
                        .expect("cannot reclaim more slots than the address space holds");
                }
            }
        }

        if released > 0 {
            trace!(released, occupied = self.occupied, "swept expired slots");
        }

        released
    }

    /// Halves the capacity, at most once per call and never below the floor.
    ///
    /// Only applied when occupancy is at or below the low watermark, and only when the
    /// halved capacity still holds every remaining occupied slot; otherwise this is a
    /// no-op. Callers sweep first, so occupancy reflects live objects here.
    pub(crate) fn shrink(&mut self) {
        if self.occupied > self.low_watermark() {
            return;
        }

        let new_capacity = (self.capacity >> 1).max(MIN_RESERVED_CAPACITY);

        if new_capacity >= self.capacity || self.occupied > new_capacity {
            return;
        }

        self.rehost(new_capacity);

        debug!(capacity = self.capacity, "halved reserved capacity");
    }

    /// Removes every slot and resets capacity to the floor.
    pub(crate) fn clear(&mut self) {
        self.entries = Vec::with_capacity(MIN_RESERVED_CAPACITY);
        self.first_free_index = None;
        self.occupied = 0;
        self.capacity = MIN_RESERVED_CAPACITY;
    }

    /// Doubles the capacity and re-hosts the occupied slots into the new storage.
    fn grow(&mut self) {
        let new_capacity = self
            .capacity
            .checked_mul(2)
            .expect("doubling beyond the address space would mean the table outgrew memory");

        self.rehost(new_capacity);

        debug!(capacity = self.capacity, "doubled reserved capacity");
    }

    /// Moves every occupied slot into freshly reserved storage of `new_capacity` slots,
    /// dropping vacant slots and resetting the free list.
    ///
    /// Cached hashes travel with their slots; nothing is rehashed. The replacement vector
    /// is allocated before the old one is disturbed, so an allocation failure unwinds with
    /// the table still in its previous valid state.
    fn rehost(&mut self, new_capacity: usize) {
        let mut rehosted = Vec::with_capacity(new_capacity);

        rehosted.extend(
            self.entries
                .drain(..)
                .filter(|entry| matches!(entry, Entry::Occupied { .. })),
        );

        self.entries = rehosted;
        self.first_free_index = None;
        self.capacity = new_capacity;
    }

    /// Occupancy at or above this triggers a sweep, then growth: 7/8 of capacity.
    #[cfg_attr(test, mutants::skip)] // Can be mutated to grow on every insertion.
    fn high_watermark(&self) -> usize {
        self.capacity.saturating_sub(self.capacity >> 3)
    }

    /// Occupancy at or below this permits shrinking: 1/4 of capacity.
    fn low_watermark(&self) -> usize {
        self.capacity >> 2
    }
}
