use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use crate::constants::ERR_POISONED_LOCK;
use crate::slot_table::SlotTable;
use crate::{ContentPoolBuilder, EqPolicy, HashPolicy, SelfContent};

/// A content-addressed object pool that deduplicates shared objects by logical content and
/// observes them through weak references.
///
/// The pool never owns its objects. [`acquire()`][Self::acquire] hands out
/// [`Arc<T>`] strong handles; the pool itself records only [`std::sync::Weak`] observation
/// handles, so an object lives exactly as long as external strong handles do. Slots whose
/// object has been destroyed linger until a cleanup pass reclaims them - either the
/// opportunistic one insertion triggers under occupancy pressure, or an explicit
/// [`cleanup()`][Self::cleanup] / [`cleanup_shrink()`][Self::cleanup_shrink] call.
///
/// Identity is defined by the pool's hash and equality policies. With the default
/// [`SelfContent`] policies, any `T: ContentHash + Eq` pools under its own content
/// identity; naming explicit [`HashPolicy`]/[`EqPolicy`] parameters pools a type under an
/// externally supplied identity instead.
///
/// # Thread safety
///
/// All operations take `&self` and synchronize on an internal readers-writer lock:
/// [`len()`][Self::len], [`is_empty()`][Self::is_empty] and
/// [`capacity()`][Self::capacity] share the lock, everything else holds it exclusively.
/// Two concurrent [`acquire()`][Self::acquire] calls with equal content are linearized at
/// the lock: one installs its candidate, the other discards its own and reuses the winner.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use content_pool::ContentPool;
///
/// let pool = ContentPool::<String>::new();
///
/// let first = pool.acquire("shared".to_string());
/// let second = pool.acquire("shared".to_string());
///
/// // Equal content resolves to the same underlying object.
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(pool.len(), 1);
/// ```
pub struct ContentPool<T, H = SelfContent, E = SelfContent> {
    /// The slot table, behind the readers-writer lock that defines the pool's
    /// linearization point.
    table: RwLock<SlotTable<T>>,

    _policies: PhantomData<(H, E)>,
}

impl<T, H, E> ContentPool<T, H, E> {
    /// Creates a pool with the default reserved capacity
    /// ([`MIN_RESERVED_CAPACITY`][crate::MIN_RESERVED_CAPACITY]).
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::{ContentPool, MIN_RESERVED_CAPACITY};
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// assert!(pool.is_empty());
    /// assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(crate::MIN_RESERVED_CAPACITY)
    }

    /// Creates a pool with the given initial reserved capacity.
    ///
    /// Values below [`MIN_RESERVED_CAPACITY`][crate::MIN_RESERVED_CAPACITY] are raised to
    /// the floor; the capacity invariant holds from construction onward.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::{ContentPool, MIN_RESERVED_CAPACITY};
    ///
    /// let pool = ContentPool::<String>::with_capacity(64);
    /// assert_eq!(pool.capacity(), 64);
    ///
    /// let small = ContentPool::<String>::with_capacity(4);
    /// assert_eq!(small.capacity(), MIN_RESERVED_CAPACITY);
    /// ```
    #[must_use]
    pub fn with_capacity(reserved: usize) -> Self {
        Self {
            table: RwLock::new(SlotTable::new(reserved)),
            _policies: PhantomData,
        }
    }

    /// Starts building a pool with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::builder().reserve(32).build();
    ///
    /// assert_eq!(pool.capacity(), 32);
    /// ```
    pub fn builder() -> ContentPoolBuilder<T, H, E> {
        ContentPoolBuilder::new()
    }
}

impl<T, H, E> ContentPool<T, H, E>
where
    H: HashPolicy<T>,
    E: EqPolicy<T>,
{
    /// Returns a strong handle to the pooled object equal to `value`, installing `value`
    /// as the canonical instance if no live equal object exists.
    ///
    /// The candidate is wrapped in its strong handle and hashed before the pool lock is
    /// taken; the critical section covers only the table lookup and, on a miss, the slot
    /// installation. On a hit the candidate is discarded - after the lock is released -
    /// and the existing object's handle is returned. At the instant this returns there is
    /// exactly one live pooled object for the requested identity.
    ///
    /// Under contention, equal candidates may be constructed concurrently; only the
    /// installation is serialized, and losers are dropped. Types with an expensive
    /// fully-initialized state should keep provisional construction cheap and defer heavy
    /// setup until a handle is actually used.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// let first = pool.acquire("value".to_string());
    /// let again = pool.acquire("value".to_string());
    /// let other = pool.acquire("other".to_string());
    ///
    /// assert!(Arc::ptr_eq(&first, &again));
    /// assert!(!Arc::ptr_eq(&first, &other));
    /// assert_eq!(pool.len(), 2);
    /// ```
    #[must_use]
    pub fn acquire(&self, value: T) -> Arc<T> {
        let candidate = Arc::new(value);
        let hash = H::hash_value(&candidate);

        let mut table = self.table.write().expect(ERR_POISONED_LOCK);

        if let Some(existing) = table.find(hash, |live| E::eq(live, &candidate)) {
            // The candidate must be discarded outside the critical section; dropping the
            // loser runs T's destructor.
            drop(table);
            return existing;
        }

        table.insert(hash, &candidate);
        drop(table);

        candidate
    }

    /// Like [`acquire()`][Self::acquire], with the candidate produced by a closure.
    ///
    /// The closure runs before any lock is taken, so a panic inside it leaves the pool
    /// untouched. Note that the closure runs unconditionally: deduplication happens after
    /// construction, never instead of it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// let built = pool.acquire_with(|| "assembled".repeat(2));
    /// let again = pool.acquire("assembledassembled".to_string());
    ///
    /// assert!(Arc::ptr_eq(&built, &again));
    /// ```
    #[must_use]
    pub fn acquire_with<F>(&self, make: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        self.acquire(make())
    }

    /// Reclaims every slot whose object has been destroyed.
    ///
    /// Capacity is unchanged. Live strong handles are unaffected - the pass inspects only
    /// weak handles.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// let retained = pool.acquire("retained".to_string());
    /// let released = pool.acquire("released".to_string());
    /// drop(released);
    ///
    /// // The expired slot lingers until cleanup.
    /// assert_eq!(pool.len(), 2);
    ///
    /// pool.cleanup();
    /// assert_eq!(pool.len(), 1);
    /// # drop(retained);
    /// ```
    pub fn cleanup(&self) {
        self.table.write().expect(ERR_POISONED_LOCK).sweep();
    }

    /// Reclaims expired slots, then halves the reserved capacity if occupancy has fallen
    /// to a quarter of it or less.
    ///
    /// The halving is conservative: one step per call, never cascading, never below
    /// [`MIN_RESERVED_CAPACITY`][crate::MIN_RESERVED_CAPACITY], and never to a capacity
    /// that could not hold the remaining occupied slots. Bursty workloads that grew the
    /// pool therefore release memory gradually instead of oscillating.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::{ContentPool, MIN_RESERVED_CAPACITY};
    ///
    /// let pool = ContentPool::<u64>::with_capacity(64);
    ///
    /// pool.cleanup_shrink();
    /// assert_eq!(pool.capacity(), 32);
    ///
    /// pool.cleanup_shrink();
    /// assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    /// ```
    pub fn cleanup_shrink(&self) {
        let mut table = self.table.write().expect(ERR_POISONED_LOCK);
        table.sweep();
        table.shrink();
    }

    /// The number of occupied slots, *including* expired slots that no cleanup pass has
    /// reclaimed yet.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// let handle = pool.acquire("counted".to_string());
    /// drop(handle);
    ///
    /// // Still counted: the object is gone but the slot is unswept.
    /// assert_eq!(pool.len(), 1);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether the pool has no occupied slots.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::ContentPool;
    ///
    /// let pool = ContentPool::<String>::new();
    /// assert!(pool.is_empty());
    ///
    /// let _handle = pool.acquire("present".to_string());
    /// assert!(!pool.is_empty());
    /// ```
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current reserved capacity of the slot table.
    ///
    /// Always at least [`MIN_RESERVED_CAPACITY`][crate::MIN_RESERVED_CAPACITY]; grows by
    /// doubling under insertion pressure and shrinks only through
    /// [`cleanup_shrink()`][Self::cleanup_shrink].
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::{ContentPool, MIN_RESERVED_CAPACITY};
    ///
    /// let pool = ContentPool::<String>::new();
    ///
    /// assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    /// ```
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.read().expect(ERR_POISONED_LOCK).capacity()
    }

    /// Removes every slot and resets the reserved capacity to the floor.
    ///
    /// Only observation records are removed; externally held strong handles keep their
    /// objects fully alive. Acquiring previously pooled content afterwards installs a new
    /// canonical instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::{ContentPool, MIN_RESERVED_CAPACITY};
    ///
    /// let pool = ContentPool::<String>::new();
    /// let survivor = pool.acquire("survivor".to_string());
    ///
    /// pool.clear();
    ///
    /// assert!(pool.is_empty());
    /// assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    /// assert_eq!(survivor.as_str(), "survivor");
    /// ```
    pub fn clear(&self) {
        self.table.write().expect(ERR_POISONED_LOCK).clear();
    }
}

impl<T, H, E> Default for ContentPool<T, H, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, H, E> fmt::Debug for ContentPool<T, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read().expect(ERR_POISONED_LOCK);

        f.debug_struct("ContentPool")
            .field("len", &table.len())
            .field("capacity", &table.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::MIN_RESERVED_CAPACITY;

    #[test]
    fn acquire_deduplicates_equal_content() {
        let pool = ContentPool::<String>::new();

        let first = pool.acquire("ten".to_string());
        let second = pool.acquire("ten".to_string());
        let third = pool.acquire("twenty".to_string());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn len_counts_unswept_expired_slots() {
        let pool = ContentPool::<String>::new();

        let first = pool.acquire("one".to_string());
        let second = pool.acquire("two".to_string());

        drop(first);
        drop(second);

        // Expired observations linger until a cleanup pass runs.
        assert_eq!(pool.len(), 2);

        pool.cleanup();

        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn cleanup_releases_exactly_the_expired_slots() {
        let pool = ContentPool::<String>::new();

        let retained = pool.acquire("retained".to_string());
        let released_a = pool.acquire("released-a".to_string());
        let released_b = pool.acquire("released-b".to_string());

        drop(released_a);
        drop(released_b);
        pool.cleanup();

        assert_eq!(pool.len(), 1);
        assert_eq!(retained.as_str(), "retained");
    }

    #[test]
    fn reacquire_after_expiry_creates_a_new_object() {
        let pool = ContentPool::<String>::new();

        let original = pool.acquire("phoenix".to_string());
        let observer = Arc::downgrade(&original);

        drop(original);
        pool.cleanup();

        let reborn = pool.acquire("phoenix".to_string());

        // The original object is gone for good; the new handle observes a new object.
        assert!(observer.upgrade().is_none());
        assert_eq!(reborn.as_str(), "phoenix");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn acquire_cleanup_reacquire_cycle() {
        let pool = ContentPool::<String>::new();

        let a1 = pool.acquire("A".to_string());
        let a2 = pool.acquire("A".to_string());
        let b = pool.acquire("B".to_string());

        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(pool.len(), 2);

        let a_observer = Arc::downgrade(&a1);
        drop(a1);
        drop(a2);
        pool.cleanup();

        assert_eq!(pool.len(), 1);

        let a3 = pool.acquire("A".to_string());

        assert_eq!(pool.len(), 2);
        assert!(a_observer.upgrade().is_none());
        assert_eq!(b.as_str(), "B");
        assert_eq!(a3.as_str(), "A");
    }

    #[test]
    fn capacity_floor_holds_after_clear_and_cleanup_shrink() {
        let pool = ContentPool::<u64>::new();

        assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);

        pool.cleanup_shrink();
        assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);

        pool.clear();
        assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    }

    #[test]
    fn expansion_and_gradual_contraction() {
        let pool = ContentPool::<u64>::new();

        let retained: Vec<_> = (0..30_u64).map(|value| pool.acquire(value)).collect();

        assert_eq!(pool.len(), 30);
        assert!(pool.capacity() >= 32);
        let grown = pool.capacity();

        drop(retained);
        pool.cleanup_shrink();

        // One halving per call, never a cascade to the floor.
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), grown / 2);

        pool.cleanup_shrink();
        assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    }

    #[test]
    fn clear_leaves_external_handles_alive() {
        let pool = ContentPool::<String>::new();

        let survivor = pool.acquire("survivor".to_string());
        pool.clear();

        assert!(pool.is_empty());
        assert_eq!(survivor.as_str(), "survivor");

        // Cleared means forgotten: reacquiring installs a fresh canonical object.
        let replacement = pool.acquire("survivor".to_string());
        assert!(!Arc::ptr_eq(&survivor, &replacement));
    }

    /// Hash policy that sends every value to one bucket, forcing the equality check to do
    /// all the discrimination work.
    #[derive(Debug)]
    struct CollidingHash;

    impl HashPolicy<u64> for CollidingHash {
        fn hash_value(_value: &u64) -> u64 {
            7
        }
    }

    impl EqPolicy<u64> for CollidingHash {
        fn eq(lhs: &u64, rhs: &u64) -> bool {
            lhs == rhs
        }
    }

    #[test]
    fn no_false_aliasing_under_hash_collisions() {
        let pool = ContentPool::<u64, CollidingHash, CollidingHash>::new();

        let one = pool.acquire(1);
        let two = pool.acquire(2);
        let one_again = pool.acquire(1);

        assert!(!Arc::ptr_eq(&one, &two));
        assert!(Arc::ptr_eq(&one, &one_again));
        assert_eq!(pool.len(), 2);
    }

    /// External-policy form for a type that describes no identity of its own.
    #[derive(Debug)]
    struct Measurement {
        millis: u64,
    }

    #[derive(Debug)]
    struct ByMillis;

    impl HashPolicy<Measurement> for ByMillis {
        fn hash_value(value: &Measurement) -> u64 {
            value.millis
        }
    }

    impl EqPolicy<Measurement> for ByMillis {
        fn eq(lhs: &Measurement, rhs: &Measurement) -> bool {
            lhs.millis == rhs.millis
        }
    }

    #[test]
    fn external_policies_pool_foreign_types() {
        let pool = ContentPool::<Measurement, ByMillis, ByMillis>::new();

        let first = pool.acquire(Measurement { millis: 250 });
        let second = pool.acquire(Measurement { millis: 250 });
        let other = pool.acquire(Measurement { millis: 750 });

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn acquire_with_deduplicates_like_acquire() {
        let pool = ContentPool::<String>::new();

        let eager = pool.acquire("lazy".to_string());
        let lazy = pool.acquire_with(|| "lazy".to_string());

        assert!(Arc::ptr_eq(&eager, &lazy));
    }

    #[test]
    fn default_pool_is_empty_at_the_floor() {
        let pool: ContentPool<String> = ContentPool::default();

        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), MIN_RESERVED_CAPACITY);
    }

    #[test]
    fn debug_output_reports_occupancy() {
        let pool = ContentPool::<String>::new();
        let _handle = pool.acquire("shown".to_string());

        let rendered = format!("{pool:?}");

        assert!(rendered.contains("len: 1"));
        assert!(rendered.contains("capacity: 16"));
    }
}
