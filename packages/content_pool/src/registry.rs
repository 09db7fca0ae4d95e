use std::fmt;
use std::sync::Arc;

use foldhash::{HashMap, HashMapExt};

use crate::{ContentPool, EqPolicy, HashPolicy, SelfContent};

/// An explicitly constructed table of named canonical instances.
///
/// Maps names to strong handles while deduplicating the values themselves through an
/// embedded [`ContentPool`]: registering two names with equal content yields two names for
/// one object. Registered objects stay alive for as long as their name stays registered -
/// unlike the pool, the registry holds strong handles.
///
/// The registry is an ordinary owned value. Construct it where its lifetime should begin,
/// pass it to whoever resolves names, and drop it where its lifetime should end; teardown
/// releases the registry's strong handles and nothing else. There is no process-global
/// instance and no hidden initialization order. Callers that share a registry across
/// threads wrap it in their own synchronization, the same as any other map.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use content_pool::Registry;
///
/// let mut registry = Registry::<String>::new();
///
/// let accept = registry.register("accept", "yes".to_string());
/// let confirm = registry.register("confirm", "yes".to_string());
///
/// // Two names, one canonical object.
/// assert!(Arc::ptr_eq(&accept, &confirm));
/// assert_eq!(registry.len(), 2);
///
/// assert_eq!(registry.get("accept").unwrap().as_str(), "yes");
/// assert!(registry.get("reject").is_none());
/// ```
pub struct Registry<T, H = SelfContent, E = SelfContent> {
    pool: ContentPool<T, H, E>,

    entries: HashMap<String, Arc<T>>,
}

impl<T, H, E> Registry<T, H, E> {
    /// Creates an empty registry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::Registry;
    ///
    /// let registry = Registry::<String>::new();
    ///
    /// assert!(registry.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: ContentPool::new(),
            entries: HashMap::new(),
        }
    }

    /// Creates an empty registry whose embedded pool reserves the given capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use content_pool::Registry;
    ///
    /// let registry = Registry::<String>::with_capacity(64);
    ///
    /// assert_eq!(registry.pool().capacity(), 64);
    /// ```
    #[must_use]
    pub fn with_capacity(reserved: usize) -> Self {
        Self {
            pool: ContentPool::with_capacity(reserved),
            entries: HashMap::new(),
        }
    }

    /// The number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no names are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The embedded pool that canonicalizes registered values.
    ///
    /// Useful for acquiring unnamed handles that still deduplicate against registered
    /// content, and for inspecting occupancy.
    #[must_use]
    pub fn pool(&self) -> &ContentPool<T, H, E> {
        &self.pool
    }

    /// Returns the canonical handle registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).map(Arc::clone)
    }

    /// Unregisters `name`, returning its handle.
    ///
    /// The object survives as long as any returned or previously shared handle does; the
    /// registry merely stops keeping it alive. The embedded pool keeps observing it until
    /// the last handle drops and a cleanup pass runs.
    pub fn remove(&mut self, name: &str) -> Option<Arc<T>> {
        self.entries.remove(name)
    }
}

impl<T, H, E> Registry<T, H, E>
where
    H: HashPolicy<T>,
    E: EqPolicy<T>,
{
    /// Registers `value` under `name` and returns the canonical handle.
    ///
    /// The value is acquired through the embedded pool first, so equal content registered
    /// under several names (or already held by outside acquirers) resolves to one object.
    /// Re-registering an existing name replaces that name's handle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use content_pool::Registry;
    ///
    /// let mut registry = Registry::<String>::new();
    ///
    /// let ok = registry.register("ok", "accepted".to_string());
    /// let alias = registry.register("alias", "accepted".to_string());
    ///
    /// assert!(Arc::ptr_eq(&ok, &alias));
    /// ```
    pub fn register(&mut self, name: impl Into<String>, value: T) -> Arc<T> {
        let canonical = self.pool.acquire(value);
        self.entries.insert(name.into(), Arc::clone(&canonical));
        canonical
    }
}

impl<T, H, E> Default for Registry<T, H, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, H, E> fmt::Debug for Registry<T, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.entries.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
