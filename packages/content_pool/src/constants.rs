// A poisoned lock means another thread panicked while mutating the slot table. The table may
// hold a partially installed entry, so continued deduplication would hand out wrong objects.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution \
    is not safe because the slot table may no longer uphold its deduplication guarantees";
