//! Example demonstrating basic usage of `ContentPool`.
//!
//! Shows content-based deduplication, non-owning observation and explicit cleanup.

use std::sync::Arc;

use content_pool::ContentPool;

fn main() {
    println!("=== ContentPool: content-addressed deduplication ===");

    let pool = ContentPool::<String>::new();

    // Equal content resolves to one shared object.
    let first = pool.acquire("configuration".to_string());
    let second = pool.acquire("configuration".to_string());
    let other = pool.acquire("diagnostics".to_string());

    println!("first and second share storage: {}", Arc::ptr_eq(&first, &second));
    println!("first and other share storage: {}", Arc::ptr_eq(&first, &other));
    println!("occupied slots: {}", pool.len());

    // The pool never owns anything: dropping the handles destroys the objects,
    // leaving expired slots behind for cleanup.
    drop(first);
    drop(second);
    println!("occupied slots before cleanup: {}", pool.len());

    pool.cleanup();
    println!("occupied slots after cleanup: {}", pool.len());

    // Capacity stays at the floor unless sustained retention pushes it up.
    println!("reserved capacity: {}", pool.capacity());
}
