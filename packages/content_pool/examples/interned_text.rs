//! Example pooling an immutable text type - the classic interning workload.
//!
//! The text type fixes its identity (the byte content) at construction, which is exactly
//! the contract the pool's cached hashes rely on.

use std::sync::Arc;
use std::thread;

use content_pool::{ContentHash, ContentPool, fnv1a64};

/// An immutable text value. Identity is the content; there is no mutable state at all.
#[derive(Debug, PartialEq, Eq)]
struct InternedText {
    bytes: Box<[u8]>,
}

impl InternedText {
    fn new(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().into(),
        }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).expect("constructed from a str")
    }
}

impl ContentHash for InternedText {
    fn content_hash(&self) -> u64 {
        fnv1a64(&self.bytes)
    }
}

fn main() {
    let pool = Arc::new(ContentPool::<InternedText>::new());

    // Many logical producers of the same few strings - the interning sweet spot.
    let workers: Vec<_> = (0..4)
        .map(|index| {
            let pool = Arc::clone(&pool);

            thread::spawn(move || {
                let status = if index % 2 == 0 { "ready" } else { "busy" };
                pool.acquire(InternedText::new(status))
            })
        })
        .collect();

    let handles: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    for handle in &handles {
        println!("{} (object at {:p})", handle.as_str(), Arc::as_ptr(handle));
    }

    // Four handles, two objects.
    println!("distinct pooled objects: {}", pool.len());
}
