//! Example using `Registry` for named canonical instances.
//!
//! The registry replaces hidden static singleton tables with a value you construct,
//! pass and drop explicitly - names keep their objects alive, the embedded pool
//! deduplicates the contents.

use std::sync::Arc;

use content_pool::Registry;

fn dispatch(registry: &Registry<String>, name: &str) {
    match registry.get(name) {
        Some(handle) => println!("{name} -> {} ({} names registered)", handle, registry.len()),
        None => println!("{name} -> <unregistered>"),
    }
}

fn main() {
    let mut registry = Registry::<String>::new();

    // Several names, partially shared content.
    let ok = registry.register("ok", "request accepted".to_string());
    let accepted = registry.register("accepted", "request accepted".to_string());
    let _rejected = registry.register("rejected", "request rejected".to_string());

    // Two names resolved to one canonical object.
    println!("ok and accepted alias: {}", Arc::ptr_eq(&ok, &accepted));
    println!(
        "{} names over {} pooled objects",
        registry.len(),
        registry.pool().len()
    );

    // The registry is passed explicitly - no global lookup anywhere.
    dispatch(&registry, "ok");
    dispatch(&registry, "rejected");
    dispatch(&registry, "missing");

    // Teardown is just a drop; outside handles stay valid afterwards.
    drop(registry);
    println!("after registry teardown: {}", ok.as_str());
}
