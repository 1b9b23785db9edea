// Persistence port. Stores are synchronous key-value maps of serialized text so
// the same aggregate can live in a file, in memory, or in a browser-like store.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key-value persistence for serialized aggregates.
pub trait StatsStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Shared handles delegate to the inner store.
impl<S: StatsStore + ?Sized> StatsStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }
}
