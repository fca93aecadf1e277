//! `ClientRegistry` — the live set of connected clients.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::client::{Client, ClientId};

#[derive(Default)]
struct RegistryInner {
    clients: DashMap<ClientId, Arc<Client>>,
    next_serial: AtomicU64,
}

/// Concurrent map from client id to client.
///
/// Cheap to clone; clones share the same set. Callers never lock: every
/// operation is safe to run concurrently with every other.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<RegistryInner>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `client`, returning the entry it replaced (same id).
    pub fn put(&self, client: Arc<Client>) -> Option<Arc<Client>> {
        self.inner.clients.insert(client.id().clone(), client)
    }

    pub fn remove(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.inner.clients.remove(id).map(|(_, client)| client)
    }

    /// Remove `id` only if its entry is still connection `serial`.
    ///
    /// A connection that was replaced by a newer one with the same id must
    /// not remove its replacement when it goes away.
    pub fn remove_if_current(&self, id: &ClientId, serial: u64) -> bool {
        self.inner
            .clients
            .remove_if(id, |_, client| client.serial() == serial)
            .is_some()
    }

    pub fn get(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.inner.clients.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of the current clients; iterate it without holding any lock.
    pub fn snapshot(&self) -> Vec<Arc<Client>> {
        self.inner
            .clients
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.clients.is_empty()
    }

    pub(crate) fn next_serial(&self) -> u64 {
        self.inner.next_serial.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::channel_client;
    use crate::client::WriterConfig;

    #[tokio::test]
    async fn put_and_remove() {
        let registry = ClientRegistry::new();
        let (a, _rx_a) = channel_client("10.0.0.1:1", &registry, &WriterConfig::default());
        let (b, _rx_b) = channel_client("10.0.0.1:2", &registry, &WriterConfig::default());

        assert!(registry.put(a.clone()).is_none());
        assert!(registry.put(b).is_none());
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(a.id()).is_some());
        assert!(registry.remove(a.id()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn same_id_replaces() {
        let registry = ClientRegistry::new();
        let (old, _rx1) = channel_client("10.0.0.1:1", &registry, &WriterConfig::default());
        let (new, _rx2) = channel_client("10.0.0.1:1", &registry, &WriterConfig::default());

        registry.put(old.clone());
        let replaced = registry.put(new.clone()).unwrap();
        assert_eq!(replaced.serial(), old.serial());
        assert_eq!(registry.len(), 1);

        // The replaced connection going away leaves the new one in place.
        assert!(!registry.remove_if_current(old.id(), old.serial()));
        assert_eq!(registry.get(new.id()).unwrap().serial(), new.serial());

        assert!(registry.remove_if_current(new.id(), new.serial()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn snapshot_is_detached() {
        let registry = ClientRegistry::new();
        let (a, _rx) = channel_client("a", &registry, &WriterConfig::default());
        registry.put(a.clone());

        let snapshot = registry.snapshot();
        registry.remove(a.id());
        assert_eq!(snapshot.len(), 1);
        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test]
    async fn concurrent_put_remove() {
        let registry = ClientRegistry::new();
        let mut tasks = Vec::new();
        for i in 0..64 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (client, _rx) = channel_client(&format!("c{i}"), &registry, &WriterConfig::default());
                registry.put(client.clone());
                let _ = registry.snapshot();
                if i % 2 == 0 {
                    registry.remove_if_current(client.id(), client.serial());
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(registry.len(), 32);
    }
}
