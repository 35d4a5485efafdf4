use std::collections::BTreeMap;

use crate::{
    errors::{FSResult, FedstackError},
    examples::Examples,
    types::{ClientId, client_id_display},
};

/// Per-client storage backing a [`FederatedData`](crate::federated::FederatedData).
///
/// Implementations are read-only and shareable across threads.
pub trait ClientStore: Send + Sync {
    /// All client ids, in sorted order.
    fn client_ids(&self) -> FSResult<Vec<ClientId>>;

    /// The number of clients.
    fn num_clients(&self) -> FSResult<usize> {
        Ok(self.client_ids()?.len())
    }

    /// Load the raw examples of one client.
    ///
    /// ## Errors
    /// [`FedstackError::UnknownClient`] if `client_id` is not in the store.
    fn load_client(
        &self,
        client_id: &[u8],
    ) -> FSResult<Examples>;
}

/// A [`ClientStore`] held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryClientStore {
    clients: BTreeMap<ClientId, Examples>,
}

impl InMemoryClientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a client.
    pub fn insert(
        &mut self,
        client_id: impl Into<ClientId>,
        examples: Examples,
    ) -> Option<Examples> {
        self.clients.insert(client_id.into(), examples)
    }

    /// Add a client, builder style.
    pub fn with_client(
        mut self,
        client_id: impl Into<ClientId>,
        examples: Examples,
    ) -> Self {
        self.insert(client_id, examples);
        self
    }

    /// Iterate over `(client_id, examples)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &Examples)> {
        self.clients.iter()
    }
}

impl FromIterator<(ClientId, Examples)> for InMemoryClientStore {
    fn from_iter<I: IntoIterator<Item = (ClientId, Examples)>>(iter: I) -> Self {
        Self {
            clients: iter.into_iter().collect(),
        }
    }
}

impl ClientStore for InMemoryClientStore {
    fn client_ids(&self) -> FSResult<Vec<ClientId>> {
        Ok(self.clients.keys().cloned().collect())
    }

    fn num_clients(&self) -> FSResult<usize> {
        Ok(self.clients.len())
    }

    fn load_client(
        &self,
        client_id: &[u8],
    ) -> FSResult<Examples> {
        self.clients
            .get(client_id)
            .cloned()
            .ok_or_else(|| FedstackError::UnknownClient(client_id_display(client_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examples::Feature;

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryClientStore::new()
            .with_client(b"b".to_vec(), Examples::new())
            .with_client(
                b"a".to_vec(),
                Examples::new().with_feature("tokens", Feature::bytes_from(["x"])),
            );

        assert_eq!(store.num_clients().unwrap(), 2);
        assert_eq!(
            store.client_ids().unwrap(),
            vec![b"a".to_vec(), b"b".to_vec()]
        );
        assert_eq!(store.load_client(b"a").unwrap().num_examples().unwrap(), 1);
        assert!(matches!(
            store.load_client(b"zz"),
            Err(FedstackError::UnknownClient(id)) if id == "zz"
        ));
    }
}
