use std::{fmt, path::Path, sync::Arc};

use crate::{
    errors::FSResult,
    examples::Examples,
    federated::{ClientStore, SqliteClientStore},
    types::ClientId,
};

/// A per-client transform, applied when a client is loaded.
pub trait ClientTransform: Send + Sync {
    /// Transform the examples of `client_id`.
    fn transform(
        &self,
        client_id: &[u8],
        examples: Examples,
    ) -> FSResult<Examples>;
}

impl<F> ClientTransform for F
where
    F: Fn(&[u8], Examples) -> FSResult<Examples> + Send + Sync,
{
    fn transform(
        &self,
        client_id: &[u8],
        examples: Examples,
    ) -> FSResult<Examples> {
        self(client_id, examples)
    }
}

/// A per-batch transform, applied to every batch of client examples.
pub trait BatchTransform: Send + Sync {
    /// Transform one batch.
    fn transform(
        &self,
        examples: Examples,
    ) -> FSResult<Examples>;
}

impl<F> BatchTransform for F
where
    F: Fn(Examples) -> FSResult<Examples> + Send + Sync,
{
    fn transform(
        &self,
        examples: Examples,
    ) -> FSResult<Examples> {
        self(examples)
    }
}

/// Shared [`ClientTransform`].
pub type ClientFn = Arc<dyn ClientTransform>;

/// Shared [`BatchTransform`].
pub type BatchFn = Arc<dyn BatchTransform>;

/// A handle over federated data: a client store plus lazy preprocessing.
///
/// Preprocessing is recorded, not executed; transforms run each time a client
/// is loaded. Handles are cheap to clone and never modify the store.
#[derive(Clone)]
pub struct FederatedData {
    store: Arc<dyn ClientStore>,
    client_fns: Vec<ClientFn>,
    batch_fns: Vec<BatchFn>,
}

impl fmt::Debug for FederatedData {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FederatedData")
            .field("client_fns", &self.client_fns.len())
            .field("batch_fns", &self.batch_fns.len())
            .finish_non_exhaustive()
    }
}

impl FederatedData {
    /// Wrap a client store.
    pub fn new<S: ClientStore + 'static>(store: S) -> Self {
        Self::from_store(Arc::new(store))
    }

    /// Wrap a shared client store.
    pub fn from_store(store: Arc<dyn ClientStore>) -> Self {
        Self {
            store,
            client_fns: Vec::new(),
            batch_fns: Vec::new(),
        }
    }

    /// Open a federated `SQLite` file.
    pub fn from_sqlite<P: AsRef<Path>>(path: P) -> FSResult<Self> {
        Ok(Self::new(SqliteClientStore::open(path)?))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ClientStore> {
        &self.store
    }

    /// A new handle which also applies `f` to every loaded client.
    ///
    /// Client transforms run in the order they were added.
    pub fn preprocess_client<F: ClientTransform + 'static>(
        &self,
        f: F,
    ) -> Self {
        self.preprocess_client_fn(Arc::new(f))
    }

    /// See [`Self::preprocess_client`].
    pub fn preprocess_client_fn(
        &self,
        f: ClientFn,
    ) -> Self {
        let mut data = self.clone();
        data.client_fns.push(f);
        data
    }

    /// A new handle which also applies `f` to every batch from
    /// [`Self::client_batches`].
    pub fn preprocess_batch<F: BatchTransform + 'static>(
        &self,
        f: F,
    ) -> Self {
        self.preprocess_batch_fn(Arc::new(f))
    }

    /// See [`Self::preprocess_batch`].
    pub fn preprocess_batch_fn(
        &self,
        f: BatchFn,
    ) -> Self {
        let mut data = self.clone();
        data.batch_fns.push(f);
        data
    }

    /// All client ids, in sorted order.
    pub fn client_ids(&self) -> FSResult<Vec<ClientId>> {
        self.store.client_ids()
    }

    /// The number of clients.
    pub fn num_clients(&self) -> FSResult<usize> {
        self.store.num_clients()
    }

    /// Load one client, with client transforms applied.
    pub fn get_client(
        &self,
        client_id: &[u8],
    ) -> FSResult<Examples> {
        let mut examples = self.store.load_client(client_id)?;
        for f in &self.client_fns {
            examples = f.transform(client_id, examples)?;
        }
        Ok(examples)
    }

    /// Iterate over all clients in id order, with client transforms applied.
    pub fn clients(&self) -> FSResult<impl Iterator<Item = FSResult<(ClientId, Examples)>> + '_> {
        let ids = self.client_ids()?;
        Ok(ids.into_iter().map(move |id| {
            let examples = self.get_client(&id)?;
            Ok((id, examples))
        }))
    }

    /// Apply the batch transforms to one batch.
    pub fn transform_batch(
        &self,
        mut batch: Examples,
    ) -> FSResult<Examples> {
        for f in &self.batch_fns {
            batch = f.transform(batch)?;
        }
        Ok(batch)
    }

    /// Load one client and split it into batches of at most `batch_size`,
    /// with batch transforms applied.
    pub fn client_batches(
        &self,
        client_id: &[u8],
        batch_size: usize,
    ) -> FSResult<Vec<Examples>> {
        self.get_client(client_id)?
            .batches(batch_size)?
            .into_iter()
            .map(|batch| self.transform_batch(batch))
            .collect()
    }
}
