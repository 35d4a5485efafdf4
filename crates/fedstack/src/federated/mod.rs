//! # Federated Data
//!
//! Client-partitioned datasets: a [`ClientStore`] holds each client's
//! [`Examples`](crate::examples::Examples); a [`FederatedData`] handle layers
//! lazy per-client and per-batch preprocessing over a store.

mod blob_codec;
mod client_store;
mod federated_data;
mod sqlite_store;

#[doc(inline)]
pub use blob_codec::*;
#[doc(inline)]
pub use client_store::*;
#[doc(inline)]
pub use federated_data::*;
#[doc(inline)]
pub use sqlite_store::*;
