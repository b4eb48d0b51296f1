//! Backend adapters
//!
//! - [`partitioned`] - flat containers partitioned by thread, scanned with
//!   key-prefix queries
//! - [`collections`] - nested collections, one collection per namespace

pub mod collections;
pub mod partitioned;

pub use collections::{CollectionClient, CollectionStore, InMemoryCollectionClient};
pub use partitioned::{InMemoryPartitionedClient, PartitionedClient, PartitionedStore};
