pub mod collector;
pub mod store;

pub use collector::{CollectionError, CollectionWindow, TrafficSource};
pub use store::{
    BaselineStore, SampleQuery, SortField, SortOrder, StorageStats, StoreError, TrafficStore,
};
