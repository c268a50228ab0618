//! Client Module
//!
//! The client side of the relay: a persisted cache of recently seen messages,
//! background tasks that keep it current, and a resolver that consults the
//! cache before the server.

mod cache;
mod http;
mod resolver;
mod storage;
mod tasks;


pub use cache::ClientCache;
pub use http::RelayClient;
pub use resolver::{LookupResolver, LookupSource, MessageFetcher, Resolved};
pub use storage::{CacheSnapshot, CacheStorage, CachedMessage, FileStorage, MemoryStorage};
pub use tasks::{spawn_subscription_task, spawn_sweep_task, CacheHandle};
